//! Filter specifications, filter banks and the built-in constraint sets
//!
//! A [`FilterSpec`] is an immutable description of one slot of the
//! equalizer: its type and the box its parameters must stay in. Optional
//! bounds fall back to per-type defaults when resolved into
//! [`FilterBounds`] for a given sample rate.

use crate::error::{PeqfitError, Result};
use crate::iir::FilterType;
use serde::{Deserialize, Serialize};

/// Default lower gain bound in dB
pub const DEFAULT_MIN_GAIN: f64 = -20.0;
/// Default upper gain bound in dB
pub const DEFAULT_MAX_GAIN: f64 = 20.0;
/// Default lower Q bound for shelves
pub const DEFAULT_SHELF_MIN_Q: f64 = 0.4;
/// Default upper Q bound for shelves
pub const DEFAULT_SHELF_MAX_Q: f64 = 0.7;
/// Default lower Q bound for peaking filters (about 5 octaves wide)
pub const DEFAULT_PEAKING_MIN_Q: f64 = 0.18248;
/// Default upper Q bound for peaking filters
pub const DEFAULT_PEAKING_MAX_Q: f64 = 6.0;
/// Default lower center frequency bound in Hz
pub const DEFAULT_MIN_FC: f64 = 20.0;
/// Default upper center frequency bound in Hz
pub const DEFAULT_MAX_FC: f64 = 10000.0;
/// Fraction of Nyquist above which no center frequency is allowed
pub const NYQUIST_MARGIN: f64 = 0.98;

/// Names of the built-in constraint sets
pub const BUILTIN_CONSTRAINT_SETS: [&str; 3] = ["standard", "restricted", "qudelix_10"];

/// Bounds for one filter slot of the bank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Filter type of this slot
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Lower gain bound in dB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_gain: Option<f64>,
    /// Upper gain bound in dB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gain: Option<f64>,
    /// Lower Q bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_q: Option<f64>,
    /// Upper Q bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_q: Option<f64>,
    /// Lower center frequency bound in Hz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fc: Option<f64>,
    /// Upper center frequency bound in Hz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fc: Option<f64>,
}

/// Resolved bounds of a filter slot, as seen by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterBounds {
    /// Filter type of this slot
    pub filter_type: FilterType,
    /// (min, max) gain in dB
    pub gain: (f64, f64),
    /// (min, max) Q
    pub q: (f64, f64),
    /// (min, max) center frequency in Hz
    pub fc: (f64, f64),
}

impl FilterBounds {
    /// True when the parameters lie inside the box
    pub fn contains(&self, fc: f64, q: f64, gain: f64) -> bool {
        fc >= self.fc.0
            && fc <= self.fc.1
            && q >= self.q.0
            && q <= self.q.1
            && gain >= self.gain.0
            && gain <= self.gain.1
    }
}

impl FilterSpec {
    /// A slot of type `filter_type` with every bound defaulted
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            min_gain: None,
            max_gain: None,
            min_q: None,
            max_q: None,
            min_fc: None,
            max_fc: None,
        }
    }

    /// Low-shelf slot with default bounds
    pub fn low_shelf() -> Self {
        Self::new(FilterType::LowShelf)
    }

    /// Peaking slot with default bounds
    pub fn peaking() -> Self {
        Self::new(FilterType::Peaking)
    }

    /// High-shelf slot with default bounds
    pub fn high_shelf() -> Self {
        Self::new(FilterType::HighShelf)
    }

    /// Same spec with the given gain bounds
    pub fn with_gain(self, min_gain: f64, max_gain: f64) -> Self {
        Self {
            min_gain: Some(min_gain),
            max_gain: Some(max_gain),
            ..self
        }
    }

    /// Same spec with the given Q bounds
    pub fn with_q(self, min_q: f64, max_q: f64) -> Self {
        Self {
            min_q: Some(min_q),
            max_q: Some(max_q),
            ..self
        }
    }

    /// Same spec with the given center frequency bounds
    pub fn with_fc(self, min_fc: f64, max_fc: f64) -> Self {
        Self {
            min_fc: Some(min_fc),
            max_fc: Some(max_fc),
            ..self
        }
    }

    fn default_q(&self) -> (f64, f64) {
        if self.filter_type.is_shelf() {
            (DEFAULT_SHELF_MIN_Q, DEFAULT_SHELF_MAX_Q)
        } else {
            (DEFAULT_PEAKING_MIN_Q, DEFAULT_PEAKING_MAX_Q)
        }
    }

    /// Resolve defaults and check consistency for `sample_rate`.
    ///
    /// The upper center frequency bound is capped below Nyquist; the cap only
    /// narrows the configured range.
    ///
    /// # Errors
    ///
    /// Returns `PeqfitError::InvalidFilterSpec` when a bound is not finite,
    /// a range is inverted, Q or fc is not strictly positive, or the whole fc
    /// range lies above Nyquist.
    pub fn bounds(&self, index: usize, sample_rate: u32) -> Result<FilterBounds> {
        let invalid = |reason: String| PeqfitError::InvalidFilterSpec { index, reason };
        let (default_min_q, default_max_q) = self.default_q();

        let gain = (
            self.min_gain.unwrap_or(DEFAULT_MIN_GAIN),
            self.max_gain.unwrap_or(DEFAULT_MAX_GAIN),
        );
        let q = (
            self.min_q.unwrap_or(default_min_q),
            self.max_q.unwrap_or(default_max_q),
        );
        let fc = (
            self.min_fc.unwrap_or(DEFAULT_MIN_FC),
            self.max_fc.unwrap_or(DEFAULT_MAX_FC),
        );

        for (name, (lo, hi)) in [("gain", gain), ("q", q), ("fc", fc)] {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(invalid(format!("{name} bounds must be finite")));
            }
            if lo > hi {
                return Err(invalid(format!("min_{name} ({lo}) > max_{name} ({hi})")));
            }
        }
        if q.0 <= 0.0 {
            return Err(invalid(format!("min_q must be positive, got {}", q.0)));
        }
        if fc.0 <= 0.0 {
            return Err(invalid(format!("min_fc must be positive, got {}", fc.0)));
        }

        let fc_cap = NYQUIST_MARGIN * sample_rate as f64 / 2.0;
        if fc.0 >= fc_cap {
            return Err(invalid(format!(
                "min_fc ({}) is above the usable range for {} Hz sampling",
                fc.0, sample_rate
            )));
        }

        Ok(FilterBounds {
            filter_type: self.filter_type,
            gain,
            q,
            fc: (fc.0, fc.1.min(fc_cap)),
        })
    }
}

/// Ordered list of filter slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterBank {
    /// Filter slots in bank order
    pub filters: Vec<FilterSpec>,
}

impl FilterBank {
    /// Build a bank from its slots
    pub fn new(filters: Vec<FilterSpec>) -> Self {
        Self { filters }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True when the bank has no slot
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterate over the slots in bank order
    pub fn iter(&self) -> impl Iterator<Item = &FilterSpec> {
        self.filters.iter()
    }

    /// Resolve every slot's bounds for `sample_rate`.
    ///
    /// # Errors
    ///
    /// Returns `PeqfitError::InvalidSampleRate` for a zero sample rate and the
    /// first `PeqfitError::InvalidFilterSpec` found otherwise.
    pub fn bounds(&self, sample_rate: u32) -> Result<Vec<FilterBounds>> {
        if sample_rate == 0 {
            return Err(PeqfitError::InvalidSampleRate { sample_rate });
        }
        self.filters
            .iter()
            .enumerate()
            .map(|(i, spec)| spec.bounds(i, sample_rate))
            .collect()
    }
}

fn ls_pk_hs_bank(num_peaking: usize, gain: f64, peaking_q: (f64, f64)) -> FilterBank {
    let mut filters = Vec::with_capacity(num_peaking + 2);
    filters.push(FilterSpec::low_shelf().with_gain(-gain, gain));
    for _ in 0..num_peaking {
        filters.push(
            FilterSpec::peaking()
                .with_gain(-gain, gain)
                .with_q(peaking_q.0, peaking_q.1),
        );
    }
    filters.push(FilterSpec::high_shelf().with_gain(-gain, gain));
    FilterBank::new(filters)
}

/// Look up a built-in constraint set by name.
///
/// * `standard`: low shelf, 3 peaking, high shelf, ±12 dB
/// * `restricted`: 3 peaking, ±6 dB, Q in [1, 5]
/// * `qudelix_10`: low shelf, 8 peaking, high shelf, ±12 dB
///
/// # Errors
///
/// Returns `PeqfitError::UnknownConstraintSet` for any other name.
pub fn builtin_constraint_set(name: &str) -> Result<FilterBank> {
    match name {
        "standard" => Ok(ls_pk_hs_bank(3, 12.0, (0.5, 10.0))),
        "restricted" => Ok(FilterBank::new(vec![
            FilterSpec::peaking().with_gain(-6.0, 6.0).with_q(1.0, 5.0);
            3
        ])),
        "qudelix_10" => Ok(ls_pk_hs_bank(8, 12.0, (0.5, 10.0))),
        _ => Err(PeqfitError::UnknownConstraintSet {
            name: name.to_string(),
        }),
    }
}
