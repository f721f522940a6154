//! Frequency response curves and the canonical frequency grid

use crate::error::{PeqfitError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Default number of points of the canonical grid (about 1% spacing).
pub const DEFAULT_GRID_POINTS: usize = 695;
/// Default lowest frequency of the canonical grid in Hz.
pub const DEFAULT_F_MIN: f64 = 20.0;
/// Default highest frequency of the canonical grid in Hz.
pub const DEFAULT_F_MAX: f64 = 20000.0;

/// A single (frequency, level) sample as found in measurement files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPoint {
    /// Frequency in Hz
    pub freq: f64,
    /// Level in dB
    pub db: f64,
}

/// A struct to hold frequency and SPL data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Frequency points in Hz
    pub freq: Array1<f64>,
    /// Sound Pressure Level in dB
    pub spl: Array1<f64>,
}

impl Curve {
    /// Build a curve and check that it is well formed.
    ///
    /// # Errors
    ///
    /// Returns `PeqfitError::InvalidCurve` when [`Curve::validate`] fails.
    pub fn try_new(freq: Array1<f64>, spl: Array1<f64>) -> Result<Self> {
        let curve = Curve { freq, spl };
        curve.validate()?;
        Ok(curve)
    }

    /// Build a curve holding `level` at every frequency of `freq`.
    pub fn constant(freq: &Array1<f64>, level: f64) -> Self {
        Curve {
            freq: freq.clone(),
            spl: Array1::from_elem(freq.len(), level),
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    /// True when the curve has no point
    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }

    /// Check that the curve is usable as resampling input.
    ///
    /// Frequencies must be finite, strictly positive and strictly increasing
    /// (duplicates are rejected), levels must be finite, and both arrays must
    /// have the same non-zero length.
    pub fn validate(&self) -> Result<()> {
        if self.freq.is_empty() {
            return Err(PeqfitError::invalid_curve("curve has no points"));
        }
        if self.freq.len() != self.spl.len() {
            return Err(PeqfitError::invalid_curve(format!(
                "{} frequencies but {} levels",
                self.freq.len(),
                self.spl.len()
            )));
        }
        for (i, (&f, &db)) in self.freq.iter().zip(self.spl.iter()).enumerate() {
            if !f.is_finite() || f <= 0.0 {
                return Err(PeqfitError::invalid_curve(format!(
                    "frequency #{i} is not a positive finite number: {f}"
                )));
            }
            if !db.is_finite() {
                return Err(PeqfitError::invalid_curve(format!(
                    "level #{i} at {f} Hz is not finite"
                )));
            }
        }
        if let Some(i) = (1..self.freq.len()).find(|&i| self.freq[i] <= self.freq[i - 1]) {
            return Err(PeqfitError::invalid_curve(format!(
                "frequencies are not strictly increasing at #{i} ({} Hz after {} Hz)",
                self.freq[i],
                self.freq[i - 1]
            )));
        }
        Ok(())
    }

    /// Convert to a list of points, e.g. for serialization.
    pub fn to_points(&self) -> Vec<FrequencyPoint> {
        self.freq
            .iter()
            .zip(self.spl.iter())
            .map(|(&freq, &db)| FrequencyPoint { freq, db })
            .collect()
    }
}

/// Build a curve from a list of points.
///
/// # Errors
///
/// Returns `PeqfitError::InvalidCurve` when the points do not form a valid curve.
pub fn curve_from_points(points: &[FrequencyPoint]) -> Result<Curve> {
    let freq = points.iter().map(|p| p.freq).collect::<Array1<f64>>();
    let spl = points.iter().map(|p| p.db).collect::<Array1<f64>>();
    Curve::try_new(freq, spl)
}

/// Shape of the canonical grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of log spaced points
    pub n_points: usize,
    /// Lowest frequency in Hz
    pub f_min: f64,
    /// Highest frequency in Hz
    pub f_max: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            n_points: DEFAULT_GRID_POINTS,
            f_min: DEFAULT_F_MIN,
            f_max: DEFAULT_F_MAX,
        }
    }
}

/// The canonical frequency grid shared by every curve entering the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    freq: Array1<f64>,
}

impl FrequencyGrid {
    /// Build the grid described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `PeqfitError::InvalidConfig` for fewer than two points or a
    /// frequency range that is empty or not strictly positive.
    pub fn new(config: &GridConfig) -> Result<Self> {
        if config.n_points < 2 {
            return Err(PeqfitError::InvalidConfig {
                reason: format!("grid needs at least 2 points, got {}", config.n_points),
            });
        }
        if !(config.f_min > 0.0 && config.f_max > config.f_min && config.f_max.is_finite()) {
            return Err(PeqfitError::InvalidConfig {
                reason: format!(
                    "grid range must satisfy 0 < f_min < f_max, got [{}, {}]",
                    config.f_min, config.f_max
                ),
            });
        }
        Ok(Self {
            freq: crate::read::create_log_frequency_grid(
                config.n_points,
                config.f_min,
                config.f_max,
            ),
        })
    }

    /// Grid frequencies in Hz
    pub fn freqs(&self) -> &Array1<f64> {
        &self.freq
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    /// Always false for a constructed grid
    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }

    /// True when `curve` lives exactly on this grid
    pub fn contains_curve(&self, curve: &Curve) -> bool {
        curve.freq == self.freq
    }
}
