//! Parameter vector utilities
//!
//! The optimizer works on a flat vector with 3 entries per filter:
//! `[log10(fc), q, gain]`. Frequencies are optimized in log space so that a
//! step has the same musical size anywhere in the band.

use crate::constraints::FilterBounds;

/// Number of parameters per filter: freq (log10), Q, gain
pub const PARAMS_PER_FILTER: usize = 3;

/// Container for filter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Frequency (as log10 for optimization)
    pub freq: f64,
    /// Q factor
    pub q: f64,
    /// Gain in dB
    pub gain: f64,
}

impl FilterParams {
    /// Parameters from a center frequency in Hz
    pub fn from_hz(fc: f64, q: f64, gain: f64) -> Self {
        Self {
            freq: fc.log10(),
            q,
            gain,
        }
    }

    /// Center frequency in Hz
    pub fn fc(&self) -> f64 {
        10f64.powf(self.freq)
    }

    /// True when every entry is finite
    pub fn is_finite(&self) -> bool {
        self.freq.is_finite() && self.q.is_finite() && self.gain.is_finite()
    }
}

/// Get the number of filters from a parameter vector
pub fn num_filters(x: &[f64]) -> usize {
    x.len() / PARAMS_PER_FILTER
}

/// Extract filter parameters for the i-th filter
pub fn get_filter_params(x: &[f64], i: usize) -> FilterParams {
    let offset = i * PARAMS_PER_FILTER;
    FilterParams {
        freq: x[offset],
        q: x[offset + 1],
        gain: x[offset + 2],
    }
}

/// Set filter parameters for the i-th filter
pub fn set_filter_params(x: &mut [f64], i: usize, params: &FilterParams) {
    let offset = i * PARAMS_PER_FILTER;
    x[offset] = params.freq;
    x[offset + 1] = params.q;
    x[offset + 2] = params.gain;
}

/// Box bounds of one filter in parameter space, in `[log10(fc), q, gain]` order
pub fn filter_param_bounds(bounds: &FilterBounds) -> [(f64, f64); PARAMS_PER_FILTER] {
    [
        (bounds.fc.0.log10(), bounds.fc.1.log10()),
        bounds.q,
        bounds.gain,
    ]
}

/// Lower and upper bound vectors for a whole bank
pub fn setup_bounds(bounds: &[FilterBounds]) -> (Vec<f64>, Vec<f64>) {
    let mut lower = Vec::with_capacity(bounds.len() * PARAMS_PER_FILTER);
    let mut upper = Vec::with_capacity(bounds.len() * PARAMS_PER_FILTER);
    for b in bounds {
        for (lo, hi) in filter_param_bounds(b) {
            lower.push(lo);
            upper.push(hi);
        }
    }
    (lower, upper)
}

/// Project `x` onto the box `[lower, upper]` in place
pub fn clamp_to_bounds(x: &mut [f64], lower: &[f64], upper: &[f64]) {
    for ((v, &lo), &hi) in x.iter_mut().zip(lower).zip(upper) {
        *v = v.clamp(lo, hi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::FilterSpec;

    #[test]
    fn get_and_set_params() {
        let mut x = vec![0.0; 6];
        let p = FilterParams::from_hz(1000.0, 1.5, -3.0);
        set_filter_params(&mut x, 1, &p);
        assert_eq!(num_filters(&x), 2);
        let back = get_filter_params(&x, 1);
        assert_eq!(back, p);
        assert!((back.fc() - 1000.0).abs() < 1e-9);
        assert_eq!(get_filter_params(&x, 0).gain, 0.0);
    }

    #[test]
    fn bounds_are_in_log_frequency() {
        let b = FilterSpec::peaking()
            .with_fc(100.0, 10000.0)
            .bounds(0, 48000)
            .unwrap();
        let (lower, upper) = setup_bounds(&[b, b]);
        assert_eq!(lower.len(), 6);
        assert!((lower[0] - 2.0).abs() < 1e-12);
        assert!((upper[0] - 4.0).abs() < 1e-12);
        assert_eq!((lower[2], upper[2]), b.gain);

        let mut x = vec![5.0, 100.0, -50.0, 1.0, 0.0, 0.0];
        clamp_to_bounds(&mut x, &lower, &upper);
        assert_eq!(x[0], 4.0);
        assert_eq!(x[1], b.q.1);
        assert_eq!(x[2], b.gain.0);
        assert_eq!(x[3], 2.0);
        assert_eq!(x[4], b.q.0);
    }
}
