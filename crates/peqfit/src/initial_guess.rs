//! Smart initial guess generation for filter optimization
//!
//! Each slot of the bank is seeded from the residual it has to explain: a
//! peaking filter goes where the residual deviates most, with a Q matching
//! the width of that deviation; shelves sit at fixed corners with the mean
//! residual beyond the corner as gain.

use crate::constraints::FilterBounds;
use crate::iir::FilterType;
use crate::param_utils::FilterParams;
use ndarray::Array1;
use rand::Rng;
use rand::rngs::StdRng;

/// Initial corner frequency of a low shelf in Hz
pub const LOW_SHELF_FC: f64 = 105.0;
/// Initial corner frequency of a high shelf in Hz
pub const HIGH_SHELF_FC: f64 = 10000.0;
/// Initial Q of a shelf
pub const SHELF_Q: f64 = 0.7;

/// Random variation applied to restarts
#[derive(Debug, Clone, Copy)]
pub struct JitterConfig {
    /// Center frequency moves by up to this many octaves
    pub octaves: f64,
    /// Relative variation of Q
    pub q_factor: f64,
    /// Relative variation of gain
    pub gain_factor: f64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            octaves: 1.0,
            q_factor: 0.3,
            gain_factor: 0.2,
        }
    }
}

/// Convert a bandwidth in octaves to Q
pub fn bw_to_q(bw_octaves: f64) -> f64 {
    let two_bw = 2f64.powf(bw_octaves);
    two_bw.sqrt() / (two_bw - 1.0)
}

fn clamp_params(fc: f64, q: f64, gain: f64, bounds: &FilterBounds) -> FilterParams {
    FilterParams::from_hz(
        fc.clamp(bounds.fc.0, bounds.fc.1),
        q.clamp(bounds.q.0, bounds.q.1),
        gain.clamp(bounds.gain.0, bounds.gain.1),
    )
}

/// Width in octaves of the lobe around `peak` where the residual keeps the
/// sign of the peak and at least half of its height.
fn half_height_bandwidth(freqs: &Array1<f64>, residual: &Array1<f64>, peak: usize) -> f64 {
    let half = residual[peak] / 2.0;
    let inside = |j: usize| residual[j] * half > 0.0 && residual[j].abs() >= half.abs();

    let mut left = peak;
    while left > 0 && inside(left - 1) {
        left -= 1;
    }
    let mut right = peak;
    while right + 1 < residual.len() && inside(right + 1) {
        right += 1;
    }

    if right > left {
        (freqs[right] / freqs[left]).log2()
    } else {
        // single sample lobe: one grid step
        let n = freqs.len();
        (freqs[n - 1] / freqs[0]).log2() / (n.max(2) - 1) as f64
    }
}

/// Guess for a peaking filter
pub fn peaking_guess(freqs: &Array1<f64>, residual: &Array1<f64>, bounds: &FilterBounds) -> FilterParams {
    let center = (bounds.fc.0 * bounds.fc.1).sqrt();
    let mut peak: Option<usize> = None;
    for (i, &f) in freqs.iter().enumerate() {
        if f < bounds.fc.0 || f > bounds.fc.1 {
            continue;
        }
        match peak {
            Some(p) if residual[i].abs() <= residual[p].abs() => {}
            _ => peak = Some(i),
        }
    }

    match peak {
        Some(p) if residual[p] != 0.0 => {
            let bw = half_height_bandwidth(freqs, residual, p);
            clamp_params(freqs[p], bw_to_q(bw), residual[p], bounds)
        }
        // nothing to correct in the allowed range
        _ => clamp_params(center, 1.0, 0.0, bounds),
    }
}

/// Guess for a low or high shelf
pub fn shelf_guess(
    freqs: &Array1<f64>,
    residual: &Array1<f64>,
    filter_type: FilterType,
    bounds: &FilterBounds,
) -> FilterParams {
    let low = filter_type == FilterType::LowShelf;
    let fc = (if low { LOW_SHELF_FC } else { HIGH_SHELF_FC }).clamp(bounds.fc.0, bounds.fc.1);

    let mut sum = 0.0;
    let mut count = 0usize;
    for (&f, &r) in freqs.iter().zip(residual.iter()) {
        if (low && f <= fc) || (!low && f >= fc) {
            sum += r;
            count += 1;
        }
    }
    let gain = if count > 0 { sum / count as f64 } else { 0.0 };
    clamp_params(fc, SHELF_Q, gain, bounds)
}

/// Heuristic starting point for one slot
pub fn initial_guess(freqs: &Array1<f64>, residual: &Array1<f64>, bounds: &FilterBounds) -> FilterParams {
    match bounds.filter_type {
        FilterType::Peaking => peaking_guess(freqs, residual, bounds),
        ft => shelf_guess(freqs, residual, ft, bounds),
    }
}

/// Random variation of `base`, kept inside the bounds
pub fn jitter(
    base: &FilterParams,
    bounds: &FilterBounds,
    config: &JitterConfig,
    rng: &mut StdRng,
) -> FilterParams {
    let octaves = rng.random_range(-config.octaves..=config.octaves);
    let q_var = 1.0 + rng.random_range(-config.q_factor..=config.q_factor);
    let gain_var = 1.0 + rng.random_range(-config.gain_factor..=config.gain_factor);
    clamp_params(
        base.fc() * 2f64.powf(octaves),
        base.q * q_var,
        base.gain * gain_var,
        bounds,
    )
}

/// Create the starting points of one slot
///
/// The first entry is the heuristic guess; the `num_guesses - 1` others are
/// random variations of it drawn from `rng`.
pub fn create_initial_guesses(
    freqs: &Array1<f64>,
    residual: &Array1<f64>,
    bounds: &FilterBounds,
    num_guesses: usize,
    rng: &mut StdRng,
) -> Vec<FilterParams> {
    let base = initial_guess(freqs, residual, bounds);
    let config = JitterConfig::default();
    let mut guesses = Vec::with_capacity(num_guesses.max(1));
    guesses.push(base);
    for _ in 1..num_guesses {
        guesses.push(jitter(&base, bounds, &config, rng));
    }
    guesses
}
