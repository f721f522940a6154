//! Pregain and residual error scoring

use crate::compensate::ensure_same_grid;
use crate::curve::Curve;
use crate::error::Result;
use crate::loss::rms;
use serde::{Deserialize, Serialize};

/// Default safety margin below full scale in dB
pub const PREAMP_HEADROOM: f64 = 0.2;

/// Scoring settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Extra attenuation on top of the largest boost (dB)
    pub headroom_db: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            headroom_db: PREAMP_HEADROOM,
        }
    }
}

/// Pregain and shape error of an equalized curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Gain to apply before the filters so that they never clip (dB)
    pub pregain: f64,
    /// RMS of `measured + response - target` (dB)
    pub rmse: f64,
}

/// Pregain for a filter response: `-max(max(response), 0) - headroom`.
///
/// A response that only cuts needs no attenuation beyond the headroom.
pub fn pregain(response: &Curve, headroom_db: f64) -> f64 {
    let peak = response.spl.iter().cloned().fold(0.0_f64, f64::max);
    -peak - headroom_db
}

/// Score an equalized curve.
///
/// # Arguments
/// * `measured` - Centered measured curve on the canonical grid
/// * `target` - Target on the canonical grid
/// * `response` - Combined filter response on the canonical grid
/// * `config` - Scoring settings
///
/// # Errors
///
/// Returns `PeqfitError::GridMismatch` when the three curves do not share a grid.
pub fn compute_score(
    measured: &Curve,
    target: &Curve,
    response: &Curve,
    config: &ScoreConfig,
) -> Result<ScoreResult> {
    ensure_same_grid(measured, target)?;
    ensure_same_grid(measured, response)?;

    let corrected = &measured.spl + &response.spl - &target.spl;
    Ok(ScoreResult {
        pregain: pregain(response, config.headroom_db),
        rmse: rms(&corrected),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn curve(spl: ndarray::Array1<f64>) -> Curve {
        Curve::try_new(array![100.0, 1000.0, 10000.0], spl).unwrap()
    }

    #[test]
    fn pregain_covers_largest_boost() {
        let response = curve(array![1.0, 3.5, -2.0]);
        assert!((pregain(&response, 0.2) + 3.7).abs() < 1e-12);
    }

    #[test]
    fn cuts_only_need_headroom() {
        let response = curve(array![-1.0, -3.5, -2.0]);
        assert!((pregain(&response, 0.2) + 0.2).abs() < 1e-12);
        assert!((pregain(&curve(array![0.0, 0.0, 0.0]), 0.5) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn rmse_of_corrected_curve() {
        let measured = curve(array![1.0, 0.0, -1.0]);
        let target = curve(array![0.0, 0.0, 0.0]);
        let response = curve(array![-1.0, 0.0, 1.0]);
        let score = compute_score(&measured, &target, &response, &ScoreConfig::default()).unwrap();
        assert!(score.rmse.abs() < 1e-12);
        assert!((score.pregain + 1.2).abs() < 1e-12);

        let none = curve(array![0.0, 0.0, 0.0]);
        let score = compute_score(&measured, &target, &none, &ScoreConfig::default()).unwrap();
        assert!((score.rmse - (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let a = curve(array![0.0, 0.0, 0.0]);
        let b = Curve::try_new(array![100.0, 1000.0], array![0.0, 0.0]).unwrap();
        assert!(compute_score(&a, &a, &b, &ScoreConfig::default()).is_err());
    }
}
