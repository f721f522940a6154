//! Compensation against a target and synthesis of the desired correction

use crate::curve::{Curve, FrequencyGrid};
use crate::error::{PeqfitError, Result};
use crate::read::{limit_correction, resample};
use log::debug;
use serde::{Deserialize, Serialize};

/// Target and error curves on the canonical grid
#[derive(Debug, Clone, PartialEq)]
pub struct Compensation {
    /// Target resampled onto the grid
    pub target: Curve,
    /// `measured - target`, pointwise
    pub error: Curve,
}

/// Check that two curves share the exact same frequency array.
///
/// # Errors
///
/// Returns `PeqfitError::GridMismatch` when lengths or any frequency differ.
pub fn ensure_same_grid(a: &Curve, b: &Curve) -> Result<()> {
    if a.freq != b.freq {
        return Err(PeqfitError::GridMismatch {
            left_len: a.len(),
            right_len: b.len(),
        });
    }
    Ok(())
}

/// Resample `target_raw` onto `grid` and subtract it from `measured`.
///
/// # Errors
///
/// Returns `PeqfitError::GridMismatch` if `measured` is not on `grid` and
/// `PeqfitError::InvalidCurve` if the target is malformed.
pub fn compensate(measured: &Curve, target_raw: &Curve, grid: &FrequencyGrid) -> Result<Compensation> {
    if !grid.contains_curve(measured) {
        return Err(PeqfitError::GridMismatch {
            left_len: measured.len(),
            right_len: grid.len(),
        });
    }
    let target = resample(target_raw, grid)?;
    ensure_same_grid(measured, &target)?;

    let error = Curve {
        freq: measured.freq.clone(),
        spl: &measured.spl - &target.spl,
    };
    debug!(
        "compensation: error spans [{:.2}, {:.2}] dB",
        error.spl.iter().cloned().fold(f64::INFINITY, f64::min),
        error.spl.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    );
    Ok(Compensation { target, error })
}

/// Optional limits on the desired correction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizeConfig {
    /// Largest boost allowed in dB
    pub max_boost: Option<f64>,
    /// Largest cut allowed in dB (positive number)
    pub max_cut: Option<f64>,
}

/// Desired correction: the negated smoothed error, optionally clipped.
pub fn equalize(smoothed_error: &Curve, config: &EqualizeConfig) -> Curve {
    Curve {
        freq: smoothed_error.freq.clone(),
        spl: limit_correction(&-&smoothed_error.spl, config.max_boost, config.max_cut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::GridConfig;
    use ndarray::array;

    fn grid() -> FrequencyGrid {
        FrequencyGrid::new(&GridConfig::default()).unwrap()
    }

    #[test]
    fn error_is_measured_minus_target() {
        let grid = grid();
        let measured = Curve::constant(grid.freqs(), 2.0);
        let target = Curve::try_new(array![10.0, 30000.0], array![-1.0, -1.0]).unwrap();
        let comp = compensate(&measured, &target, &grid).unwrap();
        assert!(comp.error.spl.iter().all(|v| (v - 3.0).abs() < 1e-12));
        assert_eq!(comp.target.freq, *grid.freqs());
    }

    #[test]
    fn off_grid_measured_is_a_mismatch() {
        let grid = grid();
        let measured = Curve::try_new(array![100.0, 1000.0], array![0.0, 0.0]).unwrap();
        let target = measured.clone();
        let err = compensate(&measured, &target, &grid).unwrap_err();
        assert!(err.is_internal_error());
    }

    #[test]
    fn malformed_target_is_invalid_curve() {
        let grid = grid();
        let measured = Curve::constant(grid.freqs(), 0.0);
        let target = Curve {
            freq: array![100.0, 100.0],
            spl: array![0.0, 1.0],
        };
        assert!(compensate(&measured, &target, &grid).unwrap_err().is_curve_error());
    }

    #[test]
    fn grids_must_match_exactly() {
        let a = Curve::try_new(array![1.0, 2.0], array![0.0, 0.0]).unwrap();
        let b = Curve::try_new(array![1.0, 2.000001], array![0.0, 0.0]).unwrap();
        assert!(ensure_same_grid(&a, &a).is_ok());
        assert!(matches!(
            ensure_same_grid(&a, &b),
            Err(PeqfitError::GridMismatch { left_len: 2, right_len: 2 })
        ));
    }

    #[test]
    fn equalize_negates_and_clips() {
        let error = Curve::try_new(array![100.0, 200.0, 300.0], array![-8.0, 1.0, 9.0]).unwrap();
        let eq = equalize(&error, &EqualizeConfig::default());
        assert_eq!(eq.spl, array![8.0, -1.0, -9.0]);

        let clipped = equalize(
            &error,
            &EqualizeConfig {
                max_boost: Some(6.0),
                max_cut: Some(4.0),
            },
        );
        assert_eq!(clipped.spl, array![6.0, -1.0, -4.0]);
    }
}
