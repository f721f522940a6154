//! The full pipeline entry point and its output artifact
//!
//! This module chains the stages for one (measured, target, constraint set)
//! triple: resampling, centering, compensation, smoothing, equalization,
//! filter bank optimization and scoring.

use crate::compensate::{compensate, equalize};
use crate::config::PipelineConfig;
use crate::constraints::FilterBank;
use crate::curve::{Curve, FrequencyGrid, FrequencyPoint, curve_from_points};
use crate::error::{PeqfitError, Result};
use crate::optim::{OptimizationResult, optimize_filter_bank};
use crate::iir::preset_code;
use crate::read::{centering_offset, resample, shift, smooth_fractional_octave};
use crate::score::{ScoreResult, compute_score};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Identifiers of one pipeline run, used in error messages and logs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunLabel {
    /// Name of the measured curve
    pub measured: String,
    /// Name of the target curve
    pub target: String,
    /// Name of the constraint set
    pub constraint: String,
}

impl RunLabel {
    /// Build a label from its three names
    pub fn new(
        measured: impl Into<String>,
        target: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self {
            measured: measured.into(),
            target: target.into(),
            constraint: constraint.into(),
        }
    }
}

impl std::fmt::Display for RunLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {} x {}", self.measured, self.target, self.constraint)
    }
}

/// Every intermediate curve of a run plus the fit and its score
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Measured curve resampled and centered
    pub measured: Curve,
    /// Target on the canonical grid, shifted by the measured curve's offset
    pub target: Curve,
    /// `measured - target`
    pub error: Curve,
    /// Smoothed error
    pub error_smoothed: Curve,
    /// Desired correction
    pub desired: Curve,
    /// Fitted filter bank
    pub optimization: OptimizationResult,
    /// Pregain and residual error
    pub score: ScoreResult,
}

/// One filter of an output preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetFilter {
    /// Filter code: `LSQ`, `PK` or `HSQ`
    #[serde(rename = "type")]
    pub kind: String,
    /// Center frequency in Hz, 2 decimals
    pub freq: f64,
    /// Gain in dB, 4 decimals
    pub gain: f64,
    /// Q, 4 decimals
    pub q: f64,
}

/// Output artifact of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqPreset {
    /// Filters in bank order
    pub filters: Vec<PresetFilter>,
    /// Pregain in dB, 4 decimals
    pub pregain: f64,
    /// Residual error in dB, 6 decimals
    pub rmse: f64,
}

/// Round `value` to `decimals` decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

impl PipelineResult {
    /// Build the output preset, rounding values for presentation
    pub fn to_preset(&self) -> EqPreset {
        EqPreset {
            filters: self
                .optimization
                .filters
                .iter()
                .map(|f| PresetFilter {
                    kind: preset_code(f).to_string(),
                    freq: round_to(f.freq, 2),
                    gain: round_to(f.db_gain, 4),
                    q: round_to(f.q, 4),
                })
                .collect(),
            pregain: round_to(self.score.pregain, 4),
            rmse: round_to(self.score.rmse, 6),
        }
    }
}

/// Single run request: `{"fr": [...], "target": [...], "config": {"filters": [...]}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Measured curve points
    pub fr: Vec<FrequencyPoint>,
    /// Target curve points
    pub target: Vec<FrequencyPoint>,
    /// Constraint set to fit
    pub config: FilterBank,
}

impl RunRequest {
    /// Run the pipeline on the request and build the preset.
    ///
    /// # Errors
    ///
    /// Returns `PeqfitError::InvalidCurve` for malformed points and any
    /// error of [`run_pipeline`].
    pub fn run(&self, sample_rate: u32, config: &PipelineConfig) -> Result<EqPreset> {
        let measured = curve_from_points(&self.fr)?;
        let target = curve_from_points(&self.target)?;
        let label = RunLabel::new("fr", "target", "config");
        let result = run_pipeline(&measured, &target, &self.config, sample_rate, config, &label)?;
        Ok(result.to_preset())
    }
}

/// Attach the run label to solver failures.
///
/// Other errors pass through unchanged.
pub fn label_failure(err: PeqfitError, label: &RunLabel) -> PeqfitError {
    match err {
        PeqfitError::NonFiniteParameters { .. } | PeqfitError::Solver { .. } => {
            PeqfitError::OptimizationFailure {
                measured: label.measured.clone(),
                target: label.target.clone(),
                constraint: label.constraint.clone(),
                message: err.to_string(),
            }
        }
        other => other,
    }
}

/// Run every stage for one triple.
///
/// The measured curve is centered on its reference band and the target is
/// shifted by the same offset, so only the shapes are compared.
///
/// # Arguments
/// * `measured_raw` - Measured curve as loaded
/// * `target_raw` - Target curve as loaded
/// * `bank` - Filter slots to fit
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Stage settings
/// * `label` - Names of the triple, for error context
///
/// # Errors
///
/// Returns the error of the first failing stage. Solver failures are
/// reported as `PeqfitError::OptimizationFailure` carrying the label.
pub fn run_pipeline(
    measured_raw: &Curve,
    target_raw: &Curve,
    bank: &FilterBank,
    sample_rate: u32,
    config: &PipelineConfig,
    label: &RunLabel,
) -> Result<PipelineResult> {
    config.validate()?;
    if sample_rate == 0 {
        return Err(PeqfitError::InvalidSampleRate { sample_rate });
    }
    let grid = FrequencyGrid::new(&config.grid)?;

    let resampled = resample(measured_raw, &grid)?;
    let offset = centering_offset(&resampled, &config.normalize);
    let measured = shift(&resampled, offset);
    let compensation = compensate(&measured, &shift(target_raw, offset), &grid)?;
    let error_smoothed = smooth_fractional_octave(&compensation.error, &config.smoothing);
    let desired = equalize(&error_smoothed, &config.equalize);
    debug!("{label}: desired correction ready on {} points", desired.len());

    let optimization = optimize_filter_bank(&desired, bank, sample_rate, &config.optimizer)
        .map_err(|e| label_failure(e, label))?;

    let score = compute_score(
        &measured,
        &compensation.target,
        &optimization.response,
        &config.score,
    )?;
    info!(
        "{label}: {} filters, pregain {:.2} dB, rmse {:.3} dB",
        optimization.filters.len(),
        score.pregain,
        score.rmse
    );

    Ok(PipelineResult {
        measured,
        target: compensation.target,
        error: compensation.error,
        error_smoothed,
        desired,
        optimization,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::FilterSpec;
    use ndarray::array;

    fn flat(level: f64) -> Curve {
        Curve::try_new(array![20.0, 1000.0, 20000.0], array![level, level, level]).unwrap()
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(1234.5678, 2), 1234.57);
        assert_eq!(round_to(-0.123456789, 6), -0.123457);
        assert_eq!(round_to(3.0, 4), 3.0);
    }

    #[test]
    fn label_display() {
        assert_eq!(
            RunLabel::new("hexa", "flat", "standard").to_string(),
            "hexa x flat x standard"
        );
    }

    #[test]
    fn solver_failures_carry_the_label() {
        let label = RunLabel::new("hexa", "flat", "standard");
        let err = label_failure(PeqfitError::NonFiniteParameters { filter_index: 2 }, &label);
        match err {
            PeqfitError::OptimizationFailure {
                measured,
                target,
                constraint,
                message,
            } => {
                assert_eq!((measured.as_str(), target.as_str()), ("hexa", "flat"));
                assert_eq!(constraint, "standard");
                assert!(message.contains("filter #2"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = label_failure(
            PeqfitError::Solver {
                message: "InvalidArgs".to_string(),
            },
            &label,
        );
        assert!(err.to_string().contains("hexa x flat x standard"));

        let passthrough = label_failure(PeqfitError::InvalidSampleRate { sample_rate: 0 }, &label);
        assert!(matches!(passthrough, PeqfitError::InvalidSampleRate { sample_rate: 0 }));
    }

    #[test]
    fn target_is_leveled_with_the_measured_offset() {
        let result = run_pipeline(
            &flat(80.0),
            &flat(80.0),
            &FilterBank::default(),
            44100,
            &PipelineConfig::default(),
            &RunLabel::default(),
        )
        .unwrap();
        assert!(result.measured.spl.iter().all(|v| v.abs() < 1e-9));
        assert!(result.target.spl.iter().all(|v| v.abs() < 1e-9));
        assert!(result.score.rmse < 1e-9);

        // the level difference between the curves survives
        let result = run_pipeline(
            &flat(80.0),
            &flat(83.0),
            &FilterBank::default(),
            44100,
            &PipelineConfig::default(),
            &RunLabel::default(),
        )
        .unwrap();
        assert!(result.target.spl.iter().all(|v| (v - 3.0).abs() < 1e-9));
        assert!((result.score.rmse - 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let err = run_pipeline(
            &flat(0.0),
            &flat(0.0),
            &FilterBank::default(),
            0,
            &PipelineConfig::default(),
            &RunLabel::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PeqfitError::InvalidSampleRate { sample_rate: 0 }));
    }

    #[test]
    fn preset_uses_short_codes_and_rounding() {
        let bank = FilterBank::new(vec![FilterSpec::low_shelf(), FilterSpec::peaking()]);
        let result = run_pipeline(
            &flat(0.0),
            &flat(0.0),
            &bank,
            44100,
            &PipelineConfig::default(),
            &RunLabel::new("m", "t", "c"),
        )
        .unwrap();
        let preset = result.to_preset();
        assert_eq!(preset.filters.len(), 2);
        assert_eq!(preset.filters[0].kind, "LSQ");
        assert_eq!(preset.filters[1].kind, "PK");
        let json = serde_json::to_value(&preset).unwrap();
        assert_eq!(json["filters"][1]["type"], "PK");
        assert_eq!(preset.rmse, 0.0);
        assert!((preset.pregain + 0.2).abs() < 1e-12);
    }

    #[test]
    fn run_request_from_json() {
        let json = r#"{
            "fr": [{"freq": 20, "db": 0}, {"freq": 20000, "db": 0}],
            "target": [{"freq": 20, "db": 0}, {"freq": 20000, "db": 0}],
            "config": {"filters": [{"type": "PEAKING", "min_gain": -6, "max_gain": 6}]}
        }"#;
        let request: RunRequest = serde_json::from_str(json).unwrap();
        let preset = request.run(44100, &PipelineConfig::default()).unwrap();
        assert_eq!(preset.filters.len(), 1);
        assert_eq!(preset.filters[0].gain, 0.0);

        let bad: RunRequest = serde_json::from_str(
            r#"{"fr": [], "target": [{"freq": 20, "db": 0}], "config": {"filters": []}}"#,
        )
        .unwrap();
        assert!(bad.run(44100, &PipelineConfig::default()).unwrap_err().is_curve_error());
    }
}
