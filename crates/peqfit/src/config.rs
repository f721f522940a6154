//! Pipeline configuration
//!
//! Every section is optional in JSON; missing fields take their defaults.

use crate::compensate::EqualizeConfig;
use crate::curve::GridConfig;
use crate::error::{PeqfitError, Result};
use crate::optim::OptimizerConfig;
use crate::read::{NormalizeConfig, SmoothingConfig};
use crate::score::ScoreConfig;
use serde::{Deserialize, Serialize};

/// Settings of every pipeline stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Canonical grid
    pub grid: GridConfig,
    /// Reference band used for centering
    pub normalize: NormalizeConfig,
    /// Error smoothing
    pub smoothing: SmoothingConfig,
    /// Limits on the desired correction
    pub equalize: EqualizeConfig,
    /// Filter bank optimizer
    pub optimizer: OptimizerConfig,
    /// Scoring
    pub score: ScoreConfig,
}

fn invalid(reason: String) -> PeqfitError {
    PeqfitError::InvalidConfig { reason }
}

impl PipelineConfig {
    /// Check that values are consistent.
    ///
    /// # Errors
    ///
    /// Returns `PeqfitError::InvalidConfig` naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        let g = &self.grid;
        if g.n_points < 2 {
            return Err(invalid(format!("grid.n_points must be >= 2, got {}", g.n_points)));
        }
        if !(g.f_min > 0.0 && g.f_min < g.f_max && g.f_max.is_finite()) {
            return Err(invalid(format!(
                "grid range must satisfy 0 < f_min < f_max, got [{}, {}]",
                g.f_min, g.f_max
            )));
        }

        let n = &self.normalize;
        if !(n.f_low.is_finite() && n.f_high.is_finite() && n.f_low <= n.f_high) {
            return Err(invalid(format!(
                "normalize band [{}, {}] is inverted or not finite",
                n.f_low, n.f_high
            )));
        }

        let s = &self.smoothing;
        if !(s.window_octaves >= 0.0 && s.treble_window_octaves >= 0.0) {
            return Err(invalid(format!(
                "smoothing windows must be >= 0, got {} and {}",
                s.window_octaves, s.treble_window_octaves
            )));
        }
        if !(s.treble_f_lower > 0.0 && s.treble_f_lower <= s.treble_f_upper) {
            return Err(invalid(format!(
                "treble band [{}, {}] is inverted or not positive",
                s.treble_f_lower, s.treble_f_upper
            )));
        }

        for (name, limit) in [
            ("max_boost", self.equalize.max_boost),
            ("max_cut", self.equalize.max_cut),
        ] {
            match limit {
                Some(v) if !(v >= 0.0 && v.is_finite()) => {
                    return Err(invalid(format!("equalize.{name} must be >= 0, got {v}")));
                }
                _ => {}
            }
        }

        let o = &self.optimizer;
        if o.max_evaluations == 0 {
            return Err(invalid("optimizer.max_evaluations must be > 0".to_string()));
        }
        if !(o.ftol_rel > 0.0 && o.ftol_rel.is_finite()) {
            return Err(invalid(format!("optimizer.ftol_rel must be > 0, got {}", o.ftol_rel)));
        }
        if o.num_starts == 0 {
            return Err(invalid("optimizer.num_starts must be > 0".to_string()));
        }
        if !(o.epsilon >= 0.0 && o.epsilon.is_finite()) {
            return Err(invalid(format!("optimizer.epsilon must be >= 0, got {}", o.epsilon)));
        }

        if !(self.score.headroom_db >= 0.0 && self.score.headroom_db.is_finite()) {
            return Err(invalid(format!(
                "score.headroom_db must be >= 0, got {}",
                self.score.headroom_db
            )));
        }
        Ok(())
    }
}
