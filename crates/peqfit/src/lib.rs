#![doc = include_str!("../README.md")]

//! peqfit - A library for fitting parametric equalizers to frequency responses
//!
//! Copyright (C) 2025 Pierre Aubert pierre(at)spinorama(dot)org
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

/// Error types for peqfit operations.
pub mod error;
pub use error::{PeqfitError, Result};

/// Batch driver over catalogs of curves, targets and constraint sets
pub mod batch;
/// Command-line argument definitions shared with the binary
pub mod cli;
/// Compensation against a target and synthesis of the desired correction
pub mod compensate;
/// Pipeline configuration
pub mod config;
/// Filter specifications and filter banks
pub mod constraints;
/// Frequency response curves and the canonical grid
pub mod curve;
/// Filter types and their biquad designs
pub mod iir;
/// Smart initial guess generation
pub mod initial_guess;
/// Loss functions used by the optimizer and the scorer
pub mod loss;
/// Two phase parametric EQ optimizer
pub mod optim;
/// Bounded local least squares solver (NLopt BOBYQA)
pub mod optim_nlopt;
/// Parameter vector utilities
pub mod param_utils;
/// Curve loading, resampling, centering and smoothing
pub mod read;
/// Pregain and residual error scoring
pub mod score;
/// The full pipeline entry point and its output artifact
pub mod workflow;
/// Mapping between parameter vectors and filters
pub mod x2peq;

// Re-export commonly used items
pub use config::PipelineConfig;
pub use constraints::{FilterBank, FilterSpec};
pub use curve::{Curve, FrequencyGrid, FrequencyPoint};
pub use iir::{Biquad, FilterType};
pub use optim::{OptimizationResult, optimize_filter_bank};
pub use score::{ScoreResult, compute_score};
pub use workflow::{EqPreset, PipelineResult, RunLabel, run_pipeline};
