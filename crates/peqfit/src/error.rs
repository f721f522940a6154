//! Error types for the peqfit crate.
//!
//! This module provides a unified error type for all pipeline stages,
//! the loaders and the batch driver.

use thiserror::Error;

/// Error type for peqfit operations.
///
/// Stage errors (`InvalidCurve`, `GridMismatch`, ...) halt the pipeline of the
/// current (measured, target, constraint set) triple only.
#[derive(Debug, Error)]
pub enum PeqfitError {
    /// An input curve is empty, unsorted or otherwise malformed.
    #[error("invalid curve: {reason}")]
    InvalidCurve {
        /// Description of what is wrong with the curve.
        reason: String,
    },

    /// Two canonical curves expected to share a grid do not.
    #[error("frequency grid mismatch: left has {left_len} points, right has {right_len} points")]
    GridMismatch {
        /// Number of points of the left hand grid.
        left_len: usize,
        /// Number of points of the right hand grid.
        right_len: usize,
    },

    /// A filter specification has inconsistent bounds.
    #[error("invalid filter spec #{index}: {reason}")]
    InvalidFilterSpec {
        /// Position of the filter in its bank.
        index: usize,
        /// Description of the problem.
        reason: String,
    },

    /// Sample rate is zero.
    #[error("invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate {
        /// The rejected sample rate.
        sample_rate: u32,
    },

    /// Pipeline configuration is inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// The solver produced non-finite filter parameters.
    #[error("non-finite parameters for filter #{filter_index}")]
    NonFiniteParameters {
        /// Position of the offending filter in its bank.
        filter_index: usize,
    },

    /// The local solver rejected a problem or stopped without a result.
    #[error("local solver failed: {message}")]
    Solver {
        /// Solver status or setup failure.
        message: String,
    },

    /// The bounded fit failed for a given triple.
    #[error("optimization failed for {measured} x {target} x {constraint}: {message}")]
    OptimizationFailure {
        /// Identifier of the measured curve.
        measured: String,
        /// Identifier of the target curve.
        target: String,
        /// Identifier of the constraint set.
        constraint: String,
        /// Underlying failure.
        message: String,
    },

    /// A constraint set name is not known.
    #[error("unknown constraint set: '{name}'")]
    UnknownConstraintSet {
        /// The requested name.
        name: String,
    },

    /// A file operation failed (create, write, read).
    #[error("file operation failed for '{path}': {message}")]
    FileOperation {
        /// Path to the file.
        path: String,
        /// Error message describing the failure.
        message: String,
    },

    /// I/O error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for peqfit operations.
pub type Result<T> = std::result::Result<T, PeqfitError>;

impl PeqfitError {
    /// Returns true if the error comes from malformed input curve data.
    pub fn is_curve_error(&self) -> bool {
        matches!(self, PeqfitError::InvalidCurve { .. })
    }

    /// Returns true if this is an internal invariant violation.
    pub fn is_internal_error(&self) -> bool {
        matches!(self, PeqfitError::GridMismatch { .. })
    }

    /// Returns true if this is an optimization error.
    pub fn is_optimization_error(&self) -> bool {
        matches!(
            self,
            PeqfitError::NonFiniteParameters { .. }
                | PeqfitError::Solver { .. }
                | PeqfitError::OptimizationFailure { .. }
        )
    }

    /// Returns true if this is a file/IO error.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            PeqfitError::FileOperation { .. } | PeqfitError::Io(_) | PeqfitError::Json(_)
        )
    }

    pub(crate) fn invalid_curve(reason: impl Into<String>) -> Self {
        PeqfitError::InvalidCurve {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        assert!(PeqfitError::invalid_curve("empty").is_curve_error());
        assert!(
            PeqfitError::GridMismatch {
                left_len: 3,
                right_len: 4
            }
            .is_internal_error()
        );
        assert!(PeqfitError::NonFiniteParameters { filter_index: 0 }.is_optimization_error());
        assert!(
            PeqfitError::Solver {
                message: "InvalidArgs".to_string()
            }
            .is_optimization_error()
        );
        let io = PeqfitError::from(std::io::Error::other("boom"));
        assert!(io.is_io_error());
        assert!(!io.is_curve_error());
    }

    #[test]
    fn optimization_failure_names_the_triple() {
        let err = PeqfitError::OptimizationFailure {
            measured: "hexa".to_string(),
            target: "flat".to_string(),
            constraint: "standard".to_string(),
            message: "non-finite parameters for filter #2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("hexa x flat x standard"));
        assert!(msg.contains("filter #2"));
    }
}
