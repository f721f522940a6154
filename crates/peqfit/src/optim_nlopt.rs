//! Bounded local least squares through NLopt
//!
//! Minimizes `Σ r_i(x)²` over a box `lower ≤ x ≤ upper` with BOBYQA, a
//! derivative free local algorithm that never leaves the box.

use crate::param_utils::clamp_to_bounds;
use log::trace;
use ndarray::Array1;
use nlopt::{Algorithm, FailState, Nlopt, Target};
use std::cell::Cell;
use thiserror::Error;

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalConfig {
    /// Maximum number of objective evaluations
    pub maxeval: usize,
    /// Relative tolerance on the cost
    pub ftol_rel: f64,
    /// Relative tolerance on the parameters
    pub xtol_rel: f64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            maxeval: 2000,
            ftol_rel: 1e-10,
            xtol_rel: 1e-8,
        }
    }
}

/// Outcome of a solve
#[derive(Debug, Clone)]
pub struct LocalReport {
    /// Best point found, inside the box
    pub x: Vec<f64>,
    /// Sum of squared residuals at `x`
    pub cost: f64,
    /// NLopt status
    pub status: String,
}

/// Errors of a local solve
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalError {
    /// A parameter or the cost became NaN or infinite.
    ///
    /// `param` is the offending parameter when one is known.
    #[error("non-finite value (parameter {param:?})")]
    NonFinite { param: Option<usize> },

    /// NLopt refused the problem
    #[error("nlopt: {0}")]
    Solver(String),
}

/// Residual function plus the bookkeeping the objective needs
struct SumOfSquares<'a, F> {
    residuals: &'a F,
    evaluations: Cell<usize>,
    non_finite: Cell<bool>,
}

fn sum_of_squares<F>(x: &[f64], _gradient: Option<&mut [f64]>, data: &mut &SumOfSquares<F>) -> f64
where
    F: Fn(&[f64]) -> Array1<f64>,
{
    data.evaluations.set(data.evaluations.get() + 1);
    let cost: f64 = (data.residuals)(x).iter().map(|v| v * v).sum();
    if cost.is_finite() {
        cost
    } else {
        data.non_finite.set(true);
        f64::MAX
    }
}

fn first_non_finite(x: &[f64]) -> Option<usize> {
    x.iter().position(|v| !v.is_finite())
}

fn setup_error(what: &str, state: FailState) -> LocalError {
    LocalError::Solver(format!("{what}: {state:?}"))
}

/// Minimize the sum of squared residuals inside a box.
///
/// `x0` is projected onto the box before the first evaluation. The returned
/// cost is never above the cost at the projected starting point.
///
/// # Errors
///
/// Returns [`LocalError::NonFinite`] when the starting point, the result, or
/// the cost at any evaluated point is not finite, and
/// [`LocalError::Solver`] when NLopt rejects the setup.
pub fn minimize_bounded<F>(
    residuals: F,
    x0: &[f64],
    lower: &[f64],
    upper: &[f64],
    config: &LocalConfig,
) -> Result<LocalReport, LocalError>
where
    F: Fn(&[f64]) -> Array1<f64>,
{
    let mut x = x0.to_vec();
    clamp_to_bounds(&mut x, lower, upper);
    if let Some(param) = first_non_finite(&x) {
        return Err(LocalError::NonFinite { param: Some(param) });
    }

    let data = SumOfSquares {
        residuals: &residuals,
        evaluations: Cell::new(0),
        non_finite: Cell::new(false),
    };
    let mut optimizer = Nlopt::new(
        Algorithm::Bobyqa,
        x.len(),
        sum_of_squares::<F>,
        Target::Minimize,
        &data,
    );
    optimizer
        .set_lower_bounds(lower)
        .map_err(|e| setup_error("lower bounds", e))?;
    optimizer
        .set_upper_bounds(upper)
        .map_err(|e| setup_error("upper bounds", e))?;
    optimizer
        .set_maxeval(u32::try_from(config.maxeval).unwrap_or(u32::MAX))
        .map_err(|e| setup_error("maxeval", e))?;
    optimizer
        .set_ftol_rel(config.ftol_rel)
        .map_err(|e| setup_error("ftol_rel", e))?;
    optimizer
        .set_xtol_rel(config.xtol_rel)
        .map_err(|e| setup_error("xtol_rel", e))?;

    let result = optimizer.optimize(&mut x);
    trace!(
        "bobyqa: {:?} after {} evaluations",
        result,
        data.evaluations.get()
    );

    let (status, cost) = match result {
        Ok((status, cost)) => (format!("{status:?}"), cost),
        // the best point so far is still usable
        Err((FailState::RoundoffLimited, cost)) => ("RoundoffLimited".to_string(), cost),
        Err((state, _)) if !data.non_finite.get() => {
            return Err(LocalError::Solver(format!("{state:?}")));
        }
        Err((_, cost)) => ("Failure".to_string(), cost),
    };

    if let Some(param) = first_non_finite(&x) {
        return Err(LocalError::NonFinite { param: Some(param) });
    }
    if data.non_finite.get() || !cost.is_finite() {
        return Err(LocalError::NonFinite { param: None });
    }

    Ok(LocalReport { x, cost, status })
}
