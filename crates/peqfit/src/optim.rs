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

use crate::constraints::{FilterBank, FilterBounds};
use crate::curve::Curve;
use crate::error::{PeqfitError, Result};
use crate::iir::{Biquad, FilterType, compute_peq_response, to_peq};
use crate::initial_guess::create_initial_guesses;
use crate::loss::flat_loss;
use crate::optim_nlopt::{LocalConfig, LocalError, minimize_bounded};
use crate::param_utils::{self, FilterParams, PARAMS_PER_FILTER};
use crate::x2peq::{x2biquad, x2spl};
use log::{debug, info, warn};
use ndarray::Array1;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Optimizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Evaluation budget of each bounded least squares solve
    pub max_evaluations: usize,
    /// Relative cost tolerance of each solve
    pub ftol_rel: f64,
    /// Maximum number of joint refinement passes
    pub refinement_passes: usize,
    /// Stop refining when a pass improves the RMSE by less than this (dB)
    pub epsilon: f64,
    /// Starting points per filter in the sequential phase
    pub num_starts: usize,
    /// Seed of the restart generator
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 2000,
            ftol_rel: 1e-10,
            refinement_passes: 4,
            epsilon: 1e-4,
            num_starts: 4,
            seed: 0x5eed,
        }
    }
}

impl OptimizerConfig {
    fn local_config(&self) -> LocalConfig {
        LocalConfig {
            maxeval: self.max_evaluations,
            ftol_rel: self.ftol_rel,
            ..LocalConfig::default()
        }
    }
}

/// Result of fitting a filter bank
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Fitted filters, same length and order as the bank
    pub filters: Vec<Biquad>,
    /// Combined response of the filters on the canonical grid
    pub response: Curve,
    /// RMSE between the response and the desired correction (dB)
    pub loss: f64,
    /// Joint refinement passes performed
    pub refinement_passes: usize,
}

/// Shared data of one optimization run
struct ObjectiveData<'a> {
    freqs: &'a Array1<f64>,
    desired: &'a Array1<f64>,
    bounds: Vec<FilterBounds>,
    types: Vec<FilterType>,
    srate: f64,
    local: LocalConfig,
}

/// Crate error for a failed solve on slot `filter_index`
fn slot_error(err: LocalError, filter_index: usize) -> PeqfitError {
    match err {
        LocalError::NonFinite { .. } => PeqfitError::NonFiniteParameters { filter_index },
        LocalError::Solver(message) => PeqfitError::Solver { message },
    }
}

impl<'a> ObjectiveData<'a> {
    fn new(desired: &'a Curve, bounds: Vec<FilterBounds>, srate: f64, local: LocalConfig) -> Self {
        Self {
            freqs: &desired.freq,
            desired: &desired.spl,
            types: bounds.iter().map(|b| b.filter_type).collect(),
            bounds,
            srate,
            local,
        }
    }

    fn response_of(&self, i: usize, params: &FilterParams) -> Array1<f64> {
        x2biquad(params, self.types[i], self.srate).np_log_result(self.freqs)
    }

    /// Best fit of slot `i` against `target`, over every starting point.
    fn fit_slot(
        &self,
        i: usize,
        target: &Array1<f64>,
        starts: &[FilterParams],
    ) -> Result<(FilterParams, f64)> {
        let [fb, qb, gb] = param_utils::filter_param_bounds(&self.bounds[i]);
        let lower = [fb.0, qb.0, gb.0];
        let upper = [fb.1, qb.1, gb.1];
        let ftype = self.types[i];

        let mut best: Option<(FilterParams, f64)> = None;
        for start in starts {
            let report = minimize_bounded(
                |p: &[f64]| {
                    let params = param_utils::get_filter_params(p, 0);
                    x2biquad(&params, ftype, self.srate).np_log_result(self.freqs) - target
                },
                &[start.freq, start.q, start.gain],
                &lower,
                &upper,
                &self.local,
            )
            .map_err(|e| slot_error(e, i))?;

            let params = param_utils::get_filter_params(&report.x, 0);
            if best.as_ref().is_none_or(|(_, cost)| report.cost < *cost) {
                best = Some((params, report.cost));
            }
        }
        best.ok_or(PeqfitError::NonFiniteParameters { filter_index: i })
    }

    /// Polish every parameter at once, starting from `x`.
    fn fit_joint(&self, x: &[f64]) -> Result<(Vec<f64>, f64)> {
        let (lower, upper) = param_utils::setup_bounds(&self.bounds);
        let report = minimize_bounded(
            |p: &[f64]| x2spl(self.freqs, p, &self.types, self.srate) - self.desired,
            x,
            &lower,
            &upper,
            &self.local,
        )
        .map_err(|e| self.joint_error(e, x))?;
        debug!("joint polish: {} (sse {:.4e})", report.status, report.cost);
        Ok((report.x, report.cost))
    }

    /// Slot blamed for a failed joint solve started at `x`.
    ///
    /// A known parameter names its slot; otherwise the first slot whose
    /// response at `x` is not finite, or the first slot.
    fn joint_error(&self, err: LocalError, x: &[f64]) -> PeqfitError {
        let filter_index = match err {
            LocalError::NonFinite { param: Some(p) } => p / PARAMS_PER_FILTER,
            LocalError::NonFinite { param: None } => (0..self.types.len())
                .find(|&i| {
                    let params = param_utils::get_filter_params(x, i);
                    !params.is_finite() || self.response_of(i, &params).iter().any(|v| !v.is_finite())
                })
                .unwrap_or(0),
            LocalError::Solver(message) => return PeqfitError::Solver { message },
        };
        PeqfitError::NonFiniteParameters { filter_index }
    }
}

fn check_finite(x: &[f64]) -> Result<()> {
    for i in 0..param_utils::num_filters(x) {
        if !param_utils::get_filter_params(x, i).is_finite() {
            return Err(PeqfitError::NonFiniteParameters { filter_index: i });
        }
    }
    Ok(())
}

fn total_response(responses: &[Array1<f64>], n: usize) -> Array1<f64> {
    responses
        .iter()
        .fold(Array1::zeros(n), |acc, r| acc + r)
}

/// Fit a bounded filter bank to a desired correction curve.
///
/// Runs a sequential per-filter fit in bank order, then joint refinement
/// passes until the RMSE stops improving by more than `epsilon` or the pass
/// budget is spent. Same inputs and seed give the same filters.
///
/// # Arguments
/// * `desired` - Desired correction on the canonical grid (dB)
/// * `bank` - Ordered filter slots
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Optimizer settings
///
/// # Errors
///
/// Returns `PeqfitError::InvalidSampleRate` or `PeqfitError::InvalidFilterSpec`
/// for bad inputs and `PeqfitError::NonFiniteParameters` when the solver
/// produces NaN or infinite values.
pub fn optimize_filter_bank(
    desired: &Curve,
    bank: &FilterBank,
    sample_rate: u32,
    config: &OptimizerConfig,
) -> Result<OptimizationResult> {
    let bounds = bank.bounds(sample_rate)?;
    let n = desired.len();

    if bank.is_empty() {
        return Ok(OptimizationResult {
            filters: Vec::new(),
            response: Curve::constant(&desired.freq, 0.0),
            loss: flat_loss(&desired.spl, &Array1::zeros(n)),
            refinement_passes: 0,
        });
    }

    let data = ObjectiveData::new(desired, bounds, sample_rate as f64, config.local_config());
    let num_filters = bank.len();
    let mut rng = StdRng::seed_from_u64(config.seed);

    // Phase 1: sequential fit
    let mut x = vec![0.0; num_filters * PARAMS_PER_FILTER];
    let mut responses: Vec<Array1<f64>> = Vec::with_capacity(num_filters);
    let mut total = Array1::zeros(n);
    for i in 0..num_filters {
        let residual = data.desired - &total;
        let starts = create_initial_guesses(
            data.freqs,
            &residual,
            &data.bounds[i],
            config.num_starts.max(1),
            &mut rng,
        );
        let (params, cost) = data.fit_slot(i, &residual, &starts)?;
        debug!(
            "filter #{i} {}: fc={:.1} Hz q={:.3} gain={:.2} dB (sse {:.4})",
            data.types[i],
            params.fc(),
            params.q,
            params.gain,
            cost
        );
        param_utils::set_filter_params(&mut x, i, &params);
        let response = data.response_of(i, &params);
        total += &response;
        responses.push(response);
    }
    check_finite(&x)?;
    let mut loss = flat_loss(data.desired, &total);

    // Phase 2: joint refinement
    let mut passes = 0;
    let mut improving = true;
    while passes < config.refinement_passes && improving {
        let previous = loss;

        for i in 0..num_filters {
            let target = data.desired - &(&total - &responses[i]);
            let current = param_utils::get_filter_params(&x, i);
            let (params, _) = data.fit_slot(i, &target, &[current])?;
            param_utils::set_filter_params(&mut x, i, &params);
            let response = data.response_of(i, &params);
            total = &total - &responses[i] + &response;
            responses[i] = response;
        }

        let (x_joint, _) = data.fit_joint(&x)?;
        x = x_joint;
        check_finite(&x)?;
        for (i, response) in responses.iter_mut().enumerate() {
            *response = data.response_of(i, &param_utils::get_filter_params(&x, i));
        }
        total = total_response(&responses, n);

        let new_loss = flat_loss(data.desired, &total);
        if !new_loss.is_finite() {
            return Err(PeqfitError::NonFiniteParameters { filter_index: 0 });
        }
        passes += 1;
        improving = previous - new_loss >= config.epsilon;
        loss = new_loss;
        debug!("refinement pass {passes}: rmse {new_loss:.6} dB");
    }
    if improving && config.refinement_passes > 0 {
        warn!(
            "refinement budget of {} passes exhausted while still improving",
            config.refinement_passes
        );
    }

    let filters: Vec<Biquad> = (0..num_filters)
        .map(|i| {
            let params = param_utils::get_filter_params(&x, i);
            let b = &data.bounds[i];
            data.types[i].biquad(
                params.fc().clamp(b.fc.0, b.fc.1),
                data.srate,
                params.q,
                params.gain,
            )
        })
        .collect();
    let response = compute_peq_response(data.freqs, &to_peq(&filters), data.srate);
    let loss = flat_loss(data.desired, &response);
    info!(
        "fitted {} filters, rmse {:.4} dB after {} refinement passes",
        filters.len(),
        loss,
        passes
    );

    Ok(OptimizationResult {
        filters,
        response: Curve {
            freq: desired.freq.clone(),
            spl: response,
        },
        loss,
        refinement_passes: passes,
    })
}
