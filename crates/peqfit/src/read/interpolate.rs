use crate::curve::{Curve, FrequencyGrid};
use crate::error::Result;
use ndarray::Array1;

/// Helper to interpolate a single value array in log frequency space.
///
/// Values outside the input range are clamped to the first/last input value.
fn interpolate_log_space_vals(
    log_freq_out: &[f64],
    log_freq_in: &[f64],
    vals_in: &Array1<f64>,
) -> Array1<f64> {
    let n_in = log_freq_in.len();
    let mut vals_out = Array1::zeros(log_freq_out.len());

    for (i, &target_log_freq) in log_freq_out.iter().enumerate() {
        if target_log_freq <= log_freq_in[0] {
            vals_out[i] = vals_in[0];
        } else if target_log_freq >= log_freq_in[n_in - 1] {
            vals_out[i] = vals_in[n_in - 1];
        } else {
            // first index whose log frequency is strictly above the target
            let hi = log_freq_in.partition_point(|&lf| lf <= target_log_freq);
            let lo = hi - 1;
            if log_freq_in[lo] == target_log_freq {
                vals_out[i] = vals_in[lo];
                continue;
            }
            let t = (target_log_freq - log_freq_in[lo]) / (log_freq_in[hi] - log_freq_in[lo]);
            vals_out[i] = vals_in[lo] * (1.0 - t) + vals_in[hi] * t;
        }
    }
    vals_out
}

/// Interpolate frequency response to a standard grid using linear interpolation in log space
///
/// Levels outside the measured range are held at the nearest edge value.
///
/// # Arguments
/// * `freq_out` - Target frequency grid for interpolation
/// * `curve` - Input curve (frequencies strictly increasing)
///
/// # Returns
/// * Interpolated curve on the target grid
pub fn interpolate_log_space(freq_out: &Array1<f64>, curve: &Curve) -> Curve {
    let log_freq_in: Vec<f64> = curve.freq.iter().map(|f| f.ln()).collect();
    let log_freq_out: Vec<f64> = freq_out.iter().map(|f| f.ln()).collect();

    let spl_out = interpolate_log_space_vals(&log_freq_out, &log_freq_in, &curve.spl);

    Curve {
        freq: freq_out.clone(),
        spl: spl_out,
    }
}

/// Validate `curve` and resample it onto the canonical grid.
///
/// # Errors
///
/// Returns `PeqfitError::InvalidCurve` if the curve is empty, unsorted or
/// contains duplicate or non-finite values.
pub fn resample(curve: &Curve, grid: &FrequencyGrid) -> Result<Curve> {
    curve.validate()?;
    Ok(interpolate_log_space(grid.freqs(), curve))
}

/// Create a standard logarithmic frequency grid
pub fn create_log_frequency_grid(n_points: usize, f_min: f64, f_max: f64) -> Array1<f64> {
    Array1::logspace(10.0, f_min.log10(), f_max.log10(), n_points)
}
