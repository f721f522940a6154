use ndarray::Array1;

/// Limit a correction curve in dB.
///
/// Boosts above `max_boost` and cuts deeper than `max_cut` (a positive
/// number) are clipped; `None` leaves that side untouched.
///
/// # Arguments
/// * `correction` - Correction levels in dB
/// * `max_boost` - Largest positive level kept
/// * `max_cut` - Largest attenuation kept
pub fn limit_correction(
    correction: &Array1<f64>,
    max_boost: Option<f64>,
    max_cut: Option<f64>,
) -> Array1<f64> {
    let hi = max_boost.unwrap_or(f64::INFINITY);
    let lo = max_cut.map_or(f64::NEG_INFINITY, |c| -c);
    correction.mapv(|v| v.clamp(lo, hi))
}
