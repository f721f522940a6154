use crate::curve::Curve;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Low frequency bound for normalization (1000 Hz).
///
/// SPL values are normalized by subtracting the mean in the range
/// from `NORMALIZE_LOW_FREQ` to `NORMALIZE_HIGH_FREQ`.
pub const NORMALIZE_LOW_FREQ: f64 = 1000.0;

/// High frequency bound for normalization (2000 Hz).
///
/// SPL values are normalized by subtracting the mean in the range
/// from `NORMALIZE_LOW_FREQ` to `NORMALIZE_HIGH_FREQ`.
pub const NORMALIZE_HIGH_FREQ: f64 = 2000.0;

/// Reference band used to level ("center") curves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Lower edge of the reference band in Hz
    pub f_low: f64,
    /// Upper edge of the reference band in Hz
    pub f_high: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            f_low: NORMALIZE_LOW_FREQ,
            f_high: NORMALIZE_HIGH_FREQ,
        }
    }
}

/// Mean level of the points whose frequency lies in `[f_min, f_max]`.
///
/// Returns `None` when no point falls inside the band.
pub fn band_mean(curve: &Curve, f_min: f64, f_max: f64) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0;

    for (&f, &spl) in curve.freq.iter().zip(curve.spl.iter()) {
        if f >= f_min && f <= f_max {
            sum += spl;
            count += 1;
        }
    }

    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}

/// Level that [`center`] subtracts from `curve`: its reference band mean.
///
/// Returns 0 (and logs a warning) when no point falls inside the band.
pub fn centering_offset(curve: &Curve, config: &NormalizeConfig) -> f64 {
    match band_mean(curve, config.f_low, config.f_high) {
        Some(mean) => {
            debug!(
                "centering: {:.3} dB mean in [{}, {}] Hz",
                mean, config.f_low, config.f_high
            );
            mean
        }
        None => {
            warn!(
                "centering: no point in [{}, {}] Hz, curve left as is",
                config.f_low, config.f_high
            );
            0.0
        }
    }
}

/// Subtract `offset` dB from every level of `curve`
pub fn shift(curve: &Curve, offset: f64) -> Curve {
    Curve {
        freq: curve.freq.clone(),
        spl: &curve.spl - offset,
    }
}

/// Center a curve by subtracting the mean level of the reference band.
///
/// The curve is returned unchanged (and a warning is logged) when no point
/// falls inside the band.
pub fn center(curve: &Curve, config: &NormalizeConfig) -> Curve {
    shift(curve, centering_offset(curve, config))
}
