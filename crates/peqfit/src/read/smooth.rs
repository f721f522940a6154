use crate::curve::Curve;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// How the averaging window behaves near the ends of the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    /// Shrink the window symmetrically so it never leaves the curve
    #[default]
    Taper,
    /// Mirror samples about the first/last point
    Reflect,
}

/// Fractional octave smoothing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Window width in octaves below the treble band
    pub window_octaves: f64,
    /// Window width in octaves above the treble band
    pub treble_window_octaves: f64,
    /// Start of the transition to the treble window (Hz)
    pub treble_f_lower: f64,
    /// End of the transition to the treble window (Hz)
    pub treble_f_upper: f64,
    /// Edge handling
    pub edge: EdgeMode,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_octaves: 1.0 / 12.0,
            treble_window_octaves: 2.0,
            treble_f_lower: 6000.0,
            treble_f_upper: 8000.0,
            edge: EdgeMode::Taper,
        }
    }
}

fn reflect_index(j: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let last = n as isize - 1;
    let mut j = j;
    while j < 0 || j > last {
        j = if j < 0 { -j } else { 2 * last - j };
    }
    j as usize
}

/// Moving average with a half width of `half_width` samples.
///
/// # Arguments
/// * `values` - Signal to smooth
/// * `half_width` - Number of samples on each side of the center sample
/// * `edge` - Edge handling
///
/// # Returns
/// Smoothed signal, same length as the input
pub fn smooth_window(values: &Array1<f64>, half_width: usize, edge: EdgeMode) -> Array1<f64> {
    let n = values.len();
    if half_width == 0 || n < 2 {
        return values.clone();
    }

    let mut out = Array1::zeros(n);
    for i in 0..n {
        out[i] = match edge {
            EdgeMode::Taper => {
                let h = half_width.min(i).min(n - 1 - i);
                let window = values.slice(ndarray::s![i - h..=i + h]);
                window.sum() / (2 * h + 1) as f64
            }
            EdgeMode::Reflect => {
                let h = half_width as isize;
                let sum: f64 = (-h..=h)
                    .map(|k| values[reflect_index(i as isize + k, n)])
                    .sum();
                sum / (2 * half_width + 1) as f64
            }
        };
    }
    out
}

/// Number of samples covering half of an `octaves` wide window on a log grid.
fn half_width_samples(freqs: &Array1<f64>, octaves: f64) -> usize {
    let n = freqs.len();
    if n < 2 || octaves <= 0.0 {
        return 0;
    }
    let step_octaves = (freqs[n - 1] / freqs[0]).log2() / (n - 1) as f64;
    (0.5 * octaves / step_octaves).round() as usize
}

/// Weight of the treble window at frequency `f`, linear in log frequency.
fn treble_weight(f: f64, f_lower: f64, f_upper: f64) -> f64 {
    if f <= f_lower {
        0.0
    } else if f >= f_upper {
        1.0
    } else {
        (f / f_lower).ln() / (f_upper / f_lower).ln()
    }
}

/// Fractional octave smoothing of a curve on a log spaced grid.
///
/// Narrow resonances are averaged out by a window whose width is a constant
/// fraction of an octave. Above `treble_f_upper` the wider treble window is
/// used; between `treble_f_lower` and `treble_f_upper` both results are
/// blended.
pub fn smooth_fractional_octave(curve: &Curve, config: &SmoothingConfig) -> Curve {
    let hw = half_width_samples(&curve.freq, config.window_octaves);
    let normal = smooth_window(&curve.spl, hw, config.edge);

    let treble_hw = half_width_samples(&curve.freq, config.treble_window_octaves);
    let spl = if treble_hw == hw || config.treble_f_upper <= config.treble_f_lower {
        normal
    } else {
        let treble = smooth_window(&curve.spl, treble_hw, config.edge);
        Array1::from_shape_fn(curve.len(), |i| {
            let w = treble_weight(
                curve.freq[i],
                config.treble_f_lower,
                config.treble_f_upper,
            );
            (1.0 - w) * normal[i] + w * treble[i]
        })
    };

    Curve {
        freq: curve.freq.clone(),
        spl,
    }
}
