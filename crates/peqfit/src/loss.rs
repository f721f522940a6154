//! Loss functions for the optimizer and the scorer
//!
//! Both work on canonical curves, so every point carries the same weight:
//! the grid is log spaced and a plain mean is already a per-octave mean.

use ndarray::{Array1, Zip};

/// Sum of squared differences between `response` and `desired`
pub fn sse(desired: &Array1<f64>, response: &Array1<f64>) -> f64 {
    Zip::from(desired)
        .and(response)
        .fold(0.0, |acc, &d, &r| acc + (r - d) * (r - d))
}

/// Root mean square of an error curve; 0 for an empty curve
pub fn rms(error: &Array1<f64>) -> f64 {
    if error.is_empty() {
        return 0.0;
    }
    (error.mapv(|e| e * e).sum() / error.len() as f64).sqrt()
}

/// Root mean square error between `response` and `desired`
pub fn flat_loss(desired: &Array1<f64>, response: &Array1<f64>) -> f64 {
    if desired.is_empty() {
        return 0.0;
    }
    (sse(desired, response) / desired.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn losses_of_known_vectors() {
        let d = array![1.0, -1.0, 2.0, 0.0];
        let r = array![0.0, 0.0, 0.0, 0.0];
        assert_eq!(sse(&d, &r), 6.0);
        assert!((flat_loss(&d, &r) - 1.5_f64.sqrt()).abs() < 1e-12);
        assert!((rms(&d) - 1.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(flat_loss(&d, &d), 0.0);
        assert_eq!(rms(&Array1::zeros(0)), 0.0);
    }
}
