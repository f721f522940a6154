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

use crate::iir::{Biquad, FilterType, Peq, compute_peq_response};
use crate::param_utils::{self, FilterParams};
use ndarray::Array1;

/// Convert parameter vector to Peq structure
///
/// # Arguments
/// * `x` - Parameter vector, 3 entries per filter
/// * `types` - Filter type of each slot, in bank order
/// * `srate` - Sample rate in Hz
///
/// # Returns
/// A Peq structure containing the filters, in bank order
pub fn x2peq(x: &[f64], types: &[FilterType], srate: f64) -> Peq {
    let mut peq = Vec::with_capacity(types.len());
    for (i, &ftype) in types.iter().enumerate() {
        let params = param_utils::get_filter_params(x, i);
        peq.push((1.0, x2biquad(&params, ftype, srate)));
    }
    peq
}

/// Build one filter from its parameters
pub fn x2biquad(params: &FilterParams, filter_type: FilterType, srate: f64) -> Biquad {
    filter_type.biquad(params.fc(), srate, params.q, params.gain)
}

/// Convert parameter vector to parametric EQ frequency response
///
/// # Arguments
/// * `freqs` - Frequency points for evaluation (Hz)
/// * `x` - Parameter vector
/// * `types` - Filter type of each slot
/// * `srate` - Sample rate in Hz
///
/// # Returns
/// Combined response in dB at the specified frequency points
pub fn x2spl(freqs: &Array1<f64>, x: &[f64], types: &[FilterType], srate: f64) -> Array1<f64> {
    let peq = x2peq(x, types, srate);
    compute_peq_response(freqs, &peq, srate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iir::BiquadFilterType;
    use crate::read::create_log_frequency_grid;

    #[test]
    fn x2peq_decodes_each_slot() {
        let types = [FilterType::LowShelf, FilterType::Peaking];
        let x = vec![2.0, 0.6, 3.0, 3.0, 2.0, -4.0];
        let peq = x2peq(&x, &types, 48000.0);
        assert_eq!(peq.len(), 2);
        let (weight, low) = &peq[0];
        assert_eq!(*weight, 1.0);
        assert!((low.freq - 100.0).abs() < 1e-9);
        assert_eq!(low.filter_type, BiquadFilterType::Lowshelf);
        let (_, peak) = &peq[1];
        assert_eq!(peak.filter_type, BiquadFilterType::Peak);
        assert!((peak.freq - 1000.0).abs() < 1e-9);
        assert_eq!(peak.q, 2.0);
        assert_eq!(peak.db_gain, -4.0);
    }

    #[test]
    fn x2spl_matches_filter_sum() {
        let freqs = create_log_frequency_grid(64, 20.0, 20000.0);
        let types = [FilterType::Peaking];
        let x = vec![3.0, 1.0, 6.0];
        let spl = x2spl(&freqs, &x, &types, 48000.0);
        let direct = FilterType::Peaking
            .biquad(1000.0, 48000.0, 1.0, 6.0)
            .np_log_result(&freqs);
        for (a, b) in spl.iter().zip(direct.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
