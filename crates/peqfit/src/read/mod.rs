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

mod clamp;
mod interpolate;
mod normalize;
mod read_csv;
mod read_json;
mod smooth;

// Re-export commonly used functions
pub use clamp::limit_correction;
pub use interpolate::*;
pub use normalize::*;
pub use read_csv::read_curve_from_csv;
pub use read_json::{load_constraint_set, read_curve, read_curve_from_json};
pub use smooth::{EdgeMode, SmoothingConfig, smooth_fractional_octave, smooth_window};
