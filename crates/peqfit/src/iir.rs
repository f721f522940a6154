//! Filter types of a bank and their mapping onto `math_audio_iir_fir` biquads

pub use math_audio_iir_fir::{Biquad, BiquadFilterType, Peq, compute_peq_response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter types supported by the equalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    /// Low-shelf filter
    LowShelf,
    /// Peaking filter
    Peaking,
    /// High-shelf filter
    HighShelf,
}

impl FilterType {
    /// Returns the 3-symbol code used in preset files (e.g., "PK").
    pub fn short_name(&self) -> &'static str {
        match self {
            FilterType::LowShelf => "LSQ",
            FilterType::Peaking => "PK",
            FilterType::HighShelf => "HSQ",
        }
    }

    /// True for the two shelf types
    pub fn is_shelf(&self) -> bool {
        matches!(self, FilterType::LowShelf | FilterType::HighShelf)
    }

    /// Biquad design used for this slot type
    pub fn biquad_type(&self) -> BiquadFilterType {
        match self {
            FilterType::LowShelf => BiquadFilterType::Lowshelf,
            FilterType::Peaking => BiquadFilterType::Peak,
            FilterType::HighShelf => BiquadFilterType::Highshelf,
        }
    }

    /// Build a filter of this type
    pub fn biquad(&self, freq: f64, srate: f64, q: f64, db_gain: f64) -> Biquad {
        Biquad::new(self.biquad_type(), freq, srate, q, db_gain)
    }
}

impl TryFrom<BiquadFilterType> for FilterType {
    type Error = BiquadFilterType;

    fn try_from(value: BiquadFilterType) -> Result<Self, Self::Error> {
        match value {
            BiquadFilterType::Lowshelf => Ok(FilterType::LowShelf),
            BiquadFilterType::Peak => Ok(FilterType::Peaking),
            BiquadFilterType::Highshelf => Ok(FilterType::HighShelf),
            other => Err(other),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Preset code of a fitted filter.
///
/// Types outside the bank vocabulary keep the biquad's own short name.
pub fn preset_code(filter: &Biquad) -> &'static str {
    FilterType::try_from(filter.filter_type)
        .map(|t| t.short_name())
        .unwrap_or_else(|other| other.short_name())
}

/// Unit-weight filter chain, in bank order
pub fn to_peq(filters: &[Biquad]) -> Peq {
    filters.iter().map(|f| (1.0, f.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::create_log_frequency_grid;

    const FS: f64 = 48000.0;

    #[test]
    fn zero_gain_is_transparent() {
        let freqs = create_log_frequency_grid(100, 20.0, 20000.0);
        for ft in [FilterType::LowShelf, FilterType::Peaking, FilterType::HighShelf] {
            let resp = ft.biquad(1000.0, FS, 0.7, 0.0).np_log_result(&freqs);
            assert!(resp.iter().all(|v| v.abs() < 1e-9), "{ft} not flat");
        }
    }

    #[test]
    fn peaking_reaches_gain_at_center() {
        let pk = FilterType::Peaking.biquad(1000.0, FS, 1.0, 6.0);
        assert!((pk.log_result(1000.0) - 6.0).abs() < 1e-6);
        assert!(pk.log_result(20.0).abs() < 0.1);
        let cut = FilterType::Peaking.biquad(1000.0, FS, 1.0, -6.0);
        assert!((cut.log_result(1000.0) + 6.0).abs() < 1e-6);
    }

    #[test]
    fn shelves_reach_gain_away_from_corner() {
        let ls = FilterType::LowShelf.biquad(200.0, FS, 0.7, 5.0);
        assert!((ls.log_result(20.0) - 5.0).abs() < 0.1);
        assert!(ls.log_result(15000.0).abs() < 0.1);
        // half gain at the corner
        assert!((ls.log_result(200.0) - 2.5).abs() < 1e-6);

        let hs = FilterType::HighShelf.biquad(5000.0, FS, 0.7, -4.0);
        assert!((hs.log_result(20000.0) + 4.0).abs() < 0.3);
        assert!(hs.log_result(50.0).abs() < 0.05);
        assert!((hs.log_result(5000.0) + 2.0).abs() < 1e-6);
    }

    #[test]
    fn combined_response_is_sum() {
        let freqs = create_log_frequency_grid(50, 20.0, 20000.0);
        let a = FilterType::Peaking.biquad(300.0, FS, 2.0, 3.0);
        let b = FilterType::HighShelf.biquad(8000.0, FS, 0.6, -2.0);
        let sum = compute_peq_response(&freqs, &to_peq(&[a.clone(), b.clone()]), FS);
        let expected = a.np_log_result(&freqs) + b.np_log_result(&freqs);
        for (x, y) in sum.iter().zip(expected.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
        assert!(compute_peq_response(&freqs, &Vec::new(), FS).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn codes_and_biquad_types() {
        assert_eq!(FilterType::LowShelf.short_name(), "LSQ");
        assert_eq!(FilterType::Peaking.short_name(), "PK");
        assert_eq!(FilterType::HighShelf.short_name(), "HSQ");
        let parsed: FilterType = serde_json::from_str("\"HIGH_SHELF\"").unwrap();
        assert_eq!(parsed, FilterType::HighShelf);

        for ft in [FilterType::LowShelf, FilterType::Peaking, FilterType::HighShelf] {
            assert_eq!(FilterType::try_from(ft.biquad_type()), Ok(ft));
            assert_eq!(preset_code(&ft.biquad(1000.0, FS, 1.0, 1.0)), ft.short_name());
        }
        assert!(FilterType::try_from(BiquadFilterType::Notch).is_err());
        let notch = Biquad::new(BiquadFilterType::Notch, 1000.0, FS, 1.0, 0.0);
        assert_eq!(preset_code(&notch), "NO");
    }
}
