//! Tests for filter bank bounds resolution
//!
//! Each built-in constraint set and each filter spec must turn into the
//! parameter box the optimizer works in.

use peqfit::constraints::{BUILTIN_CONSTRAINT_SETS, NYQUIST_MARGIN, builtin_constraint_set};
use peqfit::param_utils::{PARAMS_PER_FILTER, setup_bounds};
use peqfit::read::load_constraint_set;
use peqfit::{FilterBank, FilterSpec, FilterType, PeqfitError};

#[test]
fn test_builtin_sets_layout() {
    let standard = builtin_constraint_set("standard").unwrap();
    let types: Vec<FilterType> = standard.iter().map(|f| f.filter_type).collect();
    assert_eq!(
        types,
        vec![
            FilterType::LowShelf,
            FilterType::Peaking,
            FilterType::Peaking,
            FilterType::Peaking,
            FilterType::HighShelf
        ]
    );

    let restricted = builtin_constraint_set("restricted").unwrap();
    assert_eq!(restricted.len(), 3);
    for b in restricted.bounds(44100).unwrap() {
        assert_eq!(b.gain, (-6.0, 6.0));
        assert_eq!(b.q, (1.0, 5.0));
    }

    let qudelix = builtin_constraint_set("qudelix_10").unwrap();
    assert_eq!(qudelix.len(), 10);

    for name in BUILTIN_CONSTRAINT_SETS {
        assert_eq!(load_constraint_set(name).unwrap(), builtin_constraint_set(name).unwrap());
    }
}

#[test]
fn test_parameter_box_in_log_frequency() {
    let bank = builtin_constraint_set("standard").unwrap();
    let bounds = bank.bounds(48000).unwrap();
    let (lower, upper) = setup_bounds(&bounds);
    assert_eq!(lower.len(), bank.len() * PARAMS_PER_FILTER);
    assert_eq!(upper.len(), lower.len());

    for (i, b) in bounds.iter().enumerate() {
        let base = i * PARAMS_PER_FILTER;
        assert!((lower[base] - b.fc.0.log10()).abs() < 1e-12);
        assert!((upper[base] - b.fc.1.log10()).abs() < 1e-12);
        assert_eq!((lower[base + 1], upper[base + 1]), b.q);
        assert_eq!((lower[base + 2], upper[base + 2]), b.gain);
        assert!(lower.iter().zip(upper.iter()).all(|(l, u)| l <= u));
    }
}

#[test]
fn test_low_sample_rate_caps_frequency() {
    let bank = FilterBank::new(vec![FilterSpec::peaking()]);
    let bounds = bank.bounds(8000).unwrap();
    assert!((bounds[0].fc.1 - NYQUIST_MARGIN * 4000.0).abs() < 1e-9);
    assert_eq!(bounds[0].fc.0, 20.0);
}

#[test]
fn test_invalid_specs_are_rejected() {
    let inverted = FilterBank::new(vec![FilterSpec::peaking().with_gain(6.0, -6.0)]);
    assert!(matches!(
        inverted.bounds(44100),
        Err(PeqfitError::InvalidFilterSpec { .. })
    ));

    let zero_q = FilterBank::new(vec![FilterSpec::low_shelf().with_q(0.0, 1.0)]);
    assert!(zero_q.bounds(44100).is_err());

    let above_nyquist = FilterBank::new(vec![FilterSpec::high_shelf().with_fc(30000.0, 40000.0)]);
    assert!(above_nyquist.bounds(44100).is_err());

    assert!(matches!(
        FilterBank::new(vec![FilterSpec::peaking()]).bounds(0),
        Err(PeqfitError::InvalidSampleRate { .. })
    ));
}

#[test]
fn test_unknown_set_name() {
    assert!(matches!(
        load_constraint_set("does_not_exist"),
        Err(PeqfitError::UnknownConstraintSet { name }) if name == "does_not_exist"
    ));
}
