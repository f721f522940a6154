use std::fs;
use std::path::Path;

use crate::constraints::{FilterBank, builtin_constraint_set};
use crate::curve::{Curve, FrequencyPoint, curve_from_points};
use crate::error::{PeqfitError, Result};
use log::debug;

use super::read_csv::read_curve_from_csv;

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| PeqfitError::FileOperation {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Read a curve stored as `[{"freq": Hz, "db": dB}, ...]`.
///
/// # Errors
///
/// Returns `PeqfitError::FileOperation` if the file cannot be read,
/// `PeqfitError::Json` if it is not a list of points and
/// `PeqfitError::InvalidCurve` if the points are malformed.
pub fn read_curve_from_json(path: &Path) -> Result<Curve> {
    let content = read_to_string(path)?;
    let points: Vec<FrequencyPoint> = serde_json::from_str(&content)?;
    debug!("read {} points from {}", points.len(), path.display());
    curve_from_points(&points)
}

/// Read a curve, picking the format from the file extension.
///
/// `.json` files hold a list of points; anything else is parsed as
/// two-column text.
pub fn read_curve(path: &Path) -> Result<Curve> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        read_curve_from_json(path)
    } else {
        read_curve_from_csv(path)
    }
}

/// Load a constraint set.
///
/// `name_or_path` is either the name of a built-in set or the path to a
/// `{"filters": [...]}` JSON file.
///
/// # Errors
///
/// Returns `PeqfitError::UnknownConstraintSet` when `name_or_path` is neither
/// a built-in name nor an existing file.
pub fn load_constraint_set(name_or_path: &str) -> Result<FilterBank> {
    match builtin_constraint_set(name_or_path) {
        Ok(bank) => Ok(bank),
        Err(err) => {
            let path = Path::new(name_or_path);
            if !path.is_file() {
                return Err(err);
            }
            let content = read_to_string(path)?;
            let bank: FilterBank = serde_json::from_str(&content)?;
            debug!(
                "loaded constraint set with {} filters from {}",
                bank.len(),
                path.display()
            );
            Ok(bank)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iir::FilterType;

    #[test]
    fn reads_json_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fr.json");
        std::fs::write(
            &path,
            r#"[{"freq": 20, "db": 1.0}, {"freq": 1000, "db": 0.0}, {"freq": 20000, "db": -2.0}]"#,
        )
        .unwrap();
        let curve = read_curve(&path).unwrap();
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.spl[0], 1.0);
    }

    #[test]
    fn duplicate_frequencies_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.json");
        std::fs::write(&path, r#"[{"freq": 20, "db": 1.0}, {"freq": 20, "db": 0.0}]"#).unwrap();
        assert!(read_curve_from_json(&path).unwrap_err().is_curve_error());
    }

    #[test]
    fn dispatches_text_files_to_csv_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fr.txt");
        std::fs::write(&path, "20 0\n20000 1\n").unwrap();
        assert_eq!(read_curve(&path).unwrap().len(), 2);
    }

    #[test]
    fn constraint_sets_by_name_or_file() {
        assert_eq!(load_constraint_set("standard").unwrap().len(), 5);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(
            &path,
            r#"{"filters": [{"type": "PEAKING", "min_gain": -3, "max_gain": 3}]}"#,
        )
        .unwrap();
        let bank = load_constraint_set(path.to_str().unwrap()).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.filters[0].filter_type, FilterType::Peaking);

        assert!(matches!(
            load_constraint_set("does-not-exist"),
            Err(PeqfitError::UnknownConstraintSet { .. })
        ));
    }
}
