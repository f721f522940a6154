use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::curve::Curve;
use crate::error::{PeqfitError, Result};
use ndarray::Array1;

fn file_error(path: &Path, message: impl ToString) -> PeqfitError {
    PeqfitError::FileOperation {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Parse two-column frequency response text.
///
/// Columns may be separated by commas or whitespace. Empty lines, comments
/// (`#` or `//`) and a textual header on the first line are skipped; rows that
/// do not parse as two numbers are ignored.
pub(crate) fn parse_frequency_response<R: BufRead>(
    reader: R,
) -> std::io::Result<(Vec<f64>, Vec<f64>)> {
    let mut frequencies = Vec::new();
    let mut spl_values = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        if line_num == 0 && (line.contains("freq") || line.contains("Freq") || line.contains("Hz"))
        {
            continue;
        }

        let parts: Vec<&str> = if line.contains(',') {
            line.split(',').map(|s| s.trim()).collect()
        } else {
            line.split_whitespace().collect()
        };

        if parts.len() < 2 {
            continue;
        }
        if let (Ok(freq), Ok(spl)) = (parts[0].parse::<f64>(), parts[1].parse::<f64>()) {
            frequencies.push(freq);
            spl_values.push(spl);
        }
    }

    Ok((frequencies, spl_values))
}

/// Read a frequency response curve from a CSV or text file
///
/// # Arguments
/// * `path` - Path to the file (`freq,spl` per line)
///
/// # Returns
/// * The validated curve
///
/// # Errors
///
/// Returns `PeqfitError::FileOperation` when the file cannot be read or holds
/// no data row, and `PeqfitError::InvalidCurve` when the rows do not form a
/// valid curve.
pub fn read_curve_from_csv(path: &Path) -> Result<Curve> {
    let file = File::open(path).map_err(|e| file_error(path, e))?;
    let (freq, spl) =
        parse_frequency_response(BufReader::new(file)).map_err(|e| file_error(path, e))?;

    if freq.is_empty() {
        return Err(file_error(
            path,
            "no valid frequency response data found in file",
        ));
    }

    Curve::try_new(Array1::from_vec(freq), Array1::from_vec(spl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_comma_and_whitespace_rows() {
        let text = "frequency,spl\n# comment\n20,1.5\n\n40 , -0.5\n80\t2.0\nnot,numbers\n";
        let (freq, spl) = parse_frequency_response(Cursor::new(text)).unwrap();
        assert_eq!(freq, vec![20.0, 40.0, 80.0]);
        assert_eq!(spl, vec![1.5, -0.5, 2.0]);
    }

    #[test]
    fn reads_curve_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fr.csv");
        std::fs::write(&path, "freq,spl\n20,0\n1000,1\n20000,-3\n").unwrap();
        let curve = read_curve_from_csv(&path).unwrap();
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.spl[2], -3.0);
    }

    #[test]
    fn empty_or_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "# nothing here\n").unwrap();
        assert!(read_curve_from_csv(&path).unwrap_err().is_io_error());
        assert!(read_curve_from_csv(&dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn unsorted_rows_are_invalid_curves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "100,0\n50,1\n").unwrap();
        assert!(read_curve_from_csv(&path).unwrap_err().is_curve_error());
    }
}
