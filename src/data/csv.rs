//! CSV sample loader
//!
//! Reads dense samples from CSV files where:
//! - The last column is the label (class or regression target)
//! - All other columns are features
//! - First row can be headers (automatically detected)
//! - Empty lines and lines starting with `#` are skipped

use crate::core::{Result, SVMError, SampleLayout};
use crate::data::SampleMatrix;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Loader for CSV sample files
pub struct CSVDataset;

impl CSVDataset {
    /// Load samples from a CSV file
    ///
    /// The last column is assumed to be the label.
    /// Headers are automatically detected if present.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SampleMatrix> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load samples from a reader with header auto-detection
    pub fn from_reader<R: BufRead>(reader: R) -> Result<SampleMatrix> {
        Self::from_reader_with_options(reader, true)
    }

    /// Load samples from a reader with explicit header option
    pub fn from_reader_with_options<R: BufRead>(
        reader: R,
        auto_detect_header: bool,
    ) -> Result<SampleMatrix> {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut first_data_line = true;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(SVMError::IoError)?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if first_data_line {
                first_data_line = false;
                if auto_detect_header && Self::is_header_line(line) {
                    continue;
                }
            }

            let (features, label) = Self::parse_data_line(line)
                .map_err(|e| SVMError::ParseError(format!("line {}: {e}", line_no + 1)))?;
            rows.push(features);
            labels.push(label);
        }

        if rows.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        SampleMatrix::from_nested(&rows, &labels, SampleLayout::Row)
    }

    /// Check if a line appears to be a header
    fn is_header_line(line: &str) -> bool {
        let fields: Vec<&str> = line.split(',').collect();

        if fields.len() < 2 {
            return false;
        }

        // At least half of the fields, label included, are non-numeric
        let non_numeric_count = fields
            .iter()
            .filter(|field| field.trim().parse::<f64>().is_err())
            .count();

        non_numeric_count * 2 >= fields.len()
    }

    /// Parse a CSV data line into features and label
    fn parse_data_line(line: &str) -> std::result::Result<(Vec<f64>, f64), String> {
        let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();

        if fields.len() < 2 {
            return Err(format!("too few fields: {line}"));
        }

        let (label_str, feature_fields) = match fields.split_last() {
            Some(split) => split,
            None => return Err(format!("too few fields: {line}")),
        };
        let label = label_str
            .parse::<f64>()
            .map_err(|_| format!("invalid label: {label_str}"))?;

        let features = feature_fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                field
                    .parse::<f64>()
                    .map_err(|_| format!("invalid feature value at column {}: {field}", idx + 1))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((features, label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Dataset;
    use std::io::Cursor;

    #[test]
    fn test_csv_basic() {
        let data = "1.0,2.0,1\n3.0,4.0,-1\n";
        let dataset = CSVDataset::from_reader(Cursor::new(data)).expect("valid csv");

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 2);
        assert_eq!(dataset.row(0), &[1.0, 2.0]);
        assert_eq!(dataset.label(0), 1.0);
        assert_eq!(dataset.row(1), &[3.0, 4.0]);
        assert_eq!(dataset.label(1), -1.0);
    }

    #[test]
    fn test_csv_with_headers() {
        let data = "feature1,feature2,label\n1.0,2.0,1\n3.0,4.0,-1\n";
        let dataset = CSVDataset::from_reader(Cursor::new(data)).expect("valid csv");

        assert_eq!(dataset.len(), 2); // Headers should be skipped
        assert_eq!(dataset.get_labels(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_csv_keeps_labels_and_zeros() {
        let data = "0.0,0.0,2\n1.5,0.0,0.25\n";
        let dataset = CSVDataset::from_reader(Cursor::new(data)).expect("valid csv");

        assert_eq!(dataset.row(0), &[0.0, 0.0]);
        assert_eq!(dataset.get_labels(), vec![2.0, 0.25]);
    }

    #[test]
    fn test_csv_empty_lines_and_comments() {
        let data = "# Comment\n1.0,2.0,1\n\n3.0,4.0,-1\n";
        let dataset = CSVDataset::from_reader(Cursor::new(data)).expect("valid csv");

        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_csv_invalid_format() {
        // Too few fields
        let result = CSVDataset::from_reader(Cursor::new("1.0\n"));
        assert!(matches!(result, Err(SVMError::ParseError(_))));

        // Invalid number
        let result = CSVDataset::from_reader(Cursor::new("1.0,abc,-1\n"));
        assert!(matches!(result, Err(SVMError::ParseError(_))));

        // Ragged rows
        let result = CSVDataset::from_reader(Cursor::new("1.0,2.0,1\n1.0,1\n"));
        assert!(matches!(result, Err(SVMError::ShapeError(_))));

        // Nothing but a header
        let result = CSVDataset::from_reader(Cursor::new("a,b,label\n"));
        assert!(matches!(result, Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_csv_manual_header_control() {
        let data = "1.0,2.0,1\n3.0,4.0,-1\n";

        // Explicitly disable header detection
        let dataset =
            CSVDataset::from_reader_with_options(Cursor::new(data), false).expect("valid csv");
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_is_header_line() {
        assert!(CSVDataset::is_header_line("feature1,feature2,label"));
        assert!(CSVDataset::is_header_line("x1,x2,x3,y"));
        assert!(!CSVDataset::is_header_line("1.0,2.0,3.0,1"));
        assert!(!CSVDataset::is_header_line("1")); // Too few fields
    }

    #[test]
    fn test_single_feature_header() {
        assert!(CSVDataset::is_header_line("x,y"));
        assert!(!CSVDataset::is_header_line("0.5,2.0"));

        let data = "x,y\n0.0,-1.0\n0.5,0.5\n";
        let dataset = CSVDataset::from_reader(Cursor::new(data)).expect("valid csv");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 1);
        assert_eq!(dataset.get_labels(), vec![-1.0, 0.5]);
    }
}
