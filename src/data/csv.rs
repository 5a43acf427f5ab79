//! CSV format dataset implementation
//!
//! Supports loading regression datasets from CSV files where:
//! - The last column is the real-valued target
//! - All other columns are dense features
//! - First row can be headers (automatically detected)

use crate::core::{Dataset, Result, SVRError, Sample};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dense regression dataset
#[derive(Debug, Clone)]
pub struct CSVDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl CSVDataset {
    /// Load a dataset from a CSV file
    ///
    /// The last column is the target. Headers are detected automatically.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader, detecting a header line
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, true)
    }

    /// Load a dataset from a reader with explicit header option
    pub fn from_reader_with_options<R: BufRead>(reader: R, auto_detect_header: bool) -> Result<Self> {
        let mut samples: Vec<Sample> = Vec::new();
        let mut seen_content = false;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Only the first content line may be a header
            let first = !seen_content;
            seen_content = true;
            if first && auto_detect_header && Self::is_header_line(line) {
                continue;
            }

            let sample = Self::parse_data_line(line).map_err(|e| {
                SVRError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;

            if let Some(previous) = samples.first() {
                if previous.dim() != sample.dim() {
                    return Err(SVRError::ParseError(format!(
                        "Line {} has {} features, expected {}",
                        line_num + 1,
                        sample.dim(),
                        previous.dim()
                    )));
                }
            }
            samples.push(sample);
        }

        Self::from_samples(samples)
    }

    /// Wrap already-built samples, which must share one dimensionality
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        let dimensions = samples.first().ok_or(SVRError::EmptyDataset)?.dim();
        if let Some(bad) = samples.iter().find(|s| s.dim() != dimensions) {
            return Err(SVRError::DimensionMismatch {
                expected: dimensions,
                actual: bad.dim(),
            });
        }
        Ok(Self {
            samples,
            dimensions,
        })
    }

    /// Check if a line appears to be a header
    fn is_header_line(line: &str) -> bool {
        let fields: Vec<&str> = line.split(',').collect();

        if fields.len() < 2 {
            return false;
        }

        let non_numeric_count = fields
            .iter()
            .filter(|field| field.trim().parse::<f64>().is_err())
            .count();

        non_numeric_count > fields.len() / 2
    }

    /// Parse a CSV data line into a Sample
    fn parse_data_line(line: &str) -> Result<Sample> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        if fields.len() < 2 {
            return Err(SVRError::ParseError(format!(
                "Line has too few fields: {line}"
            )));
        }

        let (target_str, feature_strs) = match fields.split_last() {
            Some(split) => split,
            None => return Err(SVRError::ParseError("Empty line".to_string())),
        };
        let target = parse_finite(target_str)
            .ok_or_else(|| SVRError::ParseError(format!("Invalid target: {target_str}")))?;

        let features = feature_strs
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                parse_finite(field).ok_or_else(|| {
                    SVRError::ParseError(format!(
                        "Invalid feature value at column {}: {}",
                        idx + 1,
                        field
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Sample::new(features, target))
    }

    /// Feature rows in sample order
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.features.clone()).collect()
    }
}

fn parse_finite(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl Dataset for CSVDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn get_sample(&self, i: usize) -> Sample {
        self.samples[i].clone()
    }

    fn samples(&self) -> Vec<Sample> {
        self.samples.clone()
    }

    fn get_targets(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.target).collect()
    }
}
