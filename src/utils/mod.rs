//! Utility functions for SVR workflows

use crate::core::Sample;

/// Feature scaling utilities
pub mod scaling {
    use super::*;
    use crate::core::{Result, SVRError};

    /// Feature scaling methods
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub enum ScalingMethod {
        /// Min-Max scaling to [min_val, max_val] range
        MinMax { min_val: f64, max_val: f64 },
        /// Standard (Z-score) normalization: (x - mean) / std
        #[default]
        StandardScore,
    }

    /// Per-feature statistics fitted on training data
    #[derive(Debug, Clone)]
    pub struct ScalingParams {
        pub method: ScalingMethod,
        pub feature_stats: Vec<FeatureStats>,
    }

    /// Statistics for a single feature
    #[derive(Debug, Clone, PartialEq)]
    pub struct FeatureStats {
        pub min: f64,
        pub max: f64,
        pub mean: f64,
        /// Population standard deviation
        pub std: f64,
    }

    impl ScalingParams {
        /// Compute scaling parameters from training data
        pub fn fit(samples: &[Sample], method: ScalingMethod) -> Result<Self> {
            let dim = samples.first().ok_or(SVRError::EmptyDataset)?.dim();
            let n = samples.len() as f64;

            let mut feature_stats = Vec::with_capacity(dim);
            for k in 0..dim {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                let mut sum = 0.0;
                for sample in samples {
                    let value = *sample.features.get(k).ok_or(SVRError::DimensionMismatch {
                        expected: dim,
                        actual: sample.dim(),
                    })?;
                    min = min.min(value);
                    max = max.max(value);
                    sum += value;
                }
                let mean = sum / n;
                let variance = samples
                    .iter()
                    .map(|s| (s.features[k] - mean).powi(2))
                    .sum::<f64>()
                    / n;
                feature_stats.push(FeatureStats {
                    min,
                    max,
                    mean,
                    std: variance.sqrt(),
                });
            }

            Ok(Self {
                method,
                feature_stats,
            })
        }

        /// Scale one feature vector; features beyond the fitted ones are kept
        pub fn transform(&self, features: &[f64]) -> Vec<f64> {
            features
                .iter()
                .enumerate()
                .map(|(k, &value)| match self.feature_stats.get(k) {
                    Some(stats) => self.scale_value(value, stats),
                    None => value,
                })
                .collect()
        }

        /// Transform a single sample using fitted parameters
        pub fn transform_sample(&self, sample: &Sample) -> Sample {
            Sample::new(self.transform(&sample.features), sample.target)
        }

        /// Transform multiple samples
        pub fn transform_samples(&self, samples: &[Sample]) -> Vec<Sample> {
            samples
                .iter()
                .map(|sample| self.transform_sample(sample))
                .collect()
        }

        fn scale_value(&self, value: f64, stats: &FeatureStats) -> f64 {
            match self.method {
                ScalingMethod::MinMax { min_val, max_val } => {
                    if (stats.max - stats.min).abs() < 1e-12 {
                        // Constant feature
                        (min_val + max_val) / 2.0
                    } else {
                        let normalized = (value - stats.min) / (stats.max - stats.min);
                        min_val + normalized * (max_val - min_val)
                    }
                }
                ScalingMethod::StandardScore => {
                    if stats.std < 1e-12 {
                        0.0
                    } else {
                        (value - stats.mean) / stats.std
                    }
                }
            }
        }
    }

    /// Convenience function: fit and transform in one step
    pub fn fit_transform(
        samples: &[Sample],
        method: ScalingMethod,
    ) -> Result<(Vec<Sample>, ScalingParams)> {
        let params = ScalingParams::fit(samples, method)?;
        let transformed = params.transform_samples(samples);
        Ok((transformed, params))
    }
}

/// Convergence diagnostics over solver traces
pub mod diagnostics {
    use crate::core::{OptimizationTrace, Result, SolverStatus};
    use crate::optimizer::TrainedSVR;
    use serde::{Deserialize, Serialize};
    use std::fs::File;
    use std::io::{BufReader, BufWriter};
    use std::path::Path;

    /// Ratios (f_{i+1} − f*) / (f_i − f*) of consecutive objective gaps
    ///
    /// Pairs whose earlier gap is exactly zero are skipped.
    pub fn convergence_rates(trace: &OptimizationTrace, f_star: f64) -> Vec<f64> {
        trace
            .objectives()
            .windows(2)
            .filter_map(|pair| {
                let gap = pair[0] - f_star;
                (gap != 0.0).then(|| (pair[1] - f_star) / gap)
            })
            .collect()
    }

    /// ln(|f_i − f*| / |f*|) per iteration; |f*| is replaced by 1 when f* is 0
    ///
    /// Iterations that hit f* exactly are skipped.
    pub fn log_residual_errors(trace: &OptimizationTrace, f_star: f64) -> Vec<f64> {
        let scale = if f_star == 0.0 { 1.0 } else { f_star.abs() };
        trace
            .objectives()
            .iter()
            .map(|f| (f - f_star).abs())
            .filter(|residual| *residual > 0.0)
            .map(|residual| (residual / scale).ln())
            .collect()
    }

    /// JSON export of a fit's solver trace
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TraceReport {
        /// Library version used to create the report
        pub library_version: String,
        /// Creation timestamp (RFC 3339)
        pub created_at: String,
        pub kernel: String,
        pub status: SolverStatus,
        pub iterations: usize,
        /// Objective value of the returned β
        pub objective: f64,
        pub trace: OptimizationTrace,
    }

    impl TraceReport {
        /// Create a report from a trained model
        pub fn from_model(model: &TrainedSVR) -> Self {
            Self {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                kernel: model.kernel().name().to_string(),
                status: model.status(),
                iterations: model.iterations(),
                objective: model.objective(),
                trace: model.trace().clone(),
            }
        }

        /// Save report to file
        pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
            let file = File::create(path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), self)?;
            Ok(())
        }

        /// Load report from file
        pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
            let file = File::open(path)?;
            let report = serde_json::from_reader(BufReader::new(file))?;
            Ok(report)
        }
    }
}
