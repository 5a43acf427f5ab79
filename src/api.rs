//! High-level API for support vector regression
//!
//! This module provides a builder for configuring and fitting SVR models,
//! plus prediction and evaluation helpers on the fitted model.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rsvr::api::SVR;
//! use rsvr::kernel::{Gamma, KernelKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = SVR::with_kernel(KernelKind::Rbf { gamma: Gamma::Scale })
//!     .with_box(10.0)
//!     .with_epsilon(0.1)
//!     .fit_from_csv("train.csv")?;
//!
//! let metrics = model.evaluate_from_csv("test.csv")?;
//! println!("MSE: {:.4}", metrics.mse);
//! # Ok(())
//! # }
//! ```

use crate::core::{
    Dataset, OptimizationTrace, RegressionModel, Result, SVRError, Sample, SolverConfig,
    SolverStatus, StepSizeRule,
};
use crate::data::CSVDataset;
use crate::kernel::KernelKind;
use crate::optimizer::{epsilon_insensitive_loss, PrecomputedKernel, SVROptimizer, TrainedSVR};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// High-level SVR interface with builder pattern
#[derive(Debug, Clone)]
pub struct SVR {
    kernel: KernelKind,
    box_c: f64,
    epsilon: f64,
    config: SolverConfig,
}

impl SVR {
    /// Create a new SVR with linear kernel, C = 1 and epsilon = 0.1
    pub fn new() -> Self {
        Self {
            kernel: KernelKind::Linear,
            box_c: 1.0,
            epsilon: 0.1,
            config: SolverConfig::default(),
        }
    }

    /// Create SVR with custom kernel and default parameters
    pub fn with_kernel(kernel: KernelKind) -> Self {
        Self {
            kernel,
            ..Self::new()
        }
    }

    /// Set the box constraint C
    pub fn with_box(mut self, box_c: f64) -> Self {
        self.box_c = box_c;
        self
    }

    /// Set the epsilon-tube half-width
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Replace the whole solver configuration
    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum number of solver iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn with_step_size(mut self, rule: StepSizeRule) -> Self {
        self.config.step_size = rule;
        self
    }

    pub fn with_deflection(mut self, deflection: f64) -> Self {
        self.config.deflection = deflection;
        self
    }

    /// Start the solver from the given dual vector
    pub fn with_warm_start(mut self, beta: Vec<f64>) -> Self {
        self.config.warm_start = Some(beta);
        self
    }

    /// Keep every iterate in the trace, enabling [`TrainedModel::loss_history`]
    pub fn with_record_iterates(mut self, record: bool) -> Self {
        self.config.record_iterates = record;
        self
    }

    pub fn kernel(&self) -> &KernelKind {
        &self.kernel
    }

    pub fn box_constraint(&self) -> f64 {
        self.box_c
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.config
    }

    fn optimizer(self) -> SVROptimizer {
        SVROptimizer::new(self.kernel, self.box_c, self.epsilon, self.config)
    }

    /// Fit on a dataset
    pub fn fit<D: Dataset>(self, dataset: &D) -> Result<TrainedModel> {
        let model = self.optimizer().train(dataset)?;
        Ok(TrainedModel { model })
    }

    /// Fit on samples
    pub fn fit_samples(self, samples: &[Sample]) -> Result<TrainedModel> {
        let model = self.optimizer().train_samples(samples)?;
        Ok(TrainedModel { model })
    }

    /// Fit with a caller-supplied Gram matrix
    pub fn fit_precomputed(
        self,
        samples: &[Sample],
        precomputed: PrecomputedKernel,
    ) -> Result<TrainedModel> {
        let model = self.optimizer().train_precomputed(samples, precomputed)?;
        Ok(TrainedModel { model })
    }

    /// Fit from a CSV file whose last column is the target
    pub fn fit_from_csv<P: AsRef<Path>>(self, path: P) -> Result<TrainedModel> {
        let dataset = CSVDataset::from_file(path)?;
        self.fit(&dataset)
    }
}

impl Default for SVR {
    fn default() -> Self {
        Self::new()
    }
}

/// Fitted SVR model with high-level prediction interface
#[derive(Debug, Clone)]
pub struct TrainedModel {
    model: TrainedSVR,
}

impl TrainedModel {
    /// Predict a single feature vector
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        self.model.predict(x)
    }

    /// Predict many feature vectors
    pub fn predict_batch(&self, xs: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.model.predict_batch(xs)
    }

    /// Predict every sample of a dataset
    pub fn predict_dataset<D: Dataset>(&self, dataset: &D) -> Result<Vec<f64>> {
        (0..dataset.len())
            .map(|i| self.predict(&dataset.get_sample(i).features))
            .collect()
    }

    /// Predict from CSV file
    pub fn predict_from_csv<P: AsRef<Path>>(&self, path: P) -> Result<Vec<f64>> {
        let dataset = CSVDataset::from_file(path)?;
        self.predict_dataset(&dataset)
    }

    /// Epsilon-insensitive squared loss with the model's epsilon
    pub fn loss(&self, targets: &[f64], predictions: &[f64]) -> Result<f64> {
        self.model.loss(targets, predictions)
    }

    /// Training loss at each recorded iterate
    pub fn loss_history(&self) -> Vec<f64> {
        self.model.loss_history()
    }

    /// Evaluate on a labelled dataset
    pub fn evaluate<D: Dataset>(&self, dataset: &D) -> Result<RegressionMetrics> {
        let predictions = self.predict_dataset(dataset)?;
        RegressionMetrics::compute(&dataset.get_targets(), &predictions, self.model.epsilon())
    }

    /// Evaluate on labelled samples
    pub fn evaluate_samples(&self, samples: &[Sample]) -> Result<RegressionMetrics> {
        let predictions = samples
            .iter()
            .map(|s| self.predict(&s.features))
            .collect::<Result<Vec<f64>>>()?;
        let targets: Vec<f64> = samples.iter().map(|s| s.target).collect();
        RegressionMetrics::compute(&targets, &predictions, self.model.epsilon())
    }

    /// Evaluate from CSV file
    pub fn evaluate_from_csv<P: AsRef<Path>>(&self, path: P) -> Result<RegressionMetrics> {
        let dataset = CSVDataset::from_file(path)?;
        self.evaluate(&dataset)
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            kernel: self.model.kernel().name().to_string(),
            gamma: self.model.kernel().gamma(),
            n_support_vectors: self.model.n_support_vectors(),
            intercept: self.model.intercept(),
            support_vector_indices: self.model.support_vector_indices().to_vec(),
            weights: self.model.weights().map(<[f64]>::to_vec),
            status: self.model.status(),
            iterations: self.model.iterations(),
            objective: self.model.objective(),
        }
    }

    /// Solver trace of the fit
    pub fn trace(&self) -> &OptimizationTrace {
        self.model.trace()
    }

    /// Get the underlying trained model
    pub fn inner(&self) -> &TrainedSVR {
        &self.model
    }
}

/// Regression error summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Σ max(0, |y − ŷ| − ε)²
    pub epsilon_loss: f64,
    /// Mean squared error
    pub mse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Number of evaluated samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute every metric from targets and predictions
    pub fn compute(targets: &[f64], predictions: &[f64], epsilon: f64) -> Result<Self> {
        let epsilon_loss = epsilon_insensitive_loss(targets, predictions, epsilon)?;
        if targets.is_empty() {
            return Err(SVRError::EmptyDataset);
        }
        let n = targets.len() as f64;
        let (sq, abs) = targets
            .iter()
            .zip(predictions)
            .fold((0.0, 0.0), |(sq, abs), (y, p)| {
                let err = y - p;
                (sq + err * err, abs + err.abs())
            });
        Ok(Self {
            epsilon_loss,
            mse: sq / n,
            mae: abs / n,
            n_samples: targets.len(),
        })
    }

    /// Root mean squared error
    pub fn rmse(&self) -> f64 {
        self.mse.sqrt()
    }
}

/// Model information
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub kernel: String,
    pub gamma: Option<f64>,
    pub n_support_vectors: usize,
    pub intercept: f64,
    pub support_vector_indices: Vec<usize>,
    pub weights: Option<Vec<f64>>,
    pub status: SolverStatus,
    pub iterations: usize,
    pub objective: f64,
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;

    /// Fit a linear SVR on CSV data with default parameters
    pub fn fit_csv<P: AsRef<Path>>(path: P) -> Result<TrainedModel> {
        SVR::new().fit_from_csv(path)
    }

    /// Fit on one CSV file and evaluate on another
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
    ) -> Result<RegressionMetrics> {
        let model = fit_csv(train_path)?;
        model.evaluate_from_csv(test_path)
    }

    /// Sequential holdout: fit on the first `train_ratio` of the data,
    /// evaluate on the rest
    pub fn holdout_validation<D: Dataset>(
        dataset: &D,
        train_ratio: f64,
        svr: SVR,
    ) -> Result<RegressionMetrics> {
        if train_ratio <= 0.0 || train_ratio >= 1.0 {
            return Err(SVRError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got: {train_ratio}"
            )));
        }

        let n = dataset.len();
        let train_size = (n as f64 * train_ratio) as usize;
        if train_size == 0 || train_size == n {
            return Err(SVRError::InvalidDataset(format!(
                "Cannot split {n} samples with train ratio {train_ratio}"
            )));
        }

        // Sequential split keeps runs reproducible
        let samples = dataset.samples();
        let (train, test) = samples.split_at(train_size);
        let model = svr.fit_samples(train)?;
        model.evaluate_samples(test)
    }
}
