//! SVR training and the trained model
//!
//! [`SVROptimizer`] resolves the kernel, builds the Gram matrix, runs the
//! deflected subgradient solver and turns the dual solution into a
//! [`TrainedSVR`]: support vectors, intercept and, for the linear kernel, an
//! explicit weight vector.

use crate::core::{
    Dataset, GramMatrix, OptimizationTrace, RegressionModel, Result, SVRError, Sample,
    SolverConfig, SolverResult, SolverStatus,
};
use crate::kernel::{gram_matrix, kernel_row, Gamma, Kernel, KernelKind, ResolvedKernel};
use crate::solver::DeflectedSubgradient;
use log::{debug, info};
use std::fmt;
use std::time::Instant;

/// Dual variables with magnitude at or below this are not support vectors
pub const SUPPORT_TOLERANCE: f64 = 1e-6;

/// Gram matrix supplied by the caller together with the gamma it was built with
#[derive(Debug, Clone)]
pub struct PrecomputedKernel {
    pub gram: GramMatrix,
    /// Gamma used at prediction time; ignored for the linear kernel
    pub gamma: f64,
}

/// Support vectors of a dual solution and the intercept they imply
#[derive(Debug, Clone, PartialEq)]
pub struct SupportSet {
    /// Indices into the training set
    pub indices: Vec<usize>,
    /// β values at `indices`
    pub beta: Vec<f64>,
    /// Intercept: mean of per-vector bias estimates minus epsilon
    pub intercept: f64,
}

impl SupportSet {
    /// Support set of `beta`, falling back to every index holding the
    /// largest or smallest β when no component exceeds [`SUPPORT_TOLERANCE`]
    pub fn compute(beta: &[f64], targets: &[f64], gram: &GramMatrix, epsilon: f64) -> Self {
        let mut indices = active_indices(beta);
        if indices.is_empty() {
            indices = extremal_indices(beta);
        }
        Self::from_indices(indices, beta, targets, gram, epsilon)
    }

    /// Support set of `beta` without the fallback; `None` when nothing is active
    pub fn compute_strict(
        beta: &[f64],
        targets: &[f64],
        gram: &GramMatrix,
        epsilon: f64,
    ) -> Option<Self> {
        let indices = active_indices(beta);
        if indices.is_empty() {
            None
        } else {
            Some(Self::from_indices(indices, beta, targets, gram, epsilon))
        }
    }

    fn from_indices(
        indices: Vec<usize>,
        beta: &[f64],
        targets: &[f64],
        gram: &GramMatrix,
        epsilon: f64,
    ) -> Self {
        // Any single support vector yields a bias; averaging damps noise in β
        let bias_sum: f64 = indices
            .iter()
            .map(|&i| {
                let fitted: f64 = beta.iter().enumerate().map(|(j, b)| b * gram.get(j, i)).sum();
                targets[i] - fitted
            })
            .sum();
        let intercept = if indices.is_empty() {
            -epsilon
        } else {
            bias_sum / indices.len() as f64 - epsilon
        };

        Self {
            beta: indices.iter().map(|&i| beta[i]).collect(),
            indices,
            intercept,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn active_indices(beta: &[f64]) -> Vec<usize> {
    beta.iter()
        .enumerate()
        .filter(|(_, b)| b.abs() > SUPPORT_TOLERANCE)
        .map(|(i, _)| i)
        .collect()
}

/// Every index where β attains its maximum or its minimum
fn extremal_indices(beta: &[f64]) -> Vec<usize> {
    let max_value = beta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_value = beta.iter().copied().fold(f64::INFINITY, f64::min);
    beta.iter()
        .enumerate()
        .filter(|(_, &b)| b == max_value || b == min_value)
        .map(|(i, _)| i)
        .collect()
}

/// Epsilon-insensitive squared loss: Σ max(0, |yᵢ − ŷᵢ| − ε)²
pub fn epsilon_insensitive_loss(targets: &[f64], predictions: &[f64], epsilon: f64) -> Result<f64> {
    if targets.len() != predictions.len() {
        return Err(SVRError::DimensionMismatch {
            expected: targets.len(),
            actual: predictions.len(),
        });
    }
    Ok(targets
        .iter()
        .zip(predictions)
        .map(|(y, p)| {
            let excess = (y - p).abs() - epsilon;
            if excess > 0.0 {
                excess * excess
            } else {
                0.0
            }
        })
        .sum())
}

/// Trains SVR models for one kernel and hyperparameter setting
pub struct SVROptimizer {
    kernel: KernelKind,
    box_c: f64,
    epsilon: f64,
    config: SolverConfig,
}

impl SVROptimizer {
    /// Create a new optimizer
    pub fn new(kernel: KernelKind, box_c: f64, epsilon: f64, config: SolverConfig) -> Self {
        Self {
            kernel,
            box_c,
            epsilon,
            config,
        }
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

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Train an SVR model on the given dataset
    pub fn train<D: Dataset>(&self, dataset: &D) -> Result<TrainedSVR> {
        self.train_samples(&dataset.samples())
    }

    /// Train an SVR model on a slice of samples
    pub fn train_samples(&self, samples: &[Sample]) -> Result<TrainedSVR> {
        let features = self.validate(samples)?;
        let kernel = self.kernel.resolve(&features)?;
        let gram = gram_matrix(&kernel, &features);
        debug!(
            "Built {}x{} Gram matrix for {} kernel",
            gram.size(),
            gram.size(),
            kernel.name()
        );
        self.run(samples.to_vec(), kernel, gram)
    }

    /// Train with a Gram matrix computed elsewhere
    pub fn train_precomputed(
        &self,
        samples: &[Sample],
        precomputed: PrecomputedKernel,
    ) -> Result<TrainedSVR> {
        let features = self.validate(samples)?;
        if precomputed.gram.size() != samples.len() {
            return Err(SVRError::DimensionMismatch {
                expected: samples.len(),
                actual: precomputed.gram.size(),
            });
        }
        let gamma = Gamma::Value(precomputed.gamma);
        let kind = match self.kernel {
            KernelKind::Linear => KernelKind::Linear,
            KernelKind::Rbf { .. } => KernelKind::Rbf { gamma },
            KernelKind::Polynomial { degree, coef0, .. } => KernelKind::Polynomial {
                gamma,
                degree,
                coef0,
            },
            KernelKind::Sigmoid { coef0, .. } => KernelKind::Sigmoid { gamma, coef0 },
        };
        let kernel = kind.resolve(&features)?;
        self.run(samples.to_vec(), kernel, precomputed.gram)
    }

    /// Check hyperparameters and samples; returns the feature rows
    fn validate(&self, samples: &[Sample]) -> Result<Vec<Vec<f64>>> {
        if !(self.box_c.is_finite() && self.box_c > 0.0) {
            return Err(SVRError::InvalidParameter(format!(
                "Box constraint C must be positive, got: {}",
                self.box_c
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(SVRError::InvalidParameter(format!(
                "Epsilon must be non-negative, got: {}",
                self.epsilon
            )));
        }
        let first = samples.first().ok_or(SVRError::EmptyDataset)?;
        let dim = first.dim();
        for sample in samples {
            if sample.dim() != dim {
                return Err(SVRError::DimensionMismatch {
                    expected: dim,
                    actual: sample.dim(),
                });
            }
            if !sample.target.is_finite() || sample.features.iter().any(|v| !v.is_finite()) {
                return Err(SVRError::InvalidDataset(
                    "Samples must contain only finite values".to_string(),
                ));
            }
        }
        Ok(samples.iter().map(|s| s.features.clone()).collect())
    }

    fn run(
        &self,
        samples: Vec<Sample>,
        kernel: ResolvedKernel,
        gram: GramMatrix,
    ) -> Result<TrainedSVR> {
        let start = Instant::now();
        let targets: Vec<f64> = samples.iter().map(|s| s.target).collect();

        let mut config = self.config.clone();
        config.epsilon = Some(config.epsilon.unwrap_or(self.epsilon));
        let solver = DeflectedSubgradient::new(config);
        let result = solver.solve(&targets, &gram, self.box_c)?;

        let model = TrainedSVR::new(kernel, samples, gram, result, self.box_c, self.epsilon);
        info!(
            "Fit time: {:?}, #SV: {}, status: {}",
            start.elapsed(),
            model.n_support_vectors(),
            model.status()
        );
        Ok(model)
    }
}

/// A trained SVR model that can make predictions
#[derive(Debug, Clone)]
pub struct TrainedSVR {
    kernel: ResolvedKernel,
    samples: Vec<Sample>,
    gram: GramMatrix,
    beta: Vec<f64>,
    status: SolverStatus,
    iterations: usize,
    objective: f64,
    trace: OptimizationTrace,
    support: SupportSet,
    support_vectors: Vec<Vec<f64>>,
    /// Primal weights, linear kernel only
    weights: Option<Vec<f64>>,
    box_c: f64,
    epsilon: f64,
}

impl TrainedSVR {
    fn new(
        kernel: ResolvedKernel,
        samples: Vec<Sample>,
        gram: GramMatrix,
        result: SolverResult,
        box_c: f64,
        epsilon: f64,
    ) -> Self {
        let mut model = Self {
            kernel,
            samples,
            gram,
            beta: result.beta,
            status: result.status,
            iterations: result.iterations,
            objective: result.objective,
            trace: result.trace,
            support: SupportSet {
                indices: Vec::new(),
                beta: Vec::new(),
                intercept: 0.0,
            },
            support_vectors: Vec::new(),
            weights: None,
            box_c,
            epsilon,
        };
        model.recompute_support();
        model
    }

    fn targets(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.target).collect()
    }

    /// Rebuild the support set, intercept and linear weights from β
    fn recompute_support(&mut self) {
        self.support = SupportSet::compute(&self.beta, &self.targets(), &self.gram, self.epsilon);
        self.support_vectors = self
            .support
            .indices
            .iter()
            .map(|&i| self.samples[i].features.clone())
            .collect();

        self.weights = if self.kernel.is_linear() {
            let dim = self.samples.first().map_or(0, Sample::dim);
            let mut w = vec![0.0; dim];
            for (sv, &b) in self.support_vectors.iter().zip(&self.support.beta) {
                for (wk, xk) in w.iter_mut().zip(sv) {
                    *wk += b * xk;
                }
            }
            Some(w)
        } else {
            None
        };
    }

    fn check_dim(&self, x: &[f64]) -> Result<()> {
        let expected = self.dim();
        if x.len() != expected {
            return Err(SVRError::DimensionMismatch {
                expected,
                actual: x.len(),
            });
        }
        Ok(())
    }

    /// Predict through the kernel expansion β_sv · K(sv, x) + b, whatever the kernel
    pub fn predict_dual(&self, x: &[f64]) -> Result<f64> {
        self.check_dim(x)?;
        let row = kernel_row(&self.kernel, &self.support_vectors, x);
        let value: f64 = self.support.beta.iter().zip(&row).map(|(b, k)| b * k).sum();
        Ok(value + self.support.intercept)
    }

    /// Epsilon-insensitive squared loss with this model's epsilon
    pub fn loss(&self, targets: &[f64], predictions: &[f64]) -> Result<f64> {
        epsilon_insensitive_loss(targets, predictions, self.epsilon)
    }

    /// Training loss at every recorded solver iterate
    ///
    /// Requires `SolverConfig::record_iterates`; iterates without any active
    /// dual variable are skipped.
    pub fn loss_history(&self) -> Vec<f64> {
        let targets = self.targets();
        self.trace
            .iterates()
            .filter_map(|beta| {
                let support = SupportSet::compute_strict(beta, &targets, &self.gram, self.epsilon)?;
                let predictions: Vec<f64> = (0..targets.len())
                    .map(|i| {
                        support
                            .indices
                            .iter()
                            .zip(&support.beta)
                            .map(|(&j, b)| b * self.gram.get(j, i))
                            .sum::<f64>()
                            + support.intercept
                    })
                    .collect();
                epsilon_insensitive_loss(&targets, &predictions, self.epsilon).ok()
            })
            .collect()
    }

    /// Feature dimensionality the model expects
    pub fn dim(&self) -> usize {
        self.samples.first().map_or(0, Sample::dim)
    }

    /// Full dual vector
    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    pub fn support(&self) -> &SupportSet {
        &self.support
    }

    /// Feature vectors of the support vectors
    pub fn support_vectors(&self) -> &[Vec<f64>] {
        &self.support_vectors
    }

    /// Indices of support vectors in the training set
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support.indices
    }

    /// Primal weight vector; only available for the linear kernel
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn kernel(&self) -> &ResolvedKernel {
        &self.kernel
    }

    pub fn gram(&self) -> &GramMatrix {
        &self.gram
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Dual objective value at β
    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn trace(&self) -> &OptimizationTrace {
        &self.trace
    }

    pub fn box_constraint(&self) -> f64 {
        self.box_c
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl RegressionModel for TrainedSVR {
    fn predict(&self, x: &[f64]) -> Result<f64> {
        match &self.weights {
            Some(w) => {
                self.check_dim(x)?;
                let value: f64 = w.iter().zip(x).map(|(wk, xk)| wk * xk).sum();
                Ok(value + self.support.intercept)
            }
            None => self.predict_dual(x),
        }
    }

    fn n_support_vectors(&self) -> usize {
        self.support.len()
    }

    fn intercept(&self) -> f64 {
        self.support.intercept
    }
}

impl fmt::Display for TrainedSVR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kernel: {}", self.kernel.name())?;
        match &self.kernel {
            ResolvedKernel::Linear(_) => {
                if let Some(w) = &self.weights {
                    writeln!(f, "W: {w:?}")?;
                }
            }
            ResolvedKernel::Rbf(k) => writeln!(f, "Gamma: {}", k.gamma())?,
            ResolvedKernel::Polynomial(k) => writeln!(
                f,
                "Gamma: {}\tDegree: {}\tCoef: {}",
                k.gamma, k.degree, k.coef0
            )?,
            ResolvedKernel::Sigmoid(k) => writeln!(f, "Gamma: {}\tCoef: {}", k.gamma, k.coef0)?,
        }
        writeln!(f, "Intercept: {}", self.support.intercept)?;
        writeln!(
            f,
            "Solver: {} after {} iterations, objective {:.8e}",
            self.status, self.iterations, self.objective
        )?;
        writeln!(f, "Support vectors: {}", self.support.len())?;
        write!(f, "Box: {}\tEpsilon: {}", self.box_c, self.epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepSizeRule;
    use approx::assert_abs_diff_eq;

    fn line_samples() -> Vec<Sample> {
        (0..6)
            .map(|i| {
                let x = i as f64 * 0.5;
                Sample::new(vec![x], 2.0 * x + 1.0)
            })
            .collect()
    }

    fn quick_config() -> SolverConfig {
        SolverConfig {
            max_iterations: 2000,
            ..SolverConfig::default()
        }
    }

    #[test]
    fn test_support_set_threshold() {
        let gram = GramMatrix::from_fn(3, |i, j| if i == j { 1.0 } else { 0.0 });
        let set = SupportSet::compute(&[0.5, 1e-9, -0.5], &[1.0, 0.0, -1.0], &gram, 0.1);
        assert_eq!(set.indices, vec![0, 2]);
        assert_eq!(set.beta, vec![0.5, -0.5]);
        // Bias estimates: 1 - 0.5 = 0.5 and -1 + 0.5 = -0.5; mean 0, minus ε
        assert_abs_diff_eq!(set.intercept, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_support_set_extremal_fallback() {
        let gram = GramMatrix::from_fn(3, |_, _| 0.0);
        let set = SupportSet::compute(&[1e-8, -2e-8, 0.0], &[1.0, 2.0, 3.0], &gram, 0.0);
        assert_eq!(set.indices, vec![0, 1]);
        assert_abs_diff_eq!(set.intercept, 1.5, epsilon = 1e-12);

        assert!(SupportSet::compute_strict(&[1e-8, -2e-8, 0.0], &[1.0, 2.0, 3.0], &gram, 0.0)
            .is_none());
    }

    #[test]
    fn test_support_set_all_zero_averages_every_bias() {
        let gram = GramMatrix::from_fn(3, |_, _| 1.0);
        let set = SupportSet::compute(&[0.0, 0.0, 0.0], &[1.0, 3.0, 8.0], &gram, 0.5);
        assert_eq!(set.indices, vec![0, 1, 2]);
        // mean(y) − ε
        assert_abs_diff_eq!(set.intercept, 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_support_set_fallback_keeps_ties() {
        let gram = GramMatrix::from_fn(4, |_, _| 0.0);
        let set = SupportSet::compute(&[1e-8, -1e-8, 1e-8, 0.0], &[1.0, 2.0, 3.0, 4.0], &gram, 0.0);
        assert_eq!(set.indices, vec![0, 1, 2]);
        assert_abs_diff_eq!(set.intercept, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_targets_inside_tube_predict_mean() {
        // Every target within ε of 0: β = 0 is optimal and b = mean(y) − ε
        let samples = vec![
            Sample::new(vec![0.0], 0.05),
            Sample::new(vec![1.0], -0.02),
            Sample::new(vec![2.0], 0.09),
        ];
        let model = SVROptimizer::new(KernelKind::Linear, 1.0, 0.1, quick_config())
            .train_samples(&samples)
            .unwrap();
        assert!(model.beta().iter().all(|&b| b == 0.0));
        assert_eq!(model.n_support_vectors(), 3);
        assert_abs_diff_eq!(model.intercept(), 0.04 - 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(model.predict(&[5.0]).unwrap(), -0.06, epsilon = 1e-12);
    }

    #[test]
    fn test_epsilon_insensitive_loss() {
        // Errors 0.05, 0.5, 1.0 with ε = 0.1: 0 + 0.16 + 0.81
        let loss = epsilon_insensitive_loss(&[1.0, 2.0, 3.0], &[1.05, 2.5, 2.0], 0.1).unwrap();
        assert_abs_diff_eq!(loss, 0.97, epsilon = 1e-12);

        assert!(matches!(
            epsilon_insensitive_loss(&[1.0], &[1.0, 2.0], 0.1),
            Err(SVRError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_train_linear_model() {
        let optimizer = SVROptimizer::new(KernelKind::Linear, 10.0, 0.1, quick_config());
        let model = optimizer.train_samples(&line_samples()).unwrap();

        assert!(model.n_support_vectors() > 0);
        assert_eq!(model.weights().map(<[f64]>::len), Some(1));
        assert_eq!(model.beta().len(), 6);
        assert_abs_diff_eq!(model.beta().iter().sum::<f64>(), 0.0, epsilon = 1e-9);
        assert!(model.beta().iter().all(|b| b.abs() <= 10.0 + 1e-12));
    }

    #[test]
    fn test_linear_prediction_matches_kernel_expansion() {
        let optimizer = SVROptimizer::new(KernelKind::Linear, 10.0, 0.1, quick_config());
        let model = optimizer.train_samples(&line_samples()).unwrap();

        for x in [-1.0, 0.3, 1.7, 4.0] {
            let primal = model.predict(&[x]).unwrap();
            let dual = model.predict_dual(&[x]).unwrap();
            assert_abs_diff_eq!(primal, dual, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rbf_model_has_no_weights() {
        let kernel = KernelKind::Rbf {
            gamma: Gamma::Value(0.5),
        };
        let model = SVROptimizer::new(kernel, 1.0, 0.1, quick_config())
            .train_samples(&line_samples())
            .unwrap();
        assert!(model.weights().is_none());
        assert_eq!(model.kernel().gamma(), Some(0.5));
        assert!(model.predict(&[1.0]).unwrap().is_finite());
    }

    #[test]
    fn test_predict_dimension_mismatch() {
        let model = SVROptimizer::new(KernelKind::Linear, 1.0, 0.1, quick_config())
            .train_samples(&line_samples())
            .unwrap();
        assert!(matches!(
            model.predict(&[1.0, 2.0]),
            Err(SVRError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_train_validation() {
        let samples = line_samples();
        let bad_box = SVROptimizer::new(KernelKind::Linear, 0.0, 0.1, quick_config());
        assert!(matches!(
            bad_box.train_samples(&samples),
            Err(SVRError::InvalidParameter(_))
        ));

        let bad_eps = SVROptimizer::new(KernelKind::Linear, 1.0, -0.1, quick_config());
        assert!(bad_eps.train_samples(&samples).is_err());

        let optimizer = SVROptimizer::new(KernelKind::Linear, 1.0, 0.1, quick_config());
        assert!(matches!(
            optimizer.train_samples(&[]),
            Err(SVRError::EmptyDataset)
        ));

        let ragged = vec![Sample::new(vec![1.0], 1.0), Sample::new(vec![1.0, 2.0], 2.0)];
        assert!(matches!(
            optimizer.train_samples(&ragged),
            Err(SVRError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_train_precomputed_matches_internal_gram() {
        let samples = line_samples();
        let kernel = KernelKind::Rbf {
            gamma: Gamma::Value(0.7),
        };
        let optimizer = SVROptimizer::new(kernel, 1.0, 0.1, quick_config());

        let features: Vec<Vec<f64>> = samples.iter().map(|s| s.features.clone()).collect();
        let resolved = kernel.resolve(&features).unwrap();
        let gram = gram_matrix(&resolved, &features);

        let internal = optimizer.train_samples(&samples).unwrap();
        let external = optimizer
            .train_precomputed(&samples, PrecomputedKernel { gram, gamma: 0.7 })
            .unwrap();

        assert_eq!(internal.beta(), external.beta());
        assert_eq!(internal.intercept(), external.intercept());
    }

    #[test]
    fn test_train_precomputed_size_mismatch() {
        let optimizer = SVROptimizer::new(KernelKind::Linear, 1.0, 0.1, quick_config());
        let gram = GramMatrix::from_fn(2, |_, _| 0.0);
        assert!(matches!(
            optimizer.train_precomputed(&line_samples(), PrecomputedKernel { gram, gamma: 1.0 }),
            Err(SVRError::DimensionMismatch {
                expected: 6,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_loss_history_follows_recorded_iterates() {
        let config = SolverConfig {
            max_iterations: 50,
            record_iterates: true,
            step_size: StepSizeRule::Constant { length: 0.1 },
            ..SolverConfig::default()
        };
        let model = SVROptimizer::new(KernelKind::Linear, 1.0, 0.1, config)
            .train_samples(&line_samples())
            .unwrap();

        let history = model.loss_history();
        // The first iterate is β = 0, which has no active component
        assert!(history.len() < model.trace().len());
        assert!(!history.is_empty());
        assert!(history.iter().all(|l| *l >= 0.0));
    }

    #[test]
    fn test_display_summary() {
        let model = SVROptimizer::new(KernelKind::Linear, 1.0, 0.1, quick_config())
            .train_samples(&line_samples())
            .unwrap();
        let summary = model.to_string();
        assert!(summary.contains("Kernel: linear"));
        assert!(summary.contains("Intercept:"));
        assert!(summary.contains("Box: 1"));
    }
}
