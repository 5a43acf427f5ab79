//! Core type definitions for SVR

use crate::core::{Result, SVRError};
use serde::{Deserialize, Serialize};

/// Training sample with a dense feature vector and a regression target
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Feature vector
    pub features: Vec<f64>,
    /// Regression target
    pub target: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: Vec<f64>, target: f64) -> Self {
        Self { features, target }
    }

    /// Dimensionality of the feature vector
    pub fn dim(&self) -> usize {
        self.features.len()
    }
}

/// Dense square kernel (Gram) matrix stored row-major
///
/// The solver only reads it. Symmetry and positive semi-definiteness are
/// expected from the producer but never checked, since numerically computed
/// kernels are often only approximately PSD.
#[derive(Clone, Debug, PartialEq)]
pub struct GramMatrix {
    size: usize,
    values: Vec<f64>,
}

impl GramMatrix {
    /// Build an `size × size` matrix from an entry function
    pub fn from_fn<F: FnMut(usize, usize) -> f64>(size: usize, mut f: F) -> Self {
        let mut values = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                values.push(f(i, j));
            }
        }
        Self { size, values }
    }

    /// Build a matrix from explicit rows, which must form a square
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for row in rows {
            if row.len() != size {
                return Err(SVRError::DimensionMismatch {
                    expected: size,
                    actual: row.len(),
                });
            }
            values.extend(row);
        }
        Ok(Self { size, values })
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Entry K(i, j)
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Row i as a slice
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// Matrix-vector product K·v
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        (0..self.size)
            .map(|i| self.row(i).iter().zip(v).map(|(k, x)| k * x).sum())
            .collect()
    }

    /// Quadratic form vᵀ·K·v
    pub fn quadratic_form(&self, v: &[f64]) -> f64 {
        self.mul_vec(v).iter().zip(v).map(|(kv, x)| kv * x).sum()
    }

    /// True if every entry is finite
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Step-size schedule of the deflected subgradient method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum StepSizeRule {
    /// Polyak step against a known optimal value: ν = α (f − f*) / ‖d‖²
    Polyak { alpha: f64, f_star: f64 },
    /// Polyak step against a moving target level f_best − δ
    ///
    /// δ starts at `delta` times 2C·√n·‖g₀‖, a bound on the initial
    /// optimality gap. A drop of f_best by δ/2 multiplies δ by `growth`;
    /// `patience` iterations without one multiply it by `rho`. δ never
    /// exceeds the certified gap f_best − lower bound.
    TargetLevel {
        alpha: f64,
        /// Initial level gap, relative to the initial gap bound
        delta: f64,
        rho: f64,
        patience: usize,
        growth: f64,
        /// Floor for δ after a shrink
        delta_min: f64,
    },
    /// ν = a / ((k + 1) ‖d‖)
    Diminishing { a: f64 },
    /// ν = length / ‖d‖
    Constant { length: f64 },
}

impl Default for StepSizeRule {
    fn default() -> Self {
        Self::TargetLevel {
            alpha: 0.4,
            delta: 0.5,
            rho: 0.5,
            patience: 20,
            growth: 2.0,
            delta_min: 0.0,
        }
    }
}

/// Configuration for the dual solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Step-size schedule
    pub step_size: StepSizeRule,
    /// Weight of the fresh subgradient in the search direction, in (0, 1]
    pub deflection: f64,
    /// Convergence tolerance (relative to max(1, |f|))
    pub tolerance: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Epsilon-tube half-width; the model's epsilon is used when unset
    pub epsilon: Option<f64>,
    /// Required value of Σβ
    pub equality_target: f64,
    /// Optional starting point (projected onto the feasible set before use)
    pub warm_start: Option<Vec<f64>>,
    /// Iterations without sufficient improvement before the non-Polyak rules stop
    pub stall_window: usize,
    /// Keep a copy of every iterate in the trace
    pub record_iterates: bool,
    /// Emit a debug log line every this many iterations (0 disables)
    pub log_every: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            step_size: StepSizeRule::default(),
            deflection: 0.4,
            tolerance: 1e-6,
            max_iterations: 10_000,
            epsilon: None,
            equality_target: 0.0,
            warm_start: None,
            stall_window: 100,
            record_iterates: false,
            log_every: 1000,
        }
    }
}

/// How the solver stopped; neither outcome is an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverStatus {
    /// The gap certificate, a zero direction or the rule's own test stopped the run
    Converged,
    /// The iteration budget ran out first
    MaxIterations,
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::MaxIterations => write!(f, "max-iterations"),
        }
    }
}

/// One recorded solver iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub iteration: usize,
    /// Objective value at this iterate
    pub objective: f64,
    /// Best objective value seen so far
    pub best_objective: f64,
    /// Current estimate of the optimal value
    pub optimum_estimate: f64,
    /// Best certified lower bound on the optimal value so far
    pub lower_bound: f64,
    /// Step size used to leave this iterate
    pub step_size: f64,
    /// The iterate itself, when iterates are recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterate: Option<Vec<f64>>,
}

/// Per-iteration history of a solver run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationTrace {
    entries: Vec<TraceEntry>,
}

impl OptimizationTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Objective values in iteration order
    pub fn objectives(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.objective).collect()
    }

    /// Best objective value reached over the whole run
    pub fn best_objective(&self) -> Option<f64> {
        self.entries.last().map(|e| e.best_objective)
    }

    /// Last estimate of the optimal value
    pub fn optimum_estimate(&self) -> Option<f64> {
        self.entries.last().map(|e| e.optimum_estimate)
    }

    /// Distance between the best value and the best lower bound at the end
    pub fn certified_gap(&self) -> Option<f64> {
        self.entries.last().map(|e| e.best_objective - e.lower_bound)
    }

    /// Recorded iterates, skipping entries that carry none
    pub fn iterates(&self) -> impl Iterator<Item = &[f64]> {
        self.entries.iter().filter_map(|e| e.iterate.as_deref())
    }
}

/// Result of a dual solver run
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// Best feasible dual vector found
    pub beta: Vec<f64>,
    pub status: SolverStatus,
    /// Number of iterations performed
    pub iterations: usize,
    /// Objective value at `beta`
    pub objective: f64,
    pub trace: OptimizationTrace,
}
