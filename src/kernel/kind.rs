//! Kernel selection and Gram matrix construction
//!
//! [`KernelKind`] is what a user configures; resolving it against training
//! data fixes gamma and yields a [`ResolvedKernel`] that is used both for the
//! training Gram matrix and for kernel rows at prediction time.

use crate::core::{GramMatrix, Result, SVRError};
use crate::kernel::{Kernel, LinearKernel, PolynomialKernel, RBFKernel, SigmoidKernel};
use std::fmt;
use std::str::FromStr;

/// Gamma setting shared by the rbf, polynomial and sigmoid kernels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gamma {
    /// 1 / (n_features · Var(X)), with Var over every entry of X
    #[default]
    Scale,
    /// 1 / n_features
    Auto,
    /// Explicit positive value
    Value(f64),
}

impl Gamma {
    /// Resolve to a concrete value for the given training features
    pub fn resolve(&self, features: &[Vec<f64>]) -> Result<f64> {
        let gamma = match *self {
            Gamma::Value(g) => g,
            Gamma::Scale | Gamma::Auto => {
                let dim = features.first().map(Vec::len).ok_or(SVRError::EmptyDataset)?;
                if dim == 0 {
                    return Err(SVRError::InvalidDataset(
                        "Cannot derive gamma from zero-dimensional features".to_string(),
                    ));
                }
                let dim = dim as f64;
                if *self == Gamma::Auto {
                    1.0 / dim
                } else {
                    let variance = feature_variance(features);
                    if variance > 0.0 && variance.is_finite() {
                        1.0 / (dim * variance)
                    } else {
                        1.0
                    }
                }
            }
        };

        if gamma.is_finite() && gamma > 0.0 {
            Ok(gamma)
        } else {
            Err(SVRError::InvalidParameter(format!(
                "Gamma must be positive, got: {gamma}"
            )))
        }
    }
}

impl FromStr for Gamma {
    type Err = SVRError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "scale" => Ok(Gamma::Scale),
            "auto" => Ok(Gamma::Auto),
            other => other
                .parse::<f64>()
                .map(Gamma::Value)
                .map_err(|_| SVRError::ParseError(format!("Invalid gamma: {other}"))),
        }
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gamma::Scale => write!(f, "scale"),
            Gamma::Auto => write!(f, "auto"),
            Gamma::Value(g) => write!(f, "{g}"),
        }
    }
}

/// Population variance over all entries of a feature matrix
fn feature_variance(features: &[Vec<f64>]) -> f64 {
    let count = features.iter().map(Vec::len).sum::<usize>() as f64;
    if count == 0.0 {
        return 0.0;
    }
    let mean = features.iter().flatten().sum::<f64>() / count;
    features
        .iter()
        .flatten()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / count
}

/// The four supported kernel families with their hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum KernelKind {
    #[default]
    Linear,
    Rbf {
        gamma: Gamma,
    },
    Polynomial {
        gamma: Gamma,
        degree: u32,
        coef0: f64,
    },
    Sigmoid {
        gamma: Gamma,
        coef0: f64,
    },
}

impl KernelKind {
    /// Short identifier: `linear`, `rbf`, `poly` or `sigmoid`
    pub fn name(&self) -> &'static str {
        match self {
            KernelKind::Linear => "linear",
            KernelKind::Rbf { .. } => "rbf",
            KernelKind::Polynomial { .. } => "poly",
            KernelKind::Sigmoid { .. } => "sigmoid",
        }
    }

    /// Build a kernel from its identifier and hyperparameters
    ///
    /// Hyperparameters a family does not use are ignored.
    pub fn from_parts(name: &str, gamma: Gamma, degree: u32, coef0: f64) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(KernelKind::Linear),
            "rbf" => Ok(KernelKind::Rbf { gamma }),
            "poly" | "polynomial" => Ok(KernelKind::Polynomial {
                gamma,
                degree,
                coef0,
            }),
            "sigmoid" => Ok(KernelKind::Sigmoid { gamma, coef0 }),
            other => Err(SVRError::UnknownKernel(other.to_string())),
        }
    }

    /// Fix gamma against the training features and validate hyperparameters
    pub fn resolve(&self, features: &[Vec<f64>]) -> Result<ResolvedKernel> {
        Ok(match *self {
            KernelKind::Linear => ResolvedKernel::Linear(LinearKernel::new()),
            KernelKind::Rbf { gamma } => {
                ResolvedKernel::Rbf(RBFKernel::new(gamma.resolve(features)?))
            }
            KernelKind::Polynomial {
                gamma,
                degree,
                coef0,
            } => {
                if degree == 0 {
                    return Err(SVRError::InvalidParameter(
                        "Polynomial degree must be at least 1".to_string(),
                    ));
                }
                check_coef0(coef0)?;
                ResolvedKernel::Polynomial(PolynomialKernel::new(
                    degree,
                    gamma.resolve(features)?,
                    coef0,
                ))
            }
            KernelKind::Sigmoid { gamma, coef0 } => {
                check_coef0(coef0)?;
                ResolvedKernel::Sigmoid(SigmoidKernel::new(gamma.resolve(features)?, coef0))
            }
        })
    }
}

fn check_coef0(coef0: f64) -> Result<()> {
    if coef0.is_finite() {
        Ok(())
    } else {
        Err(SVRError::InvalidParameter(format!(
            "coef0 must be finite, got: {coef0}"
        )))
    }
}

impl FromStr for KernelKind {
    type Err = SVRError;

    /// Parse a bare kernel name with default hyperparameters
    /// (gamma = scale, degree = 1, coef0 = 0)
    fn from_str(s: &str) -> Result<Self> {
        KernelKind::from_parts(s, Gamma::Scale, 1, 0.0)
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelKind::Linear => write!(f, "linear"),
            KernelKind::Rbf { gamma } => write!(f, "rbf(gamma={gamma})"),
            KernelKind::Polynomial {
                gamma,
                degree,
                coef0,
            } => write!(f, "poly(gamma={gamma}, degree={degree}, coef0={coef0})"),
            KernelKind::Sigmoid { gamma, coef0 } => {
                write!(f, "sigmoid(gamma={gamma}, coef0={coef0})")
            }
        }
    }
}

/// A kernel with every hyperparameter fixed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedKernel {
    Linear(LinearKernel),
    Rbf(RBFKernel),
    Polynomial(PolynomialKernel),
    Sigmoid(SigmoidKernel),
}

impl ResolvedKernel {
    /// Resolved gamma; `None` for the linear kernel
    pub fn gamma(&self) -> Option<f64> {
        match self {
            ResolvedKernel::Linear(_) => None,
            ResolvedKernel::Rbf(k) => Some(k.gamma()),
            ResolvedKernel::Polynomial(k) => Some(k.gamma),
            ResolvedKernel::Sigmoid(k) => Some(k.gamma),
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, ResolvedKernel::Linear(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResolvedKernel::Linear(_) => "linear",
            ResolvedKernel::Rbf(_) => "rbf",
            ResolvedKernel::Polynomial(_) => "poly",
            ResolvedKernel::Sigmoid(_) => "sigmoid",
        }
    }
}

impl Kernel for ResolvedKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            ResolvedKernel::Linear(k) => k.compute(x, y),
            ResolvedKernel::Rbf(k) => k.compute(x, y),
            ResolvedKernel::Polynomial(k) => k.compute(x, y),
            ResolvedKernel::Sigmoid(k) => k.compute(x, y),
        }
    }
}

/// Gram matrix K(i, j) = kernel(rows[i], rows[j])
///
/// Only the upper triangle is evaluated; the lower one is mirrored.
pub fn gram_matrix<K: Kernel + ?Sized>(kernel: &K, rows: &[Vec<f64>]) -> GramMatrix {
    let n = rows.len();
    let upper: Vec<Vec<f64>> = (0..n)
        .map(|i| (i..n).map(|j| kernel.compute(&rows[i], &rows[j])).collect())
        .collect();
    GramMatrix::from_fn(n, |i, j| {
        if i <= j {
            upper[i][j - i]
        } else {
            upper[j][i - j]
        }
    })
}

/// Kernel values between every support vector and one query point
pub fn kernel_row<K: Kernel + ?Sized>(kernel: &K, support: &[Vec<f64>], x: &[f64]) -> Vec<f64> {
    support.iter().map(|sv| kernel.compute(sv, x)).collect()
}
