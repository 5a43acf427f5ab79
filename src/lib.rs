//! Rust implementation of epsilon-insensitive Support Vector Regression (SVR)
//!
//! The dual problem is solved by a deflected subgradient method whose
//! iterates are kept feasible by an exact projection onto the box-equality
//! set `{β : −C ≤ βᵢ ≤ C, Σ βᵢ = s}`.

pub mod api;
pub mod core;
pub mod data;
pub mod kernel;
pub mod optimizer;
pub mod solver;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{ModelInfo, RegressionMetrics, TrainedModel, SVR};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::CSVDataset;
pub use crate::kernel::{Gamma, Kernel, KernelKind, ResolvedKernel};
pub use crate::optimizer::{PrecomputedKernel, SVROptimizer, TrainedSVR};
pub use crate::solver::{project_box_equality, DeflectedSubgradient};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
