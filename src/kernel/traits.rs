//! Kernel trait definition

/// Kernel function trait
///
/// A kernel function K(x, y) over dense feature vectors. The sigmoid kernel is
/// not positive semi-definite in general, so implementations are not required
/// to satisfy Mercer's condition; the dual solver tolerates indefinite Gram
/// matrices.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    ///
    /// Both slices must have the same length.
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;
}

/// Dot product of two equally long dense vectors
pub fn dot_product(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Squared Euclidean distance between two equally long dense vectors
pub fn squared_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}
