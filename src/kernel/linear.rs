//! Linear kernel implementation

use crate::kernel::traits::{dot_product, Kernel};

/// Linear kernel: K(x, y) = x^T * y
///
/// With this kernel the trained regressor collapses to an explicit weight
/// vector, so prediction skips kernel evaluation entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        dot_product(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_kernel_basic() {
        let kernel = LinearKernel::new();
        // 1*4 + 2*5 + 3*6 = 32
        assert_eq!(kernel.compute(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_linear_kernel_identical() {
        let kernel = LinearKernel::new();
        let x = [1.0, 2.0, 3.0];
        assert_eq!(kernel.compute(&x, &x), 14.0);
    }

    #[test]
    fn test_linear_kernel_orthogonal() {
        let kernel = LinearKernel::new();
        assert_eq!(kernel.compute(&[1.0, 0.0], &[0.0, 2.0]), 0.0);
    }

    #[test]
    fn test_linear_kernel_empty() {
        assert_eq!(LinearKernel::new().compute(&[], &[]), 0.0);
    }
}
