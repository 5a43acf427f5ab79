//! Core traits for SVR implementation

use crate::core::{Result, Sample};

/// Dataset abstraction for regression data
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Get a single sample by index
    ///
    /// # Panics
    /// Panics if index >= len()
    fn get_sample(&self, i: usize) -> Sample;

    /// Get all samples in order
    fn samples(&self) -> Vec<Sample> {
        (0..self.len()).map(|i| self.get_sample(i)).collect()
    }

    /// Get all regression targets as a vector
    fn get_targets(&self) -> Vec<f64>;

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trained regression model
pub trait RegressionModel: Send + Sync {
    /// Predict the target of a single feature vector
    fn predict(&self, x: &[f64]) -> Result<f64>;

    /// Predict many feature vectors, failing on the first bad one
    fn predict_batch(&self, xs: &[Vec<f64>]) -> Result<Vec<f64>> {
        xs.iter().map(|x| self.predict(x)).collect()
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the intercept term
    fn intercept(&self) -> f64;
}
