//! Data loading and dataset implementations
//!
//! Regression data is read from dense CSV files whose last column is the target.

pub mod csv;

pub use self::csv::*;
