//! Error types for SVR implementation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SVRError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown kernel: {0} (expected linear, rbf, poly or sigmoid)")]
    UnknownKernel(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SVRError>;
