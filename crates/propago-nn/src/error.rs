//! Error types for propago-nn.

use thiserror::Error;

/// Model construction, training and inference error.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Graph construction error.
    #[error(transparent)]
    Graph(#[from] propago_graph::Error),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Model kind not recognized.
    #[error("Unknown model type: {0}")]
    UnknownModel(String),

    /// Training error.
    #[error("training error: {0}")]
    Training(String),

    /// A model produced NaN or infinite values.
    #[error("non-finite values in {0}")]
    NonFinite(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
