//! Error types for propago-graph.

use thiserror::Error;

/// Graph construction and analysis error.
#[derive(Debug, Error)]
pub enum Error {
    /// Dimension mismatch between two inputs.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An input that must be non-empty was empty.
    #[error("empty input: {0}")]
    Empty(&'static str),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
