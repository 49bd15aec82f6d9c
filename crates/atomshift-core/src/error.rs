//! Error types for the clustering engine

use thiserror::Error;

/// Result type alias for clustering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Clustering engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid request parameter or parameter combination
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough points for the requested operation
    #[error("Insufficient data: need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Atom dump parsing error
    #[error("Failed to parse dump '{path}': {message}")]
    DumpParse { path: String, message: String },

    /// Numeric failure during estimation or clustering
    #[error("Numeric failure: {0}")]
    Numeric(String),

    /// Wall-clock budget exhausted before the recursion completed
    #[error("Clustering exceeded the wall-clock budget of {0}s")]
    BudgetExceeded(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create a dump parse error
    pub fn dump_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DumpParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a numeric error
    pub fn numeric(message: impl Into<String>) -> Self {
        Self::Numeric(message.into())
    }
}
