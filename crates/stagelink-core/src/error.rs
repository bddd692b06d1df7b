//! Error types for stagelink-core.

use thiserror::Error;

/// Result type for stagelink-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors produced while building core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A string could not be parsed as an absolute scene path.
    #[error("invalid scene path '{path}': {reason}")]
    InvalidPath {
        /// The offending path text.
        path: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A type name did not name a known value type.
    #[error("unknown value type: {0}")]
    UnknownValueType(String),

    /// Import arguments could not be (de)serialized.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl CoreError {
    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }
}
