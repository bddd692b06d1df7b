//! Error types for stagelink-stage.

use stagelink_core::{CoreError, ScenePath};
use thiserror::Error;

/// Result type for stagelink-stage operations.
pub type Result<T> = std::result::Result<T, StageError>;

/// Errors from opening and editing stages.
#[derive(Debug, Error)]
pub enum StageError {
    /// The root layer file could not be read.
    #[error("cannot open layer '{path}': {source}")]
    Open {
        /// The file path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A layer file is not a valid layer document.
    #[error("layer parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A layer contains an invalid path or type.
    #[error("invalid layer data: {0}")]
    Core(#[from] CoreError),

    /// Two sibling prims share a name.
    #[error("duplicate prim path: {0}")]
    DuplicatePrim(ScenePath),

    /// No prim exists at the path.
    #[error("no prim at {0}")]
    PrimNotFound(ScenePath),

    /// The prim has no variant set with this name.
    #[error("prim {path} has no variant set '{set}'")]
    VariantSetNotFound {
        /// The prim path.
        path: ScenePath,
        /// The requested set.
        set: String,
    },
}

impl StageError {
    /// Create an open error.
    pub fn open(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}
