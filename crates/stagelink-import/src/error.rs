//! Error types for stagelink-import.

use stagelink_core::{CoreError, ScenePath};
use stagelink_host::{AnimCurveType, HostError};
use stagelink_stage::StageError;
use stagelink_xform::XformError;
use thiserror::Error;

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors raised while importing a stage.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The stage could not be opened or edited.
    #[error("stage error: {0}")]
    Stage(#[from] StageError),

    /// A host graph call failed.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Transform decomposition failed.
    #[error("xform error: {0}")]
    Xform(#[from] XformError),

    /// A path or value could not be built.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The requested time interval has `min > max`.
    #[error("invalid time interval [{min}, {max}]")]
    InvalidTimeInterval {
        /// Requested start.
        min: f64,
        /// Requested end.
        max: f64,
    },

    /// Nothing under the root passes the traversal predicate.
    #[error("no prims to import under {0}")]
    EmptyTraversal(ScenePath),

    /// A translator is already registered for the type.
    #[error("translator already registered for type '{0}'")]
    DuplicateTranslator(String),

    /// A shading mode importer is already registered under the name.
    #[error("shading mode '{0}' already registered")]
    DuplicateShadingMode(String),

    /// Translators cannot be registered for an empty type name.
    #[error("invalid translator type name '{0}'")]
    InvalidTypeName(String),

    /// An existing curve on the plug has a type that cannot take these keys.
    #[error("plug '{plug}' is driven by an unsupported {found:?} curve (expected {expected:?})")]
    UnsupportedAnimCurve {
        /// Plug name.
        plug: String,
        /// Type of the connected curve.
        found: AnimCurveType,
        /// Type the plug needs.
        expected: AnimCurveType,
    },

    /// A plug holds a value of a different shape than requested.
    #[error("plug '{plug}' does not hold a {expected} value")]
    PlugValue {
        /// Plug name.
        plug: String,
        /// Requested value shape.
        expected: &'static str,
    },

    /// A caller buffer is shorter than the array it should receive.
    #[error("buffer holds {got} elements but the array has {needed}")]
    BufferTooSmall {
        /// Array length.
        needed: usize,
        /// Buffer length.
        got: usize,
    },

    /// A stage value does not match the plug type of its declared type.
    #[error("value of attribute '{0}' does not fit its host plug type")]
    UnsupportedValue(String),
}

impl ImportError {
    /// Create a plug value error.
    pub fn plug_value(plug: impl Into<String>, expected: &'static str) -> Self {
        Self::PlugValue {
            plug: plug.into(),
            expected,
        }
    }
}
