//! Error types for stagelink-xform.

use thiserror::Error;

/// Result type for stagelink-xform operations.
pub type Result<T> = std::result::Result<T, XformError>;

/// Errors from decomposition and op evaluation.
#[derive(Debug, Error, PartialEq)]
pub enum XformError {
    /// An axis has (near) zero length, so no rotation can be recovered.
    #[error("degenerate scale on axis {axis}")]
    DegenerateScale {
        /// 0 = x, 1 = y, 2 = z.
        axis: usize,
    },

    /// The matrix contains NaN or infinite entries.
    #[error("matrix has non-finite entries")]
    NonFinite,

    /// An inverted op's matrix has no inverse.
    #[error("op '{0}' is not invertible")]
    NonInvertible(String),

    /// An op name could not be parsed.
    #[error("invalid xform op name: {0}")]
    InvalidOpName(String),

    /// An op was given a value of the wrong shape.
    #[error("op '{op}' expects a {expected} value")]
    ValueMismatch {
        /// The op name.
        op: String,
        /// The value shape it expects.
        expected: &'static str,
    },
}
