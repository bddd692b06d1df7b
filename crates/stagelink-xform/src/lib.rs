//! stagelink-xform: transform decomposition for the stagelink import bridge.
//!
//! Pure numerics with no scene-graph dependency:
//!
//! - [`components`]: 4x4 local matrix <-> translate/rotate/scale/shear/pivots
//! - [`rotation`]: rotation orders, Euler extraction, Euler filtering,
//!   axis-angle conversion
//! - [`ops`]: named xform operations and their matrices
//! - [`stack`]: greedy matching of an op list against the canonical host stack
//!
//! # Conventions
//!
//! Matrices are glam column-vector matrices (`p' = M * p`). Stage matrices
//! (row-vector, stored as rows) convert with [`matrix_from_rows`]. All
//! angles crossing the public API are in degrees.

pub mod components;
pub mod error;
pub mod ops;
pub mod rotation;
pub mod stack;

pub use components::{components_from_matrix, components_from_matrix_with_order, matrix_from_components, TransformComponents};
pub use error::{Result, XformError};
pub use ops::{compose_ops, parse_op_order, OpOrder, OpValue, Precision, XformOp, XformOpType, RESET_XFORM_STACK};
pub use rotation::{
    axis_angle_to_euler, euler_to_axis_angle, euler_to_matrix, filter_euler, matrix_to_euler, quat_to_euler,
    EulerFilter, RotationOrder,
};
pub use stack::{match_canonical_stack, HostSlot, MatchedOp, MatchedStack, XformStack};

use glam::DMat4;

/// Convert a row-major, row-vector matrix (as stored by a stage) to glam.
pub fn matrix_from_rows(rows: &[[f64; 4]; 4]) -> DMat4 {
    DMat4::from_cols_array_2d(rows)
}

/// Convert a glam matrix back to stage row storage.
pub fn matrix_to_rows(matrix: &DMat4) -> [[f64; 4]; 4] {
    matrix.to_cols_array_2d()
}
