//! stagelink-stage: the scene description side of the import bridge.
//!
//! The import job reads scenes through the [`Stage`] trait. This crate also
//! provides an in-memory implementation:
//!
//! - [`Layer`]: authored prim specs, loadable from JSON files
//! - [`MemoryStage`]: a root layer composed with a [`SessionLayer`] of
//!   variant selections
//! - [`StageCache`]: shares root layers between stages and keys session
//!   layers by model name and variant selections
//! - [`PrimRange`]: pre-order and pre-and-post-order traversal with pruning
//! - [`shading`]: material binding resolution and face subsets

pub mod cache;
pub mod error;
pub mod layer;
pub mod prim;
pub mod range;
pub mod shading;
pub mod stage;

pub use cache::{SessionKey, StageCache};
pub use error::{Result, StageError};
pub use layer::{AttributeSpec, Layer, PrimSpec, Specifier, VariantSetSpec, VariantSpec};
pub use prim::{Attribute, Prim, TimeSample, VariantSet, MATERIAL_BINDING};
pub use range::{PrimPredicate, PrimRange, TraversalEvent};
pub use shading::{compute_bound_material, material_bind_subsets, GeomSubset, SubsetPartition};
pub use stage::{MemoryStage, SessionLayer, Stage};
