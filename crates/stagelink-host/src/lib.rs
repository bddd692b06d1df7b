//! stagelink-host: the host application side of the import bridge.
//!
//! - [`HostGraph`]: node creation and deletion, plugs, animation curves,
//!   sets, and the playback range
//! - [`MutationBatch`] and [`DagModifier`]: every edit is logged with its
//!   inverse so an import can be undone and redone as one unit
//! - [`MemoryHost`]: an in-memory graph used by tests and tools

pub mod anim;
pub mod error;
pub mod graph;
pub mod memory;
pub mod mutation;
pub mod plug;

pub use anim::{AnimCurveType, Keyframe, TangentType};
pub use error::{HostError, Result};
pub use graph::{HostGraph, NodeHandle, NodeKind, SetMember};
pub use memory::{MemoryHost, INITIAL_SHADING_GROUP, SET_TYPE};
pub use mutation::{DagModifier, Mutation, MutationBatch};
pub use plug::{PlugType, PlugValue};
