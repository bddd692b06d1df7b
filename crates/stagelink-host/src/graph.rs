//! The host node graph interface.

use crate::anim::{AnimCurveType, Keyframe};
use crate::error::Result;
use crate::plug::{PlugType, PlugValue};
use stagelink_core::{DistanceUnit, TimeInterval};
use std::fmt;

/// Opaque handle to a host node. Handles stay valid after deletion so a
/// deleted node can be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a node lives in the transform hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Hierarchical node with an optional parent.
    Dag,
    /// Free-standing node (materials, curves, sets).
    Dependency,
}

/// A set member: a whole object or some of its faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMember {
    pub node: NodeHandle,
    /// Face indices, `None` for the whole object.
    pub faces: Option<Vec<usize>>,
}

impl SetMember {
    pub fn object(node: NodeHandle) -> Self {
        Self { node, faces: None }
    }

    pub fn faces(node: NodeHandle, faces: Vec<usize>) -> Self {
        Self { node, faces: Some(faces) }
    }
}

/// Read and write access to the host's scene graph.
///
/// Every method that edits the graph has an inverse so a
/// [`MutationBatch`](crate::MutationBatch) can undo and redo it.
pub trait HostGraph {
    /// Create a DAG node. Names are made unique; `None` parents to the world.
    fn create_dag_node(&mut self, type_name: &str, name: &str, parent: Option<NodeHandle>) -> Result<NodeHandle>;

    /// Create a dependency node.
    fn create_node(&mut self, type_name: &str, name: &str) -> Result<NodeHandle>;

    /// Delete a node and, for DAG nodes, its descendants.
    fn delete_node(&mut self, node: NodeHandle) -> Result<()>;

    /// Bring back a node removed by [`delete_node`](Self::delete_node) with
    /// everything deleted along with it.
    fn restore_node(&mut self, node: NodeHandle) -> Result<()>;

    /// Rename a node, returning the unique name it received.
    fn rename_node(&mut self, node: NodeHandle, name: &str) -> Result<String>;

    fn is_alive(&self, node: NodeHandle) -> bool;

    fn node_name(&self, node: NodeHandle) -> Result<String>;

    fn node_type(&self, node: NodeHandle) -> Result<String>;

    fn node_kind(&self, node: NodeHandle) -> Result<NodeKind>;

    /// DAG parent, `None` for world-level or dependency nodes.
    fn parent(&self, node: NodeHandle) -> Result<Option<NodeHandle>>;

    /// Live DAG children in creation order.
    fn children(&self, node: NodeHandle) -> Result<Vec<NodeHandle>>;

    /// Live world-level DAG nodes.
    fn world_children(&self) -> Vec<NodeHandle>;

    /// Find a live node by name.
    fn find_node(&self, name: &str) -> Option<NodeHandle>;

    fn add_plug(&mut self, node: NodeHandle, name: &str, plug_type: PlugType) -> Result<()>;

    /// Remove a dynamic plug.
    fn remove_plug(&mut self, node: NodeHandle, name: &str) -> Result<()>;

    fn has_plug(&self, node: NodeHandle, name: &str) -> bool;

    fn plug_type(&self, node: NodeHandle, name: &str) -> Result<PlugType>;

    fn get_plug(&self, node: NodeHandle, name: &str) -> Result<PlugValue>;

    /// Set a plug, returning its previous value.
    fn set_plug(&mut self, node: NodeHandle, name: &str, value: PlugValue) -> Result<PlugValue>;

    /// Create a curve driving one scalar channel of a plug.
    fn create_anim_curve(
        &mut self,
        node: NodeHandle,
        plug: &str,
        channel: usize,
        curve_type: AnimCurveType,
    ) -> Result<NodeHandle>;

    /// The live curve driving a plug channel, if any.
    fn connected_anim_curve(&self, node: NodeHandle, plug: &str, channel: usize) -> Option<NodeHandle>;

    fn anim_curve_type(&self, curve: NodeHandle) -> Result<AnimCurveType>;

    /// Add or replace the key at `key.time`, returning a replaced key.
    fn add_keyframe(&mut self, curve: NodeHandle, key: Keyframe) -> Result<Option<Keyframe>>;

    /// Remove the key at `time`.
    fn remove_keyframe(&mut self, curve: NodeHandle, time: f64) -> Result<Option<Keyframe>>;

    /// Keys sorted by time.
    fn keyframes(&self, curve: NodeHandle) -> Result<Vec<Keyframe>>;

    fn add_set_member(&mut self, set: NodeHandle, member: SetMember) -> Result<()>;

    fn remove_set_member(&mut self, set: NodeHandle, member: &SetMember) -> Result<()>;

    fn set_members(&self, set: NodeHandle) -> Result<Vec<SetMember>>;

    fn playback_range(&self) -> TimeInterval;

    fn set_playback_range(&mut self, range: TimeInterval);

    fn internal_linear_unit(&self) -> DistanceUnit;
}
