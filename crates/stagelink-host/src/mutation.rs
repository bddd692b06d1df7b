//! The mutation log.
//!
//! Every graph edit made through a [`DagModifier`] is performed at once and
//! recorded in a [`MutationBatch`]. The batch can later be reverted (undo)
//! and applied again (redo) as one unit: if any step fails, the steps
//! already taken are rolled back before the error is returned.

use crate::anim::{AnimCurveType, Keyframe};
use crate::error::Result;
use crate::graph::{HostGraph, NodeHandle, SetMember};
use crate::plug::{PlugType, PlugValue};
use stagelink_core::TimeInterval;

/// One recorded graph edit with enough state to invert it.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateNode {
        node: NodeHandle,
    },
    DeleteNode {
        node: NodeHandle,
    },
    Rename {
        node: NodeHandle,
        previous: String,
        name: String,
    },
    AddPlug {
        node: NodeHandle,
        name: String,
        plug_type: PlugType,
    },
    SetPlug {
        node: NodeHandle,
        name: String,
        previous: PlugValue,
        value: PlugValue,
    },
    AddKeyframe {
        curve: NodeHandle,
        key: Keyframe,
        replaced: Option<Keyframe>,
    },
    AddSetMember {
        set: NodeHandle,
        member: SetMember,
    },
    SetPlaybackRange {
        previous: TimeInterval,
        range: TimeInterval,
    },
}

impl Mutation {
    /// Perform the edit again after a revert.
    pub fn apply(&self, host: &mut dyn HostGraph) -> Result<()> {
        match self {
            Mutation::CreateNode { node } => host.restore_node(*node),
            Mutation::DeleteNode { node } => host.delete_node(*node),
            Mutation::Rename { node, name, .. } => host.rename_node(*node, name).map(drop),
            Mutation::AddPlug { node, name, plug_type } => host.add_plug(*node, name, *plug_type),
            Mutation::SetPlug { node, name, value, .. } => host.set_plug(*node, name, value.clone()).map(drop),
            Mutation::AddKeyframe { curve, key, .. } => host.add_keyframe(*curve, *key).map(drop),
            Mutation::AddSetMember { set, member } => host.add_set_member(*set, member.clone()),
            Mutation::SetPlaybackRange { range, .. } => {
                host.set_playback_range(*range);
                Ok(())
            }
        }
    }

    /// Undo the edit.
    pub fn revert(&self, host: &mut dyn HostGraph) -> Result<()> {
        match self {
            Mutation::CreateNode { node } => host.delete_node(*node),
            Mutation::DeleteNode { node } => host.restore_node(*node),
            Mutation::Rename { node, previous, .. } => host.rename_node(*node, previous).map(drop),
            Mutation::AddPlug { node, name, .. } => host.remove_plug(*node, name),
            Mutation::SetPlug { node, name, previous, .. } => host.set_plug(*node, name, previous.clone()).map(drop),
            Mutation::AddKeyframe { curve, key, replaced } => {
                host.remove_keyframe(*curve, key.time)?;
                if let Some(replaced) = replaced {
                    host.add_keyframe(*curve, *replaced)?;
                }
                Ok(())
            }
            Mutation::AddSetMember { set, member } => host.remove_set_member(*set, member),
            Mutation::SetPlaybackRange { previous, .. } => {
                host.set_playback_range(*previous);
                Ok(())
            }
        }
    }
}

/// An ordered log of mutations, undone and redone as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationBatch {
    mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations.iter()
    }

    /// Nodes created by this batch, in creation order.
    pub fn created_nodes(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.mutations.iter().filter_map(|m| match m {
            Mutation::CreateNode { node } => Some(*node),
            _ => None,
        })
    }

    /// Apply every mutation in order.
    pub fn apply(&self, host: &mut dyn HostGraph) -> Result<()> {
        for (index, mutation) in self.mutations.iter().enumerate() {
            if let Err(err) = mutation.apply(host) {
                log::error!("mutation {} failed to apply: {}", index, err);
                for done in self.mutations[..index].iter().rev() {
                    if let Err(rollback) = done.revert(host) {
                        log::error!("rollback failed: {}", rollback);
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Revert every mutation, newest first.
    pub fn revert(&self, host: &mut dyn HostGraph) -> Result<()> {
        for (index, mutation) in self.mutations.iter().enumerate().rev() {
            if let Err(err) = mutation.revert(host) {
                log::error!("mutation {} failed to revert: {}", index, err);
                for done in &self.mutations[index + 1..] {
                    if let Err(rollback) = done.apply(host) {
                        log::error!("rollback failed: {}", rollback);
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Extend<Mutation> for MutationBatch {
    fn extend<I: IntoIterator<Item = Mutation>>(&mut self, iter: I) {
        self.mutations.extend(iter);
    }
}

/// Performs graph edits and records each one in a batch.
pub struct DagModifier<'a> {
    host: &'a mut dyn HostGraph,
    batch: &'a mut MutationBatch,
}

impl<'a> DagModifier<'a> {
    pub fn new(host: &'a mut dyn HostGraph, batch: &'a mut MutationBatch) -> Self {
        Self { host, batch }
    }

    /// Read access to the graph.
    pub fn host(&self) -> &dyn HostGraph {
        &*self.host
    }

    pub fn batch(&self) -> &MutationBatch {
        &*self.batch
    }

    pub fn create_dag_node(&mut self, type_name: &str, name: &str, parent: Option<NodeHandle>) -> Result<NodeHandle> {
        let node = self.host.create_dag_node(type_name, name, parent)?;
        self.batch.push(Mutation::CreateNode { node });
        Ok(node)
    }

    pub fn create_node(&mut self, type_name: &str, name: &str) -> Result<NodeHandle> {
        let node = self.host.create_node(type_name, name)?;
        self.batch.push(Mutation::CreateNode { node });
        Ok(node)
    }

    pub fn delete_node(&mut self, node: NodeHandle) -> Result<()> {
        self.host.delete_node(node)?;
        self.batch.push(Mutation::DeleteNode { node });
        Ok(())
    }

    pub fn rename_node(&mut self, node: NodeHandle, name: &str) -> Result<String> {
        let previous = self.host.node_name(node)?;
        let name = self.host.rename_node(node, name)?;
        self.batch.push(Mutation::Rename {
            node,
            previous,
            name: name.clone(),
        });
        Ok(name)
    }

    pub fn add_plug(&mut self, node: NodeHandle, name: &str, plug_type: PlugType) -> Result<()> {
        self.host.add_plug(node, name, plug_type)?;
        self.batch.push(Mutation::AddPlug {
            node,
            name: name.to_string(),
            plug_type,
        });
        Ok(())
    }

    /// Add the plug unless the node already has one with this name.
    pub fn ensure_plug(&mut self, node: NodeHandle, name: &str, plug_type: PlugType) -> Result<PlugType> {
        if self.host.has_plug(node, name) {
            return self.host.plug_type(node, name);
        }
        self.add_plug(node, name, plug_type)?;
        Ok(plug_type)
    }

    pub fn set_plug(&mut self, node: NodeHandle, name: &str, value: PlugValue) -> Result<()> {
        let previous = self.host.set_plug(node, name, value.clone())?;
        self.batch.push(Mutation::SetPlug {
            node,
            name: name.to_string(),
            previous,
            value,
        });
        Ok(())
    }

    pub fn create_anim_curve(
        &mut self,
        node: NodeHandle,
        plug: &str,
        channel: usize,
        curve_type: AnimCurveType,
    ) -> Result<NodeHandle> {
        let curve = self.host.create_anim_curve(node, plug, channel, curve_type)?;
        self.batch.push(Mutation::CreateNode { node: curve });
        Ok(curve)
    }

    pub fn add_keyframe(&mut self, curve: NodeHandle, key: Keyframe) -> Result<()> {
        let replaced = self.host.add_keyframe(curve, key)?;
        self.batch.push(Mutation::AddKeyframe { curve, key, replaced });
        Ok(())
    }

    pub fn add_set_member(&mut self, set: NodeHandle, member: SetMember) -> Result<()> {
        self.host.add_set_member(set, member.clone())?;
        self.batch.push(Mutation::AddSetMember { set, member });
        Ok(())
    }

    pub fn set_playback_range(&mut self, range: TimeInterval) {
        let previous = self.host.playback_range();
        self.host.set_playback_range(range);
        self.batch.push(Mutation::SetPlaybackRange { previous, range });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;

    #[test]
    fn test_revert_and_apply_creation() {
        let mut host = MemoryHost::new();
        let mut batch = MutationBatch::new();
        let (parent, child) = {
            let mut dag = DagModifier::new(&mut host, &mut batch);
            let parent = dag.create_dag_node("transform", "group", None).unwrap();
            let child = dag.create_dag_node("transform", "child", Some(parent)).unwrap();
            dag.set_plug(child, "visibility", PlugValue::Bool(false)).unwrap();
            (parent, child)
        };
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.created_nodes().collect::<Vec<_>>(), vec![parent, child]);

        batch.revert(&mut host).unwrap();
        assert!(!host.is_alive(parent));
        assert!(!host.is_alive(child));

        batch.apply(&mut host).unwrap();
        assert!(host.is_alive(parent));
        assert!(host.is_alive(child));
        assert_eq!(host.get_plug(child, "visibility").unwrap(), PlugValue::Bool(false));
        assert_eq!(host.parent(child).unwrap(), Some(parent));
    }

    #[test]
    fn test_revert_plug_on_existing_node() {
        let mut host = MemoryHost::new();
        let existing = host.create_dag_node("transform", "existing", None).unwrap();
        let mut batch = MutationBatch::new();
        DagModifier::new(&mut host, &mut batch)
            .set_plug(existing, "translate", PlugValue::Double3([1.0, 2.0, 3.0]))
            .unwrap();
        batch.revert(&mut host).unwrap();
        assert_eq!(host.get_plug(existing, "translate").unwrap(), PlugValue::Double3([0.0; 3]));
    }

    #[test]
    fn test_keyframe_replace_reverts() {
        let mut host = MemoryHost::new();
        let node = host.create_dag_node("transform", "n", None).unwrap();
        let curve = host.create_anim_curve(node, "translate", 0, AnimCurveType::Linear).unwrap();
        host.add_keyframe(curve, Keyframe::linear(1.0, 5.0)).unwrap();

        let mut batch = MutationBatch::new();
        DagModifier::new(&mut host, &mut batch)
            .add_keyframe(curve, Keyframe::linear(1.0, 9.0))
            .unwrap();
        assert_eq!(host.keyframes(curve).unwrap()[0].value, 9.0);
        batch.revert(&mut host).unwrap();
        assert_eq!(host.keyframes(curve).unwrap(), vec![Keyframe::linear(1.0, 5.0)]);
    }

    #[test]
    fn test_playback_range_reverts() {
        let mut host = MemoryHost::new();
        let before = host.playback_range();
        let mut batch = MutationBatch::new();
        DagModifier::new(&mut host, &mut batch).set_playback_range(TimeInterval::new(-10.0, 500.0));
        assert_eq!(host.playback_range(), TimeInterval::new(-10.0, 500.0));
        batch.revert(&mut host).unwrap();
        assert_eq!(host.playback_range(), before);
    }

    #[test]
    fn test_failed_apply_rolls_back() {
        let mut host = MemoryHost::new();
        let node = host.create_dag_node("transform", "n", None).unwrap();
        let mut batch = MutationBatch::new();
        batch.push(Mutation::SetPlug {
            node,
            name: "visibility".into(),
            previous: PlugValue::Bool(true),
            value: PlugValue::Bool(false),
        });
        batch.push(Mutation::SetPlug {
            node,
            name: "missing".into(),
            previous: PlugValue::Bool(true),
            value: PlugValue::Bool(false),
        });
        assert!(batch.apply(&mut host).is_err());
        assert_eq!(host.get_plug(node, "visibility").unwrap(), PlugValue::Bool(true));
    }
}
