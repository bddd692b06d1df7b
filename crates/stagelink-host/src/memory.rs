//! An in-memory host graph.
//!
//! Behaves like a small DCC scene: transforms come with the standard
//! transform plugs, names are unique, deleted nodes are kept as tombstones
//! so they can be restored, and an `initialShadingGroup` set exists from
//! the start.

use crate::anim::{AnimCurveType, Keyframe};
use crate::error::{HostError, Result};
use crate::graph::{HostGraph, NodeHandle, NodeKind, SetMember};
use crate::plug::{PlugType, PlugValue};
use indexmap::IndexMap;
use stagelink_core::{AngleUnit, DistanceUnit, TimeInterval};

/// Name of the default shading group every host starts with.
pub const INITIAL_SHADING_GROUP: &str = "initialShadingGroup";

/// Node type of shading groups and other sets.
pub const SET_TYPE: &str = "shadingEngine";

/// Node types that receive the standard transform plugs.
const TRANSFORM_TYPES: &[&str] = &["transform", "joint"];

#[derive(Debug, Clone)]
struct Plug {
    plug_type: PlugType,
    value: PlugValue,
}

#[derive(Debug, Clone)]
struct CurveData {
    target: NodeHandle,
    plug: String,
    channel: usize,
    curve_type: AnimCurveType,
    keys: Vec<Keyframe>,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    name: String,
    type_name: String,
    kind: NodeKind,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    alive: bool,
    /// Descendants deleted together with this node.
    buried: Vec<NodeHandle>,
    plugs: IndexMap<String, Plug>,
    curve: Option<CurveData>,
    members: Option<Vec<SetMember>>,
}

/// In-memory [`HostGraph`].
#[derive(Debug, Clone)]
pub struct MemoryHost {
    nodes: Vec<NodeRecord>,
    playback: TimeInterval,
    linear_unit: DistanceUnit,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A host with a 1-120 playback range, centimeters, and the initial
    /// shading group.
    pub fn new() -> Self {
        let mut host = Self {
            nodes: Vec::new(),
            playback: TimeInterval::new(1.0, 120.0),
            linear_unit: DistanceUnit::Centimeter,
        };
        host.insert(INITIAL_SHADING_GROUP, SET_TYPE, NodeKind::Dependency, None);
        host
    }

    pub fn with_linear_unit(mut self, unit: DistanceUnit) -> Self {
        self.linear_unit = unit;
        self
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.alive).count()
    }

    /// Names of all live nodes, sorted.
    pub fn live_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.nodes.iter().filter(|n| n.alive).map(|n| n.name.clone()).collect();
        names.sort();
        names
    }

    /// The node and plug a curve drives.
    pub fn anim_curve_target(&self, curve: NodeHandle) -> Option<(NodeHandle, &str, usize)> {
        let data = self.record(curve).ok()?.curve.as_ref()?;
        Some((data.target, data.plug.as_str(), data.channel))
    }

    fn insert(&mut self, name: &str, type_name: &str, kind: NodeKind, parent: Option<NodeHandle>) -> NodeHandle {
        let handle = NodeHandle::from_raw(self.nodes.len() as u64);
        let name = self.unique_name(name);
        let mut plugs = IndexMap::new();
        if TRANSFORM_TYPES.contains(&type_name) {
            for (plug_name, plug_type, value) in standard_transform_plugs() {
                plugs.insert(plug_name.to_string(), Plug { plug_type, value });
            }
        }
        let members = (type_name == SET_TYPE).then(Vec::new);
        self.nodes.push(NodeRecord {
            name,
            type_name: type_name.to_string(),
            kind,
            parent,
            children: Vec::new(),
            alive: true,
            buried: Vec::new(),
            plugs,
            curve: None,
            members,
        });
        if let Some(parent) = parent {
            self.nodes[parent.raw() as usize].children.push(handle);
        }
        handle
    }

    fn unique_name(&self, requested: &str) -> String {
        let requested = if requested.is_empty() { "node" } else { requested };
        if self.find_node(requested).is_none() {
            return requested.to_string();
        }
        let base = requested.trim_end_matches(|c: char| c.is_ascii_digit());
        let base = if base.is_empty() { "node" } else { base };
        (1..)
            .map(|i| format!("{}{}", base, i))
            .find(|candidate| self.find_node(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    fn record(&self, node: NodeHandle) -> Result<&NodeRecord> {
        self.nodes.get(node.raw() as usize).ok_or(HostError::UnknownNode(node))
    }

    fn live(&self, node: NodeHandle) -> Result<&NodeRecord> {
        let record = self.record(node)?;
        if !record.alive {
            return Err(HostError::DeadNode(node));
        }
        Ok(record)
    }

    fn live_mut(&mut self, node: NodeHandle) -> Result<&mut NodeRecord> {
        let record = self.nodes.get_mut(node.raw() as usize).ok_or(HostError::UnknownNode(node))?;
        if !record.alive {
            return Err(HostError::DeadNode(node));
        }
        Ok(record)
    }

    fn plug(&self, node: NodeHandle, name: &str) -> Result<&Plug> {
        let record = self.live(node)?;
        record
            .plugs
            .get(name)
            .ok_or_else(|| HostError::plug_not_found(&record.name, name))
    }

    fn curve(&self, curve: NodeHandle) -> Result<&CurveData> {
        self.live(curve)?.curve.as_ref().ok_or(HostError::NotAnimCurve(curve))
    }

    fn curve_mut(&mut self, curve: NodeHandle) -> Result<&mut CurveData> {
        self.live_mut(curve)?.curve.as_mut().ok_or(HostError::NotAnimCurve(curve))
    }

    fn members_mut(&mut self, set: NodeHandle) -> Result<&mut Vec<SetMember>> {
        self.live_mut(set)?.members.as_mut().ok_or(HostError::NotASet(set))
    }

    fn live_descendants(&self, node: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Ok(record) = self.record(current) {
                for child in &record.children {
                    if self.is_alive(*child) {
                        out.push(*child);
                        stack.push(*child);
                    }
                }
            }
        }
        out
    }
}

fn standard_transform_plugs() -> Vec<(&'static str, PlugType, PlugValue)> {
    let distance = PlugType::Distance3(DistanceUnit::Centimeter);
    let angle = PlugType::Angle3(AngleUnit::Radians);
    let zero = PlugValue::Double3([0.0; 3]);
    vec![
        ("translate", distance, zero.clone()),
        ("rotate", angle, zero.clone()),
        ("scale", PlugType::Double3, PlugValue::Double3([1.0; 3])),
        ("shear", PlugType::Double3, zero.clone()),
        ("rotatePivot", distance, zero.clone()),
        ("rotatePivotTranslate", distance, zero.clone()),
        ("scalePivot", distance, zero.clone()),
        ("scalePivotTranslate", distance, zero.clone()),
        ("rotateAxis", angle, zero),
        ("rotateOrder", PlugType::Int, PlugValue::Int(0)),
        ("inheritsTransform", PlugType::Bool, PlugValue::Bool(true)),
        ("visibility", PlugType::Bool, PlugValue::Bool(true)),
    ]
}

impl HostGraph for MemoryHost {
    fn create_dag_node(&mut self, type_name: &str, name: &str, parent: Option<NodeHandle>) -> Result<NodeHandle> {
        if let Some(parent) = parent {
            let record = self.live(parent).map_err(|_| HostError::InvalidParent(parent))?;
            if record.kind != NodeKind::Dag {
                return Err(HostError::InvalidParent(parent));
            }
        }
        let node = self.insert(name, type_name, NodeKind::Dag, parent);
        log::trace!("created {} {}", type_name, node);
        Ok(node)
    }

    fn create_node(&mut self, type_name: &str, name: &str) -> Result<NodeHandle> {
        Ok(self.insert(name, type_name, NodeKind::Dependency, None))
    }

    fn delete_node(&mut self, node: NodeHandle) -> Result<()> {
        self.live(node)?;
        let buried = self.live_descendants(node);
        for handle in &buried {
            self.nodes[handle.raw() as usize].alive = false;
        }
        let record = &mut self.nodes[node.raw() as usize];
        record.alive = false;
        record.buried = buried;
        Ok(())
    }

    fn restore_node(&mut self, node: NodeHandle) -> Result<()> {
        let record = self.nodes.get_mut(node.raw() as usize).ok_or(HostError::UnknownNode(node))?;
        if record.alive {
            return Ok(());
        }
        record.alive = true;
        let buried = std::mem::take(&mut record.buried);
        for handle in buried {
            self.nodes[handle.raw() as usize].alive = true;
        }
        Ok(())
    }

    fn rename_node(&mut self, node: NodeHandle, name: &str) -> Result<String> {
        if self.live(node)?.name == name {
            return Ok(name.to_string());
        }
        let unique = self.unique_name(name);
        self.live_mut(node)?.name = unique.clone();
        Ok(unique)
    }

    fn is_alive(&self, node: NodeHandle) -> bool {
        self.record(node).map(|r| r.alive).unwrap_or(false)
    }

    fn node_name(&self, node: NodeHandle) -> Result<String> {
        Ok(self.record(node)?.name.clone())
    }

    fn node_type(&self, node: NodeHandle) -> Result<String> {
        Ok(self.record(node)?.type_name.clone())
    }

    fn node_kind(&self, node: NodeHandle) -> Result<NodeKind> {
        Ok(self.record(node)?.kind)
    }

    fn parent(&self, node: NodeHandle) -> Result<Option<NodeHandle>> {
        Ok(self.record(node)?.parent)
    }

    fn children(&self, node: NodeHandle) -> Result<Vec<NodeHandle>> {
        Ok(self
            .live(node)?
            .children
            .iter()
            .copied()
            .filter(|c| self.is_alive(*c))
            .collect())
    }

    fn world_children(&self) -> Vec<NodeHandle> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive && n.kind == NodeKind::Dag && n.parent.is_none())
            .map(|(i, _)| NodeHandle::from_raw(i as u64))
            .collect()
    }

    fn find_node(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .position(|n| n.alive && n.name == name)
            .map(|i| NodeHandle::from_raw(i as u64))
    }

    fn add_plug(&mut self, node: NodeHandle, name: &str, plug_type: PlugType) -> Result<()> {
        let record = self.live_mut(node)?;
        if record.plugs.contains_key(name) {
            return Err(HostError::PlugExists {
                node: record.name.clone(),
                plug: name.to_string(),
            });
        }
        record.plugs.insert(
            name.to_string(),
            Plug {
                plug_type,
                value: plug_type.default_value(),
            },
        );
        Ok(())
    }

    fn remove_plug(&mut self, node: NodeHandle, name: &str) -> Result<()> {
        let record = self.live_mut(node)?;
        record
            .plugs
            .shift_remove(name)
            .map(drop)
            .ok_or_else(|| HostError::plug_not_found(&record.name, name))
    }

    fn has_plug(&self, node: NodeHandle, name: &str) -> bool {
        self.plug(node, name).is_ok()
    }

    fn plug_type(&self, node: NodeHandle, name: &str) -> Result<PlugType> {
        Ok(self.plug(node, name)?.plug_type)
    }

    fn get_plug(&self, node: NodeHandle, name: &str) -> Result<PlugValue> {
        Ok(self.plug(node, name)?.value.clone())
    }

    fn set_plug(&mut self, node: NodeHandle, name: &str, value: PlugValue) -> Result<PlugValue> {
        let record = self.live_mut(node)?;
        let node_name = record.name.clone();
        let plug = record
            .plugs
            .get_mut(name)
            .ok_or_else(|| HostError::plug_not_found(node_name, name))?;
        if !plug.plug_type.accepts(&value) {
            return Err(HostError::TypeMismatch {
                plug: name.to_string(),
                expected: plug.plug_type.to_string(),
                found: value.kind_name(),
            });
        }
        Ok(std::mem::replace(&mut plug.value, value))
    }

    fn create_anim_curve(
        &mut self,
        node: NodeHandle,
        plug: &str,
        channel: usize,
        curve_type: AnimCurveType,
    ) -> Result<NodeHandle> {
        let plug_type = self.plug(node, plug)?.plug_type;
        if channel >= plug_type.channel_count() {
            return Err(HostError::ChannelOutOfRange {
                plug: plug.to_string(),
                channel,
            });
        }
        if self.connected_anim_curve(node, plug, channel).is_some() {
            return Err(HostError::AlreadyAnimated {
                plug: plug.to_string(),
                channel,
            });
        }
        let name = format!("{}_{}_{}", self.live(node)?.name, plug, channel);
        let curve = self.insert(&name, curve_type_name(curve_type), NodeKind::Dependency, None);
        self.nodes[curve.raw() as usize].curve = Some(CurveData {
            target: node,
            plug: plug.to_string(),
            channel,
            curve_type,
            keys: Vec::new(),
        });
        Ok(curve)
    }

    fn connected_anim_curve(&self, node: NodeHandle, plug: &str, channel: usize) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .position(|n| {
                n.alive
                    && n
                        .curve
                        .as_ref()
                        .is_some_and(|c| c.target == node && c.plug == plug && c.channel == channel)
            })
            .map(|i| NodeHandle::from_raw(i as u64))
    }

    fn anim_curve_type(&self, curve: NodeHandle) -> Result<AnimCurveType> {
        Ok(self.curve(curve)?.curve_type)
    }

    fn add_keyframe(&mut self, curve: NodeHandle, key: Keyframe) -> Result<Option<Keyframe>> {
        let keys = &mut self.curve_mut(curve)?.keys;
        match keys.binary_search_by(|k| k.time.total_cmp(&key.time)) {
            Ok(index) => Ok(Some(std::mem::replace(&mut keys[index], key))),
            Err(index) => {
                keys.insert(index, key);
                Ok(None)
            }
        }
    }

    fn remove_keyframe(&mut self, curve: NodeHandle, time: f64) -> Result<Option<Keyframe>> {
        let keys = &mut self.curve_mut(curve)?.keys;
        Ok(keys
            .binary_search_by(|k| k.time.total_cmp(&time))
            .ok()
            .map(|index| keys.remove(index)))
    }

    fn keyframes(&self, curve: NodeHandle) -> Result<Vec<Keyframe>> {
        Ok(self.curve(curve)?.keys.clone())
    }

    fn add_set_member(&mut self, set: NodeHandle, member: SetMember) -> Result<()> {
        self.live(member.node)?;
        self.members_mut(set)?.push(member);
        Ok(())
    }

    fn remove_set_member(&mut self, set: NodeHandle, member: &SetMember) -> Result<()> {
        let members = self.members_mut(set)?;
        if let Some(index) = members.iter().rposition(|m| m == member) {
            members.remove(index);
        }
        Ok(())
    }

    fn set_members(&self, set: NodeHandle) -> Result<Vec<SetMember>> {
        let members = self.live(set)?.members.as_ref().ok_or(HostError::NotASet(set))?;
        Ok(members.iter().filter(|m| self.is_alive(m.node)).cloned().collect())
    }

    fn playback_range(&self) -> TimeInterval {
        self.playback
    }

    fn set_playback_range(&mut self, range: TimeInterval) {
        self.playback = range;
    }

    fn internal_linear_unit(&self) -> DistanceUnit {
        self.linear_unit
    }
}

fn curve_type_name(curve_type: AnimCurveType) -> &'static str {
    match curve_type {
        AnimCurveType::Linear => "animCurveTL",
        AnimCurveType::Angular => "animCurveTA",
        AnimCurveType::Unitless => "animCurveTU",
        AnimCurveType::Time => "animCurveTT",
    }
}
