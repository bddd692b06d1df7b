//! Canonical host transform stacks and greedy op matching.
//!
//! A node's op list matches a stack when each op fits a slot strictly
//! after the previous op's slot. Slots may be skipped, so any subset of the
//! canonical ops in canonical order matches. Pivot slots come in pairs and
//! an op list holding one half of a pair without the other is rejected.

use crate::ops::{XformOp, XformOpType};
use crate::rotation::RotationOrder;
use std::fmt;

/// Host transform attribute an op maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSlot {
    Translate,
    RotatePivotTranslate,
    RotatePivot,
    Rotate,
    RotateAxis,
    ScalePivotTranslate,
    ScalePivot,
    Shear,
    Scale,
    /// Shared rotate and scale pivot of the common profile.
    Pivot,
}

impl HostSlot {
    /// Host plug name. `Pivot` writes both pivots and reports the rotate one.
    pub fn plug_name(self) -> &'static str {
        match self {
            HostSlot::Translate => "translate",
            HostSlot::RotatePivotTranslate => "rotatePivotTranslate",
            HostSlot::RotatePivot | HostSlot::Pivot => "rotatePivot",
            HostSlot::Rotate => "rotate",
            HostSlot::RotateAxis => "rotateAxis",
            HostSlot::ScalePivotTranslate => "scalePivotTranslate",
            HostSlot::ScalePivot => "scalePivot",
            HostSlot::Shear => "shear",
            HostSlot::Scale => "scale",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Translate,
    Rotate,
    Scale,
    Transform,
}

#[derive(Debug, Clone, Copy)]
struct StackSlot {
    kind: SlotKind,
    suffix: Option<&'static str>,
    inverse: bool,
    twin: Option<usize>,
    host: Option<HostSlot>,
}

impl StackSlot {
    const fn new(kind: SlotKind, suffix: Option<&'static str>, host: HostSlot) -> Self {
        Self {
            kind,
            suffix,
            inverse: false,
            twin: None,
            host: Some(host),
        }
    }

    const fn pivot(suffix: &'static str, host: HostSlot, twin: usize) -> Self {
        Self {
            kind: SlotKind::Translate,
            suffix: Some(suffix),
            inverse: false,
            twin: Some(twin),
            host: Some(host),
        }
    }

    const fn inverse_pivot(suffix: &'static str, twin: usize) -> Self {
        Self {
            kind: SlotKind::Translate,
            suffix: Some(suffix),
            inverse: true,
            twin: Some(twin),
            host: None,
        }
    }

    fn accepts(&self, op: &XformOp) -> bool {
        let kind_fits = match self.kind {
            SlotKind::Translate => op.op_type == XformOpType::Translate,
            SlotKind::Rotate => op.op_type.is_rotate(),
            SlotKind::Scale => op.op_type == XformOpType::Scale,
            SlotKind::Transform => op.op_type == XformOpType::Transform,
        };
        kind_fits && op.inverse == self.inverse && op.suffix.as_deref() == self.suffix
    }
}

const MAYA_SLOTS: [StackSlot; 11] = [
    StackSlot::new(SlotKind::Translate, None, HostSlot::Translate),
    StackSlot::new(SlotKind::Translate, Some("rotatePivotTranslate"), HostSlot::RotatePivotTranslate),
    StackSlot::pivot("rotatePivot", HostSlot::RotatePivot, 5),
    StackSlot::new(SlotKind::Rotate, None, HostSlot::Rotate),
    StackSlot::new(SlotKind::Rotate, Some("rotateAxis"), HostSlot::RotateAxis),
    StackSlot::inverse_pivot("rotatePivot", 2),
    StackSlot::new(SlotKind::Translate, Some("scalePivotTranslate"), HostSlot::ScalePivotTranslate),
    StackSlot::pivot("scalePivot", HostSlot::ScalePivot, 10),
    StackSlot::new(SlotKind::Transform, Some("shear"), HostSlot::Shear),
    StackSlot::new(SlotKind::Scale, None, HostSlot::Scale),
    StackSlot::inverse_pivot("scalePivot", 7),
];

const COMMON_SLOTS: [StackSlot; 5] = [
    StackSlot::new(SlotKind::Translate, None, HostSlot::Translate),
    StackSlot::pivot("pivot", HostSlot::Pivot, 4),
    StackSlot::new(SlotKind::Rotate, None, HostSlot::Rotate),
    StackSlot::new(SlotKind::Scale, None, HostSlot::Scale),
    StackSlot::inverse_pivot("pivot", 1),
];

/// A fixed, ordered profile of host transform slots.
#[derive(Debug, Clone, Copy)]
pub struct XformStack {
    name: &'static str,
    slots: &'static [StackSlot],
}

impl XformStack {
    /// The full host transform stack, pivots and shear included.
    pub fn maya() -> Self {
        Self {
            name: "maya",
            slots: &MAYA_SLOTS,
        }
    }

    /// Translate, pivot, rotate, scale.
    pub fn common() -> Self {
        Self {
            name: "common",
            slots: &COMMON_SLOTS,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Greedily match `ops` against this stack.
    pub fn match_ops(&self, ops: &[XformOp]) -> Option<MatchedStack> {
        let mut used = vec![false; self.slots.len()];
        let mut next = 0;
        let mut matched = Vec::with_capacity(ops.len());

        for op in ops {
            let offset = self.slots[next..].iter().position(|slot| slot.accepts(op))?;
            let index = next + offset;
            used[index] = true;
            next = index + 1;
            matched.push(MatchedOp {
                op: op.clone(),
                slot: self.slots[index].host,
            });
        }

        let unpaired = self
            .slots
            .iter()
            .enumerate()
            .any(|(i, slot)| used[i] && slot.twin.is_some_and(|twin| !used[twin]));
        if unpaired {
            return None;
        }

        Some(MatchedStack {
            profile: self.name,
            ops: matched,
        })
    }
}

impl fmt::Display for XformStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An op paired with the host slot it writes, `None` for inverse twins.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedOp {
    pub op: XformOp,
    pub slot: Option<HostSlot>,
}

/// Result of a successful stack match, ops in their authored order.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedStack {
    pub profile: &'static str,
    pub ops: Vec<MatchedOp>,
}

impl MatchedStack {
    /// Rotation order of the matched rotate op, if it has one.
    pub fn rotate_order(&self) -> Option<RotationOrder> {
        self.ops
            .iter()
            .find(|m| m.slot == Some(HostSlot::Rotate))
            .and_then(|m| m.op.op_type.rotation_order())
    }

    /// Ops that write a host plug.
    pub fn mapped(&self) -> impl Iterator<Item = (&XformOp, HostSlot)> {
        self.ops.iter().filter_map(|m| m.slot.map(|slot| (&m.op, slot)))
    }
}

/// Match against the full stack, then the common profile.
pub fn match_canonical_stack(ops: &[XformOp]) -> Option<MatchedStack> {
    XformStack::maya()
        .match_ops(ops)
        .or_else(|| XformStack::common().match_ops(ops))
}
