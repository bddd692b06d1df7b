//! Point instancer translator.
//!
//! Prototypes usually live below the instancer, so the instancer node can
//! only reference them once its subtree has been read.

use super::{create_transform, xformable};
use crate::context::ReadContext;
use crate::error::Result;
use crate::registry::Translator;
use stagelink_core::Value;
use stagelink_host::{NodeHandle, PlugType, PlugValue};
use stagelink_stage::{Prim, TimeSample};

/// Relationship listing an instancer's prototypes.
pub const PROTOTYPES_REL: &str = "prototypes";

/// String array plug naming the prototype nodes.
pub const PROTOTYPES_PLUG: &str = "prototypes";

/// Int plug holding the number of instances.
pub const INSTANCE_COUNT_PLUG: &str = "instanceCount";

/// `PointInstancer` prims.
#[derive(Debug, Clone, Default)]
pub struct PointInstancerTranslator {
    node: Option<NodeHandle>,
}

impl Translator for PointInstancerTranslator {
    fn read(&mut self, prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<()> {
        let node = create_transform(prim, ctx)?;
        xformable::read_xformable(prim, node, ctx)?;
        self.node = Some(node);
        Ok(())
    }

    fn has_post_read_subtree(&self) -> bool {
        true
    }

    fn post_read_subtree(&mut self, prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<()> {
        let Some(node) = self.node else {
            return Ok(());
        };

        let mut prototypes = Vec::new();
        for target in prim.relationship_targets(PROTOTYPES_REL) {
            match ctx.registry().lookup(target) {
                Some(handle) => prototypes.push(handle),
                None => log::warn!("{}: prototype {} was not imported", prim.path(), target),
            }
        }
        let names = prototypes
            .iter()
            .map(|handle| ctx.host().node_name(*handle))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let instance_count = prim
            .attribute("protoIndices")
            .and_then(|attr| attr.value_at(TimeSample::Default))
            .and_then(Value::as_array)
            .map_or(0, <[Value]>::len);

        let modifier = ctx.modifier();
        modifier.ensure_plug(node, PROTOTYPES_PLUG, PlugType::StringArray)?;
        modifier.set_plug(node, PROTOTYPES_PLUG, PlugValue::StringArray(names))?;
        modifier.ensure_plug(node, INSTANCE_COUNT_PLUG, PlugType::Int)?;
        modifier.set_plug(
            node,
            INSTANCE_COUNT_PLUG,
            PlugValue::Int(i32::try_from(instance_count).unwrap_or(i32::MAX)),
        )?;
        for prototype in prototypes {
            modifier.set_plug(prototype, "visibility", PlugValue::Bool(false))?;
        }
        log::debug!("{}: {} instances of {} prototypes", prim.path(), instance_count, prim.relationship_targets(PROTOTYPES_REL).len());
        Ok(())
    }
}
