//! Transform translators.

use super::{create_transform, user_attributes, xformable};
use crate::context::ReadContext;
use crate::error::Result;
use crate::registry::Translator;
use stagelink_host::NodeHandle;
use stagelink_stage::Prim;

fn read_transform(prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<NodeHandle> {
    let node = create_transform(prim, ctx)?;
    xformable::read_xformable(prim, node, ctx)?;
    user_attributes::read_user_attributes(prim, node, ctx)?;
    Ok(node)
}

/// `Xform` and `Scope` prims: one host transform each.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformTranslator;

impl Translator for TransformTranslator {
    fn read(&mut self, prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<()> {
        read_transform(prim, ctx).map(drop)
    }
}

/// Prims of unknown type keep their place in the hierarchy as plain
/// transforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackTranslator;

impl Translator for FallbackTranslator {
    fn read(&mut self, prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<()> {
        log::debug!("{}: no translator for '{}', importing as transform", prim.path(), prim.type_name());
        read_transform(prim, ctx).map(drop)
    }
}
