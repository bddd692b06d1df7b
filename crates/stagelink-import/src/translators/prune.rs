//! Prims that create nothing on their own.

use crate::context::ReadContext;
use crate::error::Result;
use crate::registry::Translator;
use stagelink_stage::Prim;

/// Skips a prim and its descendants.
///
/// Materials and their shaders are imported when geometry bound to them is
/// read; face subsets are read with their mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct PruneTranslator;

impl Translator for PruneTranslator {
    fn read(&mut self, prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<()> {
        log::trace!("pruning {} ({})", prim.path(), prim.type_name());
        ctx.prune_children();
        Ok(())
    }
}
