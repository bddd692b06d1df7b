//! Built-in prim translators.
//!
//! | Type | Translator |
//! |------|------------|
//! | `Xform`, `Scope` | [`TransformTranslator`] |
//! | `Mesh` | [`MeshTranslator`] |
//! | `Material`, `Shader`, `NodeGraph`, `GeomSubset` | [`PruneTranslator`] |
//! | `PointInstancer` | [`PointInstancerTranslator`] |
//! | anything else | [`FallbackTranslator`] |

pub mod material;
pub mod mesh;
pub mod point_instancer;
pub mod prune;
pub mod transform;
pub mod user_attributes;
pub mod xformable;

pub use mesh::MeshTranslator;
pub use point_instancer::PointInstancerTranslator;
pub use prune::PruneTranslator;
pub use transform::{FallbackTranslator, TransformTranslator};

use crate::context::ReadContext;
use crate::error::Result;
use crate::registry::{Translator, TranslatorFactory, TranslatorRegistry};
use stagelink_host::NodeHandle;
use stagelink_stage::Prim;
use std::sync::Arc;

/// Host node type created for transformable prims.
pub const TRANSFORM_NODE_TYPE: &str = "transform";

/// Register every built-in translator into `registry`.
pub fn register_builtins(registry: &TranslatorRegistry) {
    let builtins: [(&str, fn(&Prim) -> Box<dyn Translator>); 8] = [
        ("Xform", |_| Box::new(TransformTranslator)),
        ("Scope", |_| Box::new(TransformTranslator)),
        ("Mesh", |_| Box::new(MeshTranslator)),
        ("Material", |_| Box::new(PruneTranslator)),
        ("Shader", |_| Box::new(PruneTranslator)),
        ("NodeGraph", |_| Box::new(PruneTranslator)),
        ("GeomSubset", |_| Box::new(PruneTranslator)),
        ("PointInstancer", |_| Box::new(PointInstancerTranslator::default())),
    ];
    for (type_name, factory) in builtins {
        if let Err(err) = registry.register(type_name, factory) {
            log::error!("built-in translator not registered: {}", err);
        }
    }
}

/// Factory for the translator used when no other is registered.
pub fn fallback_factory() -> TranslatorFactory {
    Arc::new(|_: &Prim| -> Box<dyn Translator> { Box::new(FallbackTranslator) })
}

/// Create the host transform for `prim` under its nearest imported
/// ancestor and register it.
pub fn create_transform(prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<NodeHandle> {
    let parent = ctx.parent_handle(prim.path());
    let node = ctx.modifier().create_dag_node(TRANSFORM_NODE_TYPE, prim.name(), parent)?;
    ctx.register(prim.path(), node);
    log::trace!("{} -> {}", prim.path(), node);
    Ok(node)
}
