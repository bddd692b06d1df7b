//! stagelink-import: reads a stage into the host graph.
//!
//! - [`ImportJob`]: opens a stage, walks it and records every host edit so
//!   the import can be undone and redone
//! - [`TranslatorRegistry`]: prim type name to [`Translator`] factory, with
//!   on-demand plugin loading and a fallback
//! - [`NodePathRegistry`] and [`ReadContext`]: what translators see while
//!   reading a prim
//! - [`bridge`]: typed plug access, unit conversion and keyframing
//! - [`translators`]: the built-in translators, including material and
//!   transform import
//!
//! # Example
//!
//! ```no_run
//! use stagelink_core::ImportArgs;
//! use stagelink_host::MemoryHost;
//! use stagelink_import::{ImportEnv, ImportJob};
//! use stagelink_stage::StageCache;
//!
//! let mut host = MemoryHost::new();
//! let mut cache = StageCache::new();
//! let mut job = ImportJob::new("chair.json", ImportArgs::default());
//! let added = job.read(&mut ImportEnv::new(&mut host, &mut cache))?;
//! println!("imported {} top-level nodes", added.len());
//! job.undo(&mut host)?;
//! # Ok::<(), stagelink_import::ImportError>(())
//! ```

pub mod bridge;
pub mod context;
pub mod error;
pub mod job;
pub mod registry;
pub mod translators;

pub use bridge::{AnimOptions, PlugArrayElement, PlugScalar};
pub use context::{ImportEnv, NodePathRegistry, ReadContext};
pub use error::{ImportError, Result};
pub use job::{ImportJob, UndoState, STAGE_PROXY_KEY};
pub use registry::{PluginLoader, Translator, TranslatorFactory, TranslatorRegistry};
pub use translators::material::{
    assign_material, resolve_material, MaterialCache, MaterialMergePolicy, NoMerge, ShadingModeImporter,
    ShadingModeRegistry, ShadingModeRequest, UvRemapSpecialization,
};
