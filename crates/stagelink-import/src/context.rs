//! Per-job state shared with translators.
//!
//! [`NodePathRegistry`] maps scene paths (and a few synthetic keys) to the
//! host nodes an import created for them. [`ReadContext`] bundles the
//! registry with the stage, the import arguments and the recording
//! [`DagModifier`] for the duration of one traversal. [`ImportEnv`] carries
//! the process-level collaborators a job needs.

use crate::registry::TranslatorRegistry;
use crate::translators::material::{MaterialCache, ShadingModeRegistry};
use indexmap::IndexMap;
use stagelink_core::{ImportArgs, ScenePath};
use stagelink_host::{DagModifier, HostGraph, NodeHandle};
use stagelink_stage::{Stage, StageCache};

/// Maps scene paths to the host nodes created for them.
///
/// Keys are path strings. Synthetic keys (for example the stage proxy's
/// type name, or an animation curve's host name) never start with `/` and
/// so cannot collide with a path.
#[derive(Debug, Clone, Default)]
pub struct NodePathRegistry {
    nodes: IndexMap<String, NodeHandle>,
}

impl NodePathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the node created for `path`.
    pub fn register(&mut self, path: &ScenePath, node: NodeHandle) {
        self.register_path(path.as_str(), node);
    }

    /// Register a node under a raw key.
    ///
    /// Callers must not register one key twice; a replaced entry is only
    /// reported.
    pub fn register_path(&mut self, key: &str, node: NodeHandle) {
        if let Some(previous) = self.nodes.insert(key.to_string(), node) {
            if previous != node {
                log::debug!("registry entry {} replaced: {} -> {}", key, previous, node);
            }
        }
    }

    pub fn lookup(&self, path: &ScenePath) -> Option<NodeHandle> {
        self.lookup_path(path.as_str())
    }

    pub fn lookup_path(&self, key: &str) -> Option<NodeHandle> {
        self.nodes.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Visit every entry in registration order.
    pub fn for_each_registered(&self, mut visitor: impl FnMut(&str, NodeHandle)) {
        for (key, node) in &self.nodes {
            visitor(key, *node);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeHandle)> {
        self.nodes.iter().map(|(key, node)| (key.as_str(), *node))
    }

    /// The node registered for the nearest strict ancestor of `path`.
    pub fn parent_handle(&self, path: &ScenePath) -> Option<NodeHandle> {
        path.ancestors().skip(1).find_map(|ancestor| self.lookup(&ancestor))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Everything a translator sees while reading one prim.
pub struct ReadContext<'a> {
    stage: &'a dyn Stage,
    args: &'a ImportArgs,
    registry: &'a mut NodePathRegistry,
    modifier: DagModifier<'a>,
    materials: &'a mut MaterialCache,
    shading_modes: &'a ShadingModeRegistry,
    prune_children: bool,
}

impl<'a> ReadContext<'a> {
    pub fn new(
        stage: &'a dyn Stage,
        args: &'a ImportArgs,
        registry: &'a mut NodePathRegistry,
        modifier: DagModifier<'a>,
        materials: &'a mut MaterialCache,
        shading_modes: &'a ShadingModeRegistry,
    ) -> Self {
        Self {
            stage,
            args,
            registry,
            modifier,
            materials,
            shading_modes,
            prune_children: false,
        }
    }

    pub fn stage(&self) -> &'a dyn Stage {
        self.stage
    }

    pub fn args(&self) -> &'a ImportArgs {
        self.args
    }

    pub fn registry(&self) -> &NodePathRegistry {
        &*self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodePathRegistry {
        &mut *self.registry
    }

    pub fn modifier(&mut self) -> &mut DagModifier<'a> {
        &mut self.modifier
    }

    /// Read access to the host graph.
    pub fn host(&self) -> &dyn HostGraph {
        self.modifier.host()
    }

    /// The modifier and registry together, for calls that need both.
    pub fn split(&mut self) -> (&mut DagModifier<'a>, &mut NodePathRegistry) {
        (&mut self.modifier, &mut *self.registry)
    }

    pub fn materials(&self) -> &MaterialCache {
        &*self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialCache {
        &mut *self.materials
    }

    pub fn shading_modes(&self) -> &'a ShadingModeRegistry {
        self.shading_modes
    }

    /// Register the node created for `path`.
    pub fn register(&mut self, path: &ScenePath, node: NodeHandle) {
        self.registry.register(path, node);
    }

    /// Host parent for a prim: the node of its nearest imported ancestor.
    pub fn parent_handle(&self, path: &ScenePath) -> Option<NodeHandle> {
        self.registry.parent_handle(path)
    }

    /// Ask the traversal to skip the current prim's descendants.
    pub fn prune_children(&mut self) {
        self.prune_children = true;
    }

    pub(crate) fn take_prune(&mut self) -> bool {
        std::mem::take(&mut self.prune_children)
    }
}

/// Collaborators an import job runs against.
pub struct ImportEnv<'a> {
    pub host: &'a mut dyn HostGraph,
    pub stage_cache: &'a mut StageCache,
    pub translators: &'a TranslatorRegistry,
    pub shading_modes: &'a ShadingModeRegistry,
}

impl<'a> ImportEnv<'a> {
    /// Use the process-wide translator and shading mode registries.
    pub fn new(host: &'a mut dyn HostGraph, stage_cache: &'a mut StageCache) -> Self {
        Self {
            host,
            stage_cache,
            translators: TranslatorRegistry::global(),
            shading_modes: ShadingModeRegistry::global(),
        }
    }

    pub fn with_translators(mut self, translators: &'a TranslatorRegistry) -> Self {
        self.translators = translators;
        self
    }

    pub fn with_shading_modes(mut self, shading_modes: &'a ShadingModeRegistry) -> Self {
        self.shading_modes = shading_modes;
        self
    }
}
