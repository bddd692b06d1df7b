//! The import job.
//!
//! [`ImportJob::read`] runs one import as a single unit:
//!
//! 1. open the stage with a session layer keyed by model name and variants
//! 2. warn on a linear unit mismatch
//! 3. validate the time interval and work out the playback expansion
//! 4. resolve the root prim
//! 5. apply variant selections to the session layer
//! 6. build the traversal range, failing if it is empty
//! 7. create the stage proxy when reading as an animation cache
//! 8. expand the playback range and seed the node path registry with the
//!    host parent
//! 9. traverse each top-level prim in pre- and post-order
//! 10. report the top-level host nodes created
//!
//! Nothing touches the host before step 6 succeeds, and a failed step 7
//! rolls back its own edits. Every host edit after that is recorded, so
//! [`ImportJob::undo`] and [`ImportJob::redo`] can toggle the whole import.

use crate::context::{ImportEnv, NodePathRegistry, ReadContext};
use crate::error::{ImportError, Result};
use crate::registry::{Translator, TranslatorRegistry};
use crate::translators::material::MaterialCache;
use indexmap::{IndexMap, IndexSet};
use stagelink_core::{DistanceUnit, ImportArgs, ScenePath, TimeInterval};
use stagelink_host::{DagModifier, HostGraph, Mutation, MutationBatch, NodeHandle, NodeKind, PlugType, PlugValue};
use stagelink_stage::{MemoryStage, PrimPredicate, PrimRange, SessionKey, Stage, TraversalEvent};

/// Registry key of the job's stage proxy node.
pub const STAGE_PROXY_KEY: &str = "stageProxy";

/// Host node type of the stage proxy.
pub const STAGE_PROXY_NODE_TYPE: &str = "stageProxy";

/// String plug on the stage proxy holding the source file path.
pub const FILE_PATH_PLUG: &str = "filePath";

/// Where the undo plan of a job stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoState {
    /// No undo has been requested since the last read.
    #[default]
    NotComputed,
    /// The plan exists and the import's effect is in the host.
    Computed,
    /// The import's effect has been undone.
    Applied,
}

#[derive(Debug, Default)]
struct UndoPlan {
    state: UndoState,
    /// Deletes every node the import created.
    deletions: MutationBatch,
    /// Edits the import made to state it did not create.
    external: MutationBatch,
}

/// One import of a scene file into the host.
#[derive(Debug)]
pub struct ImportJob {
    file_path: String,
    root_path: Option<ScenePath>,
    variants: IndexMap<String, String>,
    args: ImportArgs,
    root_parent: Option<NodeHandle>,
    registry: NodePathRegistry,
    materials: MaterialCache,
    read_batch: MutationBatch,
    undo: UndoPlan,
}

impl ImportJob {
    pub fn new(file_path: impl Into<String>, args: ImportArgs) -> Self {
        Self {
            file_path: file_path.into(),
            root_path: None,
            variants: IndexMap::new(),
            args,
            root_parent: None,
            registry: NodePathRegistry::new(),
            materials: MaterialCache::new(),
            read_batch: MutationBatch::new(),
            undo: UndoPlan::default(),
        }
    }

    /// Import only the subtree at `path`.
    pub fn with_root_path(mut self, path: ScenePath) -> Self {
        self.root_path = Some(path);
        self
    }

    /// Select variants on the root prim before traversal.
    pub fn with_variants(mut self, variants: impl IntoIterator<Item = (String, String)>) -> Self {
        self.variants = variants.into_iter().collect();
        self
    }

    /// Host node new top-level nodes are parented to, `None` for the world.
    pub fn root_parent(&self) -> Option<NodeHandle> {
        self.root_parent
    }

    pub fn set_root_parent(&mut self, parent: Option<NodeHandle>) {
        self.root_parent = parent;
    }

    pub fn args(&self) -> &ImportArgs {
        &self.args
    }

    pub fn state(&self) -> UndoState {
        self.undo.state
    }

    /// Nodes registered by the last read.
    pub fn registry(&self) -> &NodePathRegistry {
        &self.registry
    }

    /// Every host edit made by the last read.
    pub fn mutations(&self) -> &MutationBatch {
        &self.read_batch
    }

    /// Run the import, returning the top-level host nodes it created.
    pub fn read(&mut self, env: &mut ImportEnv<'_>) -> Result<Vec<NodeHandle>> {
        self.registry = NodePathRegistry::new();
        self.materials = MaterialCache::new();
        self.read_batch = MutationBatch::new();
        self.undo = UndoPlan::default();

        let key = SessionKey::new(
            SessionKey::model_name_for(&self.file_path),
            self.variants.iter().map(|(set, selection)| (set.clone(), selection.clone())),
        );
        let mut stage = env.stage_cache.open_stage(&self.file_path, &key)?;
        log::debug!("opened {} with session {}", self.file_path, key.identifier());

        check_units(&stage, env.host.internal_linear_unit());
        let playback = self.playback_expansion(&stage, env.host.playback_range())?;
        let root = self.resolve_root(&stage);

        for (set, selection) in &self.variants {
            if let Err(err) = stage.set_variant_selection(&root, set, selection) {
                log::warn!("{}: cannot select {}={}: {}", root, set, selection, err);
            }
        }
        env.stage_cache.store_session(&key, &stage);

        let predicate = PrimPredicate::default().with_instance_proxies();
        let roots = top_level_paths(&stage, &root, predicate);
        if roots.is_empty() {
            log::error!("{}: nothing to import under {}", self.file_path, root);
            return Err(ImportError::EmptyTraversal(root));
        }

        let translators = env.translators;
        let shading_modes = env.shading_modes;
        let mut modifier = DagModifier::new(&mut *env.host, &mut self.read_batch);
        if self.args.use_as_animation_cache {
            match create_stage_proxy(&mut modifier, &self.file_path) {
                Ok(proxy) => self.registry.register_path(STAGE_PROXY_KEY, proxy),
                Err(err) => {
                    drop(modifier);
                    if let Err(revert) = self.read_batch.revert(&mut *env.host) {
                        log::error!("{}: cannot roll back stage proxy: {}", self.file_path, revert);
                    }
                    self.read_batch = MutationBatch::new();
                    return Err(err);
                }
            }
        }

        if let Some(range) = playback {
            log::debug!("expanding playback range to [{}, {}]", range.min, range.max);
            modifier.set_playback_range(range);
        }

        if let Some(parent) = self.root_parent {
            let seed = root.parent().unwrap_or_else(ScenePath::absolute_root);
            self.registry.register(&seed, parent);
        }

        let mut ctx = ReadContext::new(
            &stage,
            &self.args,
            &mut self.registry,
            modifier,
            &mut self.materials,
            shading_modes,
        );
        for path in &roots {
            traverse(&stage, path, predicate, translators, &mut ctx);
        }
        drop(ctx);
        log::debug!(
            "{}: {} nodes registered, {} edits recorded",
            self.file_path,
            self.registry.len(),
            self.read_batch.len()
        );

        let host: &dyn HostGraph = &*env.host;
        Ok(roots
            .iter()
            .filter_map(|path| self.registry.lookup(path))
            .filter(|node| matches!(host.node_kind(*node), Ok(NodeKind::Dag)))
            .collect())
    }

    /// Playback range to set after validation, if it has to grow.
    fn playback_expansion(&self, stage: &MemoryStage, current: TimeInterval) -> Result<Option<TimeInterval>> {
        let requested = match self.args.time_interval {
            Some(interval) if !interval.is_valid() => {
                log::error!("invalid time interval [{}, {}]", interval.min, interval.max);
                return Err(ImportError::InvalidTimeInterval {
                    min: interval.min,
                    max: interval.max,
                });
            }
            Some(interval) if interval.is_finite() => Some(interval),
            Some(_) => None,
            None if self.args.read_animation => match (stage.start_time_code(), stage.end_time_code()) {
                (Some(start), Some(end)) if start <= end => Some(TimeInterval::new(start, end)),
                _ => None,
            },
            None => None,
        };
        Ok(requested
            .map(|interval| current.union(&interval))
            .filter(|expanded| *expanded != current))
    }

    /// The explicit root if it exists, else the default prim, else `/`.
    fn resolve_root(&self, stage: &MemoryStage) -> ScenePath {
        match &self.root_path {
            Some(path) if stage.prim(path).is_some() => path.clone(),
            Some(path) => {
                log::warn!("{}: root {} not found, importing the whole stage", self.file_path, path);
                ScenePath::absolute_root()
            }
            None => stage
                .default_prim()
                .map(|prim| prim.path().clone())
                .unwrap_or_else(ScenePath::absolute_root),
        }
    }

    fn compute_undo(&mut self, host: &dyn HostGraph) {
        let created: IndexSet<NodeHandle> = self.read_batch.created_nodes().collect();

        let mut scheduled = IndexSet::new();
        for (key, node) in self.registry.iter() {
            if Some(node) == self.root_parent || !created.contains(&node) || !host.is_alive(node) {
                continue;
            }
            let delete = match host.node_kind(node) {
                Ok(NodeKind::Dag) => matches!(host.parent(node), Ok(parent) if parent == self.root_parent),
                Ok(_) => true,
                Err(err) => {
                    log::error!("{}: cannot inspect node for undo: {}", key, err);
                    false
                }
            };
            if delete {
                scheduled.insert(node);
            }
        }

        let mut deletions = MutationBatch::new();
        deletions.extend(scheduled.into_iter().map(|node| Mutation::DeleteNode { node }));

        let mut external = MutationBatch::new();
        external.extend(
            self.read_batch
                .iter()
                .filter(|mutation| touches_existing(mutation, &created))
                .cloned(),
        );

        log::debug!(
            "undo plan: {} deletions, {} edits to existing state",
            deletions.len(),
            external.len()
        );
        self.undo = UndoPlan {
            state: UndoState::Computed,
            deletions,
            external,
        };
    }

    /// Remove everything the last read added to the host.
    ///
    /// Returns `Ok(false)` if there is nothing to undo.
    pub fn undo(&mut self, host: &mut dyn HostGraph) -> Result<bool> {
        match self.undo.state {
            UndoState::Applied => return Ok(false),
            UndoState::NotComputed => {
                if self.read_batch.is_empty() {
                    return Ok(false);
                }
                self.compute_undo(host);
            }
            UndoState::Computed => {}
        }

        self.undo.external.revert(host)?;
        if let Err(err) = self.undo.deletions.apply(host) {
            if let Err(rollback) = self.undo.external.apply(host) {
                log::error!("undo rollback failed: {}", rollback);
            }
            return Err(err.into());
        }
        self.undo.state = UndoState::Applied;
        Ok(true)
    }

    /// Bring back what [`undo`](Self::undo) removed.
    ///
    /// Returns `Ok(false)` unless an undo is in effect.
    pub fn redo(&mut self, host: &mut dyn HostGraph) -> Result<bool> {
        if self.undo.state != UndoState::Applied {
            return Ok(false);
        }

        self.undo.deletions.revert(host)?;
        if let Err(err) = self.undo.external.apply(host) {
            if let Err(rollback) = self.undo.deletions.apply(host) {
                log::error!("redo rollback failed: {}", rollback);
            }
            return Err(err.into());
        }
        self.undo.state = UndoState::Computed;
        Ok(true)
    }
}

fn create_stage_proxy(modifier: &mut DagModifier<'_>, file_path: &str) -> Result<NodeHandle> {
    let proxy = modifier.create_node(STAGE_PROXY_NODE_TYPE, STAGE_PROXY_NODE_TYPE)?;
    modifier.add_plug(proxy, FILE_PATH_PLUG, PlugType::String)?;
    modifier.set_plug(proxy, FILE_PATH_PLUG, PlugValue::String(file_path.to_string()))?;
    Ok(proxy)
}

fn check_units(stage: &MemoryStage, host_unit: DistanceUnit) {
    let Some(meters_per_unit) = stage.meters_per_unit() else {
        return;
    };
    let matches = (meters_per_unit - host_unit.meters()).abs() <= 1e-9 * host_unit.meters();
    if !matches {
        log::warn!(
            "{}: stage unit is {} m, host unit is {:?}; distances are imported unconverted",
            stage.identifier(),
            meters_per_unit,
            host_unit
        );
    }
}

/// Prims imported as top-level nodes: the children of `/`, or the root.
fn top_level_paths(stage: &dyn Stage, root: &ScenePath, predicate: PrimPredicate) -> Vec<ScenePath> {
    if root.is_absolute_root() {
        return stage
            .pseudo_root()
            .children()
            .iter()
            .filter(|child| stage.prim(child).is_some_and(|prim| predicate.accepts(prim)))
            .cloned()
            .collect();
    }
    if PrimRange::new(stage, root, predicate).is_empty() {
        return Vec::new();
    }
    vec![root.clone()]
}

/// Read one top-level prim and its subtree.
fn traverse(
    stage: &dyn Stage,
    root: &ScenePath,
    predicate: PrimPredicate,
    translators: &TranslatorRegistry,
    ctx: &mut ReadContext<'_>,
) {
    let mut post_read: IndexMap<ScenePath, Box<dyn Translator>> = IndexMap::new();
    let mut range = PrimRange::pre_and_post(stage, root, predicate);
    while let Some(event) = range.next() {
        match event {
            TraversalEvent::Enter(prim) => {
                let factory = translators.find_or_fallback(prim.type_name());
                let mut translator = factory(prim);
                if let Err(err) = translator.read(prim, ctx) {
                    log::error!("{}: read failed: {}", prim.path(), err);
                }
                if ctx.take_prune() {
                    range.prune_children();
                }
                if translator.has_post_read_subtree() {
                    post_read.insert(prim.path().clone(), translator);
                }
            }
            TraversalEvent::Exit(prim) => {
                if let Some(mut translator) = post_read.shift_remove(prim.path()) {
                    if let Err(err) = translator.post_read_subtree(prim, ctx) {
                        log::error!("{}: post-read failed: {}", prim.path(), err);
                    }
                }
            }
        }
    }
}

/// Whether undoing `mutation` has to happen explicitly, because deleting
/// the created nodes does not cover it.
fn touches_existing(mutation: &Mutation, created: &IndexSet<NodeHandle>) -> bool {
    match mutation {
        Mutation::CreateNode { .. } | Mutation::DeleteNode { .. } => false,
        Mutation::Rename { node, .. } | Mutation::AddPlug { node, .. } | Mutation::SetPlug { node, .. } => {
            !created.contains(node)
        }
        Mutation::AddKeyframe { curve, .. } => !created.contains(curve),
        Mutation::AddSetMember { set, .. } => !created.contains(set),
        Mutation::SetPlaybackRange { .. } => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagelink_host::{MemoryHost, SetMember};
    use stagelink_stage::{Layer, PrimSpec, StageCache};

    fn env_parts() -> (MemoryHost, StageCache) {
        let mut cache = StageCache::new();
        cache.insert_layer(
            Layer::new("scene.json")
                .with_prim(PrimSpec::new("World", "Xform").with_child(PrimSpec::new("Child", "Xform")))
                .with_time_codes(1.0, 24.0),
        );
        (MemoryHost::new(), cache)
    }

    #[test]
    fn test_touches_existing() {
        let created: IndexSet<NodeHandle> = [NodeHandle::from_raw(7)].into_iter().collect();
        let existing = NodeHandle::from_raw(1);
        let own = NodeHandle::from_raw(7);

        let on_existing = Mutation::AddSetMember {
            set: existing,
            member: SetMember::object(own),
        };
        let on_own = Mutation::AddPlug {
            node: own,
            name: "x".into(),
            plug_type: PlugType::Int,
        };
        assert!(touches_existing(&on_existing, &created));
        assert!(!touches_existing(&on_own, &created));
        assert!(!touches_existing(&Mutation::CreateNode { node: own }, &created));
    }

    #[test]
    fn test_stage_time_codes_expand_playback() {
        let (mut host, mut cache) = env_parts();
        host.set_playback_range(TimeInterval::new(10.0, 12.0));
        let mut job = ImportJob::new("scene.json", ImportArgs::default());
        let mut env = ImportEnv::new(&mut host, &mut cache);
        job.read(&mut env).unwrap();
        assert_eq!(host.playback_range(), TimeInterval::new(1.0, 24.0));

        assert!(job.undo(&mut host).unwrap());
        assert_eq!(host.playback_range(), TimeInterval::new(10.0, 12.0));
        assert!(!job.undo(&mut host).unwrap());
        assert!(job.redo(&mut host).unwrap());
        assert_eq!(host.playback_range(), TimeInterval::new(1.0, 24.0));
    }

    #[test]
    fn test_undo_before_read_is_noop() {
        let mut host = MemoryHost::new();
        let mut job = ImportJob::new("scene.json", ImportArgs::default());
        assert!(!job.undo(&mut host).unwrap());
        assert!(!job.redo(&mut host).unwrap());
        assert_eq!(job.state(), UndoState::NotComputed);
    }

    #[test]
    fn test_root_parent_seeds_registry() {
        let (mut host, mut cache) = env_parts();
        let group = host.create_dag_node("transform", "group", None).unwrap();
        let mut job = ImportJob::new("scene.json", ImportArgs::default()).with_root_path(ScenePath::parse("/World/Child").unwrap());
        job.set_root_parent(Some(group));

        let mut env = ImportEnv::new(&mut host, &mut cache);
        let added = job.read(&mut env).unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(host.parent(added[0]).unwrap(), Some(group));
        assert_eq!(job.registry().lookup_path("/World"), Some(group));

        job.undo(&mut host).unwrap();
        assert!(!host.is_alive(added[0]));
        assert!(host.is_alive(group));
    }
}
