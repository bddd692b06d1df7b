//! Shared root layers and keyed session layers.
//!
//! Opening the same file twice yields stages that share one root layer.
//! Each stage gets the session layer for its [`SessionKey`], so imports of
//! one file with different variant selections never see each other's
//! overrides.

use crate::error::{Result, StageError};
use crate::layer::Layer;
use crate::stage::{MemoryStage, SessionLayer};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// Identity of a session layer: model name plus sorted variant selections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub model_name: String,
    pub variants: Vec<(String, String)>,
}

impl SessionKey {
    /// Create a key. Selections are sorted by set name.
    pub fn new(model_name: impl Into<String>, variants: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut variants: Vec<_> = variants.into_iter().collect();
        variants.sort();
        Self {
            model_name: model_name.into(),
            variants,
        }
    }

    /// Model name derived from a file path: its file stem.
    pub fn model_name_for(file_path: &str) -> String {
        Path::new(file_path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(file_path)
            .to_string()
    }

    /// Session layer identifier, e.g. `chair-session{lod=high}`.
    pub fn identifier(&self) -> String {
        let selections: Vec<String> = self.variants.iter().map(|(set, sel)| format!("{}={}", set, sel)).collect();
        format!("{}-session{{{}}}", self.model_name, selections.join(","))
    }
}

/// Cache of opened root layers and session layers.
#[derive(Debug, Default)]
pub struct StageCache {
    layers: IndexMap<String, Arc<Layer>>,
    sessions: IndexMap<SessionKey, SessionLayer>,
}

impl StageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-memory layer under its identifier.
    pub fn insert_layer(&mut self, layer: Layer) -> Arc<Layer> {
        let layer = Arc::new(layer);
        self.layers.insert(layer.identifier.clone(), Arc::clone(&layer));
        layer
    }

    /// Open a root layer, reading and parsing the file on first use.
    pub fn open_layer(&mut self, file_path: &str) -> Result<Arc<Layer>> {
        if let Some(layer) = self.layers.get(file_path) {
            log::debug!("layer cache hit: {}", file_path);
            return Ok(Arc::clone(layer));
        }

        let text = std::fs::read_to_string(file_path).map_err(|e| StageError::open(file_path, e))?;
        let mut layer = Layer::from_json(&text)?;
        if layer.identifier.is_empty() {
            layer.identifier = file_path.to_string();
        }
        log::debug!("opened layer {} from {}", layer.identifier, file_path);
        let layer = Arc::new(layer);
        self.layers.insert(file_path.to_string(), Arc::clone(&layer));
        Ok(layer)
    }

    /// The session layer for a key, created empty on first use.
    pub fn session_layer(&mut self, key: &SessionKey) -> SessionLayer {
        self.sessions
            .entry(key.clone())
            .or_insert_with(|| SessionLayer::new(key.identifier()))
            .clone()
    }

    /// Open a stage on a root layer with the session layer for `key`.
    pub fn open_stage(&mut self, file_path: &str, key: &SessionKey) -> Result<MemoryStage> {
        let root = self.open_layer(file_path)?;
        let session = self.session_layer(key);
        MemoryStage::new(root, session)
    }

    /// Remember a stage's session edits for later opens with the same key.
    pub fn store_session(&mut self, key: &SessionKey, stage: &MemoryStage) {
        self.sessions.insert(key.clone(), stage.session_layer().clone());
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::PrimSpec;
    use crate::stage::Stage;
    use stagelink_core::ScenePath;

    #[test]
    fn test_session_key_sorted() {
        let a = SessionKey::new("chair", vec![("lod".into(), "high".into()), ("color".into(), "red".into())]);
        let b = SessionKey::new("chair", vec![("color".into(), "red".into()), ("lod".into(), "high".into())]);
        assert_eq!(a, b);
        assert_eq!(a.identifier(), "chair-session{color=red,lod=high}");
    }

    #[test]
    fn test_model_name() {
        assert_eq!(SessionKey::model_name_for("/assets/chair.json"), "chair");
        assert_eq!(SessionKey::model_name_for("scene"), "scene");
    }

    #[test]
    fn test_shared_root_distinct_sessions() {
        let mut cache = StageCache::new();
        cache.insert_layer(Layer::new("mem:chair").with_prim(PrimSpec::new("Chair", "Xform")));

        let plain = SessionKey::new("chair", Vec::new());
        let high = SessionKey::new("chair", vec![("lod".into(), "high".into())]);
        let a = cache.open_stage("mem:chair", &plain).unwrap();
        let b = cache.open_stage("mem:chair", &high).unwrap();

        assert!(Arc::ptr_eq(a.root_layer(), b.root_layer()));
        assert_ne!(a.session_layer().identifier, b.session_layer().identifier);
        assert_eq!(cache.layer_count(), 1);
        assert_eq!(cache.session_count(), 2);
    }

    #[test]
    fn test_open_missing_file() {
        let mut cache = StageCache::new();
        let err = cache.open_layer("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, StageError::Open { .. }));
    }

    #[test]
    fn test_open_from_file() {
        let dir = std::env::temp_dir().join(format!("stagelink-cache-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("box.json");
        let layer = Layer::new("").with_prim(PrimSpec::new("Box", "Mesh"));
        std::fs::write(&file, layer.to_json().unwrap()).unwrap();

        let mut cache = StageCache::new();
        let path = file.to_str().unwrap();
        let stage = cache.open_stage(path, &SessionKey::new("box", Vec::new())).unwrap();
        assert_eq!(stage.identifier(), path);
        assert!(stage.prim(&ScenePath::parse("/Box").unwrap()).is_some());
        std::fs::remove_dir_all(&dir).ok();
    }
}
