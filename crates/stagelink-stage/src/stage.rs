//! The stage interface and its in-memory implementation.

use crate::error::{Result, StageError};
use crate::layer::{AttributeSpec, Layer, PrimSpec};
use crate::prim::{Attribute, Prim, VariantSet};
use indexmap::IndexMap;
use stagelink_core::ScenePath;
use std::sync::Arc;

/// Read access to a composed scene description.
pub trait Stage {
    /// Identifier of the root layer.
    fn identifier(&self) -> &str;

    /// The prim at `/`.
    fn pseudo_root(&self) -> &Prim;

    /// The prim at `path`, if any.
    fn prim(&self, path: &ScenePath) -> Option<&Prim>;

    /// The prim named by the root layer's default prim metadata.
    fn default_prim(&self) -> Option<&Prim>;

    /// Authored linear unit in meters, `None` when unauthored.
    fn meters_per_unit(&self) -> Option<f64>;

    fn time_codes_per_second(&self) -> f64;

    fn start_time_code(&self) -> Option<f64>;

    fn end_time_code(&self) -> Option<f64>;

    /// Select a variant. Only the session layer is edited.
    fn set_variant_selection(&mut self, path: &ScenePath, set: &str, selection: &str) -> Result<()>;
}

/// Per-stage overrides layered over a shared root layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionLayer {
    pub identifier: String,
    /// Prim path to variant set name to selection.
    pub selections: IndexMap<ScenePath, IndexMap<String, String>>,
}

impl SessionLayer {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            selections: IndexMap::new(),
        }
    }

    /// The selection authored for a set, if any.
    pub fn selection(&self, path: &ScenePath, set: &str) -> Option<&str> {
        self.selections.get(path)?.get(set).map(String::as_str)
    }
}

/// A stage composed from a shared root layer and a private session layer.
#[derive(Debug, Clone)]
pub struct MemoryStage {
    root: Arc<Layer>,
    session: SessionLayer,
    pseudo_root: Prim,
    prims: IndexMap<ScenePath, Prim>,
}

impl MemoryStage {
    /// Compose a stage. Fails on duplicate sibling names or invalid names.
    pub fn new(root: Arc<Layer>, session: SessionLayer) -> Result<Self> {
        let mut stage = Self {
            root,
            session,
            pseudo_root: Prim::pseudo_root(Vec::new()),
            prims: IndexMap::new(),
        };
        stage.compose()?;
        Ok(stage)
    }

    /// Compose a stage from a layer with an empty session.
    pub fn from_layer(layer: Layer) -> Result<Self> {
        let session = SessionLayer::new(format!("{}-session", layer.identifier));
        Self::new(Arc::new(layer), session)
    }

    pub fn root_layer(&self) -> &Arc<Layer> {
        &self.root
    }

    pub fn session_layer(&self) -> &SessionLayer {
        &self.session
    }

    /// Number of composed prims, the pseudo-root included.
    pub fn prim_count(&self) -> usize {
        self.prims.len() + 1
    }

    fn compose(&mut self) -> Result<()> {
        let mut prims = IndexMap::new();
        let root_path = ScenePath::absolute_root();
        let mut top = Vec::with_capacity(self.root.prims.len());
        for spec in &self.root.prims {
            top.push(compose_prim(spec, &root_path, &self.session, &mut prims)?);
        }
        self.pseudo_root = Prim::pseudo_root(top);
        self.prims = prims;
        log::trace!("composed {} prims for {}", self.prim_count(), self.root.identifier);
        Ok(())
    }
}

fn compose_prim(
    spec: &PrimSpec,
    parent: &ScenePath,
    session: &SessionLayer,
    prims: &mut IndexMap<ScenePath, Prim>,
) -> Result<ScenePath> {
    let path = parent.append_child(&spec.name)?;
    if prims.contains_key(&path) {
        return Err(StageError::DuplicatePrim(path));
    }

    let mut attributes: IndexMap<String, Attribute> = spec
        .attributes
        .iter()
        .map(|a| (a.name.clone(), Attribute::from_spec(a)))
        .collect();
    let mut child_specs: Vec<&PrimSpec> = spec.children.iter().collect();
    let mut variant_sets = IndexMap::new();

    for (set_name, set) in &spec.variant_sets {
        let selection = session
            .selection(&path, set_name)
            .map(str::to_string)
            .or_else(|| set.default_selection.clone());
        if let Some(variant) = selection.as_ref().and_then(|s| set.variants.get(s)) {
            apply_variant(&mut attributes, &variant.attributes);
            child_specs.extend(variant.children.iter());
        }
        variant_sets.insert(
            set_name.clone(),
            VariantSet {
                variants: set.variants.keys().cloned().collect(),
                selection,
            },
        );
    }

    let mut children = Vec::with_capacity(child_specs.len());
    for child in child_specs {
        children.push(compose_prim(child, &path, session, prims)?);
    }

    prims.insert(
        path.clone(),
        Prim {
            path: path.clone(),
            type_name: spec.type_name.clone(),
            specifier: spec.specifier,
            active: spec.active,
            instanceable: spec.instanceable,
            kind: spec.kind.clone(),
            attributes,
            relationships: spec.relationships.clone(),
            specializes: spec.specializes.clone(),
            variant_sets,
            children,
        },
    );
    Ok(path)
}

/// Variant opinions are stronger than the prim's own.
fn apply_variant(attributes: &mut IndexMap<String, Attribute>, overrides: &[AttributeSpec]) {
    for spec in overrides {
        attributes.insert(spec.name.clone(), Attribute::from_spec(spec));
    }
}

impl Stage for MemoryStage {
    fn identifier(&self) -> &str {
        &self.root.identifier
    }

    fn pseudo_root(&self) -> &Prim {
        &self.pseudo_root
    }

    fn prim(&self, path: &ScenePath) -> Option<&Prim> {
        if path.is_absolute_root() {
            return Some(&self.pseudo_root);
        }
        self.prims.get(path)
    }

    fn default_prim(&self) -> Option<&Prim> {
        let name = self.root.default_prim.as_deref()?;
        let path = ScenePath::absolute_root().append_child(name).ok()?;
        self.prims.get(&path)
    }

    fn meters_per_unit(&self) -> Option<f64> {
        self.root.meters_per_unit
    }

    fn time_codes_per_second(&self) -> f64 {
        self.root.time_codes_per_second
    }

    fn start_time_code(&self) -> Option<f64> {
        self.root.start_time_code
    }

    fn end_time_code(&self) -> Option<f64> {
        self.root.end_time_code
    }

    fn set_variant_selection(&mut self, path: &ScenePath, set: &str, selection: &str) -> Result<()> {
        let prim = self.prim(path).ok_or_else(|| StageError::PrimNotFound(path.clone()))?;
        if !prim.variant_sets.contains_key(set) {
            return Err(StageError::VariantSetNotFound {
                path: path.clone(),
                set: set.to_string(),
            });
        }
        self.session
            .selections
            .entry(path.clone())
            .or_default()
            .insert(set.to_string(), selection.to_string());
        self.compose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{VariantSetSpec, VariantSpec};
    use crate::prim::TimeSample;
    use stagelink_core::{ScalarKind, Value, ValueType};

    fn path(text: &str) -> ScenePath {
        ScenePath::parse(text).unwrap()
    }

    fn variant_layer() -> Layer {
        let mut set = VariantSetSpec {
            default_selection: Some("low".into()),
            ..Default::default()
        };
        set.variants.insert(
            "low".into(),
            VariantSpec {
                children: vec![PrimSpec::new("LowGeo", "Mesh")],
                ..Default::default()
            },
        );
        set.variants.insert(
            "high".into(),
            VariantSpec {
                attributes: vec![AttributeSpec::new("detail", ValueType::scalar(ScalarKind::Int)).with_default(Value::Int(3))],
                children: vec![PrimSpec::new("HighGeo", "Mesh")],
            },
        );
        Layer::new("asset.json")
            .with_default_prim("Asset")
            .with_prim(PrimSpec::new("Asset", "Xform").with_variant_set("lod", set))
    }

    #[test]
    fn test_compose_hierarchy() {
        let layer = Layer::new("scene").with_prim(
            PrimSpec::new("World", "Xform").with_child(PrimSpec::new("Geo", "Scope").with_child(PrimSpec::new("Cube", "Mesh"))),
        );
        let stage = MemoryStage::from_layer(layer).unwrap();
        assert_eq!(stage.prim_count(), 4);
        assert_eq!(stage.pseudo_root().children(), &[path("/World")]);
        let geo = stage.prim(&path("/World/Geo")).unwrap();
        assert_eq!(geo.type_name(), "Scope");
        assert_eq!(geo.children(), &[path("/World/Geo/Cube")]);
        assert!(stage.default_prim().is_none());
    }

    #[test]
    fn test_duplicate_sibling_rejected() {
        let layer = Layer::new("dup").with_prim(PrimSpec::new("A", "")).with_prim(PrimSpec::new("A", ""));
        assert!(matches!(MemoryStage::from_layer(layer), Err(StageError::DuplicatePrim(_))));
    }

    #[test]
    fn test_default_variant_selection() {
        let stage = MemoryStage::from_layer(variant_layer()).unwrap();
        let asset = stage.default_prim().unwrap();
        assert_eq!(asset.children(), &[path("/Asset/LowGeo")]);
        assert_eq!(asset.variant_sets()["lod"].selection.as_deref(), Some("low"));
    }

    #[test]
    fn test_set_variant_selection_recomposes() {
        let mut stage = MemoryStage::from_layer(variant_layer()).unwrap();
        stage.set_variant_selection(&path("/Asset"), "lod", "high").unwrap();
        let asset = stage.prim(&path("/Asset")).unwrap();
        assert_eq!(asset.children(), &[path("/Asset/HighGeo")]);
        assert_eq!(
            asset.attribute("detail").unwrap().value_at(TimeSample::Default),
            Some(&Value::Int(3))
        );
        assert!(stage.prim(&path("/Asset/LowGeo")).is_none());
        // The root layer is untouched.
        assert_eq!(stage.root_layer().prims[0].children.len(), 0);
        assert_eq!(stage.session_layer().selection(&path("/Asset"), "lod"), Some("high"));
    }

    #[test]
    fn test_set_variant_errors() {
        let mut stage = MemoryStage::from_layer(variant_layer()).unwrap();
        assert!(matches!(
            stage.set_variant_selection(&path("/Nope"), "lod", "high"),
            Err(StageError::PrimNotFound(_))
        ));
        assert!(matches!(
            stage.set_variant_selection(&path("/Asset"), "shape", "round"),
            Err(StageError::VariantSetNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_selection_composes_nothing() {
        let mut stage = MemoryStage::from_layer(variant_layer()).unwrap();
        stage.set_variant_selection(&path("/Asset"), "lod", "medium").unwrap();
        assert!(stage.prim(&path("/Asset")).unwrap().children().is_empty());
    }
}
