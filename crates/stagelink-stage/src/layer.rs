//! Layer documents.
//!
//! A layer is the authored, uncomposed form of a stage. On disk it is the
//! JSON serialization of [`Layer`]; in memory it is shared behind an `Arc`
//! by every stage opened on it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use stagelink_core::{ScenePath, Value, ValueType};

fn default_time_codes_per_second() -> f64 {
    24.0
}

fn default_true() -> bool {
    true
}

/// How a prim spec contributes to its prim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specifier {
    /// Defines the prim.
    #[default]
    Def,
    /// Only overrides opinions; the prim is not defined by this spec.
    Over,
    /// Abstract prim, skipped by default traversal.
    Class,
}

/// One authored attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// `(time, value)` pairs, in any order.
    #[serde(default)]
    pub time_samples: Vec<(f64, Value)>,
}

impl AttributeSpec {
    /// An attribute with no value.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            custom: false,
            default: None,
            time_samples: Vec::new(),
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_sample(mut self, time: f64, value: Value) -> Self {
        self.time_samples.push((time, value));
        self
    }

    pub fn custom(mut self) -> Self {
        self.custom = true;
        self
    }
}

/// Contents one variant adds to its prim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub children: Vec<PrimSpec>,
}

/// A named set of mutually exclusive variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantSetSpec {
    /// Selection used when the session layer selects nothing.
    #[serde(default)]
    pub default_selection: Option<String>,
    pub variants: IndexMap<String, VariantSpec>,
}

/// One authored prim and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimSpec {
    pub name: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub specifier: Specifier,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub instanceable: bool,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    /// Relationship name to target paths.
    #[serde(default)]
    pub relationships: IndexMap<String, Vec<ScenePath>>,
    #[serde(default)]
    pub specializes: Vec<ScenePath>,
    #[serde(default)]
    pub variant_sets: IndexMap<String, VariantSetSpec>,
    #[serde(default)]
    pub children: Vec<PrimSpec>,
}

impl PrimSpec {
    /// A defined prim of the given type.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            specifier: Specifier::Def,
            active: true,
            instanceable: false,
            kind: None,
            attributes: Vec::new(),
            relationships: IndexMap::new(),
            specializes: Vec::new(),
            variant_sets: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_specifier(mut self, specifier: Specifier) -> Self {
        self.specifier = specifier;
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_relationship(mut self, name: impl Into<String>, targets: Vec<ScenePath>) -> Self {
        self.relationships.insert(name.into(), targets);
        self
    }

    pub fn with_specializes(mut self, base: ScenePath) -> Self {
        self.specializes.push(base);
        self
    }

    pub fn with_variant_set(mut self, name: impl Into<String>, set: VariantSetSpec) -> Self {
        self.variant_sets.insert(name.into(), set);
        self
    }

    pub fn with_child(mut self, child: PrimSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn instanceable(mut self) -> Self {
        self.instanceable = true;
        self
    }
}

/// A root layer document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Identifier the layer is cached under. Files default to their path.
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub default_prim: Option<String>,
    /// Authored linear unit; unset means the stage's fallback of centimeters.
    #[serde(default)]
    pub meters_per_unit: Option<f64>,
    #[serde(default = "default_time_codes_per_second")]
    pub time_codes_per_second: f64,
    #[serde(default)]
    pub start_time_code: Option<f64>,
    #[serde(default)]
    pub end_time_code: Option<f64>,
    #[serde(default)]
    pub prims: Vec<PrimSpec>,
}

impl Layer {
    /// An empty layer.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            default_prim: None,
            meters_per_unit: None,
            time_codes_per_second: default_time_codes_per_second(),
            start_time_code: None,
            end_time_code: None,
            prims: Vec::new(),
        }
    }

    pub fn with_prim(mut self, prim: PrimSpec) -> Self {
        self.prims.push(prim);
        self
    }

    pub fn with_default_prim(mut self, name: impl Into<String>) -> Self {
        self.default_prim = Some(name.into());
        self
    }

    pub fn with_meters_per_unit(mut self, meters_per_unit: f64) -> Self {
        self.meters_per_unit = Some(meters_per_unit);
        self
    }

    pub fn with_time_codes(mut self, start: f64, end: f64) -> Self {
        self.start_time_code = Some(start);
        self.end_time_code = Some(end);
        self
    }

    /// Parse a layer from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagelink_core::ScalarKind;

    #[test]
    fn test_layer_json_defaults() {
        let layer = Layer::from_json(
            r#"{
                "prims": [
                    { "name": "World", "type_name": "Xform", "children": [ { "name": "Geo" } ] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(layer.time_codes_per_second, 24.0);
        assert_eq!(layer.prims[0].specifier, Specifier::Def);
        assert!(layer.prims[0].active);
        assert_eq!(layer.prims[0].children[0].type_name, "");
    }

    #[test]
    fn test_attribute_json() {
        let layer = Layer::from_json(
            r#"{
                "identifier": "anim.json",
                "prims": [{
                    "name": "Cube",
                    "type_name": "Xform",
                    "specifier": "over",
                    "attributes": [{
                        "name": "xformOp:translate",
                        "value_type": "double3",
                        "time_samples": [[1.0, {"Double3": [0.0, 1.0, 2.0]}]]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let attr = &layer.prims[0].attributes[0];
        assert_eq!(attr.value_type, ValueType::scalar(ScalarKind::Double3));
        assert_eq!(attr.time_samples[0], (1.0, Value::Double3([0.0, 1.0, 2.0])));
        assert_eq!(layer.prims[0].specifier, Specifier::Over);
    }

    #[test]
    fn test_round_trip_json() {
        let layer = Layer::new("scene")
            .with_default_prim("World")
            .with_prim(PrimSpec::new("World", "Xform").with_attribute(
                AttributeSpec::new("visibility", ValueType::scalar(ScalarKind::Token))
                    .with_default(Value::Token("inherited".into())),
            ));
        let back = Layer::from_json(&layer.to_json().unwrap()).unwrap();
        assert_eq!(back, layer);
    }
}
