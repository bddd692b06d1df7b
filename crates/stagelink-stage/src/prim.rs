//! Composed prims and attributes.

use crate::layer::{AttributeSpec, Specifier};
use indexmap::IndexMap;
use stagelink_core::{ScenePath, TimeInterval, Value, ValueType};

/// Relationship holding a prim's direct material binding.
pub const MATERIAL_BINDING: &str = "material:binding";

/// The time an attribute is read at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSample {
    /// The default value, or the first sample when no default is authored.
    Default,
    /// The held value at a time code.
    At(f64),
}

/// A composed attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    value_type: ValueType,
    custom: bool,
    default: Option<Value>,
    /// Sorted by time, no duplicate times.
    samples: Vec<(f64, Value)>,
}

impl Attribute {
    pub(crate) fn from_spec(spec: &AttributeSpec) -> Self {
        let mut samples = spec.time_samples.clone();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        samples.dedup_by(|later, earlier| later.0 == earlier.0);
        Self {
            name: spec.name.clone(),
            value_type: spec.value_type,
            custom: spec.custom,
            default: spec.default.clone(),
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether the attribute is user-declared rather than schema-defined.
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Whether any value is authored.
    pub fn has_value(&self) -> bool {
        self.default.is_some() || !self.samples.is_empty()
    }

    /// More than one sample means the value may change over time.
    pub fn might_be_time_varying(&self) -> bool {
        self.samples.len() > 1
    }

    /// Value at `time`. Samples are held, so a time between two samples
    /// reads the earlier one and a time before the first reads the first.
    pub fn value_at(&self, time: TimeSample) -> Option<&Value> {
        match time {
            TimeSample::Default => self.default.as_ref().or_else(|| self.samples.first().map(|(_, v)| v)),
            TimeSample::At(t) => {
                if self.samples.is_empty() {
                    return self.default.as_ref();
                }
                let after = self.samples.partition_point(|(st, _)| *st <= t);
                let index = after.saturating_sub(1);
                self.samples.get(index).map(|(_, v)| v)
            }
        }
    }

    /// All authored sample times.
    pub fn sample_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|(t, _)| *t)
    }

    /// Sample times inside `interval`.
    pub fn sample_times_in(&self, interval: &TimeInterval) -> Vec<f64> {
        self.sample_times().filter(|t| interval.contains(*t)).collect()
    }

    /// Authored `(time, value)` samples.
    pub fn samples(&self) -> &[(f64, Value)] {
        &self.samples
    }
}

/// A composed variant set on a prim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
    pub variants: Vec<String>,
    pub selection: Option<String>,
}

/// A composed, read-only prim.
#[derive(Debug, Clone, PartialEq)]
pub struct Prim {
    pub(crate) path: ScenePath,
    pub(crate) type_name: String,
    pub(crate) specifier: Specifier,
    pub(crate) active: bool,
    pub(crate) instanceable: bool,
    pub(crate) kind: Option<String>,
    pub(crate) attributes: IndexMap<String, Attribute>,
    pub(crate) relationships: IndexMap<String, Vec<ScenePath>>,
    pub(crate) specializes: Vec<ScenePath>,
    pub(crate) variant_sets: IndexMap<String, VariantSet>,
    pub(crate) children: Vec<ScenePath>,
}

impl Prim {
    pub(crate) fn pseudo_root(children: Vec<ScenePath>) -> Self {
        Self {
            path: ScenePath::absolute_root(),
            type_name: String::new(),
            specifier: Specifier::Def,
            active: true,
            instanceable: false,
            kind: None,
            attributes: IndexMap::new(),
            relationships: IndexMap::new(),
            specializes: Vec::new(),
            variant_sets: IndexMap::new(),
            children,
        }
    }

    pub fn path(&self) -> &ScenePath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Schema type name; empty for typeless prims.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    pub fn is_pseudo_root(&self) -> bool {
        self.path.is_absolute_root()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Defined by a `def` or `class` spec.
    pub fn is_defined(&self) -> bool {
        self.specifier != Specifier::Over
    }

    pub fn is_abstract(&self) -> bool {
        self.specifier == Specifier::Class
    }

    pub fn is_instanceable(&self) -> bool {
        self.instanceable
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Attributes in authored order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Targets of a relationship, empty when unauthored.
    pub fn relationship_targets(&self, name: &str) -> &[ScenePath] {
        self.relationships.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn specializes(&self) -> &[ScenePath] {
        &self.specializes
    }

    pub fn variant_sets(&self) -> &IndexMap<String, VariantSet> {
        &self.variant_sets
    }

    /// Child paths in authored order.
    pub fn children(&self) -> &[ScenePath] {
        &self.children
    }
}
