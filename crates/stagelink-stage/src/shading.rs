//! Material binding and geom subset queries.

use crate::prim::{Prim, TimeSample, MATERIAL_BINDING};
use crate::stage::Stage;
use stagelink_core::{ScenePath, Value};
use std::collections::BTreeSet;

/// Subset family whose members carry per-face material bindings.
pub const MATERIAL_BIND_FAMILY: &str = "materialBind";

/// Type name of a material prim.
pub const MATERIAL_TYPE: &str = "Material";

/// Type name of a geom subset prim.
pub const GEOM_SUBSET_TYPE: &str = "GeomSubset";

/// The material bound to `path`: its own binding or the nearest ancestor's.
///
/// Bindings whose target is missing or not a material are ignored.
pub fn compute_bound_material(stage: &dyn Stage, path: &ScenePath) -> Option<ScenePath> {
    let mut current = Some(path.clone());
    while let Some(p) = current {
        if let Some(target) = stage
            .prim(&p)
            .and_then(|prim| prim.relationship_targets(MATERIAL_BINDING).first())
        {
            match stage.prim(target) {
                Some(material) if material.type_name() == MATERIAL_TYPE => return Some(target.clone()),
                _ => log::warn!("{} binds {} which is not a material", p, target),
            }
        }
        current = p.parent();
    }
    None
}

/// A face subset of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct GeomSubset {
    pub path: ScenePath,
    pub indices: Vec<i32>,
}

impl GeomSubset {
    fn from_prim(prim: &Prim) -> Option<Self> {
        let family = prim.attribute("familyName")?.value_at(TimeSample::Default)?;
        if family.as_str() != Some(MATERIAL_BIND_FAMILY) {
            return None;
        }
        let element = prim
            .attribute("elementType")
            .and_then(|a| a.value_at(TimeSample::Default))
            .and_then(Value::as_str)
            .unwrap_or("face");
        if element != "face" {
            return None;
        }
        let indices = prim
            .attribute("indices")
            .and_then(|a| a.value_at(TimeSample::Default))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_i64).map(|i| i as i32).collect())
            .unwrap_or_default();
        Some(Self {
            path: prim.path().clone(),
            indices,
        })
    }
}

/// The `materialBind` face subsets directly under a mesh.
pub fn material_bind_subsets(stage: &dyn Stage, path: &ScenePath) -> Vec<GeomSubset> {
    let Some(prim) = stage.prim(path) else {
        return Vec::new();
    };
    prim.children()
        .iter()
        .filter_map(|child| stage.prim(child))
        .filter(|child| child.type_name() == GEOM_SUBSET_TYPE)
        .filter_map(GeomSubset::from_prim)
        .collect()
}

/// How a set of subsets covers a mesh's faces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubsetPartition {
    /// Faces in no subset, ascending.
    pub unassigned: Vec<usize>,
    /// Faces in more than one subset, ascending.
    pub duplicated: Vec<usize>,
    /// Indices outside `0..face_count`.
    pub out_of_range: Vec<i32>,
}

impl SubsetPartition {
    /// Check `subsets` against `face_count` faces.
    pub fn validate(subsets: &[GeomSubset], face_count: usize) -> Self {
        let mut seen = vec![0u32; face_count];
        let mut out_of_range = BTreeSet::new();
        for index in subsets.iter().flat_map(|s| s.indices.iter().copied()) {
            match usize::try_from(index).ok().filter(|i| *i < face_count) {
                Some(i) => seen[i] += 1,
                None => {
                    out_of_range.insert(index);
                }
            }
        }
        Self {
            unassigned: (0..face_count).filter(|i| seen[*i] == 0).collect(),
            duplicated: (0..face_count).filter(|i| seen[*i] > 1).collect(),
            out_of_range: out_of_range.into_iter().collect(),
        }
    }

    /// Every face in exactly one subset.
    pub fn is_partition(&self) -> bool {
        self.unassigned.is_empty() && self.duplicated.is_empty() && self.out_of_range.is_empty()
    }
}
