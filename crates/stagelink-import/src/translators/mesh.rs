//! Mesh translator.

use super::material::{assign_material, STAGE_PRIMARY_UV_SET, UV_SET_NAMES_PLUG};
use super::{create_transform, user_attributes, xformable};
use crate::context::ReadContext;
use crate::error::Result;
use crate::registry::Translator;
use stagelink_core::{ScalarKind, Value};
use stagelink_host::{NodeHandle, PlugType, PlugValue};
use stagelink_stage::{Prim, TimeSample};

/// Host node type of a mesh shape.
pub const MESH_NODE_TYPE: &str = "mesh";

const PRIMVARS_PREFIX: &str = "primvars:";

/// `Mesh` prims: a transform with a mesh shape under it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshTranslator;

impl Translator for MeshTranslator {
    fn read(&mut self, prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<()> {
        let transform = create_transform(prim, ctx)?;
        xformable::read_xformable(prim, transform, ctx)?;
        user_attributes::read_user_attributes(prim, transform, ctx)?;

        let shape = ctx
            .modifier()
            .create_dag_node(MESH_NODE_TYPE, &format!("{}Shape", prim.name()), Some(transform))?;
        read_topology(prim, shape, ctx)?;
        read_uv_sets(prim, shape, ctx)?;

        let args = ctx.args();
        if let Err(err) = assign_material(args, prim.path(), shape, ctx) {
            log::error!("{}: material assignment failed: {}", prim.path(), err);
        }
        Ok(())
    }
}

fn default_value<'p>(prim: &'p Prim, name: &str) -> Option<&'p Value> {
    prim.attribute(name)?.value_at(TimeSample::Default)
}

fn int_array(prim: &Prim, name: &str) -> Option<Vec<i32>> {
    default_value(prim, name)?
        .as_array()?
        .iter()
        .map(|v| v.as_i64().and_then(|i| i32::try_from(i).ok()))
        .collect()
}

fn read_topology(prim: &Prim, shape: NodeHandle, ctx: &mut ReadContext<'_>) -> Result<()> {
    let points: Option<Vec<[f32; 3]>> = default_value(prim, "points")
        .and_then(Value::as_array)
        .and_then(|items| items.iter().map(|v| v.as_vec3d().map(|p| p.map(|c| c as f32))).collect());
    let modifier = ctx.modifier();
    match points {
        Some(points) => {
            modifier.ensure_plug(shape, "points", PlugType::Float3Array)?;
            modifier.set_plug(shape, "points", PlugValue::Float3Array(points))?;
        }
        None => log::warn!("{}: mesh has no readable points", prim.path()),
    }
    for name in ["faceVertexCounts", "faceVertexIndices"] {
        if let Some(values) = int_array(prim, name) {
            modifier.ensure_plug(shape, name, PlugType::IntArray)?;
            modifier.set_plug(shape, name, PlugValue::IntArray(values))?;
        }
    }
    Ok(())
}

/// Host name of a UV set primvar, `None` for other attributes.
fn uv_set_name(attr_name: &str, kind: ScalarKind, is_array: bool, primary: &str) -> Option<String> {
    let name = attr_name.strip_prefix(PRIMVARS_PREFIX)?;
    if kind != ScalarKind::Float2 || !is_array || name.is_empty() || name.contains(':') {
        return None;
    }
    Some(if name == STAGE_PRIMARY_UV_SET { primary.to_string() } else { name.to_string() })
}

fn read_uv_sets(prim: &Prim, shape: NodeHandle, ctx: &mut ReadContext<'_>) -> Result<()> {
    let primary = ctx.args().primary_uv_set_name.as_str();
    let mut names = Vec::new();
    let modifier = ctx.modifier();
    for attr in prim.attributes() {
        let value_type = attr.value_type();
        let Some(uv_set) = uv_set_name(attr.name(), value_type.kind, value_type.is_array, primary) else {
            continue;
        };
        let coords: Option<Vec<[f32; 2]>> = attr
            .value_at(TimeSample::Default)
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(|v| v.as_vec2d().map(|c| c.map(|x| x as f32))).collect());
        let Some(coords) = coords else {
            log::warn!("{}: UV set {} has no readable values", prim.path(), attr.name());
            continue;
        };
        let plug = format!("uv_{}", uv_set);
        modifier.ensure_plug(shape, &plug, PlugType::Float2Array)?;
        modifier.set_plug(shape, &plug, PlugValue::Float2Array(coords))?;
        names.push(uv_set);
    }
    if !names.is_empty() {
        modifier.ensure_plug(shape, UV_SET_NAMES_PLUG, PlugType::StringArray)?;
        modifier.set_plug(shape, UV_SET_NAMES_PLUG, PlugValue::StringArray(names))?;
    }
    Ok(())
}
