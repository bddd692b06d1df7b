//! Material import.
//!
//! Materials are not translated when the traversal reaches them. Geometry
//! asks for its bound material through [`assign_material`], which resolves
//! it once per import through [`resolve_material`] and the configured
//! shading modes, then adds the shape (or its face subsets) to the
//! resulting shading engine.

use crate::bridge::{plug_type_for, value_to_plug};
use crate::context::ReadContext;
use crate::error::{ImportError, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use stagelink_core::{ImportArgs, ScenePath, ShadingModeConfig, Value};
use stagelink_host::{NodeHandle, PlugType, PlugValue, SetMember, INITIAL_SHADING_GROUP, SET_TYPE};
use stagelink_stage::{compute_bound_material, material_bind_subsets, Prim, Stage, SubsetPartition, TimeSample};

/// Message plug on a shading engine pointing at its surface node.
pub const SURFACE_SHADER_PLUG: &str = "surfaceShader";

/// String array plug on a shading engine listing `shape.uvSet` links.
pub const UV_SET_LINKS_PLUG: &str = "uvSetLinks";

/// String array plug on a mesh shape naming its UV sets.
pub const UV_SET_NAMES_PLUG: &str = "uvSetNames";

/// UV set name stages use for a mesh's primary set.
pub const STAGE_PRIMARY_UV_SET: &str = "st";

const MATERIAL_TYPE: &str = "Material";
const SHADER_TYPE: &str = "Shader";
const SURFACE_OUTPUT: &str = "outputs:surface";
const SHADER_ID_ATTR: &str = "info:id";
const INPUTS_PREFIX: &str = "inputs:";

/// What a shading mode importer is asked to build.
#[derive(Debug, Clone, Copy)]
pub struct ShadingModeRequest<'p> {
    pub material: &'p Prim,
    pub bound_geometry: &'p ScenePath,
    pub config: &'p ShadingModeConfig,
}

/// Builds a shading engine for a material. `Ok(None)` passes the material
/// to the next configured mode.
pub type ShadingModeImporter = fn(&ShadingModeRequest<'_>, &mut ReadContext<'_>) -> Result<Option<NodeHandle>>;

/// Decides whether a material is imported as another one.
pub trait MaterialMergePolicy: Send + Sync {
    fn name(&self) -> &str;

    /// The material to import in place of `material`, if any.
    fn merge_target(&self, stage: &dyn Stage, material: &Prim) -> Option<ScenePath>;
}

/// Never merges.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMerge;

impl MaterialMergePolicy for NoMerge {
    fn name(&self) -> &str {
        "none"
    }

    fn merge_target(&self, _stage: &dyn Stage, _material: &Prim) -> Option<ScenePath> {
        None
    }
}

/// Collapses a material that only specializes a base material to remap its
/// UV inputs.
///
/// Such a material has exactly one specializes arc to a material, no child
/// prims, and nothing authored but `inputs:*varname` string inputs. The
/// remapped names still reach the host through UV set links.
#[derive(Debug, Clone, Copy, Default)]
pub struct UvRemapSpecialization;

impl UvRemapSpecialization {
    fn is_uv_remap_input(name: &str, value: Option<&Value>) -> bool {
        let Some(input) = name.strip_prefix(INPUTS_PREFIX) else {
            return false;
        };
        !input.contains(':') && input.to_ascii_lowercase().ends_with("varname") && value.and_then(Value::as_str).is_some()
    }
}

impl MaterialMergePolicy for UvRemapSpecialization {
    fn name(&self) -> &str {
        "uvRemapSpecialization"
    }

    fn merge_target(&self, stage: &dyn Stage, material: &Prim) -> Option<ScenePath> {
        let [base] = material.specializes() else {
            return None;
        };
        if stage.prim(base)?.type_name() != MATERIAL_TYPE || !material.children().is_empty() {
            return None;
        }
        let mut attributes = material.attributes().peekable();
        attributes.peek()?;
        attributes
            .all(|attr| Self::is_uv_remap_input(attr.name(), attr.value_at(TimeSample::Default)))
            .then(|| base.clone())
    }
}

static GLOBAL: Lazy<ShadingModeRegistry> = Lazy::new(ShadingModeRegistry::with_builtins);

/// Named shading mode importers and the material merge policy.
pub struct ShadingModeRegistry {
    importers: IndexMap<String, ShadingModeImporter>,
    merge_policy: Box<dyn MaterialMergePolicy>,
}

impl Default for ShadingModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadingModeRegistry {
    /// An empty registry merging UV remap specializations.
    pub fn new() -> Self {
        Self {
            importers: IndexMap::new(),
            merge_policy: Box::new(UvRemapSpecialization),
        }
    }

    /// A registry with `displayColor` and `useRegistry`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.importers.insert("displayColor".to_string(), import_display_color);
        registry.importers.insert("useRegistry".to_string(), import_use_registry);
        registry
    }

    /// The process-wide registry.
    pub fn global() -> &'static ShadingModeRegistry {
        &GLOBAL
    }

    /// Register an importer. The first registration for a name wins.
    pub fn register(&mut self, name: &str, importer: ShadingModeImporter) -> Result<()> {
        if self.importers.contains_key(name) {
            log::error!("shading mode '{}' already registered", name);
            return Err(ImportError::DuplicateShadingMode(name.to_string()));
        }
        self.importers.insert(name.to_string(), importer);
        Ok(())
    }

    pub fn importer(&self, name: &str) -> Option<ShadingModeImporter> {
        self.importers.get(name).copied()
    }

    pub fn with_merge_policy(mut self, policy: impl MaterialMergePolicy + 'static) -> Self {
        self.merge_policy = Box::new(policy);
        self
    }

    pub fn merge_policy(&self) -> &dyn MaterialMergePolicy {
        self.merge_policy.as_ref()
    }
}

/// Shading engines already built in this import, by material path.
#[derive(Debug, Clone, Default)]
pub struct MaterialCache {
    engines: IndexMap<ScenePath, NodeHandle>,
}

impl MaterialCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, material: &ScenePath) -> Option<NodeHandle> {
        self.engines.get(material).copied()
    }

    pub fn insert(&mut self, material: ScenePath, engine: NodeHandle) {
        self.engines.insert(material, engine);
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

/// Follow merge targets from `material` to the material actually imported.
fn merged_material(stage: &dyn Stage, policy: &dyn MaterialMergePolicy, material: &ScenePath) -> ScenePath {
    let mut current = material.clone();
    let mut visited = vec![current.clone()];
    while let Some(target) = stage.prim(&current).and_then(|prim| policy.merge_target(stage, prim)) {
        if visited.contains(&target) {
            log::warn!("{}: material specializes itself, not merging further", current);
            break;
        }
        log::debug!("{}: merged into {} ({})", current, target, policy.name());
        visited.push(target.clone());
        current = target;
    }
    current
}

/// The shading engine for `material`, built by the first configured shading
/// mode that produces one.
///
/// Returns `Ok(None)` when material import is disabled or no mode produces
/// an engine. Results are cached per material for the rest of the import.
pub fn resolve_material(
    args: &ImportArgs,
    material: &ScenePath,
    bound_geometry: &ScenePath,
    ctx: &mut ReadContext<'_>,
) -> Result<Option<NodeHandle>> {
    if !args.imports_materials() {
        return Ok(None);
    }
    if let Some(engine) = ctx.materials().get(material) {
        return Ok(Some(engine));
    }

    let stage = ctx.stage();
    let shading_modes = ctx.shading_modes();
    let resolved = merged_material(stage, shading_modes.merge_policy(), material);
    if let Some(engine) = ctx.materials().get(&resolved) {
        ctx.materials_mut().insert(material.clone(), engine);
        return Ok(Some(engine));
    }
    let Some(prim) = stage.prim(&resolved) else {
        log::warn!("{}: material not found", resolved);
        return Ok(None);
    };

    for config in &args.shading_modes {
        let Some(importer) = shading_modes.importer(&config.mode) else {
            log::warn!("{}: unknown shading mode '{}'", resolved, config.mode);
            continue;
        };
        let request = ShadingModeRequest {
            material: prim,
            bound_geometry,
            config,
        };
        match importer(&request, ctx) {
            Ok(Some(engine)) => {
                log::debug!("{}: imported with shading mode '{}'", resolved, config.mode);
                ctx.register(&resolved, engine);
                ctx.materials_mut().insert(resolved.clone(), engine);
                if resolved != *material {
                    ctx.materials_mut().insert(material.clone(), engine);
                }
                return Ok(Some(engine));
            }
            Ok(None) => {}
            Err(err) => log::error!("{}: shading mode '{}' failed: {}", resolved, config.mode, err),
        }
    }
    Ok(None)
}

/// Create a shading engine driven by `surface` and register the surface
/// node under its host name.
pub fn create_shading_engine(material: &Prim, surface: NodeHandle, ctx: &mut ReadContext<'_>) -> Result<NodeHandle> {
    let modifier = ctx.modifier();
    let engine = modifier.create_node(SET_TYPE, &format!("{}SG", material.name()))?;
    modifier.add_plug(engine, SURFACE_SHADER_PLUG, PlugType::Message)?;
    modifier.set_plug(engine, SURFACE_SHADER_PLUG, PlugValue::Message(Some(surface)))?;
    let surface_name = modifier.host().node_name(surface)?;
    ctx.registry_mut().register_path(&surface_name, surface);
    Ok(engine)
}

fn import_display_color(request: &ShadingModeRequest<'_>, ctx: &mut ReadContext<'_>) -> Result<Option<NodeHandle>> {
    let color = ctx
        .stage()
        .prim(request.bound_geometry)
        .and_then(|geom| geom.attribute("primvars:displayColor"))
        .and_then(|attr| attr.value_at(TimeSample::Default))
        .and_then(|value| match value.as_array() {
            Some(items) => items.first().and_then(Value::as_vec3d),
            None => value.as_vec3d(),
        });
    let Some(color) = color else {
        return Ok(None);
    };

    let modifier = ctx.modifier();
    let surface = modifier.create_node("lambert", request.material.name())?;
    modifier.add_plug(surface, "color", PlugType::Float3)?;
    modifier.set_plug(surface, "color", PlugValue::Float3(color.map(|c| c as f32)))?;
    create_shading_engine(request.material, surface, ctx).map(Some)
}

/// The surface shader of a material: the target of `outputs:surface`, else
/// a child shader whose id matches the requested conversion.
fn surface_shader<'s>(stage: &'s dyn Stage, material: &Prim, conversion: &str) -> Option<&'s Prim> {
    if let Some(shader) = material
        .relationship_targets(SURFACE_OUTPUT)
        .first()
        .and_then(|path| stage.prim(path))
    {
        return Some(shader);
    }
    material
        .children()
        .iter()
        .filter_map(|child| stage.prim(child))
        .filter(|child| child.type_name() == SHADER_TYPE)
        .find(|child| {
            child
                .attribute(SHADER_ID_ATTR)
                .and_then(|attr| attr.value_at(TimeSample::Default))
                .and_then(Value::as_str)
                .is_some_and(|id| id.eq_ignore_ascii_case(conversion))
        })
}

fn import_use_registry(request: &ShadingModeRequest<'_>, ctx: &mut ReadContext<'_>) -> Result<Option<NodeHandle>> {
    let stage = ctx.stage();
    let Some(shader) = surface_shader(stage, request.material, &request.config.material_conversion) else {
        return Ok(None);
    };

    let modifier = ctx.modifier();
    let surface = modifier.create_node("usdPreviewSurface", shader.name())?;
    for attr in shader.attributes() {
        let Some(input) = attr.name().strip_prefix(INPUTS_PREFIX) else {
            continue;
        };
        let plug = input.replace(':', "_");
        let plug_type = plug_type_for(attr.value_type());
        let converted = attr
            .value_at(TimeSample::Default)
            .and_then(|value| value_to_plug(value, plug_type))
            .map(|v| (plug_type, v));
        match converted {
            Some((plug_type, value)) => {
                modifier.ensure_plug(surface, &plug, plug_type)?;
                modifier.set_plug(surface, &plug, value)?;
            }
            None => log::debug!("{}: input {} not copied", shader.path(), attr.name()),
        }
    }
    create_shading_engine(request.material, surface, ctx).map(Some)
}

/// UV set names a material's inputs remap to, in authored order.
fn uv_varnames(stage: &dyn Stage, material: &Prim) -> Vec<String> {
    let shaders = material.children().iter().filter_map(|child| stage.prim(child));
    let mut names: Vec<String> = Vec::new();
    for prim in std::iter::once(material).chain(shaders) {
        for attr in prim.attributes() {
            let lower = attr.name().to_ascii_lowercase();
            if !lower.starts_with(INPUTS_PREFIX) || !lower.ends_with("varname") {
                continue;
            }
            if let Some(name) = attr.value_at(TimeSample::Default).and_then(Value::as_str) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}

/// Link the UV sets `material` reads to `shape`, skipping the primary set.
fn link_uv_sets(material: &ScenePath, shape: NodeHandle, engine: NodeHandle, ctx: &mut ReadContext<'_>) -> Result<()> {
    let Some(prim) = ctx.stage().prim(material) else {
        return Ok(());
    };
    let varnames = uv_varnames(ctx.stage(), prim);
    if varnames.is_empty() {
        return Ok(());
    }

    let host = ctx.host();
    let shape_sets = match host.get_plug(shape, UV_SET_NAMES_PLUG) {
        Ok(PlugValue::StringArray(names)) => names,
        _ => Vec::new(),
    };
    let primary = ctx.args().primary_uv_set_name.as_str();
    let shape_name = host.node_name(shape)?;
    let mut links = match host.get_plug(engine, UV_SET_LINKS_PLUG) {
        Ok(PlugValue::StringArray(links)) => links,
        _ => Vec::new(),
    };

    let before = links.len();
    for varname in varnames {
        let uv_set = if varname == STAGE_PRIMARY_UV_SET { primary } else { varname.as_str() };
        if uv_set == primary {
            continue;
        }
        if !shape_sets.iter().any(|s| s == uv_set) {
            log::debug!("{}: shape has no UV set '{}' to link", shape_name, uv_set);
            continue;
        }
        let link = format!("{}.{}", shape_name, uv_set);
        if !links.contains(&link) {
            links.push(link);
        }
    }
    if links.len() == before {
        return Ok(());
    }

    let modifier = ctx.modifier();
    modifier.ensure_plug(engine, UV_SET_LINKS_PLUG, PlugType::StringArray)?;
    modifier.set_plug(engine, UV_SET_LINKS_PLUG, PlugValue::StringArray(links))?;
    Ok(())
}

fn face_count(geom: &Prim) -> usize {
    geom.attribute("faceVertexCounts")
        .and_then(|attr| attr.value_at(TimeSample::Default))
        .and_then(Value::as_array)
        .map_or(0, <[Value]>::len)
}

/// The engine for the material bound to `path`, or the default shading
/// group when none resolves.
fn engine_for(
    args: &ImportArgs,
    path: &ScenePath,
    geom: &ScenePath,
    ctx: &mut ReadContext<'_>,
) -> Result<Option<(NodeHandle, Option<ScenePath>)>> {
    let material = compute_bound_material(ctx.stage(), path);
    let resolved = match &material {
        Some(material) => resolve_material(args, material, geom, ctx)?,
        None => None,
    };
    match resolved {
        Some(engine) => Ok(Some((engine, material))),
        None => Ok(ctx.host().find_node(INITIAL_SHADING_GROUP).map(|engine| (engine, None))),
    }
}

/// Add `shape` to the shading engine of the material bound to `geom`, per
/// face subset when `geom` has material-bind subsets.
///
/// Returns `false` when nothing could be assigned.
pub fn assign_material(args: &ImportArgs, geom: &ScenePath, shape: NodeHandle, ctx: &mut ReadContext<'_>) -> Result<bool> {
    let subsets = material_bind_subsets(ctx.stage(), geom);
    if subsets.is_empty() {
        let Some((engine, material)) = engine_for(args, geom, geom, ctx)? else {
            log::warn!("{}: no shading group to assign", geom);
            return Ok(false);
        };
        ctx.modifier().add_set_member(engine, SetMember::object(shape))?;
        if let Some(material) = material {
            link_uv_sets(&material, shape, engine, ctx)?;
        }
        return Ok(true);
    }

    let faces = ctx.stage().prim(geom).map_or(0, face_count);
    let mut assigned = false;
    for subset in &subsets {
        let indices: Vec<usize> = subset
            .indices
            .iter()
            .filter_map(|i| usize::try_from(*i).ok())
            .filter(|i| *i < faces)
            .collect();
        if indices.is_empty() {
            continue;
        }
        let Some((engine, material)) = engine_for(args, &subset.path, geom, ctx)? else {
            log::warn!("{}: no shading group to assign", subset.path);
            continue;
        };
        ctx.modifier().add_set_member(engine, SetMember::faces(shape, indices))?;
        if let Some(material) = material {
            link_uv_sets(&material, shape, engine, ctx)?;
        }
        assigned = true;
    }

    let partition = SubsetPartition::validate(&subsets, faces);
    if !partition.is_partition() {
        log::warn!(
            "{}: material subsets are not a partition ({} unassigned, {} duplicated, {} out of range)",
            geom,
            partition.unassigned.len(),
            partition.duplicated.len(),
            partition.out_of_range.len()
        );
        if !partition.unassigned.is_empty() {
            if let Some((engine, material)) = engine_for(args, geom, geom, ctx)? {
                ctx.modifier()
                    .add_set_member(engine, SetMember::faces(shape, partition.unassigned))?;
                if let Some(material) = material {
                    link_uv_sets(&material, shape, engine, ctx)?;
                }
                assigned = true;
            }
        }
    }
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagelink_core::ValueType;
    use stagelink_stage::{AttributeSpec, Layer, MemoryStage, PrimSpec};

    fn path(text: &str) -> ScenePath {
        ScenePath::parse(text).unwrap()
    }

    fn varname(name: &str, value: &str) -> AttributeSpec {
        AttributeSpec::new(name, ValueType::parse("token").unwrap()).with_default(Value::Token(value.into()))
    }

    fn stage(remap: PrimSpec) -> MemoryStage {
        let layer = Layer::new("m.json").with_prim(
            PrimSpec::new("Looks", "Scope")
                .with_child(PrimSpec::new("Base", "Material"))
                .with_child(remap),
        );
        MemoryStage::from_layer(layer).unwrap()
    }

    #[test]
    fn test_uv_remap_merges_into_base() {
        let stage = stage(
            PrimSpec::new("Remap", "Material")
                .with_specializes(path("/Looks/Base"))
                .with_attribute(varname("inputs:frame:stPrimvarName", "st1"))
                .with_attribute(varname("inputs:uvVarname", "st1")),
        );
        let remap = stage.prim(&path("/Looks/Remap")).unwrap();
        // a namespaced input is not a plain remap
        assert_eq!(UvRemapSpecialization.merge_target(&stage, remap), None);

        let stage = self::stage(
            PrimSpec::new("Remap", "Material")
                .with_specializes(path("/Looks/Base"))
                .with_attribute(varname("inputs:uvVarname", "st1")),
        );
        let remap = stage.prim(&path("/Looks/Remap")).unwrap();
        assert_eq!(UvRemapSpecialization.merge_target(&stage, remap), Some(path("/Looks/Base")));
        assert_eq!(NoMerge.merge_target(&stage, remap), None);
        assert_eq!(
            merged_material(&stage, &UvRemapSpecialization, &path("/Looks/Remap")),
            path("/Looks/Base")
        );
    }

    #[test]
    fn test_specialization_with_content_is_kept() {
        let stage = stage(
            PrimSpec::new("Remap", "Material")
                .with_specializes(path("/Looks/Base"))
                .with_child(PrimSpec::new("Shader", "Shader")),
        );
        let remap = stage.prim(&path("/Looks/Remap")).unwrap();
        assert_eq!(UvRemapSpecialization.merge_target(&stage, remap), None);

        let stage = self::stage(PrimSpec::new("Remap", "Material").with_specializes(path("/Looks/Base")));
        let remap = stage.prim(&path("/Looks/Remap")).unwrap();
        assert_eq!(UvRemapSpecialization.merge_target(&stage, remap), None);
    }

    #[test]
    fn test_registry_rejects_duplicate_mode() {
        let mut registry = ShadingModeRegistry::with_builtins();
        assert!(registry.importer("useRegistry").is_some());
        let err = registry.register("displayColor", import_display_color).unwrap_err();
        assert!(matches!(err, ImportError::DuplicateShadingMode(name) if name == "displayColor"));
    }

    #[test]
    fn test_uv_varnames_dedup() {
        let stage = stage(
            PrimSpec::new("Remap", "Material")
                .with_attribute(varname("inputs:uvVarname", "st1"))
                .with_child(PrimSpec::new("Tex", "Shader").with_attribute(varname("inputs:varname", "st1")))
                .with_child(PrimSpec::new("Tex2", "Shader").with_attribute(varname("inputs:varname", "st"))),
        );
        let remap = stage.prim(&path("/Looks/Remap")).unwrap();
        assert_eq!(uv_varnames(&stage, remap), vec!["st1".to_string(), "st".to_string()]);
    }
}
