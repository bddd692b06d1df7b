//! Material resolution and shading group assignment.

mod common;

use common::*;
use stagelink_core::{ImportArgs, ShadingModeConfig, Value};
use stagelink_host::{HostGraph, PlugValue, SetMember};
use stagelink_stage::{PrimSpec, MATERIAL_BINDING};

fn bind(prim: PrimSpec, material: &str) -> PrimSpec {
    prim.with_relationship(MATERIAL_BINDING, vec![path(material)])
}

fn red(prim: PrimSpec) -> PrimSpec {
    prim.with_attribute(attr("primvars:displayColor", Value::Array(vec![Value::Float3([1.0, 0.0, 0.0])])))
}

fn subset(name: &str, faces: &[i32]) -> PrimSpec {
    PrimSpec::new(name, "GeomSubset")
        .with_attribute(attr("familyName", Value::Token("materialBind".into())))
        .with_attribute(attr("indices", ints(faces)))
}

fn looks(materials: Vec<PrimSpec>) -> PrimSpec {
    materials
        .into_iter()
        .fold(PrimSpec::new("Looks", "Scope"), PrimSpec::with_child)
}

fn preview_material(name: &str) -> PrimSpec {
    let shader_path = format!("/Looks/{}/Surf", name);
    PrimSpec::new(name, "Material")
        .with_relationship("outputs:surface", vec![path(&shader_path)])
        .with_child(
            PrimSpec::new("Surf", "Shader")
                .with_attribute(attr("info:id", Value::Token("UsdPreviewSurface".into())))
                .with_attribute(attr("inputs:roughness", Value::Float(0.25)))
                .with_attribute(attr("inputs:diffuseColor", Value::Float3([0.2, 0.4, 0.6]))),
        )
}

impl Scene {
    fn members(&self, set: &str) -> Vec<SetMember> {
        self.host.set_members(self.node(set)).unwrap()
    }
}

#[test]
fn test_display_color_material() {
    let mut scene = Scene::with_prims(vec![
        looks(vec![PrimSpec::new("Red", "Material")]),
        bind(red(quad_mesh("Geo")), "/Looks/Red"),
    ]);
    scene.import(ImportArgs::default());

    let surface = scene.node("Red");
    assert_eq!(scene.host.node_type(surface).unwrap(), "lambert");
    assert_eq!(scene.plug("Red", "color"), PlugValue::Float3([1.0, 0.0, 0.0]));
    assert_eq!(scene.plug("RedSG", "surfaceShader"), PlugValue::Message(Some(surface)));
    assert_eq!(scene.members("RedSG"), vec![SetMember::object(scene.node("GeoShape"))]);
    assert!(scene.members("initialShadingGroup").is_empty());
}

#[test]
fn test_use_registry_copies_inputs() {
    let mut scene = Scene::with_prims(vec![
        looks(vec![preview_material("Mat")]),
        bind(quad_mesh("Geo"), "/Looks/Mat"),
    ]);
    let (job, _) = scene.import(ImportArgs::default());

    let surface = scene.node("Surf");
    assert_eq!(scene.host.node_type(surface).unwrap(), "usdPreviewSurface");
    assert_eq!(scene.plug("Surf", "roughness"), PlugValue::Float(0.25));
    assert_eq!(scene.plug("Surf", "diffuseColor"), PlugValue::Float3([0.2, 0.4, 0.6]));
    assert_eq!(scene.plug("MatSG", "surfaceShader"), PlugValue::Message(Some(surface)));
    assert_eq!(job.registry().lookup(&path("/Looks/Mat")), Some(scene.node("MatSG")));
}

#[test]
fn test_shader_found_by_id() {
    let material = PrimSpec::new("Mat", "Material").with_child(
        PrimSpec::new("Preview", "Shader")
            .with_attribute(attr("info:id", Value::Token("UsdPreviewSurface".into())))
            .with_attribute(attr("inputs:metallic", Value::Float(1.0))),
    );
    let mut scene = Scene::with_prims(vec![looks(vec![material]), bind(quad_mesh("Geo"), "/Looks/Mat")]);
    scene.import(ImportArgs::default());

    assert_eq!(scene.plug("Preview", "metallic"), PlugValue::Float(1.0));
    assert_eq!(scene.members("MatSG").len(), 1);
}

#[test]
fn test_unbound_mesh_uses_default_group() {
    let mut scene = Scene::with_prims(vec![quad_mesh("Geo")]);
    let (mut job, _) = scene.import(ImportArgs::default());
    assert_eq!(scene.members("initialShadingGroup"), vec![SetMember::object(scene.node("GeoShape"))]);

    job.undo(&mut scene.host).unwrap();
    assert!(scene.members("initialShadingGroup").is_empty());
}

#[test]
fn test_inherited_binding() {
    let mut scene = Scene::with_prims(vec![
        looks(vec![PrimSpec::new("Red", "Material")]),
        bind(PrimSpec::new("Group", "Xform"), "/Looks/Red").with_child(red(quad_mesh("Geo"))),
    ]);
    scene.import(ImportArgs::default());
    assert_eq!(scene.members("RedSG"), vec![SetMember::object(scene.node("GeoShape"))]);
}

#[test]
fn test_partial_subsets_fall_back_to_object_material() {
    let geo = bind(red(mesh("Geo", 4)), "/Looks/Base").with_child(bind(subset("Top", &[0, 1]), "/Looks/Red"));
    let mut scene = Scene::with_prims(vec![
        looks(vec![PrimSpec::new("Base", "Material"), PrimSpec::new("Red", "Material")]),
        geo,
    ]);
    scene.import(ImportArgs::default());

    let shape = scene.node("GeoShape");
    assert_eq!(scene.members("RedSG"), vec![SetMember::faces(shape, vec![0, 1])]);
    assert_eq!(scene.members("BaseSG"), vec![SetMember::faces(shape, vec![2, 3])]);
    assert!(scene.host.find_node("Top").is_none());
}

#[test]
fn test_full_partition_skips_object_material() {
    let geo = bind(red(mesh("Geo", 2)), "/Looks/Base")
        .with_child(bind(subset("Left", &[0]), "/Looks/Red"))
        .with_child(bind(subset("Right", &[1, 7]), "/Looks/Red"));
    let mut scene = Scene::with_prims(vec![
        looks(vec![PrimSpec::new("Base", "Material"), PrimSpec::new("Red", "Material")]),
        geo,
    ]);
    scene.import(ImportArgs::default());

    let shape = scene.node("GeoShape");
    assert_eq!(
        scene.members("RedSG"),
        vec![SetMember::faces(shape, vec![0]), SetMember::faces(shape, vec![1])]
    );
    assert!(scene.host.find_node("BaseSG").is_none());
}

#[test]
fn test_material_built_once() {
    let mut scene = Scene::with_prims(vec![
        looks(vec![PrimSpec::new("Red", "Material")]),
        bind(red(quad_mesh("A")), "/Looks/Red"),
        bind(red(quad_mesh("B")), "/Looks/Red"),
    ]);
    scene.import(ImportArgs::default());

    assert_eq!(
        scene.members("RedSG"),
        vec![SetMember::object(scene.node("AShape")), SetMember::object(scene.node("BShape"))]
    );
    assert!(scene.host.find_node("Red1").is_none());
    assert!(scene.host.find_node("RedSG1").is_none());
}

#[test]
fn test_no_shading_modes_skips_materials() {
    let mut scene = Scene::with_prims(vec![
        looks(vec![PrimSpec::new("Red", "Material")]),
        bind(red(quad_mesh("Geo")), "/Looks/Red"),
    ]);
    scene.import(ImportArgs::default().with_shading_modes(Vec::new()));

    assert!(scene.host.find_node("RedSG").is_none());
    assert_eq!(scene.members("initialShadingGroup"), vec![SetMember::object(scene.node("GeoShape"))]);
}

#[test]
fn test_unknown_mode_is_skipped() {
    let mut scene = Scene::with_prims(vec![
        looks(vec![PrimSpec::new("Red", "Material")]),
        bind(red(quad_mesh("Geo")), "/Looks/Red"),
    ]);
    let modes = vec![ShadingModeConfig::new("pxrRis", "none"), ShadingModeConfig::display_color()];
    scene.import(ImportArgs::default().with_shading_modes(modes));

    assert_eq!(scene.members("RedSG").len(), 1);
}

#[test]
fn test_uv_set_links() {
    let uvs = Value::Array(vec![Value::Float2([0.0, 0.0]); 4]);
    let geo = bind(quad_mesh("Geo"), "/Looks/Mat")
        .with_attribute(attr("primvars:st", uvs.clone()))
        .with_attribute(attr("primvars:st1", uvs));
    let material = preview_material("Mat")
        .with_child(PrimSpec::new("Primary", "Shader").with_attribute(attr("inputs:varname", Value::String("st".into()))))
        .with_child(PrimSpec::new("Detail", "Shader").with_attribute(attr("inputs:varname", Value::String("st1".into()))));
    let mut scene = Scene::with_prims(vec![looks(vec![material]), geo]);
    scene.import(ImportArgs::default());

    assert_eq!(
        scene.plug("GeoShape", "uvSetNames"),
        PlugValue::StringArray(vec!["map1".to_string(), "st1".to_string()])
    );
    assert_eq!(
        scene.plug("MatSG", "uvSetLinks"),
        PlugValue::StringArray(vec!["GeoShape.st1".to_string()])
    );
}

#[test]
fn test_uv_remap_specialization_merges() {
    let remap = PrimSpec::new("Remap", "Material")
        .with_specializes(path("/Looks/Base"))
        .with_attribute(attr("inputs:uvVarname", Value::String("st1".into())));
    let mut scene = Scene::with_prims(vec![
        looks(vec![PrimSpec::new("Base", "Material"), remap]),
        bind(red(quad_mesh("A")), "/Looks/Base"),
        bind(red(quad_mesh("B")), "/Looks/Remap"),
    ]);
    let (job, _) = scene.import(ImportArgs::default());

    assert!(scene.host.find_node("RemapSG").is_none());
    assert_eq!(
        scene.members("BaseSG"),
        vec![SetMember::object(scene.node("AShape")), SetMember::object(scene.node("BShape"))]
    );
    assert_eq!(job.registry().lookup(&path("/Looks/Remap")), None);
}
