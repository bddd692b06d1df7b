//! Scene building helpers shared by the integration tests.

#![allow(dead_code)]

use stagelink_core::{ImportArgs, ScenePath, Value, ValueType};
use stagelink_host::{HostGraph, MemoryHost, NodeHandle, PlugValue};
use stagelink_import::{ImportEnv, ImportJob, ImportError};
use stagelink_stage::{AttributeSpec, Layer, PrimSpec, StageCache};

pub const FILE: &str = "scene.json";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn path(text: &str) -> ScenePath {
    ScenePath::parse(text).unwrap()
}

fn value_type_of(value: &Value) -> ValueType {
    match value {
        Value::Array(items) => ValueType::array(items.first().and_then(Value::kind).unwrap()),
        other => ValueType::scalar(other.kind().unwrap()),
    }
}

pub fn attr(name: &str, value: Value) -> AttributeSpec {
    AttributeSpec::new(name, value_type_of(&value)).with_default(value)
}

pub fn animated(name: &str, samples: &[(f64, Value)]) -> AttributeSpec {
    let mut spec = AttributeSpec::new(name, value_type_of(&samples[0].1));
    for (time, value) in samples {
        spec = spec.with_sample(*time, value.clone());
    }
    spec
}

pub fn tokens(items: &[&str]) -> Value {
    Value::Array(items.iter().map(|t| Value::Token(t.to_string())).collect())
}

pub fn ints(items: &[i32]) -> Value {
    Value::Array(items.iter().map(|i| Value::Int(*i)).collect())
}

/// An `Xform` prim with the given ops authored in order.
pub fn xform(name: &str, ops: Vec<AttributeSpec>) -> PrimSpec {
    with_ops(PrimSpec::new(name, "Xform"), ops)
}

pub fn with_ops(mut prim: PrimSpec, ops: Vec<AttributeSpec>) -> PrimSpec {
    let names: Vec<&str> = ops.iter().map(|op| op.name.as_str()).collect();
    prim = prim.with_attribute(attr("xformOpOrder", tokens(&names)));
    for op in ops {
        prim = prim.with_attribute(op);
    }
    prim
}

/// A single quad.
pub fn quad_mesh(name: &str) -> PrimSpec {
    mesh(name, 1)
}

/// A strip of `faces` quads.
pub fn mesh(name: &str, faces: usize) -> PrimSpec {
    let points: Vec<Value> = (0..=faces)
        .flat_map(|i| [Value::Float3([i as f32, 0.0, 0.0]), Value::Float3([i as f32, 1.0, 0.0])])
        .collect();
    let counts: Vec<i32> = vec![4; faces];
    let indices: Vec<i32> = (0..faces as i32)
        .flat_map(|f| [2 * f, 2 * f + 2, 2 * f + 3, 2 * f + 1])
        .collect();
    PrimSpec::new(name, "Mesh")
        .with_attribute(AttributeSpec::new("points", ValueType::parse("point3f[]").unwrap()).with_default(Value::Array(points)))
        .with_attribute(attr("faceVertexCounts", ints(&counts)))
        .with_attribute(attr("faceVertexIndices", ints(&indices)))
}

pub struct Scene {
    pub host: MemoryHost,
    pub cache: StageCache,
}

impl Scene {
    pub fn new(layer: Layer) -> Self {
        init_logging();
        let mut cache = StageCache::new();
        cache.insert_layer(layer);
        Self {
            host: MemoryHost::new(),
            cache,
        }
    }

    pub fn with_prims(prims: Vec<PrimSpec>) -> Self {
        let mut layer = Layer::new(FILE);
        for prim in prims {
            layer = layer.with_prim(prim);
        }
        Self::new(layer)
    }

    pub fn read(&mut self, job: &mut ImportJob) -> Result<Vec<NodeHandle>, ImportError> {
        let mut env = ImportEnv::new(&mut self.host, &mut self.cache);
        job.read(&mut env)
    }

    pub fn import(&mut self, args: ImportArgs) -> (ImportJob, Vec<NodeHandle>) {
        let mut job = ImportJob::new(FILE, args);
        let added = self.read(&mut job).unwrap();
        (job, added)
    }

    pub fn node(&self, name: &str) -> NodeHandle {
        self.host
            .find_node(name)
            .unwrap_or_else(|| panic!("no node named {} in {:?}", name, self.host.live_names()))
    }

    pub fn plug(&self, node: &str, plug: &str) -> PlugValue {
        self.host.get_plug(self.node(node), plug).unwrap()
    }

    pub fn double3(&self, node: &str, plug: &str) -> [f64; 3] {
        match self.plug(node, plug) {
            PlugValue::Double3(v) => v,
            other => panic!("{}.{} is {:?}", node, plug, other),
        }
    }
}

pub fn assert_close(actual: [f64; 3], expected: [f64; 3]) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
    }
}
