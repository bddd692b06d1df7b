//! Decomposition benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec3;
use stagelink_xform::{components_from_matrix, match_canonical_stack, matrix_from_components, TransformComponents, XformOp};

fn sample_components() -> TransformComponents {
    TransformComponents {
        translate: DVec3::new(1.0, -2.0, 3.5),
        rotate: DVec3::new(12.0, -48.0, 170.0),
        scale: DVec3::new(1.5, 0.75, 2.0),
        shear: DVec3::new(0.1, 0.0, -0.2),
        rotate_pivot: DVec3::new(0.5, 0.0, 0.0),
        ..Default::default()
    }
}

fn compose(c: &mut Criterion) {
    let components = sample_components();
    c.bench_function("matrix_from_components", |b| {
        b.iter(|| matrix_from_components(black_box(&components)))
    });
}

fn decompose(c: &mut Criterion) {
    let m = matrix_from_components(&sample_components());
    c.bench_function("components_from_matrix", |b| {
        b.iter(|| components_from_matrix(black_box(&m)))
    });
}

fn match_stack(c: &mut Criterion) {
    let ops: Vec<XformOp> = [
        "xformOp:translate",
        "xformOp:translate:rotatePivot",
        "xformOp:rotateXYZ",
        "!invert!xformOp:translate:rotatePivot",
        "xformOp:scale",
    ]
    .iter()
    .filter_map(|name| XformOp::parse(name).ok())
    .collect();
    c.bench_function("match_canonical_stack", |b| {
        b.iter(|| match_canonical_stack(black_box(&ops)))
    });
}

criterion_group!(benches, compose, decompose, match_stack);
criterion_main!(benches);
