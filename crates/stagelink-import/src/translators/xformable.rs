//! Reading a prim's xform ops onto a host transform.
//!
//! An op order that fits a canonical host stack is pushed op by op onto
//! the matching host plugs, so authored values arrive unchanged. Any other
//! order is composed to a matrix per sample and decomposed into translate,
//! rotate, scale and shear.

use crate::bridge::{set_animated, AnimOptions};
use crate::context::ReadContext;
use crate::error::Result;
use crate::job::STAGE_PROXY_KEY;
use glam::{DQuat, DVec3};
use stagelink_core::{AngleUnit, ScenePath, TimeInterval, Value};
use stagelink_host::{NodeHandle, PlugType, PlugValue};
use stagelink_stage::{Attribute, Prim, TimeSample};
use stagelink_xform::{
    components_from_matrix, compose_ops, euler_to_matrix, match_canonical_stack, matrix_from_rows, matrix_to_euler,
    parse_op_order, EulerFilter, HostSlot, MatchedStack, OpValue, RotationOrder, TransformComponents, XformOp,
    XformOpType,
};

/// Attribute listing a prim's xform ops.
pub const OP_ORDER_ATTR: &str = "xformOpOrder";

/// Message plug pointing an animated transform at the stage proxy.
pub const STAGE_PROXY_PLUG: &str = "stageProxy";

/// String plug holding the prim path a proxied transform reads.
pub const PRIM_PATH_PLUG: &str = "primPath";

/// One value per time, or a single static value.
#[derive(Debug, Clone, PartialEq)]
enum Samples {
    Static(DVec3),
    Animated(Vec<(f64, DVec3)>),
}

/// Which times attributes are read at.
#[derive(Debug, Clone, Copy)]
struct Sampling {
    interval: Option<TimeInterval>,
}

impl Sampling {
    fn from_ctx(ctx: &ReadContext<'_>) -> Self {
        let args = ctx.args();
        Self {
            interval: args.read_animation.then(|| args.sample_interval()),
        }
    }

    fn static_only() -> Self {
        Self { interval: None }
    }

    /// Times to read `attr` at. Empty means read the default value.
    fn times(&self, attr: &Attribute) -> Vec<f64> {
        match &self.interval {
            Some(interval) => attr.sample_times_in(interval),
            None => Vec::new(),
        }
    }
}

/// Read the xform ops of `prim` onto `node`.
///
/// Per-sample failures are logged and skipped; a prim whose transform
/// cannot be read at all leaves `node` at its defaults.
pub fn read_xformable(prim: &Prim, node: NodeHandle, ctx: &mut ReadContext<'_>) -> Result<()> {
    let names = op_order_names(prim);
    let order = match parse_op_order(&names) {
        Ok(order) => order,
        Err(err) => {
            log::error!("{}: unreadable {}: {}", prim.path(), OP_ORDER_ATTR, err);
            return Ok(());
        }
    };

    if order.resets_xform_stack {
        ctx.modifier()
            .set_plug(node, "inheritsTransform", PlugValue::Bool(false))?;
    }
    if order.ops.is_empty() {
        return Ok(());
    }

    let mut sampling = Sampling::from_ctx(ctx);
    if ctx.args().use_as_animation_cache && is_animated(prim, &order.ops, &sampling) {
        tag_stage_proxy(prim.path(), node, ctx)?;
        sampling = Sampling::static_only();
    }

    match match_canonical_stack(&order.ops) {
        Some(matched) => {
            log::trace!("{}: ops match the {} stack", prim.path(), matched.profile);
            read_matched(prim, node, &matched, &sampling, ctx)
        }
        None => {
            log::warn!(
                "{}: xform ops [{}] fit no host stack, decomposing the matrix",
                prim.path(),
                names.join(", ")
            );
            read_decomposed(prim, node, &order.ops, &sampling, ctx)
        }
    }
}

fn op_order_names(prim: &Prim) -> Vec<String> {
    prim.attribute(OP_ORDER_ATTR)
        .and_then(|attr| attr.value_at(TimeSample::Default))
        .and_then(Value::as_array)
        .map(|tokens| tokens.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn is_animated(prim: &Prim, ops: &[XformOp], sampling: &Sampling) -> bool {
    ops.iter()
        .filter_map(|op| prim.attribute(&op.attribute_name()))
        .any(|attr| sampling.times(attr).len() > 1)
}

/// Point `node` at the job's stage proxy instead of keying it.
fn tag_stage_proxy(path: &ScenePath, node: NodeHandle, ctx: &mut ReadContext<'_>) -> Result<()> {
    let Some(proxy) = ctx.registry().lookup_path(STAGE_PROXY_KEY) else {
        log::warn!("{}: animated but no stage proxy exists, reading static values", path);
        return Ok(());
    };
    let modifier = ctx.modifier();
    modifier.ensure_plug(node, STAGE_PROXY_PLUG, PlugType::Message)?;
    modifier.set_plug(node, STAGE_PROXY_PLUG, PlugValue::Message(Some(proxy)))?;
    modifier.ensure_plug(node, PRIM_PATH_PLUG, PlugType::String)?;
    modifier.set_plug(node, PRIM_PATH_PLUG, PlugValue::String(path.to_string()))?;
    Ok(())
}

fn read_matched(
    prim: &Prim,
    node: NodeHandle,
    matched: &MatchedStack,
    sampling: &Sampling,
    ctx: &mut ReadContext<'_>,
) -> Result<()> {
    let rotate_order = matched.rotate_order().unwrap_or(RotationOrder::Xyz);
    if matched.rotate_order().is_some() {
        ctx.modifier()
            .set_plug(node, "rotateOrder", PlugValue::Int(rotate_order.index()))?;
    }

    for (op, slot) in matched.mapped() {
        let Some(attr) = prim.attribute(&op.attribute_name()) else {
            continue;
        };
        let Some(mut samples) = read_op_samples(prim.path(), op, slot, attr, sampling) else {
            continue;
        };
        if slot == HostSlot::Rotate && ctx.args().apply_euler_filter {
            filter_rotation(&mut samples, rotate_order);
        }

        let plugs: &[&str] = match slot {
            HostSlot::Pivot => &["rotatePivot", "scalePivot"],
            _ => &[slot.plug_name()],
        };
        for plug in plugs {
            push_samples(node, plug, &samples, ctx)?;
        }
    }
    Ok(())
}

/// Read one matched op, static or over time. `None` when no sample could
/// be read.
fn read_op_samples(
    path: &ScenePath,
    op: &XformOp,
    slot: HostSlot,
    attr: &Attribute,
    sampling: &Sampling,
) -> Option<Samples> {
    let times = sampling.times(attr);
    if times.len() <= 1 {
        let time = times.first().map_or(TimeSample::Default, |t| TimeSample::At(*t));
        let value = attr.value_at(time).and_then(|v| slot_value(op, slot, v));
        if value.is_none() {
            log::error!("{}: cannot read {} as {}", path, attr.name(), op.op_type.token());
        }
        return value.map(Samples::Static);
    }

    let mut out = Vec::with_capacity(times.len());
    for time in times {
        match attr.value_at(TimeSample::At(time)).and_then(|v| slot_value(op, slot, v)) {
            Some(value) => out.push((time, value)),
            None => log::error!("{}: skipping unreadable sample of {} at {}", path, attr.name(), time),
        }
    }
    match out.len() {
        0 => None,
        1 => Some(Samples::Static(out[0].1)),
        _ => Some(Samples::Animated(out)),
    }
}

/// Host-side value of a matched op: degrees for rotations, stage units for
/// everything else.
fn slot_value(op: &XformOp, slot: HostSlot, value: &Value) -> Option<DVec3> {
    match slot {
        HostSlot::Rotate | HostSlot::RotateAxis => {
            let euler = rotation_value(op.op_type, value)?;
            match (slot, op.op_type.rotation_order()) {
                (HostSlot::RotateAxis, Some(order)) if order != RotationOrder::Xyz => Some(matrix_to_euler(
                    &euler_to_matrix(euler, order),
                    RotationOrder::Xyz,
                )),
                _ => Some(euler),
            }
        }
        HostSlot::Shear => {
            let rows = value.as_matrix4d()?;
            Some(DVec3::new(rows[1][0], rows[2][0], rows[2][1]))
        }
        _ => value.as_vec3d().map(DVec3::from_array),
    }
}

fn rotation_value(op_type: XformOpType, value: &Value) -> Option<DVec3> {
    match op_type.single_axis() {
        Some(axis) => {
            let mut euler = DVec3::ZERO;
            euler[axis] = value.as_f64()?;
            Some(euler)
        }
        None => value.as_vec3d().map(DVec3::from_array),
    }
}

fn filter_rotation(samples: &mut Samples, order: RotationOrder) {
    if let Samples::Animated(values) = samples {
        let mut filter = EulerFilter::new(order);
        for (_, value) in values.iter_mut() {
            *value = filter.filter(*value);
        }
    }
}

/// Convert a host-side value into the plug's storage unit. Angle plugs
/// take degrees; distances are written as authored.
fn to_storage(plug_type: PlugType, value: DVec3) -> [f64; 3] {
    match plug_type.angle_unit() {
        Some(unit) => value.to_array().map(|v| AngleUnit::Degrees.convert(v, unit)),
        None => value.to_array(),
    }
}

fn push_samples(node: NodeHandle, plug: &str, samples: &Samples, ctx: &mut ReadContext<'_>) -> Result<()> {
    let plug_type = ctx.host().plug_type(node, plug)?;
    match samples {
        Samples::Static(value) => {
            ctx.modifier()
                .set_plug(node, plug, PlugValue::Double3(to_storage(plug_type, *value)))?;
        }
        Samples::Animated(values) => {
            let keyed: Vec<(f64, PlugValue)> = values
                .iter()
                .map(|(time, value)| (*time, PlugValue::Double3(to_storage(plug_type, *value))))
                .collect();
            if let Some((_, first)) = keyed.first() {
                ctx.modifier().set_plug(node, plug, first.clone())?;
            }
            let options = AnimOptions::from_args(ctx.args());
            let (modifier, registry) = ctx.split();
            if let Err(err) = set_animated(modifier, registry, node, plug, &keyed, &options) {
                log::error!("cannot animate {}: {}", plug, err);
            }
        }
    }
    Ok(())
}

fn op_value(op: &XformOp, value: &Value) -> Option<OpValue> {
    let converted = match op.op_type {
        XformOpType::Translate | XformOpType::Scale => OpValue::Vec3(DVec3::from_array(value.as_vec3d()?)),
        XformOpType::Orient => {
            let [i, j, k, real] = value.as_quatd()?;
            OpValue::Quat(DQuat::from_xyzw(i, j, k, real))
        }
        XformOpType::Transform => OpValue::Matrix(matrix_from_rows(&value.as_matrix4d()?)),
        op_type if op_type.single_axis().is_some() => OpValue::Scalar(value.as_f64()?),
        _ => OpValue::Vec3(DVec3::from_array(value.as_vec3d()?)),
    };
    Some(converted)
}

/// Compose every op at `time` and decompose the result.
fn decompose_at(prim: &Prim, ops: &[XformOp], time: TimeSample) -> Option<TransformComponents> {
    let mut values = Vec::with_capacity(ops.len());
    for op in ops {
        let name = op.attribute_name();
        let Some(value) = prim.attribute(&name).and_then(|attr| attr.value_at(time)) else {
            log::error!("{}: no value for {} at {:?}", prim.path(), name, time);
            return None;
        };
        let Some(value) = op_value(op, value) else {
            log::error!("{}: cannot read {} as {}", prim.path(), name, op.op_type.token());
            return None;
        };
        values.push((op.clone(), value));
    }

    let decomposed = compose_ops(&values).and_then(|m| components_from_matrix(&m));
    match decomposed {
        Ok(components) => Some(components),
        Err(err) => {
            log::error!("{}: cannot decompose transform at {:?}: {}", prim.path(), time, err);
            None
        }
    }
}

fn read_decomposed(
    prim: &Prim,
    node: NodeHandle,
    ops: &[XformOp],
    sampling: &Sampling,
    ctx: &mut ReadContext<'_>,
) -> Result<()> {
    let mut times: Vec<f64> = ops
        .iter()
        .filter_map(|op| prim.attribute(&op.attribute_name()))
        .flat_map(|attr| sampling.times(attr))
        .collect();
    times.sort_by(f64::total_cmp);
    times.dedup();

    let components: Vec<(f64, TransformComponents)> = if times.len() <= 1 {
        let time = times.first().map_or(TimeSample::Default, |t| TimeSample::At(*t));
        decompose_at(prim, ops, time)
            .map(|c| vec![(times.first().copied().unwrap_or_default(), c)])
            .unwrap_or_default()
    } else {
        times
            .iter()
            .filter_map(|t| decompose_at(prim, ops, TimeSample::At(*t)).map(|c| (*t, c)))
            .collect()
    };

    if components.is_empty() {
        log::error!("{}: transform unreadable, leaving host defaults", prim.path());
        return Ok(());
    }

    let channel = |pick: fn(&TransformComponents) -> DVec3| -> Samples {
        if components.len() == 1 {
            Samples::Static(pick(&components[0].1))
        } else {
            Samples::Animated(components.iter().map(|(t, c)| (*t, pick(c))).collect())
        }
    };

    let mut rotate = channel(|c| c.rotate);
    if ctx.args().apply_euler_filter {
        filter_rotation(&mut rotate, RotationOrder::Xyz);
    }
    push_samples(node, "translate", &channel(|c| c.translate), ctx)?;
    push_samples(node, "rotate", &rotate, ctx)?;
    push_samples(node, "scale", &channel(|c| c.scale), ctx)?;
    push_samples(node, "shear", &channel(|c| c.shear), ctx)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr_with(op: &str, samples: &[(f64, Value)]) -> Prim {
        use stagelink_core::ValueType;
        use stagelink_stage::{AttributeSpec, Layer, MemoryStage, PrimSpec, Stage};
        let mut spec = AttributeSpec::new(op, ValueType::parse("double3").unwrap());
        for (t, v) in samples {
            spec = spec.with_sample(*t, v.clone());
        }
        let stage = MemoryStage::from_layer(Layer::new("t.json").with_prim(PrimSpec::new("A", "Xform").with_attribute(spec)))
            .unwrap();
        stage.prim(&ScenePath::parse("/A").unwrap()).unwrap().clone()
    }

    #[test]
    fn test_shear_from_matrix_rows() {
        let op = XformOp::parse("xformOp:transform:shear").unwrap();
        let rows = [
            [1.0, 0.0, 0.0, 0.0],
            [0.5, 1.0, 0.0, 0.0],
            [0.25, 0.75, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let shear = slot_value(&op, HostSlot::Shear, &Value::Matrix4d(rows)).unwrap();
        assert_eq!(shear, DVec3::new(0.5, 0.25, 0.75));
    }

    #[test]
    fn test_single_axis_rotate() {
        let op = XformOp::parse("xformOp:rotateY").unwrap();
        let euler = slot_value(&op, HostSlot::Rotate, &Value::Double(30.0)).unwrap();
        assert_eq!(euler, DVec3::new(0.0, 30.0, 0.0));
    }

    #[test]
    fn test_rotate_axis_reordered() {
        let op = XformOp::parse("xformOp:rotateZYX:rotateAxis").unwrap();
        let euler = slot_value(&op, HostSlot::RotateAxis, &Value::Double3([0.0, 0.0, 45.0])).unwrap();
        // a single-axis rotation is the same in any order
        assert!((euler - DVec3::new(0.0, 0.0, 45.0)).length() < 1e-9);
    }

    #[test]
    fn test_to_storage_converts_angles() {
        let stored = to_storage(PlugType::Angle3(AngleUnit::Radians), DVec3::new(180.0, 0.0, 0.0));
        assert!((stored[0] - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(to_storage(PlugType::Double3, DVec3::ONE), [1.0; 3]);
    }

    #[test]
    fn test_samples_skip_unreadable() {
        let prim = attr_with(
            "xformOp:translate",
            &[
                (1.0, Value::Double3([1.0, 0.0, 0.0])),
                (2.0, Value::String("bad".into())),
                (3.0, Value::Double3([3.0, 0.0, 0.0])),
            ],
        );
        let op = XformOp::parse("xformOp:translate").unwrap();
        let attr = prim.attribute("xformOp:translate").unwrap();
        let sampling = Sampling {
            interval: Some(TimeInterval::ALL),
        };
        let samples = read_op_samples(prim.path(), &op, HostSlot::Translate, attr, &sampling).unwrap();
        assert_eq!(
            samples,
            Samples::Animated(vec![(1.0, DVec3::new(1.0, 0.0, 0.0)), (3.0, DVec3::new(3.0, 0.0, 0.0))])
        );

        let sampling = Sampling::static_only();
        let samples = read_op_samples(prim.path(), &op, HostSlot::Translate, attr, &sampling).unwrap();
        assert_eq!(samples, Samples::Static(DVec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_euler_filter_unwraps() {
        let mut samples = Samples::Animated(vec![
            (1.0, DVec3::new(0.0, 0.0, 170.0)),
            (2.0, DVec3::new(0.0, 0.0, -170.0)),
        ]);
        filter_rotation(&mut samples, RotationOrder::Xyz);
        let Samples::Animated(values) = samples else {
            panic!("expected animated samples");
        };
        assert!((values[1].1.z - 190.0).abs() < 1e-9);
    }
}
