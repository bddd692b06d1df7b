//! Typed access to host plugs.
//!
//! Scalars, vectors, quaternions and matrices go through [`PlugScalar`];
//! arrays through [`PlugArrayElement`], read by querying the length with
//! [`array_len`] and then filling a caller buffer with [`get_array_into`].
//! Distance, angle and time plugs (scalar and array) store values in a
//! declared unit; the unit-aware accessors convert on the way in and out.
//!
//! Stage values become plug values with [`plug_type_for`] and
//! [`value_to_plug`]. Time samples are keyed onto animation curves by
//! [`set_animated`].

use crate::context::NodePathRegistry;
use crate::error::{ImportError, Result};
use glam::{DMat2, DMat3, DMat4, DQuat};
use half::f16;
use stagelink_core::{AngleUnit, DistanceUnit, ImportArgs, ScalarKind, TimeUnit, Value, ValueType};
use stagelink_host::{DagModifier, HostGraph, Keyframe, NodeHandle, PlugType, PlugValue, TangentType};
use stagelink_xform::matrix_from_rows;
use std::borrow::Cow;

/// A value type that round-trips through a single plug.
pub trait PlugScalar: Sized {
    /// Value shape, for diagnostics.
    const KIND: &'static str;

    /// Plug type created for this value when the plug does not exist.
    fn plug_type() -> PlugType;

    fn from_plug(value: &PlugValue) -> Option<Self>;

    fn into_plug(self) -> PlugValue;
}

macro_rules! plug_scalar {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl PlugScalar for $ty {
            const KIND: &'static str = $kind;

            fn plug_type() -> PlugType {
                PlugType::$variant
            }

            fn from_plug(value: &PlugValue) -> Option<Self> {
                match value {
                    PlugValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn into_plug(self) -> PlugValue {
                PlugValue::$variant(self)
            }
        }
    };
}

plug_scalar!(bool, Bool, "bool");
plug_scalar!(i32, Int, "int");
plug_scalar!(i64, Int64, "int64");
plug_scalar!(f32, Float, "float");
plug_scalar!(f64, Double, "double");
plug_scalar!([f32; 2], Float2, "float2");
plug_scalar!([f32; 3], Float3, "float3");
plug_scalar!([f64; 2], Double2, "double2");
plug_scalar!([f64; 3], Double3, "double3");
plug_scalar!([f64; 4], Double4, "double4");
plug_scalar!([i32; 2], Int2, "int2");
plug_scalar!([i32; 3], Int3, "int3");
plug_scalar!([i32; 4], Int4, "int4");
plug_scalar!(DMat2, Matrix2, "matrix2");
plug_scalar!(DMat3, Matrix3, "matrix3");
plug_scalar!(DMat4, Matrix, "matrix");

impl PlugScalar for u8 {
    const KIND: &'static str = "uchar";

    fn plug_type() -> PlugType {
        PlugType::Int
    }

    fn from_plug(value: &PlugValue) -> Option<Self> {
        i32::from_plug(value).and_then(|v| u8::try_from(v).ok())
    }

    fn into_plug(self) -> PlugValue {
        PlugValue::Int(i32::from(self))
    }
}

impl PlugScalar for i16 {
    const KIND: &'static str = "short";

    fn plug_type() -> PlugType {
        PlugType::Int
    }

    fn from_plug(value: &PlugValue) -> Option<Self> {
        i32::from_plug(value).and_then(|v| i16::try_from(v).ok())
    }

    fn into_plug(self) -> PlugValue {
        PlugValue::Int(i32::from(self))
    }
}

impl PlugScalar for f16 {
    const KIND: &'static str = "half";

    fn plug_type() -> PlugType {
        PlugType::Float
    }

    fn from_plug(value: &PlugValue) -> Option<Self> {
        f32::from_plug(value).map(f16::from_f32)
    }

    fn into_plug(self) -> PlugValue {
        PlugValue::Float(self.to_f32())
    }
}

impl PlugScalar for String {
    const KIND: &'static str = "string";

    fn plug_type() -> PlugType {
        PlugType::String
    }

    fn from_plug(value: &PlugValue) -> Option<Self> {
        match value {
            PlugValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_plug(self) -> PlugValue {
        PlugValue::String(self)
    }
}

/// Quaternions are stored as `[x, y, z, w]` on a double4 plug.
impl PlugScalar for DQuat {
    const KIND: &'static str = "quaternion";

    fn plug_type() -> PlugType {
        PlugType::Double4
    }

    fn from_plug(value: &PlugValue) -> Option<Self> {
        <[f64; 4]>::from_plug(value).map(DQuat::from_array)
    }

    fn into_plug(self) -> PlugValue {
        PlugValue::Double4(self.to_array())
    }
}

/// Read a plug as `T`.
pub fn get<T: PlugScalar>(host: &dyn HostGraph, node: NodeHandle, plug: &str) -> Result<T> {
    let value = host.get_plug(node, plug)?;
    T::from_plug(&value).ok_or_else(|| ImportError::plug_value(plug, T::KIND))
}

/// Set a plug, adding it first if the node does not have it.
pub fn set<T: PlugScalar>(modifier: &mut DagModifier<'_>, node: NodeHandle, plug: &str, value: T) -> Result<()> {
    modifier.ensure_plug(node, plug, T::plug_type())?;
    modifier.set_plug(node, plug, value.into_plug())?;
    Ok(())
}

/// Element type of an array plug.
///
/// Types the host stores natively borrow the plug's elements; narrower
/// types (`u8`, `i16`, `bool`, `f16`, quaternions) convert through the
/// host's storage array.
pub trait PlugArrayElement: Clone {
    const KIND: &'static str;

    fn plug_type() -> PlugType;

    fn elements(value: &PlugValue) -> Option<Cow<'_, [Self]>>;

    fn into_plug(values: Vec<Self>) -> PlugValue;
}

macro_rules! plug_array {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl PlugArrayElement for $ty {
            const KIND: &'static str = $kind;

            fn plug_type() -> PlugType {
                PlugType::$variant
            }

            fn elements(value: &PlugValue) -> Option<Cow<'_, [Self]>> {
                match value {
                    PlugValue::$variant(v) => Some(Cow::Borrowed(v.as_slice())),
                    _ => None,
                }
            }

            fn into_plug(values: Vec<Self>) -> PlugValue {
                PlugValue::$variant(values)
            }
        }
    };
}

plug_array!(i32, IntArray, "int[]");
plug_array!(i64, Int64Array, "int64[]");
plug_array!(f32, FloatArray, "float[]");
plug_array!(f64, DoubleArray, "double[]");
plug_array!(String, StringArray, "string[]");
plug_array!([f32; 2], Float2Array, "float2[]");
plug_array!([f32; 3], Float3Array, "float3[]");
plug_array!([f64; 2], Double2Array, "double2[]");
plug_array!([f64; 3], Double3Array, "double3[]");
plug_array!([f64; 4], Double4Array, "double4[]");
plug_array!([i32; 2], Int2Array, "int2[]");
plug_array!([i32; 3], Int3Array, "int3[]");
plug_array!([i32; 4], Int4Array, "int4[]");
plug_array!(DMat2, Matrix2Array, "matrix2[]");
plug_array!(DMat3, Matrix3Array, "matrix3[]");
plug_array!(DMat4, MatrixArray, "matrix[]");

macro_rules! plug_array_via {
    ($ty:ty, $storage:ty, $kind:literal, $from:expr, $into:expr) => {
        impl PlugArrayElement for $ty {
            const KIND: &'static str = $kind;

            fn plug_type() -> PlugType {
                <$storage as PlugArrayElement>::plug_type()
            }

            fn elements(value: &PlugValue) -> Option<Cow<'_, [Self]>> {
                let stored = <$storage as PlugArrayElement>::elements(value)?;
                let converted: Option<Vec<Self>> = stored.iter().map($from).collect();
                converted.map(Cow::Owned)
            }

            fn into_plug(values: Vec<Self>) -> PlugValue {
                <$storage as PlugArrayElement>::into_plug(values.into_iter().map($into).collect())
            }
        }
    };
}

plug_array_via!(bool, i32, "bool[]", |v: &i32| Some(*v != 0), i32::from);
plug_array_via!(u8, i32, "uchar[]", |v: &i32| u8::try_from(*v).ok(), i32::from);
plug_array_via!(i16, i32, "short[]", |v: &i32| i16::try_from(*v).ok(), i32::from);
plug_array_via!(f16, f32, "half[]", |v: &f32| Some(f16::from_f32(*v)), f16::to_f32);
plug_array_via!(
    DQuat,
    [f64; 4],
    "quaternion[]",
    |v: &[f64; 4]| Some(DQuat::from_array(*v)),
    |q: DQuat| q.to_array()
);

/// Element count of an array plug.
pub fn array_len(host: &dyn HostGraph, node: NodeHandle, plug: &str) -> Result<usize> {
    host.get_plug(node, plug)?
        .array_len()
        .ok_or_else(|| ImportError::plug_value(plug, "array"))
}

/// Copy an array plug into `out`, returning the number of elements written.
pub fn get_array_into<T: PlugArrayElement>(
    host: &dyn HostGraph,
    node: NodeHandle,
    plug: &str,
    out: &mut [T],
) -> Result<usize> {
    let value = host.get_plug(node, plug)?;
    let elements = T::elements(&value).ok_or_else(|| ImportError::plug_value(plug, T::KIND))?;
    if out.len() < elements.len() {
        return Err(ImportError::BufferTooSmall {
            needed: elements.len(),
            got: out.len(),
        });
    }
    out[..elements.len()].clone_from_slice(&elements);
    Ok(elements.len())
}

/// Set an array plug, adding it first if needed.
pub fn set_array<T: PlugArrayElement>(
    modifier: &mut DagModifier<'_>,
    node: NodeHandle,
    plug: &str,
    values: Vec<T>,
) -> Result<()> {
    modifier.ensure_plug(node, plug, T::plug_type())?;
    modifier.set_plug(node, plug, T::into_plug(values))?;
    Ok(())
}

fn distance_unit(host: &dyn HostGraph, node: NodeHandle, plug: &str) -> Result<DistanceUnit> {
    host.plug_type(node, plug)?
        .distance_unit()
        .ok_or_else(|| ImportError::plug_value(plug, "distance"))
}

fn angle_unit(host: &dyn HostGraph, node: NodeHandle, plug: &str) -> Result<AngleUnit> {
    host.plug_type(node, plug)?
        .angle_unit()
        .ok_or_else(|| ImportError::plug_value(plug, "angle"))
}

fn time_unit(host: &dyn HostGraph, node: NodeHandle, plug: &str) -> Result<TimeUnit> {
    host.plug_type(node, plug)?
        .time_unit()
        .ok_or_else(|| ImportError::plug_value(plug, "time"))
}

/// Read a distance plug in `unit`.
pub fn get_distance(host: &dyn HostGraph, node: NodeHandle, plug: &str, unit: DistanceUnit) -> Result<f64> {
    let storage = distance_unit(host, node, plug)?;
    Ok(storage.convert(get::<f64>(host, node, plug)?, unit))
}

/// Write a distance given in `unit`.
pub fn set_distance(
    modifier: &mut DagModifier<'_>,
    node: NodeHandle,
    plug: &str,
    value: f64,
    unit: DistanceUnit,
) -> Result<()> {
    let storage = distance_unit(modifier.host(), node, plug)?;
    modifier.set_plug(node, plug, PlugValue::Double(unit.convert(value, storage)))?;
    Ok(())
}

/// Read a three-channel distance plug in `unit`.
pub fn get_distance3(host: &dyn HostGraph, node: NodeHandle, plug: &str, unit: DistanceUnit) -> Result<[f64; 3]> {
    let storage = distance_unit(host, node, plug)?;
    Ok(get::<[f64; 3]>(host, node, plug)?.map(|v| storage.convert(v, unit)))
}

/// Write a three-channel distance given in `unit`.
pub fn set_distance3(
    modifier: &mut DagModifier<'_>,
    node: NodeHandle,
    plug: &str,
    value: [f64; 3],
    unit: DistanceUnit,
) -> Result<()> {
    let storage = distance_unit(modifier.host(), node, plug)?;
    modifier.set_plug(node, plug, PlugValue::Double3(value.map(|v| unit.convert(v, storage))))?;
    Ok(())
}

/// Read an angle plug in `unit`.
pub fn get_angle(host: &dyn HostGraph, node: NodeHandle, plug: &str, unit: AngleUnit) -> Result<f64> {
    let storage = angle_unit(host, node, plug)?;
    Ok(storage.convert(get::<f64>(host, node, plug)?, unit))
}

/// Write an angle given in `unit`.
pub fn set_angle(
    modifier: &mut DagModifier<'_>,
    node: NodeHandle,
    plug: &str,
    value: f64,
    unit: AngleUnit,
) -> Result<()> {
    let storage = angle_unit(modifier.host(), node, plug)?;
    modifier.set_plug(node, plug, PlugValue::Double(unit.convert(value, storage)))?;
    Ok(())
}

/// Read a three-channel angle plug in `unit`.
pub fn get_angle3(host: &dyn HostGraph, node: NodeHandle, plug: &str, unit: AngleUnit) -> Result<[f64; 3]> {
    let storage = angle_unit(host, node, plug)?;
    Ok(get::<[f64; 3]>(host, node, plug)?.map(|v| storage.convert(v, unit)))
}

/// Write a three-channel angle given in `unit`.
pub fn set_angle3(
    modifier: &mut DagModifier<'_>,
    node: NodeHandle,
    plug: &str,
    value: [f64; 3],
    unit: AngleUnit,
) -> Result<()> {
    let storage = angle_unit(modifier.host(), node, plug)?;
    modifier.set_plug(node, plug, PlugValue::Double3(value.map(|v| unit.convert(v, storage))))?;
    Ok(())
}

/// Read a time plug in `unit`.
pub fn get_time(host: &dyn HostGraph, node: NodeHandle, plug: &str, unit: TimeUnit) -> Result<f64> {
    let storage = time_unit(host, node, plug)?;
    Ok(storage.convert(get::<f64>(host, node, plug)?, unit))
}

/// Write a time given in `unit`.
pub fn set_time(modifier: &mut DagModifier<'_>, node: NodeHandle, plug: &str, value: f64, unit: TimeUnit) -> Result<()> {
    let storage = time_unit(modifier.host(), node, plug)?;
    modifier.set_plug(node, plug, PlugValue::Double(unit.convert(value, storage)))?;
    Ok(())
}

fn converted_into(
    host: &dyn HostGraph,
    node: NodeHandle,
    plug: &str,
    out: &mut [f64],
    convert: impl Fn(f64) -> f64,
) -> Result<usize> {
    let len = get_array_into(host, node, plug, out)?;
    for v in &mut out[..len] {
        *v = convert(*v);
    }
    Ok(len)
}

/// Copy a distance array plug into `out` in `unit`.
pub fn get_distance_array_into(
    host: &dyn HostGraph,
    node: NodeHandle,
    plug: &str,
    unit: DistanceUnit,
    out: &mut [f64],
) -> Result<usize> {
    let storage = distance_unit(host, node, plug)?;
    converted_into(host, node, plug, out, |v| storage.convert(v, unit))
}

/// Write a distance array given in `unit`.
pub fn set_distance_array(
    modifier: &mut DagModifier<'_>,
    node: NodeHandle,
    plug: &str,
    values: &[f64],
    unit: DistanceUnit,
) -> Result<()> {
    let storage = distance_unit(modifier.host(), node, plug)?;
    let stored = values.iter().map(|v| unit.convert(*v, storage)).collect();
    modifier.set_plug(node, plug, PlugValue::DoubleArray(stored))?;
    Ok(())
}

/// Copy an angle array plug into `out` in `unit`.
pub fn get_angle_array_into(
    host: &dyn HostGraph,
    node: NodeHandle,
    plug: &str,
    unit: AngleUnit,
    out: &mut [f64],
) -> Result<usize> {
    let storage = angle_unit(host, node, plug)?;
    converted_into(host, node, plug, out, |v| storage.convert(v, unit))
}

/// Write an angle array given in `unit`.
pub fn set_angle_array(
    modifier: &mut DagModifier<'_>,
    node: NodeHandle,
    plug: &str,
    values: &[f64],
    unit: AngleUnit,
) -> Result<()> {
    let storage = angle_unit(modifier.host(), node, plug)?;
    let stored = values.iter().map(|v| unit.convert(*v, storage)).collect();
    modifier.set_plug(node, plug, PlugValue::DoubleArray(stored))?;
    Ok(())
}

/// Copy a time array plug into `out` in `unit`.
pub fn get_time_array_into(
    host: &dyn HostGraph,
    node: NodeHandle,
    plug: &str,
    unit: TimeUnit,
    out: &mut [f64],
) -> Result<usize> {
    let storage = time_unit(host, node, plug)?;
    converted_into(host, node, plug, out, |v| storage.convert(v, unit))
}

/// Write a time array given in `unit`.
pub fn set_time_array(
    modifier: &mut DagModifier<'_>,
    node: NodeHandle,
    plug: &str,
    values: &[f64],
    unit: TimeUnit,
) -> Result<()> {
    let storage = time_unit(modifier.host(), node, plug)?;
    let stored = values.iter().map(|v| unit.convert(*v, storage)).collect();
    modifier.set_plug(node, plug, PlugValue::DoubleArray(stored))?;
    Ok(())
}

/// Host plug type for a stage attribute type.
pub fn plug_type_for(value_type: ValueType) -> PlugType {
    use ScalarKind as K;

    if value_type.is_array {
        return match value_type.kind {
            K::Bool | K::UChar | K::Short | K::Int => PlugType::IntArray,
            K::Int64 => PlugType::Int64Array,
            K::Half | K::Float => PlugType::FloatArray,
            K::Double | K::TimeCode => PlugType::DoubleArray,
            K::String | K::Token | K::Asset => PlugType::StringArray,
            K::Float2 => PlugType::Float2Array,
            K::Float3 => PlugType::Float3Array,
            K::Double2 => PlugType::Double2Array,
            K::Double3 => PlugType::Double3Array,
            K::Float4 | K::Double4 | K::Quatf | K::Quatd => PlugType::Double4Array,
            K::Int2 => PlugType::Int2Array,
            K::Int3 => PlugType::Int3Array,
            K::Int4 => PlugType::Int4Array,
            K::Matrix2d => PlugType::Matrix2Array,
            K::Matrix3d => PlugType::Matrix3Array,
            K::Matrix4d => PlugType::MatrixArray,
        };
    }

    match value_type.kind {
        K::Bool => PlugType::Bool,
        K::UChar | K::Short | K::Int => PlugType::Int,
        K::Int64 => PlugType::Int64,
        K::Half | K::Float => PlugType::Float,
        K::Double | K::TimeCode => PlugType::Double,
        K::String | K::Token | K::Asset => PlugType::String,
        K::Float2 => PlugType::Float2,
        K::Float3 => PlugType::Float3,
        K::Double2 => PlugType::Double2,
        K::Double3 => PlugType::Double3,
        K::Float4 | K::Double4 | K::Quatf | K::Quatd => PlugType::Double4,
        K::Int2 => PlugType::Int2,
        K::Int3 => PlugType::Int3,
        K::Int4 => PlugType::Int4,
        K::Matrix2d => PlugType::Matrix2,
        K::Matrix3d => PlugType::Matrix3,
        K::Matrix4d => PlugType::Matrix,
    }
}

/// Convert a stage value to the plug value [`plug_type_for`] chose for
/// `plug_type`. `None` if the value does not fit.
pub fn value_to_plug(value: &Value, plug_type: PlugType) -> Option<PlugValue> {
    let converted = match plug_type {
        PlugType::Bool => PlugValue::Bool(value.as_bool()?),
        PlugType::Int => PlugValue::Int(i32::try_from(value.as_i64()?).ok()?),
        PlugType::Int64 => PlugValue::Int64(value.as_i64()?),
        PlugType::Float => PlugValue::Float(value.as_f64()? as f32),
        PlugType::Double | PlugType::Angle(_) | PlugType::Distance(_) | PlugType::Time(_) => {
            PlugValue::Double(value.as_f64()?)
        }
        PlugType::String => PlugValue::String(value.as_str()?.to_string()),
        PlugType::Float2 => PlugValue::Float2(value.as_vec2d()?.map(|c| c as f32)),
        PlugType::Float3 => PlugValue::Float3(value.as_vec3d()?.map(|c| c as f32)),
        PlugType::Double2 => PlugValue::Double2(value.as_vec2d()?),
        PlugType::Double3 | PlugType::Angle3(_) | PlugType::Distance3(_) => PlugValue::Double3(value.as_vec3d()?),
        PlugType::Double4 => PlugValue::Double4(vec4(value)?),
        PlugType::Int2 => PlugValue::Int2(int2(value)?),
        PlugType::Int3 => PlugValue::Int3(int3(value)?),
        PlugType::Int4 => PlugValue::Int4(int4(value)?),
        PlugType::Matrix2 => PlugValue::Matrix2(matrix2(value)?),
        PlugType::Matrix3 => PlugValue::Matrix3(matrix3(value)?),
        PlugType::Matrix => PlugValue::Matrix(matrix_from_rows(&value.as_matrix4d()?)),
        PlugType::IntArray => PlugValue::IntArray(
            elements(value, |v| v.as_i64().and_then(|i| i32::try_from(i).ok()))?,
        ),
        PlugType::Int64Array => PlugValue::Int64Array(elements(value, Value::as_i64)?),
        PlugType::FloatArray => PlugValue::FloatArray(elements(value, |v| v.as_f64().map(|f| f as f32))?),
        PlugType::DoubleArray | PlugType::AngleArray(_) | PlugType::DistanceArray(_) | PlugType::TimeArray(_) => {
            PlugValue::DoubleArray(elements(value, Value::as_f64)?)
        }
        PlugType::StringArray => PlugValue::StringArray(elements(value, |v| v.as_str().map(str::to_string))?),
        PlugType::Float2Array => PlugValue::Float2Array(elements(value, |v| v.as_vec2d().map(|c| c.map(|x| x as f32)))?),
        PlugType::Float3Array => PlugValue::Float3Array(elements(value, |v| v.as_vec3d().map(|c| c.map(|x| x as f32)))?),
        PlugType::Double2Array => PlugValue::Double2Array(elements(value, Value::as_vec2d)?),
        PlugType::Double3Array => PlugValue::Double3Array(elements(value, Value::as_vec3d)?),
        PlugType::Double4Array => PlugValue::Double4Array(elements(value, vec4)?),
        PlugType::Int2Array => PlugValue::Int2Array(elements(value, int2)?),
        PlugType::Int3Array => PlugValue::Int3Array(elements(value, int3)?),
        PlugType::Int4Array => PlugValue::Int4Array(elements(value, int4)?),
        PlugType::Matrix2Array => PlugValue::Matrix2Array(elements(value, matrix2)?),
        PlugType::Matrix3Array => PlugValue::Matrix3Array(elements(value, matrix3)?),
        PlugType::MatrixArray => PlugValue::MatrixArray(elements(value, |v| v.as_matrix4d().map(|m| matrix_from_rows(&m)))?),
        PlugType::Message => return None,
    };
    Some(converted)
}

fn int2(value: &Value) -> Option<[i32; 2]> {
    match value {
        Value::Int2(v) => Some(*v),
        _ => None,
    }
}

fn int3(value: &Value) -> Option<[i32; 3]> {
    match value {
        Value::Int3(v) => Some(*v),
        _ => None,
    }
}

fn int4(value: &Value) -> Option<[i32; 4]> {
    match value {
        Value::Int4(v) => Some(*v),
        _ => None,
    }
}

// Stage matrices are row-major with row vectors, same as `matrix_from_rows`.
fn matrix2(value: &Value) -> Option<DMat2> {
    match value {
        Value::Matrix2d(rows) => Some(DMat2::from_cols_array_2d(rows)),
        _ => None,
    }
}

fn matrix3(value: &Value) -> Option<DMat3> {
    match value {
        Value::Matrix3d(rows) => Some(DMat3::from_cols_array_2d(rows)),
        _ => None,
    }
}

fn vec4(value: &Value) -> Option<[f64; 4]> {
    match value {
        Value::Float4(v) => Some(v.map(|c| c as f64)),
        Value::Double4(v) => Some(*v),
        _ => value.as_quatd(),
    }
}

fn elements<T>(value: &Value, convert: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    value.as_array()?.iter().map(convert).collect()
}

/// How samples are keyed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimOptions {
    /// Multiplier applied to every sample time.
    pub time_scale: f64,
    /// Tangent for continuous channels. Discrete plugs always step.
    pub tangent: TangentType,
}

impl Default for AnimOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            tangent: TangentType::Linear,
        }
    }
}

impl AnimOptions {
    pub fn from_args(args: &ImportArgs) -> Self {
        Self {
            time_scale: args.time_scale,
            ..Self::default()
        }
    }
}

/// Key `samples` onto one curve per channel of `plug`.
///
/// Existing curves on the plug are reused; new curves are registered in
/// `registry` under their host name so undo can find them. Returns the
/// number of keys added. Fails without creating anything if an existing
/// curve has the wrong type.
pub fn set_animated(
    modifier: &mut DagModifier<'_>,
    registry: &mut NodePathRegistry,
    node: NodeHandle,
    plug: &str,
    samples: &[(f64, PlugValue)],
    options: &AnimOptions,
) -> Result<usize> {
    if samples.is_empty() {
        return Ok(0);
    }

    let plug_type = modifier.host().plug_type(node, plug)?;
    let expected = plug_type
        .anim_curve_type()
        .ok_or_else(|| ImportError::plug_value(plug, "animatable"))?;
    let tangent = match plug_type {
        PlugType::Bool | PlugType::Int | PlugType::Int64 | PlugType::Int2 | PlugType::Int3 | PlugType::Int4 => {
            TangentType::Step
        }
        _ => options.tangent,
    };

    let channels = plug_type.channel_count();
    for channel in 0..channels {
        if let Some(curve) = modifier.host().connected_anim_curve(node, plug, channel) {
            let found = modifier.host().anim_curve_type(curve)?;
            if found != expected {
                return Err(ImportError::UnsupportedAnimCurve {
                    plug: plug.to_string(),
                    found,
                    expected,
                });
            }
        }
    }

    let mut keyed = 0;
    for channel in 0..channels {
        let curve = match modifier.host().connected_anim_curve(node, plug, channel) {
            Some(curve) => curve,
            None => {
                let curve = modifier.create_anim_curve(node, plug, channel, expected)?;
                let name = modifier.host().node_name(curve)?;
                registry.register_path(&name, curve);
                curve
            }
        };
        for (time, value) in samples {
            let Some(v) = value.channel(channel) else {
                log::error!("sample at {} has no channel {} for {}", time, channel, plug);
                continue;
            };
            modifier.add_keyframe(curve, Keyframe::new(time * options.time_scale, v, tangent))?;
            keyed += 1;
        }
    }
    Ok(keyed)
}
