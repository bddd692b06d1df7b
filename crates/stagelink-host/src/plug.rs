//! Plug types and values.
//!
//! Unit-carrying plugs (angles, distances, times) store values in the unit
//! their type declares. Converting to and from other units is the caller's
//! job.

use crate::anim::AnimCurveType;
use crate::graph::NodeHandle;
use glam::{DMat2, DMat3, DMat4};
use stagelink_core::{AngleUnit, DistanceUnit, TimeUnit};
use std::fmt;

/// Declared type of a plug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlugType {
    Bool,
    Int,
    Int64,
    Float,
    Double,
    String,
    Float2,
    Float3,
    Double2,
    Double3,
    Double4,
    Int2,
    Int3,
    Int4,
    Matrix2,
    Matrix3,
    Matrix,
    Angle(AngleUnit),
    Distance(DistanceUnit),
    Time(TimeUnit),
    /// Three angles, e.g. `rotate`.
    Angle3(AngleUnit),
    /// Three distances, e.g. `translate`.
    Distance3(DistanceUnit),
    IntArray,
    Int64Array,
    FloatArray,
    DoubleArray,
    StringArray,
    Float2Array,
    Float3Array,
    Double2Array,
    Double3Array,
    Double4Array,
    Int2Array,
    Int3Array,
    Int4Array,
    Matrix2Array,
    Matrix3Array,
    MatrixArray,
    AngleArray(AngleUnit),
    DistanceArray(DistanceUnit),
    TimeArray(TimeUnit),
    /// A connection to another node.
    Message,
}

impl PlugType {
    /// Value a freshly added plug holds.
    pub fn default_value(self) -> PlugValue {
        match self {
            PlugType::Bool => PlugValue::Bool(false),
            PlugType::Int => PlugValue::Int(0),
            PlugType::Int64 => PlugValue::Int64(0),
            PlugType::Float => PlugValue::Float(0.0),
            PlugType::Double | PlugType::Angle(_) | PlugType::Distance(_) | PlugType::Time(_) => PlugValue::Double(0.0),
            PlugType::String => PlugValue::String(String::new()),
            PlugType::Float2 => PlugValue::Float2([0.0; 2]),
            PlugType::Float3 => PlugValue::Float3([0.0; 3]),
            PlugType::Double2 => PlugValue::Double2([0.0; 2]),
            PlugType::Double3 | PlugType::Angle3(_) | PlugType::Distance3(_) => PlugValue::Double3([0.0; 3]),
            PlugType::Double4 => PlugValue::Double4([0.0; 4]),
            PlugType::Int2 => PlugValue::Int2([0; 2]),
            PlugType::Int3 => PlugValue::Int3([0; 3]),
            PlugType::Int4 => PlugValue::Int4([0; 4]),
            PlugType::Matrix2 => PlugValue::Matrix2(DMat2::IDENTITY),
            PlugType::Matrix3 => PlugValue::Matrix3(DMat3::IDENTITY),
            PlugType::Matrix => PlugValue::Matrix(DMat4::IDENTITY),
            PlugType::IntArray => PlugValue::IntArray(Vec::new()),
            PlugType::Int64Array => PlugValue::Int64Array(Vec::new()),
            PlugType::FloatArray => PlugValue::FloatArray(Vec::new()),
            PlugType::DoubleArray | PlugType::AngleArray(_) | PlugType::DistanceArray(_) | PlugType::TimeArray(_) => {
                PlugValue::DoubleArray(Vec::new())
            }
            PlugType::StringArray => PlugValue::StringArray(Vec::new()),
            PlugType::Float2Array => PlugValue::Float2Array(Vec::new()),
            PlugType::Float3Array => PlugValue::Float3Array(Vec::new()),
            PlugType::Double2Array => PlugValue::Double2Array(Vec::new()),
            PlugType::Double3Array => PlugValue::Double3Array(Vec::new()),
            PlugType::Double4Array => PlugValue::Double4Array(Vec::new()),
            PlugType::Int2Array => PlugValue::Int2Array(Vec::new()),
            PlugType::Int3Array => PlugValue::Int3Array(Vec::new()),
            PlugType::Int4Array => PlugValue::Int4Array(Vec::new()),
            PlugType::Matrix2Array => PlugValue::Matrix2Array(Vec::new()),
            PlugType::Matrix3Array => PlugValue::Matrix3Array(Vec::new()),
            PlugType::MatrixArray => PlugValue::MatrixArray(Vec::new()),
            PlugType::Message => PlugValue::Message(None),
        }
    }

    /// Whether `value` can be stored on a plug of this type.
    pub fn accepts(self, value: &PlugValue) -> bool {
        matches!(
            (self, value),
            (PlugType::Bool, PlugValue::Bool(_))
                | (PlugType::Int, PlugValue::Int(_))
                | (PlugType::Int64, PlugValue::Int64(_))
                | (PlugType::Float, PlugValue::Float(_))
                | (
                    PlugType::Double | PlugType::Angle(_) | PlugType::Distance(_) | PlugType::Time(_),
                    PlugValue::Double(_)
                )
                | (PlugType::String, PlugValue::String(_))
                | (PlugType::Float2, PlugValue::Float2(_))
                | (PlugType::Float3, PlugValue::Float3(_))
                | (PlugType::Double2, PlugValue::Double2(_))
                | (
                    PlugType::Double3 | PlugType::Angle3(_) | PlugType::Distance3(_),
                    PlugValue::Double3(_)
                )
                | (PlugType::Double4, PlugValue::Double4(_))
                | (PlugType::Int2, PlugValue::Int2(_))
                | (PlugType::Int3, PlugValue::Int3(_))
                | (PlugType::Int4, PlugValue::Int4(_))
                | (PlugType::Matrix2, PlugValue::Matrix2(_))
                | (PlugType::Matrix3, PlugValue::Matrix3(_))
                | (PlugType::Matrix, PlugValue::Matrix(_))
                | (PlugType::IntArray, PlugValue::IntArray(_))
                | (PlugType::Int64Array, PlugValue::Int64Array(_))
                | (PlugType::FloatArray, PlugValue::FloatArray(_))
                | (
                    PlugType::DoubleArray
                        | PlugType::AngleArray(_)
                        | PlugType::DistanceArray(_)
                        | PlugType::TimeArray(_),
                    PlugValue::DoubleArray(_)
                )
                | (PlugType::StringArray, PlugValue::StringArray(_))
                | (PlugType::Float2Array, PlugValue::Float2Array(_))
                | (PlugType::Float3Array, PlugValue::Float3Array(_))
                | (PlugType::Double2Array, PlugValue::Double2Array(_))
                | (PlugType::Double3Array, PlugValue::Double3Array(_))
                | (PlugType::Double4Array, PlugValue::Double4Array(_))
                | (PlugType::Int2Array, PlugValue::Int2Array(_))
                | (PlugType::Int3Array, PlugValue::Int3Array(_))
                | (PlugType::Int4Array, PlugValue::Int4Array(_))
                | (PlugType::Matrix2Array, PlugValue::Matrix2Array(_))
                | (PlugType::Matrix3Array, PlugValue::Matrix3Array(_))
                | (PlugType::MatrixArray, PlugValue::MatrixArray(_))
                | (PlugType::Message, PlugValue::Message(_))
        )
    }

    /// Number of independently animatable channels. Zero for non-numeric
    /// and array plugs.
    pub fn channel_count(self) -> usize {
        match self {
            PlugType::Bool
            | PlugType::Int
            | PlugType::Int64
            | PlugType::Float
            | PlugType::Double
            | PlugType::Angle(_)
            | PlugType::Distance(_)
            | PlugType::Time(_) => 1,
            PlugType::Float2 | PlugType::Double2 | PlugType::Int2 => 2,
            PlugType::Float3 | PlugType::Double3 | PlugType::Int3 | PlugType::Angle3(_) | PlugType::Distance3(_) => 3,
            PlugType::Double4 | PlugType::Int4 => 4,
            _ => 0,
        }
    }

    /// Curve type that animates this plug, `None` if it cannot be keyed.
    pub fn anim_curve_type(self) -> Option<AnimCurveType> {
        match self {
            PlugType::AngleArray(_) | PlugType::DistanceArray(_) | PlugType::TimeArray(_) => None,
            PlugType::Angle(_) | PlugType::Angle3(_) => Some(AnimCurveType::Angular),
            PlugType::Distance(_) | PlugType::Distance3(_) => Some(AnimCurveType::Linear),
            PlugType::Time(_) => Some(AnimCurveType::Time),
            t if t.channel_count() > 0 => Some(AnimCurveType::Unitless),
            _ => None,
        }
    }

    /// Storage unit of an angle plug.
    pub fn angle_unit(self) -> Option<AngleUnit> {
        match self {
            PlugType::Angle(unit) | PlugType::Angle3(unit) | PlugType::AngleArray(unit) => Some(unit),
            _ => None,
        }
    }

    /// Storage unit of a distance plug.
    pub fn distance_unit(self) -> Option<DistanceUnit> {
        match self {
            PlugType::Distance(unit) | PlugType::Distance3(unit) | PlugType::DistanceArray(unit) => Some(unit),
            _ => None,
        }
    }

    /// Storage unit of a time plug.
    pub fn time_unit(self) -> Option<TimeUnit> {
        match self {
            PlugType::Time(unit) | PlugType::TimeArray(unit) => Some(unit),
            _ => None,
        }
    }
}

impl fmt::Display for PlugType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A value held by a plug.
#[derive(Debug, Clone, PartialEq)]
pub enum PlugValue {
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Double2([f64; 2]),
    Double3([f64; 3]),
    Double4([f64; 4]),
    Int2([i32; 2]),
    Int3([i32; 3]),
    Int4([i32; 4]),
    Matrix2(DMat2),
    Matrix3(DMat3),
    Matrix(DMat4),
    IntArray(Vec<i32>),
    Int64Array(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
    Float2Array(Vec<[f32; 2]>),
    Float3Array(Vec<[f32; 3]>),
    Double2Array(Vec<[f64; 2]>),
    Double3Array(Vec<[f64; 3]>),
    Double4Array(Vec<[f64; 4]>),
    Int2Array(Vec<[i32; 2]>),
    Int3Array(Vec<[i32; 3]>),
    Int4Array(Vec<[i32; 4]>),
    Matrix2Array(Vec<DMat2>),
    Matrix3Array(Vec<DMat3>),
    MatrixArray(Vec<DMat4>),
    Message(Option<NodeHandle>),
}

impl PlugValue {
    /// Short name of the value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PlugValue::Bool(_) => "bool",
            PlugValue::Int(_) => "int",
            PlugValue::Int64(_) => "int64",
            PlugValue::Float(_) => "float",
            PlugValue::Double(_) => "double",
            PlugValue::String(_) => "string",
            PlugValue::Float2(_) => "float2",
            PlugValue::Float3(_) => "float3",
            PlugValue::Double2(_) => "double2",
            PlugValue::Double3(_) => "double3",
            PlugValue::Double4(_) => "double4",
            PlugValue::Int2(_) => "int2",
            PlugValue::Int3(_) => "int3",
            PlugValue::Int4(_) => "int4",
            PlugValue::Matrix2(_) => "matrix2",
            PlugValue::Matrix3(_) => "matrix3",
            PlugValue::Matrix(_) => "matrix",
            PlugValue::IntArray(_) => "int[]",
            PlugValue::Int64Array(_) => "int64[]",
            PlugValue::FloatArray(_) => "float[]",
            PlugValue::DoubleArray(_) => "double[]",
            PlugValue::StringArray(_) => "string[]",
            PlugValue::Float2Array(_) => "float2[]",
            PlugValue::Float3Array(_) => "float3[]",
            PlugValue::Double2Array(_) => "double2[]",
            PlugValue::Double3Array(_) => "double3[]",
            PlugValue::Double4Array(_) => "double4[]",
            PlugValue::Int2Array(_) => "int2[]",
            PlugValue::Int3Array(_) => "int3[]",
            PlugValue::Int4Array(_) => "int4[]",
            PlugValue::Matrix2Array(_) => "matrix2[]",
            PlugValue::Matrix3Array(_) => "matrix3[]",
            PlugValue::MatrixArray(_) => "matrix[]",
            PlugValue::Message(_) => "message",
        }
    }

    /// Element count of an array value, `None` for scalars.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            PlugValue::IntArray(v) => Some(v.len()),
            PlugValue::Int64Array(v) => Some(v.len()),
            PlugValue::FloatArray(v) => Some(v.len()),
            PlugValue::DoubleArray(v) => Some(v.len()),
            PlugValue::StringArray(v) => Some(v.len()),
            PlugValue::Float2Array(v) => Some(v.len()),
            PlugValue::Float3Array(v) => Some(v.len()),
            PlugValue::Double2Array(v) => Some(v.len()),
            PlugValue::Double3Array(v) => Some(v.len()),
            PlugValue::Double4Array(v) => Some(v.len()),
            PlugValue::Int2Array(v) => Some(v.len()),
            PlugValue::Int3Array(v) => Some(v.len()),
            PlugValue::Int4Array(v) => Some(v.len()),
            PlugValue::Matrix2Array(v) => Some(v.len()),
            PlugValue::Matrix3Array(v) => Some(v.len()),
            PlugValue::MatrixArray(v) => Some(v.len()),
            _ => None,
        }
    }

    /// One scalar channel of a numeric value.
    pub fn channel(&self, index: usize) -> Option<f64> {
        match self {
            PlugValue::Bool(v) if index == 0 => Some(if *v { 1.0 } else { 0.0 }),
            PlugValue::Int(v) if index == 0 => Some(*v as f64),
            PlugValue::Int64(v) if index == 0 => Some(*v as f64),
            PlugValue::Float(v) if index == 0 => Some(*v as f64),
            PlugValue::Double(v) if index == 0 => Some(*v),
            PlugValue::Float2(v) => v.get(index).map(|c| *c as f64),
            PlugValue::Float3(v) => v.get(index).map(|c| *c as f64),
            PlugValue::Double2(v) => v.get(index).copied(),
            PlugValue::Double3(v) => v.get(index).copied(),
            PlugValue::Double4(v) => v.get(index).copied(),
            PlugValue::Int2(v) => v.get(index).map(|c| *c as f64),
            PlugValue::Int3(v) => v.get(index).map(|c| *c as f64),
            PlugValue::Int4(v) => v.get(index).map(|c| *c as f64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values_accepted() {
        let types = [
            PlugType::Bool,
            PlugType::Double3,
            PlugType::Angle3(AngleUnit::Radians),
            PlugType::Distance(DistanceUnit::Centimeter),
            PlugType::Matrix,
            PlugType::Matrix3,
            PlugType::Int4,
            PlugType::Float2Array,
            PlugType::Double4Array,
            PlugType::AngleArray(AngleUnit::Degrees),
            PlugType::TimeArray(TimeUnit::Film),
            PlugType::Message,
        ];
        for t in types {
            assert!(t.accepts(&t.default_value()), "{}", t);
        }
    }

    #[test]
    fn test_type_mismatch() {
        assert!(!PlugType::Double3.accepts(&PlugValue::Float3([0.0; 3])));
        assert!(!PlugType::Int.accepts(&PlugValue::Double(1.0)));
    }

    #[test]
    fn test_anim_curve_types() {
        assert_eq!(PlugType::Angle3(AngleUnit::Radians).anim_curve_type(), Some(AnimCurveType::Angular));
        assert_eq!(
            PlugType::Distance3(DistanceUnit::Centimeter).anim_curve_type(),
            Some(AnimCurveType::Linear)
        );
        assert_eq!(PlugType::Bool.anim_curve_type(), Some(AnimCurveType::Unitless));
        assert_eq!(PlugType::String.anim_curve_type(), None);
        assert_eq!(PlugType::DoubleArray.anim_curve_type(), None);
        assert_eq!(PlugType::AngleArray(AngleUnit::Radians).anim_curve_type(), None);
        assert_eq!(PlugType::Int4.anim_curve_type(), Some(AnimCurveType::Unitless));
    }

    #[test]
    fn test_channels() {
        let v = PlugValue::Double3([1.0, 2.0, 3.0]);
        assert_eq!(v.channel(2), Some(3.0));
        assert_eq!(v.channel(3), None);
        assert_eq!(PlugValue::Bool(true).channel(0), Some(1.0));
        assert_eq!(PlugValue::IntArray(vec![1, 2]).array_len(), Some(2));
    }
}
