//! Typed attribute values.
//!
//! Values are what a stage hands back for an attribute at a time. The
//! declared type of an attribute is a [`ValueType`]: a [`ScalarKind`] plus
//! whether it is an array.

use crate::error::{CoreError, Result};
use half::f16;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Element kinds an attribute can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    UChar,
    Short,
    Int,
    Int64,
    Half,
    Float,
    Double,
    String,
    Token,
    Asset,
    Float2,
    Float3,
    Float4,
    Double2,
    Double3,
    Double4,
    Int2,
    Int3,
    Int4,
    Quatf,
    Quatd,
    Matrix2d,
    Matrix3d,
    Matrix4d,
    TimeCode,
}

impl ScalarKind {
    /// Parse a scalar type name. Role names map onto their storage kind.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => ScalarKind::Bool,
            "uchar" => ScalarKind::UChar,
            "short" => ScalarKind::Short,
            "int" => ScalarKind::Int,
            "int64" => ScalarKind::Int64,
            "half" => ScalarKind::Half,
            "float" => ScalarKind::Float,
            "double" => ScalarKind::Double,
            "string" => ScalarKind::String,
            "token" => ScalarKind::Token,
            "asset" => ScalarKind::Asset,
            "float2" | "half2" | "texCoord2f" | "texCoord2h" => ScalarKind::Float2,
            "float3" | "half3" | "color3f" | "color3h" | "point3f" | "point3h" | "normal3f"
            | "normal3h" | "vector3f" | "vector3h" | "texCoord3f" => ScalarKind::Float3,
            "float4" | "half4" | "color4f" | "color4h" => ScalarKind::Float4,
            "double2" | "texCoord2d" => ScalarKind::Double2,
            "double3" | "color3d" | "point3d" | "normal3d" | "vector3d" | "texCoord3d" => {
                ScalarKind::Double3
            }
            "double4" | "color4d" => ScalarKind::Double4,
            "int2" => ScalarKind::Int2,
            "int3" => ScalarKind::Int3,
            "int4" => ScalarKind::Int4,
            "quatf" | "quath" => ScalarKind::Quatf,
            "quatd" => ScalarKind::Quatd,
            "matrix2d" => ScalarKind::Matrix2d,
            "matrix3d" => ScalarKind::Matrix3d,
            "matrix4d" | "frame4d" => ScalarKind::Matrix4d,
            "timecode" => ScalarKind::TimeCode,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical type name.
    pub fn type_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::UChar => "uchar",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Int64 => "int64",
            ScalarKind::Half => "half",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
            ScalarKind::Token => "token",
            ScalarKind::Asset => "asset",
            ScalarKind::Float2 => "float2",
            ScalarKind::Float3 => "float3",
            ScalarKind::Float4 => "float4",
            ScalarKind::Double2 => "double2",
            ScalarKind::Double3 => "double3",
            ScalarKind::Double4 => "double4",
            ScalarKind::Int2 => "int2",
            ScalarKind::Int3 => "int3",
            ScalarKind::Int4 => "int4",
            ScalarKind::Quatf => "quatf",
            ScalarKind::Quatd => "quatd",
            ScalarKind::Matrix2d => "matrix2d",
            ScalarKind::Matrix3d => "matrix3d",
            ScalarKind::Matrix4d => "matrix4d",
            ScalarKind::TimeCode => "timecode",
        }
    }

    /// Number of numeric channels in one element.
    pub fn component_count(self) -> usize {
        match self {
            ScalarKind::Float2 | ScalarKind::Double2 | ScalarKind::Int2 => 2,
            ScalarKind::Float3 | ScalarKind::Double3 | ScalarKind::Int3 => 3,
            ScalarKind::Float4
            | ScalarKind::Double4
            | ScalarKind::Int4
            | ScalarKind::Quatf
            | ScalarKind::Quatd
            | ScalarKind::Matrix2d => 4,
            ScalarKind::Matrix3d => 9,
            ScalarKind::Matrix4d => 16,
            _ => 1,
        }
    }

    /// Whether elements of this kind are numbers (animatable channels).
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            ScalarKind::String | ScalarKind::Token | ScalarKind::Asset
        )
    }

    /// Whether this kind is a discrete (stepped) quantity.
    pub fn is_discrete(self) -> bool {
        matches!(
            self,
            ScalarKind::Bool
                | ScalarKind::UChar
                | ScalarKind::Short
                | ScalarKind::Int
                | ScalarKind::Int64
                | ScalarKind::Int2
                | ScalarKind::Int3
                | ScalarKind::Int4
        )
    }
}

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValueType {
    /// Element kind.
    pub kind: ScalarKind,
    /// Whether the attribute holds an array of `kind`.
    pub is_array: bool,
}

impl ValueType {
    /// A scalar type.
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self {
            kind,
            is_array: false,
        }
    }

    /// An array type.
    pub const fn array(kind: ScalarKind) -> Self {
        Self {
            kind,
            is_array: true,
        }
    }

    /// Parse a type name such as `float3` or `int[]`.
    pub fn parse(name: &str) -> Result<Self> {
        let (base, is_array) = match name.strip_suffix("[]") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let kind = ScalarKind::from_type_name(base.trim())
            .ok_or_else(|| CoreError::UnknownValueType(name.to_string()))?;
        Ok(Self { kind, is_array })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.kind.type_name())
        } else {
            f.write_str(self.kind.type_name())
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.to_string()
    }
}

/// A typed attribute value.
///
/// Quaternions are stored imaginary-first: `[i, j, k, real]`.
/// Matrices are stored as rows, with row vectors transformed by the matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    UChar(u8),
    Short(i16),
    Int(i32),
    Int64(i64),
    Half(f16),
    Float(f32),
    Double(f64),
    String(String),
    Token(String),
    Asset(String),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    Double2([f64; 2]),
    Double3([f64; 3]),
    Double4([f64; 4]),
    Int2([i32; 2]),
    Int3([i32; 3]),
    Int4([i32; 4]),
    Quatf([f32; 4]),
    Quatd([f64; 4]),
    Matrix2d([[f64; 2]; 2]),
    Matrix3d([[f64; 3]; 3]),
    Matrix4d([[f64; 4]; 4]),
    TimeCode(f64),
    Array(Vec<Value>),
}

impl Value {
    /// Element kind of a scalar value (`None` for arrays).
    pub fn kind(&self) -> Option<ScalarKind> {
        let kind = match self {
            Value::Bool(_) => ScalarKind::Bool,
            Value::UChar(_) => ScalarKind::UChar,
            Value::Short(_) => ScalarKind::Short,
            Value::Int(_) => ScalarKind::Int,
            Value::Int64(_) => ScalarKind::Int64,
            Value::Half(_) => ScalarKind::Half,
            Value::Float(_) => ScalarKind::Float,
            Value::Double(_) => ScalarKind::Double,
            Value::String(_) => ScalarKind::String,
            Value::Token(_) => ScalarKind::Token,
            Value::Asset(_) => ScalarKind::Asset,
            Value::Float2(_) => ScalarKind::Float2,
            Value::Float3(_) => ScalarKind::Float3,
            Value::Float4(_) => ScalarKind::Float4,
            Value::Double2(_) => ScalarKind::Double2,
            Value::Double3(_) => ScalarKind::Double3,
            Value::Double4(_) => ScalarKind::Double4,
            Value::Int2(_) => ScalarKind::Int2,
            Value::Int3(_) => ScalarKind::Int3,
            Value::Int4(_) => ScalarKind::Int4,
            Value::Quatf(_) => ScalarKind::Quatf,
            Value::Quatd(_) => ScalarKind::Quatd,
            Value::Matrix2d(_) => ScalarKind::Matrix2d,
            Value::Matrix3d(_) => ScalarKind::Matrix3d,
            Value::Matrix4d(_) => ScalarKind::Matrix4d,
            Value::TimeCode(_) => ScalarKind::TimeCode,
            Value::Array(_) => return None,
        };
        Some(kind)
    }

    /// Whether this is an array value.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Try to extract as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Try to extract as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(v) => Some(*v as i64),
            Value::UChar(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as f64. Integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Half(v) => Some(v.to_f64()),
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) | Value::TimeCode(v) => Some(*v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Try to extract as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Token(s) | Value::Asset(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract a 2-vector as f64.
    pub fn as_vec2d(&self) -> Option<[f64; 2]> {
        match self {
            Value::Float2(v) => Some([v[0] as f64, v[1] as f64]),
            Value::Double2(v) => Some(*v),
            Value::Int2(v) => Some([v[0] as f64, v[1] as f64]),
            _ => None,
        }
    }

    /// Try to extract a 3-vector as f64.
    pub fn as_vec3d(&self) -> Option<[f64; 3]> {
        match self {
            Value::Float3(v) => Some([v[0] as f64, v[1] as f64, v[2] as f64]),
            Value::Double3(v) => Some(*v),
            Value::Int3(v) => Some([v[0] as f64, v[1] as f64, v[2] as f64]),
            _ => None,
        }
    }

    /// Try to extract a quaternion as `[i, j, k, real]`.
    pub fn as_quatd(&self) -> Option<[f64; 4]> {
        match self {
            Value::Quatf(q) => Some([q[0] as f64, q[1] as f64, q[2] as f64, q[3] as f64]),
            Value::Quatd(q) => Some(*q),
            _ => None,
        }
    }

    /// Try to extract a 4x4 matrix (rows).
    pub fn as_matrix4d(&self) -> Option<[[f64; 4]; 4]> {
        match self {
            Value::Matrix4d(m) => Some(*m),
            _ => None,
        }
    }

    /// Try to extract as an array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Flatten a numeric scalar into its channels, in storage order.
    ///
    /// Returns `None` for strings and arrays.
    pub fn channels(&self) -> Option<SmallVec<[f64; 16]>> {
        let mut out = SmallVec::new();
        match self {
            Value::Float2(v) => out.extend(v.iter().map(|c| *c as f64)),
            Value::Float3(v) => out.extend(v.iter().map(|c| *c as f64)),
            Value::Float4(v) | Value::Quatf(v) => out.extend(v.iter().map(|c| *c as f64)),
            Value::Double2(v) => out.extend_from_slice(v),
            Value::Double3(v) => out.extend_from_slice(v),
            Value::Double4(v) | Value::Quatd(v) => out.extend_from_slice(v),
            Value::Int2(v) => out.extend(v.iter().map(|c| *c as f64)),
            Value::Int3(v) => out.extend(v.iter().map(|c| *c as f64)),
            Value::Int4(v) => out.extend(v.iter().map(|c| *c as f64)),
            Value::Matrix2d(m) => out.extend(m.iter().flatten().copied()),
            Value::Matrix3d(m) => out.extend(m.iter().flatten().copied()),
            Value::Matrix4d(m) => out.extend(m.iter().flatten().copied()),
            other => out.push(other.as_f64()?),
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_type() {
        assert_eq!(ValueType::parse("float3").unwrap(), ValueType::scalar(ScalarKind::Float3));
        assert_eq!(ValueType::parse("int[]").unwrap(), ValueType::array(ScalarKind::Int));
        assert_eq!(ValueType::parse("color3f[]").unwrap(), ValueType::array(ScalarKind::Float3));
        assert_eq!(ValueType::parse("texCoord2f[]").unwrap().kind, ScalarKind::Float2);
        assert!(ValueType::parse("widget").is_err());
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::array(ScalarKind::Double3).to_string(), "double3[]");
        assert_eq!(ValueType::scalar(ScalarKind::Matrix4d).to_string(), "matrix4d");
    }

    #[test]
    fn test_component_count() {
        assert_eq!(ScalarKind::Double.component_count(), 1);
        assert_eq!(ScalarKind::Float3.component_count(), 3);
        assert_eq!(ScalarKind::Matrix4d.component_count(), 16);
        assert!(!ScalarKind::Token.is_numeric());
        assert!(ScalarKind::Int.is_discrete());
    }

    #[test]
    fn test_extractors() {
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Half(f16::from_f32(0.5)).as_f64(), Some(0.5));
        assert_eq!(Value::Float3([1.0, 2.0, 3.0]).as_vec3d(), Some([1.0, 2.0, 3.0]));
        assert_eq!(Value::Token("st".into()).as_str(), Some("st"));
        assert_eq!(Value::String("x".into()).as_f64(), None);
    }

    #[test]
    fn test_channels() {
        let c = Value::Double3([1.0, 2.0, 3.0]).channels().unwrap();
        assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(Value::Bool(true).channels().unwrap().as_slice(), &[1.0]);
        assert!(Value::Token("a".into()).channels().is_none());
        assert!(Value::Array(vec![]).channels().is_none());
    }
}
