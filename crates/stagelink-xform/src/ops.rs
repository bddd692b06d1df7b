//! Named xform operations.
//!
//! An op name has the form `xformOp:<type>[:<suffix>]`, optionally prefixed
//! with `!invert!` when the op contributes its inverse (pivot pairs). An op
//! order is the ordered list of such names; the reserved entry
//! `!resetXformStack!` discards everything before it and stops the node
//! from inheriting its parent's transform.

use crate::error::{Result, XformError};
use crate::rotation::{euler_to_matrix, RotationOrder};
use glam::{DMat4, DQuat, DVec3};
use std::fmt;

/// Op order entry that resets the inherited transform stack.
pub const RESET_XFORM_STACK: &str = "!resetXformStack!";

const OP_PREFIX: &str = "xformOp:";
const INVERT_PREFIX: &str = "!invert!";

/// Kind of transform an op applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XformOpType {
    Translate,
    Scale,
    RotateX,
    RotateY,
    RotateZ,
    RotateXYZ,
    RotateXZY,
    RotateYXZ,
    RotateYZX,
    RotateZXY,
    RotateZYX,
    Orient,
    Transform,
}

impl XformOpType {
    /// The type token used in op names.
    pub fn token(self) -> &'static str {
        match self {
            XformOpType::Translate => "translate",
            XformOpType::Scale => "scale",
            XformOpType::RotateX => "rotateX",
            XformOpType::RotateY => "rotateY",
            XformOpType::RotateZ => "rotateZ",
            XformOpType::RotateXYZ => "rotateXYZ",
            XformOpType::RotateXZY => "rotateXZY",
            XformOpType::RotateYXZ => "rotateYXZ",
            XformOpType::RotateYZX => "rotateYZX",
            XformOpType::RotateZXY => "rotateZXY",
            XformOpType::RotateZYX => "rotateZYX",
            XformOpType::Orient => "orient",
            XformOpType::Transform => "transform",
        }
    }

    /// Parse a type token.
    pub fn from_token(token: &str) -> Option<Self> {
        let op_type = match token {
            "translate" => XformOpType::Translate,
            "scale" => XformOpType::Scale,
            "rotateX" => XformOpType::RotateX,
            "rotateY" => XformOpType::RotateY,
            "rotateZ" => XformOpType::RotateZ,
            "orient" => XformOpType::Orient,
            "transform" => XformOpType::Transform,
            other => {
                let order = RotationOrder::from_suffix(other.strip_prefix("rotate")?)?;
                return Some(Self::three_axis(order));
            }
        };
        Some(op_type)
    }

    /// The three-axis rotate type for an order.
    pub fn three_axis(order: RotationOrder) -> Self {
        match order {
            RotationOrder::Xyz => XformOpType::RotateXYZ,
            RotationOrder::Xzy => XformOpType::RotateXZY,
            RotationOrder::Yxz => XformOpType::RotateYXZ,
            RotationOrder::Yzx => XformOpType::RotateYZX,
            RotationOrder::Zxy => XformOpType::RotateZXY,
            RotationOrder::Zyx => XformOpType::RotateZYX,
        }
    }

    /// Rotation order of a three-axis rotate.
    pub fn rotation_order(self) -> Option<RotationOrder> {
        match self {
            XformOpType::RotateXYZ => Some(RotationOrder::Xyz),
            XformOpType::RotateXZY => Some(RotationOrder::Xzy),
            XformOpType::RotateYXZ => Some(RotationOrder::Yxz),
            XformOpType::RotateYZX => Some(RotationOrder::Yzx),
            XformOpType::RotateZXY => Some(RotationOrder::Zxy),
            XformOpType::RotateZYX => Some(RotationOrder::Zyx),
            _ => None,
        }
    }

    /// Axis index of a single-axis rotate.
    pub fn single_axis(self) -> Option<usize> {
        match self {
            XformOpType::RotateX => Some(0),
            XformOpType::RotateY => Some(1),
            XformOpType::RotateZ => Some(2),
            _ => None,
        }
    }

    /// Whether this is any Euler rotate.
    pub fn is_rotate(self) -> bool {
        self.rotation_order().is_some() || self.single_axis().is_some()
    }
}

/// Storage precision of an op's attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    Half,
    Float,
    #[default]
    Double,
}

/// Value an op is evaluated with. Angles are degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpValue {
    Scalar(f64),
    Vec3(DVec3),
    Quat(DQuat),
    Matrix(DMat4),
}

/// One named transform operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XformOp {
    pub op_type: XformOpType,
    pub suffix: Option<String>,
    pub inverse: bool,
    pub precision: Precision,
}

impl XformOp {
    /// Create an op with no suffix.
    pub fn new(op_type: XformOpType) -> Self {
        Self {
            op_type,
            suffix: None,
            inverse: false,
            precision: Precision::Double,
        }
    }

    /// Set the suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Mark as the inverse twin.
    pub fn inverted(mut self) -> Self {
        self.inverse = true;
        self
    }

    /// Set the precision.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Parse an op order entry such as `!invert!xformOp:translate:pivot`.
    pub fn parse(name: &str) -> Result<Self> {
        let (inverse, rest) = match name.strip_prefix(INVERT_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        let body = rest
            .strip_prefix(OP_PREFIX)
            .ok_or_else(|| XformError::InvalidOpName(name.to_string()))?;
        let (token, suffix) = match body.split_once(':') {
            Some((token, suffix)) if !suffix.is_empty() => (token, Some(suffix.to_string())),
            Some(_) => return Err(XformError::InvalidOpName(name.to_string())),
            None => (body, None),
        };
        let op_type = XformOpType::from_token(token).ok_or_else(|| XformError::InvalidOpName(name.to_string()))?;
        Ok(Self {
            op_type,
            suffix,
            inverse,
            precision: Precision::Double,
        })
    }

    /// Name of the attribute holding this op's value.
    pub fn attribute_name(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}{}:{}", OP_PREFIX, self.op_type.token(), suffix),
            None => format!("{}{}", OP_PREFIX, self.op_type.token()),
        }
    }

    /// The op order entry for this op.
    pub fn op_name(&self) -> String {
        if self.inverse {
            format!("{}{}", INVERT_PREFIX, self.attribute_name())
        } else {
            self.attribute_name()
        }
    }

    /// The matrix this op contributes, inverted for inverse ops.
    pub fn matrix(&self, value: &OpValue) -> Result<DMat4> {
        let mismatch = |expected| XformError::ValueMismatch {
            op: self.op_name(),
            expected,
        };
        let m = match (self.op_type, value) {
            (XformOpType::Translate, OpValue::Vec3(v)) => DMat4::from_translation(*v),
            (XformOpType::Scale, OpValue::Vec3(v)) => DMat4::from_scale(*v),
            (XformOpType::Translate | XformOpType::Scale, _) => return Err(mismatch("vec3")),
            (XformOpType::Orient, OpValue::Quat(q)) => DMat4::from_quat(q.normalize()),
            (XformOpType::Orient, _) => return Err(mismatch("quat")),
            (XformOpType::Transform, OpValue::Matrix(m)) => *m,
            (XformOpType::Transform, _) => return Err(mismatch("matrix")),
            (op_type, value) => {
                if let Some(axis) = op_type.single_axis() {
                    let OpValue::Scalar(degrees) = value else {
                        return Err(mismatch("scalar"));
                    };
                    let mut euler = DVec3::ZERO;
                    euler[axis] = *degrees;
                    DMat4::from_mat3(euler_to_matrix(euler, RotationOrder::Xyz))
                } else {
                    let (Some(order), OpValue::Vec3(euler)) = (op_type.rotation_order(), value) else {
                        return Err(mismatch("vec3"));
                    };
                    DMat4::from_mat3(euler_to_matrix(*euler, order))
                }
            }
        };

        if !self.inverse {
            return Ok(m);
        }
        if m.determinant().abs() < 1e-12 {
            return Err(XformError::NonInvertible(self.op_name()));
        }
        Ok(m.inverse())
    }
}

impl fmt::Display for XformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.op_name())
    }
}

/// A parsed op order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpOrder {
    /// Ops after the last reset, in order.
    pub ops: Vec<XformOp>,
    /// Whether the order contained `!resetXformStack!`.
    pub resets_xform_stack: bool,
}

/// Parse an op order token list.
pub fn parse_op_order<S: AsRef<str>>(names: &[S]) -> Result<OpOrder> {
    let mut order = OpOrder::default();
    for name in names {
        let name = name.as_ref();
        if name == RESET_XFORM_STACK {
            order.ops.clear();
            order.resets_xform_stack = true;
            continue;
        }
        order.ops.push(XformOp::parse(name)?);
    }
    Ok(order)
}

/// Product of every op's matrix, first op outermost.
pub fn compose_ops(ops: &[(XformOp, OpValue)]) -> Result<DMat4> {
    ops.iter()
        .try_fold(DMat4::IDENTITY, |acc, (op, value)| Ok(acc * op.matrix(value)?))
}
