//! Animation curves.

/// What an animation curve's values measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimCurveType {
    /// Distances, in the plug's storage unit.
    Linear,
    /// Angles, in the plug's storage unit.
    Angular,
    /// Plain numbers.
    Unitless,
    /// Times.
    Time,
}

/// How a key's value carries to the next key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TangentType {
    #[default]
    Linear,
    /// Hold until the next key.
    Step,
    Clamped,
    Auto,
}

/// One key on a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
    pub tangent: TangentType,
}

impl Keyframe {
    pub fn new(time: f64, value: f64, tangent: TangentType) -> Self {
        Self { time, value, tangent }
    }

    pub fn linear(time: f64, value: f64) -> Self {
        Self::new(time, value, TangentType::Linear)
    }
}
