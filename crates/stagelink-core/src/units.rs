//! Distance, angle and time units.
//!
//! Host attributes may store values in a different unit than the stage
//! authored them in, so every conversion names both ends explicitly.

use serde::{Deserialize, Serialize};

/// Linear distance units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceUnit {
    Inch,
    Foot,
    Yard,
    Mile,
    Millimeter,
    Centimeter,
    Kilometer,
    Meter,
}

impl DistanceUnit {
    /// Size of one unit in meters.
    pub fn meters(self) -> f64 {
        match self {
            DistanceUnit::Inch => 0.0254,
            DistanceUnit::Foot => 0.3048,
            DistanceUnit::Yard => 0.9144,
            DistanceUnit::Mile => 1609.344,
            DistanceUnit::Millimeter => 0.001,
            DistanceUnit::Centimeter => 0.01,
            DistanceUnit::Kilometer => 1000.0,
            DistanceUnit::Meter => 1.0,
        }
    }

    /// Convert `value` from `self` to `target`.
    pub fn convert(self, value: f64, target: DistanceUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.meters() / target.meters()
    }

    /// Recognise a stage's authored meters-per-unit as a standard unit.
    pub fn from_meters_per_unit(meters_per_unit: f64) -> Option<Self> {
        const ALL: [DistanceUnit; 8] = [
            DistanceUnit::Inch,
            DistanceUnit::Foot,
            DistanceUnit::Yard,
            DistanceUnit::Mile,
            DistanceUnit::Millimeter,
            DistanceUnit::Centimeter,
            DistanceUnit::Kilometer,
            DistanceUnit::Meter,
        ];
        ALL.into_iter()
            .find(|unit| ((unit.meters() - meters_per_unit) / unit.meters()).abs() < 1e-6)
    }
}

/// Angular units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AngleUnit {
    Radians,
    Degrees,
    AngularMinutes,
    AngularSeconds,
}

impl AngleUnit {
    /// Size of one unit in radians.
    pub fn radians(self) -> f64 {
        match self {
            AngleUnit::Radians => 1.0,
            AngleUnit::Degrees => std::f64::consts::PI / 180.0,
            AngleUnit::AngularMinutes => std::f64::consts::PI / (180.0 * 60.0),
            AngleUnit::AngularSeconds => std::f64::consts::PI / (180.0 * 3600.0),
        }
    }

    /// Convert `value` from `self` to `target`.
    pub fn convert(self, value: f64, target: AngleUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.radians() / target.radians()
    }
}

/// Time units. Frame-based units are expressed by their rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    /// 15 fps
    Game,
    /// 24 fps
    Film,
    /// 25 fps
    Pal,
    /// 30 fps
    Ntsc,
    /// Any other integral frame rate.
    Fps(u32),
}

impl TimeUnit {
    /// Size of one unit in seconds.
    pub fn seconds(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 0.001,
            TimeUnit::Game => 1.0 / 15.0,
            TimeUnit::Film => 1.0 / 24.0,
            TimeUnit::Pal => 1.0 / 25.0,
            TimeUnit::Ntsc => 1.0 / 30.0,
            TimeUnit::Fps(rate) => 1.0 / rate.max(1) as f64,
        }
    }

    /// Convert `value` from `self` to `target`.
    pub fn convert(self, value: f64, target: TimeUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.seconds() / target.seconds()
    }

    /// Pick the named unit for a frame rate, if there is one.
    pub fn from_fps(fps: f64) -> Self {
        match fps.round() as u32 {
            15 => TimeUnit::Game,
            24 => TimeUnit::Film,
            25 => TimeUnit::Pal,
            30 => TimeUnit::Ntsc,
            other => TimeUnit::Fps(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_conversion() {
        let cm = DistanceUnit::Meter.convert(1.5, DistanceUnit::Centimeter);
        assert!((cm - 150.0).abs() < 1e-9);
        let inches = DistanceUnit::Foot.convert(2.0, DistanceUnit::Inch);
        assert!((inches - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_meters_per_unit() {
        assert_eq!(DistanceUnit::from_meters_per_unit(0.01), Some(DistanceUnit::Centimeter));
        assert_eq!(DistanceUnit::from_meters_per_unit(1.0), Some(DistanceUnit::Meter));
        assert_eq!(DistanceUnit::from_meters_per_unit(0.3), None);
    }

    #[test]
    fn test_angle_conversion() {
        let rad = AngleUnit::Degrees.convert(180.0, AngleUnit::Radians);
        assert!((rad - std::f64::consts::PI).abs() < 1e-12);
        let minutes = AngleUnit::Degrees.convert(1.0, AngleUnit::AngularMinutes);
        assert!((minutes - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_conversion() {
        let frames = TimeUnit::Seconds.convert(2.0, TimeUnit::Film);
        assert!((frames - 48.0).abs() < 1e-9);
        assert_eq!(TimeUnit::from_fps(24.0), TimeUnit::Film);
        assert_eq!(TimeUnit::from_fps(48.0), TimeUnit::Fps(48));
    }
}
