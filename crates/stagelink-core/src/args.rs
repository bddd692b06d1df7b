//! Import arguments.
//!
//! `ImportArgs` is the configuration a caller hands to an import job. It
//! serializes to JSON so option presets can be stored next to a scene.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A closed time interval in stage time codes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub min: f64,
    pub max: f64,
}

impl TimeInterval {
    /// The unbounded interval.
    pub const ALL: TimeInterval = TimeInterval {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Create an interval. No validation is done here; see [`is_valid`](Self::is_valid).
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A single-time interval.
    pub fn at(time: f64) -> Self {
        Self::new(time, time)
    }

    /// `min <= max` (NaN bounds are invalid).
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Both bounds are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Whether `time` lies within the interval.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.min && time <= self.max
    }

    /// Smallest interval covering both.
    pub fn union(&self, other: &TimeInterval) -> TimeInterval {
        TimeInterval::new(self.min.min(other.min), self.max.max(other.max))
    }
}

/// One shading import strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadingModeConfig {
    /// Importer name, e.g. `useRegistry` or `displayColor`.
    pub mode: String,
    /// Material conversion the importer should target, e.g. `UsdPreviewSurface`.
    pub material_conversion: String,
}

impl ShadingModeConfig {
    /// Create a shading mode entry.
    pub fn new(mode: impl Into<String>, material_conversion: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            material_conversion: material_conversion.into(),
        }
    }

    /// The registry-driven preview-surface importer.
    pub fn use_registry() -> Self {
        Self::new("useRegistry", "UsdPreviewSurface")
    }

    /// The display-colour importer.
    pub fn display_color() -> Self {
        Self::new("displayColor", "none")
    }
}

/// Options controlling one import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportArgs {
    /// Restrict samples to this interval. `None` reads every sample.
    pub time_interval: Option<TimeInterval>,
    /// Read time samples at all. When false only default values are read.
    pub read_animation: bool,
    /// Shading importers to try, in order. Empty disables material import.
    pub shading_modes: Vec<ShadingModeConfig>,
    /// Reference the live stage through a proxy node instead of baking keys.
    pub use_as_animation_cache: bool,
    /// Pick the Euler solution closest to the previous sample for rotations.
    pub apply_euler_filter: bool,
    /// Multiplier applied to sample times when keying.
    pub time_scale: f64,
    /// Copy `userProperties:` attributes onto host nodes.
    pub import_user_attributes: bool,
    /// Host name given to a mesh's primary UV set.
    pub primary_uv_set_name: String,
}

impl Default for ImportArgs {
    fn default() -> Self {
        Self {
            time_interval: None,
            read_animation: true,
            shading_modes: vec![
                ShadingModeConfig::use_registry(),
                ShadingModeConfig::display_color(),
            ],
            use_as_animation_cache: false,
            apply_euler_filter: false,
            time_scale: 1.0,
            import_user_attributes: true,
            primary_uv_set_name: "map1".to_string(),
        }
    }
}

impl ImportArgs {
    /// Create default import arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict reading to a time interval.
    pub fn with_time_interval(mut self, interval: TimeInterval) -> Self {
        self.time_interval = Some(interval);
        self
    }

    /// Read static values only.
    pub fn without_animation(mut self) -> Self {
        self.read_animation = false;
        self
    }

    /// Replace the shading mode list.
    pub fn with_shading_modes(mut self, modes: Vec<ShadingModeConfig>) -> Self {
        self.shading_modes = modes;
        self
    }

    /// Use the stage as an animation cache.
    pub fn with_animation_cache(mut self) -> Self {
        self.use_as_animation_cache = true;
        self
    }

    /// Enable the Euler continuity filter.
    pub fn with_euler_filter(mut self) -> Self {
        self.apply_euler_filter = true;
        self
    }

    /// Set the time scale multiplier.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale;
        self
    }

    /// Whether any shading importer is configured.
    pub fn imports_materials(&self) -> bool {
        !self.shading_modes.is_empty()
    }

    /// The interval samples are read from.
    pub fn sample_interval(&self) -> TimeInterval {
        self.time_interval.unwrap_or(TimeInterval::ALL)
    }

    /// Load arguments from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize arguments to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_validity() {
        assert!(TimeInterval::new(1.0, 5.0).is_valid());
        assert!(!TimeInterval::new(10.0, 5.0).is_valid());
        assert!(!TimeInterval::new(f64::NAN, 5.0).is_valid());
        assert!(TimeInterval::ALL.is_valid());
        assert!(!TimeInterval::ALL.is_finite());
    }

    #[test]
    fn test_interval_union() {
        let u = TimeInterval::new(1.0, 5.0).union(&TimeInterval::new(3.0, 9.0));
        assert_eq!(u, TimeInterval::new(1.0, 9.0));
        assert!(u.contains(9.0));
        assert!(!u.contains(0.5));
    }

    #[test]
    fn test_default_args() {
        let args = ImportArgs::default();
        assert!(args.read_animation);
        assert!(args.imports_materials());
        assert_eq!(args.sample_interval(), TimeInterval::ALL);
        assert_eq!(args.time_scale, 1.0);
    }

    #[test]
    fn test_builder() {
        let args = ImportArgs::new()
            .with_time_interval(TimeInterval::new(1.0, 24.0))
            .with_euler_filter()
            .with_shading_modes(vec![]);
        assert!(args.apply_euler_filter);
        assert!(!args.imports_materials());
        assert_eq!(args.sample_interval(), TimeInterval::new(1.0, 24.0));
    }

    #[test]
    fn test_json_partial() {
        let args = ImportArgs::from_json(r#"{ "apply_euler_filter": true, "time_scale": 2.0 }"#).unwrap();
        assert!(args.apply_euler_filter);
        assert_eq!(args.time_scale, 2.0);
        assert_eq!(args.primary_uv_set_name, "map1");
    }

    #[test]
    fn test_json_round_trip() {
        let args = ImportArgs::new().with_time_interval(TimeInterval::new(0.0, 10.0));
        let text = args.to_json().unwrap();
        assert_eq!(ImportArgs::from_json(&text).unwrap(), args);
    }
}
