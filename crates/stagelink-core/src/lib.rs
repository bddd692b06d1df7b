//! stagelink-core: shared types for the stagelink scene import bridge.
//!
//! This crate holds the vocabulary every other stagelink crate speaks:
//!
//! - [`ScenePath`]: absolute hierarchical paths into a stage
//! - [`Value`] and [`ValueType`]: typed attribute values read from a stage
//! - [`units`]: distance, angle and time units with conversion
//! - [`ImportArgs`]: the import configuration, loadable from JSON

pub mod args;
pub mod error;
pub mod path;
pub mod units;
pub mod value;

pub use args::{ImportArgs, ShadingModeConfig, TimeInterval};
pub use error::{CoreError, Result};
pub use path::ScenePath;
pub use units::{AngleUnit, DistanceUnit, TimeUnit};
pub use value::{ScalarKind, Value, ValueType};
