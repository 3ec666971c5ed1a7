//! Engine configuration: TOML file, then environment overrides, then validation.

mod loading;
mod types;
mod validation;


pub use types::{DriverConfig, EngineConfig, LaneOverride, PeriodicConfig};
