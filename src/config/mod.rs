//! Configuration module
//!
//! Built-in defaults, optionally overlaid by a TOML file, then by command
//! line flags and environment variables (see [`crate::args`]).

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{load_config, load_config_or_default};
pub use types::{
    CollectorSettings, Config, GraphiteSettings, MetricsSettings, PoolSettings, StatsSettings,
};
