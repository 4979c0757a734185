//! Parsing and validation of `strata.toml` project configuration files.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::{AnalysisConfig, LayerRefresh, LayersConfig, ProjectConfig, ProjectMeta};
