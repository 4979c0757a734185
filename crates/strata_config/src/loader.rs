//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::ProjectConfig;

/// Layers whose refresh mode may be overridden.
const OVERRIDABLE_LAYERS: &[&str] = &["exports", "types"];

/// Loads and validates a `strata.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join("strata.toml"))?;
    load_config_from_str(&content)
}

/// Parses and validates a `strata.toml` from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    for layer in config.layers.lazy.iter().chain(&config.layers.eager) {
        if !OVERRIDABLE_LAYERS.contains(&layer.as_str()) {
            return Err(ConfigError::InvalidLayer(format!(
                "unknown or fixed layer `{layer}`"
            )));
        }
    }
    for layer in &config.layers.lazy {
        if config.layers.eager.contains(layer) {
            return Err(ConfigError::InvalidLayer(format!(
                "`{layer}` is listed as both lazy and eager"
            )));
        }
    }
    Ok(())
}
