//! Configuration types deserialized from `strata.toml`.

use serde::Deserialize;

/// The top-level project configuration.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Per-layer refresh overrides.
    #[serde(default)]
    pub layers: LayersConfig,
}

/// Core project metadata required in every `strata.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default)]
    pub version: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Settings of the analysis engine itself.
#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Directory of module sources, relative to the project root.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    /// Worker threads for bulk recomputation; zero means one per core.
    #[serde(default)]
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            workers: 0,
        }
    }
}

fn default_source_dir() -> String {
    "src".to_string()
}

/// Per-layer refresh overrides.
///
/// Layers not listed keep their defaults (`exports` eager, `types` lazy).
/// The `errors` layer is always eager and may not be overridden.
#[derive(Debug, Default, Deserialize)]
pub struct LayersConfig {
    /// Layers to run lazily (evict and recompute on demand).
    #[serde(default)]
    pub lazy: Vec<String>,
    /// Layers to run eagerly (recompute during updates).
    #[serde(default)]
    pub eager: Vec<String>,
}

/// The resolved refresh override for one layer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LayerRefresh {
    /// Evict and recompute on demand.
    Lazy,
    /// Recompute during updates.
    Eager,
}

impl LayersConfig {
    /// The override for `layer`, if the configuration names it.
    pub fn refresh_of(&self, layer: &str) -> Option<LayerRefresh> {
        if self.lazy.iter().any(|l| l == layer) {
            Some(LayerRefresh::Lazy)
        } else if self.eager.iter().any(|l| l == layer) {
            Some(LayerRefresh::Eager)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.source_dir, "src");
        assert_eq!(config.workers, 0);
    }

    #[test]
    fn refresh_of_prefers_lazy_list() {
        let layers = LayersConfig {
            lazy: vec!["types".to_string()],
            eager: vec!["exports".to_string()],
        };
        assert_eq!(layers.refresh_of("types"), Some(LayerRefresh::Lazy));
        assert_eq!(layers.refresh_of("exports"), Some(LayerRefresh::Eager));
        assert_eq!(layers.refresh_of("errors"), None);
    }
}
