//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `strata.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A `[layers]` entry names a layer that does not exist or cannot
    /// take the requested mode.
    #[error("invalid layer override: {0}")]
    InvalidLayer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("project.name".to_string());
        assert_eq!(err.to_string(), "missing required field: project.name");
    }

    #[test]
    fn display_invalid_layer() {
        let err = ConfigError::InvalidLayer("`errors` cannot be lazy".to_string());
        assert!(err.to_string().contains("errors"));
    }
}
