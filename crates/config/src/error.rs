use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into the config model.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
