//! Configuration structures for the provider translation engine.
//!
//! Configuration is deserialized from TOML and handed to the engine at
//! construction time. Nothing in here reads the environment on its own:
//! credential fallback chains go through the [`Env`] adapter so that
//! process-boundary lookups stay in one place.

mod credentials;
mod error;
mod provider;

use indexmap::IndexMap;
use serde::Deserialize;

pub use credentials::{Env, ProcessEnv, StaticEnv};
pub use error::ConfigError;
pub use provider::{ApiProviderConfig, OllamaProviderConfig, ProviderConfig, ProviderKind};

/// Root configuration for the translation engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Map of named provider configurations.
    ///
    /// The key is a caller-chosen name ("primary", "fallback", ...);
    /// the provider type lives inside the value.
    pub providers: IndexMap<String, ProviderConfig>,
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;

        log::debug!("Loaded configuration with {} providers", config.providers.len());

        Ok(config)
    }

    /// Whether any providers are configured.
    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Look up a provider configuration by name.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn empty_config_has_no_providers() {
        let config = Config::from_toml("").unwrap();
        assert!(!config.has_providers());
    }

    #[test]
    fn parses_multiple_providers() {
        let config = Config::from_toml(indoc! {r#"
            [providers.primary]
            type = "anthropic"
            api_key = "sk-ant-test"

            [providers.local]
            type = "ollama"
            base_url = "http://localhost:11434"
        "#})
        .unwrap();

        assert!(config.has_providers());
        assert_eq!(config.providers.len(), 2);
        assert!(matches!(config.provider("primary"), Some(ProviderConfig::Anthropic(_))));
        assert!(matches!(config.provider("local"), Some(ProviderConfig::Ollama(_))));
        assert!(config.provider("missing").is_none());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let result = Config::from_toml(indoc! {r#"
            [transport]
            retries = 3
        "#});

        assert!(result.is_err());
    }
}
