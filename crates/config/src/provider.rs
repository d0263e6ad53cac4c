//! Per-provider configuration structures.

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::credentials::Env;

/// Configuration for one provider, discriminated by the `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// OpenAI Chat Completions API.
    Openai(ApiProviderConfig),
    /// OpenAI Responses API.
    OpenaiResponses(ApiProviderConfig),
    /// Anthropic Messages API.
    Anthropic(ApiProviderConfig),
    /// Local Ollama instance.
    Ollama(OllamaProviderConfig),
    /// OpenRouter aggregation API.
    Openrouter(ApiProviderConfig),
    /// Deterministic mock provider for tests.
    Mock,
}

impl ProviderConfig {
    /// The provider kind this configuration describes.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Openai(_) => ProviderKind::Openai,
            Self::OpenaiResponses(_) => ProviderKind::OpenaiResponses,
            Self::Anthropic(_) => ProviderKind::Anthropic,
            Self::Ollama(_) => ProviderKind::Ollama,
            Self::Openrouter(_) => ProviderKind::Openrouter,
            Self::Mock => ProviderKind::Mock,
        }
    }

    /// Resolve the API credential for this provider.
    ///
    /// Precedence: explicit `api_key` setting, then `access_token` setting,
    /// then `<PREFIX>_API_KEY` and `<PREFIX>_ACCESS_TOKEN` from the supplied
    /// environment. A missing credential is not an error here; only the
    /// transport that needs it may complain.
    pub fn resolve_api_key(&self, env: &dyn Env) -> Option<SecretString> {
        let api = match self {
            Self::Openai(c) | Self::OpenaiResponses(c) | Self::Anthropic(c) | Self::Openrouter(c) => c,
            Self::Ollama(c) => {
                return c
                    .api_key
                    .clone()
                    .or_else(|| env.var("OLLAMA_API_KEY").map(SecretString::from));
            }
            Self::Mock => return None,
        };

        let prefix = self.kind().env_prefix();

        api.api_key
            .clone()
            .or_else(|| api.access_token.clone())
            .or_else(|| env.var(&format!("{prefix}_API_KEY")).map(SecretString::from))
            .or_else(|| env.var(&format!("{prefix}_ACCESS_TOKEN")).map(SecretString::from))
    }
}

/// Provider kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Openai,
    OpenaiResponses,
    Anthropic,
    Ollama,
    Openrouter,
    Mock,
}

impl ProviderKind {
    /// Environment variable prefix for credential fallback.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Self::Openai | Self::OpenaiResponses => "OPENAI",
            Self::Anthropic => "ANTHROPIC",
            Self::Ollama => "OLLAMA",
            Self::Openrouter => "OPENROUTER",
            Self::Mock => "MOCK",
        }
    }
}

/// Configuration shared by API-key authenticated providers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiProviderConfig {
    /// API key for authentication.
    pub api_key: Option<SecretString>,

    /// Access token, consulted when no API key is set.
    pub access_token: Option<SecretString>,

    /// Custom base URL for the provider API.
    pub base_url: Option<String>,

    /// Default model identifier when a request does not name one.
    pub default_model: Option<String>,
}

/// Configuration for a local Ollama instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OllamaProviderConfig {
    /// Base URL of the Ollama server. Defaults to the local daemon.
    pub base_url: Option<String>,

    /// Optional API key for remote Ollama deployments.
    pub api_key: Option<SecretString>,

    /// Default model identifier when a request does not name one.
    pub default_model: Option<String>,

    /// How long the model stays loaded after a request.
    #[serde(deserialize_with = "duration_str::deserialize_option_duration")]
    pub keep_alive: Option<Duration>,
}
