//! Provider request builders and response normalizers.
//!
//! Each submodule owns one provider: `input` converts the canonical
//! request into the provider's wire format and declares its validation
//! rules, `output` normalizes the provider's raw response back into
//! canonical messages. Builders are stateless transformers — construct,
//! validate, serialize — and no instance is reused across requests.

pub(crate) mod anthropic;
pub(crate) mod mock;
pub(crate) mod ollama;
pub(crate) mod openai;
pub(crate) mod openai_responses;
pub(crate) mod openrouter;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CastError, Result};
use crate::request::{EmbedRequest, GenerateRequest};
use crate::response::{EmbedResponse, PromptResponse};
use crate::validation::ValidationError;

/// The supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// OpenAI Chat Completions.
    Openai,
    /// OpenAI Responses.
    OpenaiResponses,
    /// Anthropic Messages.
    Anthropic,
    /// Ollama.
    Ollama,
    /// OpenRouter.
    Openrouter,
    /// Deterministic mock for tests.
    Mock,
}

impl Provider {
    /// The provider a configuration entry selects.
    pub fn from_config(config: &config::ProviderConfig) -> Self {
        match config.kind() {
            config::ProviderKind::Openai => Self::Openai,
            config::ProviderKind::OpenaiResponses => Self::OpenaiResponses,
            config::ProviderKind::Anthropic => Self::Anthropic,
            config::ProviderKind::Ollama => Self::Ollama,
            config::ProviderKind::Openrouter => Self::Openrouter,
            config::ProviderKind::Mock => Self::Mock,
        }
    }

    /// Stable provider name, used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::OpenaiResponses => "openai_responses",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::Openrouter => "openrouter",
            Self::Mock => "mock",
        }
    }

    /// Build the wire request for a canonical generation request.
    ///
    /// Cast failures are fatal; validation failures are collected on the
    /// returned [`BuiltRequest`] for the caller to inspect before sending.
    pub fn build(self, request: &GenerateRequest) -> Result<BuiltRequest> {
        log::debug!("building {} request for model '{}'", self.name(), request.model);

        let built = match self {
            Self::Openai => {
                let wire = openai::input::chat_request(request)?;
                BuiltRequest::from_wire(self, &wire)?
            }
            Self::OpenaiResponses => {
                let wire = openai_responses::input::responses_request(request)?;
                BuiltRequest::from_wire(self, &wire)?
            }
            Self::Anthropic => {
                let wire = anthropic::input::messages_request(request)?;
                BuiltRequest::from_wire(self, &wire)?
            }
            Self::Ollama => {
                let wire = ollama::input::chat_request(request)?;
                BuiltRequest::from_wire(self, &wire)?
            }
            Self::Openrouter => {
                let wire = openrouter::input::chat_request(request)?;
                BuiltRequest::from_wire(self, &wire)?
            }
            Self::Mock => mock::build(request)?,
        };

        if !built.validation.is_empty() {
            log::debug!(
                "{} request has {} validation errors",
                self.name(),
                built.validation.len()
            );
        }

        Ok(built)
    }

    /// Build the wire request for a canonical embedding request.
    pub fn build_embed(self, request: &EmbedRequest) -> Result<BuiltRequest> {
        match self {
            Self::Openai => {
                let wire = openai::input::embed_request(request);
                BuiltRequest::from_wire(self, &wire)
            }
            Self::Ollama => {
                let wire = ollama::input::embed_request(request);
                BuiltRequest::from_wire(self, &wire)
            }
            Self::Mock => mock::build_embed(request),
            other => Err(CastError::Unsupported {
                provider: other.name(),
                what: "embeddings",
            }
            .into()),
        }
    }

    /// Normalize a raw generation response into the canonical shape.
    ///
    /// `raw_response` and `raw_request` are taken by value and owned by the
    /// returned response; nothing outside can alias them afterwards.
    pub fn normalize_prompt(
        self,
        raw_response: Value,
        context: GenerateRequest,
        raw_request: Value,
    ) -> Result<PromptResponse> {
        log::debug!("normalizing {} response", self.name());

        let response = match self {
            Self::Openai | Self::Openrouter => openai::output::normalize(self, raw_response, context, raw_request)?,
            Self::OpenaiResponses => openai_responses::output::normalize(self, raw_response, context, raw_request)?,
            Self::Anthropic => anthropic::output::normalize(self, raw_response, context, raw_request)?,
            Self::Ollama => ollama::output::normalize(self, raw_response, context, raw_request)?,
            Self::Mock => mock::normalize(raw_response, context, raw_request),
        };

        Ok(response)
    }

    /// Normalize a raw embedding response into the canonical shape.
    pub fn normalize_embed(
        self,
        raw_response: Value,
        context: EmbedRequest,
        raw_request: Value,
    ) -> Result<EmbedResponse> {
        let response = match self {
            Self::Openai => openai::output::normalize_embed(self, raw_response, context, raw_request)?,
            Self::Ollama => ollama::output::normalize_embed(self, raw_response, context, raw_request)?,
            Self::Mock => mock::normalize_embed(raw_response, context, raw_request),
            other => {
                return Err(CastError::Unsupported {
                    provider: other.name(),
                    what: "embeddings",
                }
                .into());
            }
        };

        Ok(response)
    }
}

/// A serialized wire request plus its collected validation errors.
///
/// Serialization never auto-corrects: an invalid request still serializes,
/// and the caller decides whether a non-empty [`BuiltRequest::validation`]
/// list blocks sending.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    provider: Provider,
    body: Value,
    validation: Vec<ValidationError>,
}

impl BuiltRequest {
    fn from_wire<T>(provider: Provider, wire: &T) -> Result<Self>
    where
        T: Serialize + crate::validation::Validate,
    {
        Ok(Self {
            provider,
            body: serde_json::to_value(wire)?,
            validation: wire.validate(),
        })
    }

    pub(crate) fn new(provider: Provider, body: Value, validation: Vec<ValidationError>) -> Self {
        Self {
            provider,
            body,
            validation,
        }
    }

    /// The provider this request targets.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// The provider-exact JSON body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Take ownership of the body, typically to store it as a response's
    /// `raw_request`.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Validation errors collected during the build.
    pub fn validation(&self) -> &[ValidationError] {
        &self.validation
    }

    /// Whether the request passed every validation rule.
    pub fn is_send_ready(&self) -> bool {
        self.validation.is_empty()
    }
}

/// Rendered description of a tool-use block, used when a response is split
/// into one canonical message per block.
pub(crate) fn render_tool_use(name: &str, id: &str, input: &Value) -> String {
    let input_json = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());

    if id.is_empty() {
        format!("[Tool Use: {name}]\nInput: {input_json}")
    } else {
        format!("[Tool Use: {name}]\nID: {id}\nInput: {input_json}")
    }
}

/// Rendered description of a tool-result block.
pub(crate) fn render_tool_result(tool_use_id: &str, content: &Value) -> String {
    let output_json = serde_json::to_string(content).unwrap_or_else(|_| "{}".to_string());

    format!("[Tool Result: {tool_use_id}]\nOutput: {output_json}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_kind() {
        let config: config::ProviderConfig = toml::from_str("type = \"anthropic\"").unwrap();
        assert_eq!(Provider::from_config(&config), Provider::Anthropic);

        let config: config::ProviderConfig = toml::from_str("type = \"mock\"").unwrap();
        assert_eq!(Provider::from_config(&config), Provider::Mock);
    }

    #[test]
    fn embeddings_are_rejected_where_unsupported() {
        let request = crate::request::EmbedRequest {
            model: "embedder".to_string(),
            input: crate::request::EmbedInput::Single("hi".to_string()),
            dimensions: None,
            params: serde_json::Map::new(),
        };

        let err = Provider::Anthropic.build_embed(&request).unwrap_err();
        assert!(err.to_string().contains("does not support embeddings"));
    }

    #[test]
    fn rendered_tool_use_format() {
        let rendered = render_tool_use("get_weather", "toolu_1", &serde_json::json!({"city": "Paris"}));
        assert_eq!(rendered, "[Tool Use: get_weather]\nID: toolu_1\nInput: {\"city\":\"Paris\"}");
    }
}
