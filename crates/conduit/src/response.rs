//! Canonical response objects handed back to the orchestrator.
//!
//! Normalizers construct these from raw provider JSON. Raw payloads are
//! owned by the response and exposed as borrows only, so nothing outside
//! can alias or mutate them after construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::canonical::Message;
use crate::provider::Provider;
use crate::request::GenerateRequest;

/// Normalized token-usage statistics.
///
/// Providers name these fields differently (OpenAI `prompt_tokens` /
/// `completion_tokens`, Anthropic `input_tokens` / `output_tokens`,
/// Ollama `prompt_eval_count` / `eval_count`); this is the one shape the
/// orchestrator sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub input_tokens: u32,

    /// Tokens generated.
    pub output_tokens: u32,

    /// Prompt plus generated tokens.
    pub total_tokens: u32,

    /// Tokens served from the provider's prompt cache, where reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u32>,
}

impl Usage {
    fn from_parts(input: Option<u64>, output: Option<u64>, total: Option<u64>, cached: Option<u64>) -> Self {
        let input_tokens = input.unwrap_or(0) as u32;
        let output_tokens = output.unwrap_or(0) as u32;

        Self {
            input_tokens,
            output_tokens,
            total_tokens: total.map(|t| t as u32).unwrap_or(input_tokens + output_tokens),
            cached_tokens: cached.map(|c| c as u32),
        }
    }

    /// OpenAI Chat Completions shape: `prompt_tokens` / `completion_tokens`
    /// with cached counts under `prompt_tokens_details`.
    pub(crate) fn from_openai(usage: &Value) -> Self {
        Self::from_parts(
            usage.get("prompt_tokens").and_then(Value::as_u64),
            usage.get("completion_tokens").and_then(Value::as_u64),
            usage.get("total_tokens").and_then(Value::as_u64),
            usage
                .get("prompt_tokens_details")
                .and_then(|d| d.get("cached_tokens"))
                .and_then(Value::as_u64),
        )
    }

    /// OpenAI Responses shape: `input_tokens` / `output_tokens` with cached
    /// counts under `input_tokens_details`.
    pub(crate) fn from_openai_responses(usage: &Value) -> Self {
        Self::from_parts(
            usage.get("input_tokens").and_then(Value::as_u64),
            usage.get("output_tokens").and_then(Value::as_u64),
            usage.get("total_tokens").and_then(Value::as_u64),
            usage
                .get("input_tokens_details")
                .and_then(|d| d.get("cached_tokens"))
                .and_then(Value::as_u64),
        )
    }

    /// Anthropic shape: `input_tokens` / `output_tokens`, no total, cached
    /// counts as `cache_read_input_tokens`.
    pub(crate) fn from_anthropic(usage: &Value) -> Self {
        Self::from_parts(
            usage.get("input_tokens").and_then(Value::as_u64),
            usage.get("output_tokens").and_then(Value::as_u64),
            None,
            usage.get("cache_read_input_tokens").and_then(Value::as_u64),
        )
    }

    /// Ollama reports counts at the response's top level, not under a
    /// `usage` object.
    pub(crate) fn from_ollama(raw: &Value) -> Option<Self> {
        let input = raw.get("prompt_eval_count").and_then(Value::as_u64);
        let output = raw.get("eval_count").and_then(Value::as_u64);

        if input.is_none() && output.is_none() {
            return None;
        }

        Some(Self::from_parts(input, output, None, None))
    }
}

/// Why the provider stopped generating, normalized across providers.
///
/// Unknown wire values are preserved rather than dropped, so protocol
/// drift stays visible to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of turn.
    Stop,
    /// Token limit reached; the response may be truncated.
    Length,
    /// Blocked by the provider's content filter.
    ContentFilter,
    /// The model requested one or more tool calls.
    ToolCalls,
    /// The model declined to answer.
    Refusal,
    /// Any reason not yet known.
    #[serde(untagged)]
    Other(String),
}

impl FinishReason {
    /// Map a provider's wire value onto the canonical reason.
    pub(crate) fn from_wire(value: &str) -> Self {
        match value {
            "stop" | "end_turn" | "stop_sequence" | "completed" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            "content_filter" => Self::ContentFilter,
            "tool_calls" | "tool_use" => Self::ToolCalls,
            "refusal" => Self::Refusal,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A normalized generation response.
#[derive(Debug, Clone)]
pub struct PromptResponse {
    pub(crate) context: GenerateRequest,
    pub(crate) messages: Vec<Message>,
    pub(crate) finish_reason: Option<FinishReason>,
    pub(crate) provider: Provider,
    pub(crate) raw_request: Value,
    pub(crate) raw_response: Value,
    pub(crate) success: bool,
}

impl PromptResponse {
    /// The canonical request this response answers.
    pub fn context(&self) -> &GenerateRequest {
        &self.context
    }

    /// The instructions that were in effect for the generation.
    pub fn instructions(&self) -> Option<&str> {
        self.context.instructions.as_deref()
    }

    /// Canonical messages reconstructed from the response, in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The final message, usually the one callers want.
    pub fn message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Why generation stopped, when the provider said.
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.finish_reason.as_ref()
    }

    /// The provider that produced this response.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// The wire request as it was serialized for the provider.
    pub fn raw_request(&self) -> &Value {
        &self.raw_request
    }

    /// The provider's response exactly as received.
    pub fn raw_response(&self) -> &Value {
        &self.raw_response
    }

    /// Whether normalization produced a complete canonical response.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Token usage, derived from the raw response on demand.
    ///
    /// Absence of a usage block is not an error; it yields `None`.
    pub fn usage(&self) -> Option<Usage> {
        normalize_usage(self.provider, &self.raw_response)
    }
}

/// A normalized embedding response.
#[derive(Debug, Clone)]
pub struct EmbedResponse {
    pub(crate) model: String,
    pub(crate) vectors: Vec<Vec<f32>>,
    pub(crate) provider: Provider,
    pub(crate) raw_request: Value,
    pub(crate) raw_response: Value,
    pub(crate) success: bool,
}

impl EmbedResponse {
    /// The model that produced the vectors.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// One vector per input, in input order.
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// The wire request as it was serialized for the provider.
    pub fn raw_request(&self) -> &Value {
        &self.raw_request
    }

    /// The provider's response exactly as received.
    pub fn raw_response(&self) -> &Value {
        &self.raw_response
    }

    /// Whether normalization produced a complete canonical response.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Token usage, derived from the raw response on demand.
    pub fn usage(&self) -> Option<Usage> {
        normalize_usage(self.provider, &self.raw_response)
    }
}

/// Locate and normalize a usage payload for the given provider.
pub(crate) fn normalize_usage(provider: Provider, raw_response: &Value) -> Option<Usage> {
    match provider {
        Provider::Ollama => Usage::from_ollama(raw_response),
        Provider::Openai | Provider::Openrouter => raw_response.get("usage").map(Usage::from_openai),
        Provider::OpenaiResponses => raw_response.get("usage").map(Usage::from_openai_responses),
        Provider::Anthropic | Provider::Mock => raw_response.get("usage").map(Usage::from_anthropic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn openai_and_anthropic_usage_shapes_normalize_identically() {
        let openai = json!({"usage": {"prompt_tokens": 10, "completion_tokens": 5}});
        let anthropic = json!({"usage": {"input_tokens": 10, "output_tokens": 5}});

        let expected = Usage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
            cached_tokens: None,
        };

        assert_eq!(normalize_usage(Provider::Openai, &openai), Some(expected));
        assert_eq!(normalize_usage(Provider::Anthropic, &anthropic), Some(expected));
    }

    #[test]
    fn missing_usage_is_none_not_an_error() {
        assert_eq!(normalize_usage(Provider::Openai, &json!({"id": "x"})), None);
        assert_eq!(normalize_usage(Provider::Anthropic, &json!({})), None);
        assert_eq!(normalize_usage(Provider::Ollama, &json!({"done": true})), None);
    }

    #[test]
    fn cached_tokens_are_picked_up_where_reported() {
        let openai = json!({"usage": {
            "prompt_tokens": 100,
            "completion_tokens": 10,
            "total_tokens": 110,
            "prompt_tokens_details": {"cached_tokens": 80},
        }});

        let usage = normalize_usage(Provider::Openai, &openai).unwrap();
        assert_eq!(usage.cached_tokens, Some(80));

        let anthropic = json!({"usage": {
            "input_tokens": 100,
            "output_tokens": 10,
            "cache_read_input_tokens": 80,
        }});

        let usage = normalize_usage(Provider::Anthropic, &anthropic).unwrap();
        assert_eq!(usage.cached_tokens, Some(80));
        assert_eq!(usage.total_tokens, 110);
    }

    #[test]
    fn ollama_counts_live_at_the_top_level() {
        let raw = json!({"prompt_eval_count": 26, "eval_count": 298, "done": true});

        let usage = normalize_usage(Provider::Ollama, &raw).unwrap();
        assert_eq!(usage.input_tokens, 26);
        assert_eq!(usage.output_tokens, 298);
        assert_eq!(usage.total_tokens, 324);
    }

    #[test]
    fn finish_reason_wire_mapping() {
        assert_eq!(FinishReason::from_wire("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire("end_turn"), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire("max_tokens"), FinishReason::Length);
        assert_eq!(FinishReason::from_wire("tool_use"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from_wire("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(
            FinishReason::from_wire("pause_turn"),
            FinishReason::Other("pause_turn".to_string())
        );
    }
}
