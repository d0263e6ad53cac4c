//! Deterministic mock provider.
//!
//! The wire request mirrors the canonical request, and normalization
//! fabricates an assistant echo of the last user message with fixed usage
//! numbers. Tests use it as the reference round-trip provider; nothing
//! here depends on input ordering, clocks or randomness.

use serde_json::{Value, json};

use crate::error::Result;
use crate::messages::canonical::{Message, Role};
use crate::provider::{BuiltRequest, Provider};
use crate::request::{EmbedRequest, GenerateRequest};
use crate::response::{EmbedResponse, FinishReason, PromptResponse};
use crate::validation::ValidationError;

const ECHO_INPUT_TOKENS: u32 = 10;
const ECHO_OUTPUT_TOKENS: u32 = 5;
const EMBED_DIMENSIONS: usize = 8;

pub(crate) fn build(request: &GenerateRequest) -> Result<BuiltRequest> {
    let body = serde_json::to_value(request)?;

    let mut validation = Vec::new();
    if request.messages.is_empty() {
        validation.push(ValidationError::new("messages", "must not be empty"));
    }

    Ok(BuiltRequest::new(Provider::Mock, body, validation))
}

/// Produce the echo response. A non-empty `raw_response` object passes
/// through as-is; an empty one is fabricated from the context so tests can
/// run without any transport at all.
pub(crate) fn normalize(raw_response: Value, context: GenerateRequest, raw_request: Value) -> PromptResponse {
    let has_body = raw_response.as_object().is_some_and(|map| !map.is_empty());
    let raw_response = if has_body { raw_response } else { fabricate(&context) };

    let content = raw_response
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    PromptResponse {
        context,
        messages: vec![Message::assistant(content)],
        finish_reason: Some(FinishReason::Stop),
        provider: Provider::Mock,
        raw_request,
        raw_response,
        success: true,
    }
}

fn fabricate(context: &GenerateRequest) -> Value {
    let echo = context
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(Message::flatten_text)
        .unwrap_or_default();

    json!({
        "model": context.model,
        "message": {"role": "assistant", "content": format!("Echo: {echo}")},
        "usage": {"input_tokens": ECHO_INPUT_TOKENS, "output_tokens": ECHO_OUTPUT_TOKENS},
    })
}

pub(crate) fn build_embed(request: &EmbedRequest) -> Result<BuiltRequest> {
    let body = serde_json::to_value(request)?;

    let mut validation = Vec::new();
    if request.input.is_empty() {
        validation.push(ValidationError::new("input", "must not be empty"));
    }

    Ok(BuiltRequest::new(Provider::Mock, body, validation))
}

pub(crate) fn normalize_embed(raw_response: Value, context: EmbedRequest, raw_request: Value) -> EmbedResponse {
    let count = context.input.len();

    let has_body = raw_response.as_object().is_some_and(|map| !map.is_empty());
    let raw_response = if has_body {
        raw_response
    } else {
        json!({
            "model": context.model,
            "embeddings": vec![vec![0.0_f32; EMBED_DIMENSIONS]; count],
            "usage": {"input_tokens": count as u32, "output_tokens": 0},
        })
    };

    let vectors = raw_response
        .get("embeddings")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|xs| xs.iter().filter_map(Value::as_f64).map(|x| x as f32).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default();

    EmbedResponse {
        model: context.model.clone(),
        vectors,
        provider: Provider::Mock,
        raw_request,
        raw_response,
        success: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::EmbedInput;

    #[test]
    fn build_then_normalize_echoes_the_last_user_message() {
        let mut request = GenerateRequest::new("mock-model");
        request.messages = vec![
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
        ];

        let built = Provider::Mock.build(&request).unwrap();
        assert!(built.is_send_ready());
        assert_eq!(built.body()["model"], "mock-model");

        let raw_request = built.into_body();
        let response = Provider::Mock
            .normalize_prompt(Value::Null, request, raw_request)
            .unwrap();

        assert!(response.success());
        assert_eq!(response.message().unwrap().flatten_text(), "Echo: second");

        let usage = response.usage().unwrap();
        assert_eq!(usage.input_tokens, ECHO_INPUT_TOKENS);
        assert_eq!(usage.output_tokens, ECHO_OUTPUT_TOKENS);
        assert_eq!(usage.total_tokens, ECHO_INPUT_TOKENS + ECHO_OUTPUT_TOKENS);
    }

    #[test]
    fn provided_raw_response_passes_through() {
        let request = GenerateRequest::new("mock-model");
        let raw = json!({"message": {"role": "assistant", "content": "canned"}});

        let response = Provider::Mock.normalize_prompt(raw, request, json!({})).unwrap();
        assert_eq!(response.message().unwrap().flatten_text(), "canned");
    }

    #[test]
    fn empty_message_list_is_flagged_but_still_builds() {
        let request = GenerateRequest::new("mock-model");

        let built = Provider::Mock.build(&request).unwrap();
        assert!(!built.is_send_ready());
        assert_eq!(built.validation()[0].field, "messages");
    }

    #[test]
    fn embed_fabricates_one_vector_per_input() {
        let request = EmbedRequest {
            model: "mock-embedder".to_string(),
            input: EmbedInput::Batch(vec!["a".to_string(), "b".to_string()]),
            dimensions: None,
            params: serde_json::Map::new(),
        };

        let built = Provider::Mock.build_embed(&request).unwrap();
        let response = Provider::Mock
            .normalize_embed(Value::Null, request, built.into_body())
            .unwrap();

        assert_eq!(response.vectors().len(), 2);
        assert_eq!(response.vectors()[0].len(), EMBED_DIMENSIONS);
        assert_eq!(response.usage().unwrap().input_tokens, 2);
    }
}
