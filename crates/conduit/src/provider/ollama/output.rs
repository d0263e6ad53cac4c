//! Ollama response normalization.

use serde_json::Value;

use crate::error::NormalizeError;
use crate::messages::canonical::{Content, Message, Role};
use crate::messages::ollama::{ChatResponse, EmbedResponse as WireEmbedResponse};
use crate::provider::{Provider, render_tool_use};
use crate::request::{EmbedRequest, GenerateRequest};
use crate::response::{EmbedResponse, FinishReason, PromptResponse};

/// Normalize a raw chat response.
///
/// Ollama tool calls carry no id; the rendered description omits the ID
/// line. Token counts live at the response's top level and are picked up
/// by the usage accessor, not here.
pub(crate) fn normalize(
    provider: Provider,
    raw_response: Value,
    context: GenerateRequest,
    raw_request: Value,
) -> Result<PromptResponse, NormalizeError> {
    let response: ChatResponse = serde_json::from_value(raw_response.clone())?;

    let mut messages = Vec::new();

    if !response.message.content.is_empty() {
        messages.push(Message {
            role: Role::Assistant,
            content: Content::Text(response.message.content),
            name: None,
        });
    }

    for call in response.message.tool_calls.into_iter().flatten() {
        messages.push(Message {
            role: Role::Assistant,
            content: Content::Text(render_tool_use(&call.function.name, "", &call.function.arguments)),
            name: None,
        });
    }

    if messages.is_empty() {
        return Err(NormalizeError::MissingStructure {
            what: "message content",
        });
    }

    Ok(PromptResponse {
        context,
        messages,
        finish_reason: response.done_reason.as_deref().map(FinishReason::from_wire),
        provider,
        raw_request,
        raw_response,
        success: true,
    })
}

/// Normalize a raw embed response.
pub(crate) fn normalize_embed(
    provider: Provider,
    raw_response: Value,
    context: EmbedRequest,
    raw_request: Value,
) -> Result<EmbedResponse, NormalizeError> {
    let response: WireEmbedResponse = serde_json::from_value(raw_response.clone())?;

    if response.embeddings.is_empty() {
        return Err(NormalizeError::MissingStructure { what: "embeddings" });
    }

    Ok(EmbedResponse {
        model: response.model.unwrap_or(context.model),
        vectors: response.embeddings,
        provider,
        raw_request,
        raw_response,
        success: true,
    })
}
