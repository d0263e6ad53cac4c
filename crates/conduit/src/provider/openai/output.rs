//! OpenAI Chat Completions response normalization.

use serde::Deserialize;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::messages::canonical::{Content, ContentBlock, Message, Role};
use crate::messages::openai::ChatResponse;
use crate::provider::{Provider, render_tool_use};
use crate::request::{EmbedRequest, GenerateRequest};
use crate::response::{EmbedResponse, FinishReason, PromptResponse};

/// Normalize a raw chat completion.
///
/// The first choice is the canonical one. An assistant turn that mixes
/// text with tool calls splits into one canonical message per unit, in
/// order, each inheriting the wire message's `name`.
pub(crate) fn normalize(
    provider: Provider,
    raw_response: Value,
    context: GenerateRequest,
    raw_request: Value,
) -> Result<PromptResponse, NormalizeError> {
    let response: ChatResponse = serde_json::from_value(raw_response.clone())?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(NormalizeError::MissingStructure { what: "choices" })?;

    let wire_message = choice.message;
    let name = wire_message.name;
    let mut messages = Vec::new();

    if let Some(content) = wire_message.content {
        if !content.is_empty() {
            messages.push(Message {
                role: Role::Assistant,
                content: Content::Text(content),
                name: name.clone(),
            });
        }
    }

    if let Some(refusal) = wire_message.refusal {
        messages.push(Message {
            role: Role::Assistant,
            content: Content::Blocks(vec![ContentBlock::Refusal { refusal }]),
            name: name.clone(),
        });
    }

    for call in wire_message.tool_calls.into_iter().flatten() {
        let input: Value = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));

        messages.push(Message {
            role: Role::Assistant,
            content: Content::Text(render_tool_use(&call.function.name, &call.id, &input)),
            name: name.clone(),
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
        finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_wire),
        provider,
        raw_request,
        raw_response,
        success: true,
    })
}

/// Response body of `POST /v1/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    model: Option<String>,

    data: Vec<EmbeddingObject>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    #[serde(default)]
    index: usize,

    embedding: Vec<f32>,
}

/// Normalize a raw embeddings response. Vectors are reordered by the
/// provider-reported index so they line up with the inputs.
pub(crate) fn normalize_embed(
    provider: Provider,
    raw_response: Value,
    context: EmbedRequest,
    raw_request: Value,
) -> Result<EmbedResponse, NormalizeError> {
    let response: EmbeddingsResponse = serde_json::from_value(raw_response.clone())?;

    if response.data.is_empty() {
        return Err(NormalizeError::MissingStructure { what: "embedding data" });
    }

    let mut data = response.data;
    data.sort_by_key(|d| d.index);

    Ok(EmbedResponse {
        model: response.model.unwrap_or(context.model),
        vectors: data.into_iter().map(|d| d.embedding).collect(),
        provider,
        raw_request,
        raw_response,
        success: true,
    })
}
