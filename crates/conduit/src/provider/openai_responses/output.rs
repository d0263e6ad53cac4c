//! OpenAI Responses response normalization.

use serde_json::Value;

use crate::error::NormalizeError;
use crate::messages::canonical::{Content, ContentBlock, Message, Role};
use crate::messages::openai_responses::{OutputItem, OutputPart, ResponsesResponse};
use crate::provider::{Provider, render_tool_use};
use crate::request::GenerateRequest;
use crate::response::{FinishReason, PromptResponse};

/// Normalize a raw response.
///
/// Output items split into one canonical message each: message items keep
/// their text, function calls become rendered descriptions, reasoning
/// items surface as thinking blocks when they carry summary text and
/// contribute nothing when empty.
pub(crate) fn normalize(
    provider: Provider,
    raw_response: Value,
    context: GenerateRequest,
    raw_request: Value,
) -> Result<PromptResponse, NormalizeError> {
    let response: ResponsesResponse = serde_json::from_value(raw_response.clone())?;

    if response.output.is_empty() {
        return Err(NormalizeError::MissingStructure { what: "output" });
    }

    let mut messages = Vec::new();

    for item in response.output {
        match item {
            OutputItem::Message { content, .. } => {
                let mut texts = Vec::new();

                for part in content {
                    match part {
                        OutputPart::OutputText { text } => texts.push(text),
                        OutputPart::Refusal { refusal } => messages.push(Message {
                            role: Role::Assistant,
                            content: Content::Blocks(vec![ContentBlock::Refusal { refusal }]),
                            name: None,
                        }),
                    }
                }

                if !texts.is_empty() {
                    messages.push(Message::assistant(texts.join("\n")));
                }
            }
            OutputItem::FunctionCall {
                call_id, name, arguments, ..
            } => {
                let input: Value =
                    serde_json::from_str(&arguments).unwrap_or_else(|_| Value::String(arguments.clone()));

                messages.push(Message::assistant(render_tool_use(&name, &call_id, &input)));
            }
            OutputItem::Reasoning { summary, .. } => {
                let thinking = summary_text(&summary);

                if !thinking.is_empty() {
                    messages.push(Message {
                        role: Role::Assistant,
                        content: Content::Blocks(vec![ContentBlock::Thinking {
                            thinking,
                            signature: None,
                        }]),
                        name: None,
                    });
                }
            }
        }
    }

    if messages.is_empty() {
        return Err(NormalizeError::MissingStructure {
            what: "message content",
        });
    }

    Ok(PromptResponse {
        context,
        messages,
        finish_reason: response.status.as_deref().map(FinishReason::from_wire),
        provider,
        raw_request,
        raw_response,
        success: true,
    })
}

/// Reasoning summaries are arrays of `{type: "summary_text", text}` parts.
fn summary_text(summary: &Value) -> String {
    let Some(parts) = summary.as_array() else {
        return String::new();
    };

    parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}
