//! Anthropic Messages response normalization.

use serde_json::Value;

use crate::error::NormalizeError;
use crate::messages::anthropic::{MessagesResponse, ResponseBlock};
use crate::messages::canonical::{Content, ContentBlock, Message, Role};
use crate::provider::{Provider, render_tool_result, render_tool_use};
use crate::request::GenerateRequest;
use crate::response::{FinishReason, PromptResponse};

/// Normalize a raw messages response.
///
/// The content block array splits into one canonical assistant message per
/// block, in original order: text blocks keep their text, tool-use blocks
/// (client, server and MCP alike) become rendered descriptions, thinking
/// blocks stay structured so signatures survive a round trip.
pub(crate) fn normalize(
    provider: Provider,
    raw_response: Value,
    context: GenerateRequest,
    raw_request: Value,
) -> Result<PromptResponse, NormalizeError> {
    let response: MessagesResponse = serde_json::from_value(raw_response.clone())?;

    if response.content.is_empty() {
        return Err(NormalizeError::MissingStructure {
            what: "message content",
        });
    }

    let messages = response.content.into_iter().map(split_block).collect();

    Ok(PromptResponse {
        context,
        messages,
        finish_reason: response.stop_reason.as_deref().map(FinishReason::from_wire),
        provider,
        raw_request,
        raw_response,
        success: true,
    })
}

fn split_block(block: ResponseBlock) -> Message {
    let content = match block {
        ResponseBlock::Text { text } => Content::Text(text),
        ResponseBlock::ToolUse { id, name, input }
        | ResponseBlock::ServerToolUse { id, name, input }
        | ResponseBlock::McpToolUse { id, name, input, .. } => {
            Content::Text(render_tool_use(&name, &id, &input))
        }
        ResponseBlock::McpToolResult {
            tool_use_id, content, ..
        } => Content::Text(render_tool_result(&tool_use_id, &content)),
        ResponseBlock::Thinking { thinking, signature } => {
            Content::Blocks(vec![ContentBlock::Thinking { thinking, signature }])
        }
        ResponseBlock::RedactedThinking { data } => Content::Blocks(vec![ContentBlock::RedactedThinking { data }]),
    };

    Message {
        role: Role::Assistant,
        content,
        name: None,
    }
}
