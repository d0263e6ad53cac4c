//! Canonical request to OpenAI Responses wire format.

use serde_json::Value;

use crate::error::CastError;
use crate::messages::canonical::{Content, ContentBlock, Message, Role, Source, Tool, ToolChoice};
use crate::messages::openai::ToolChoiceMode;
use crate::messages::openai_responses::{
    InputItem, ItemContent, ItemPart, ResponsesRequest, ResponsesTool, ResponsesToolChoice, ResponsesToolKind,
};
use crate::request::GenerateRequest;
use crate::validation::{self, Validate, ValidationError};

const PROVIDER: &str = "openai_responses";

const METADATA_MAX_ENTRIES: usize = 16;
const METADATA_MAX_KEY_LEN: usize = 64;
const METADATA_MAX_VALUE_LEN: usize = 512;

/// Build the wire request. Instructions go to the dedicated top-level
/// field; tool calls and their outputs become sibling input items rather
/// than message attachments.
pub(crate) fn responses_request(request: &GenerateRequest) -> Result<ResponsesRequest, CastError> {
    let mut input = Vec::with_capacity(request.messages.len());

    for message in &request.messages {
        input.extend(convert_message(message)?);
    }

    let tools = match &request.tools {
        Some(tools) => Some(tools.iter().map(convert_tool).collect::<Result<Vec<_>, _>>()?),
        None => None,
    };

    Ok(ResponsesRequest {
        model: request.model.clone(),
        input,
        instructions: request.instructions.clone(),
        conversation: request.param("conversation").and_then(Value::as_str).map(str::to_string),
        previous_response_id: request
            .param("previous_response_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        temperature: request.temperature,
        top_p: request.top_p,
        max_output_tokens: request.max_tokens,
        metadata: request.metadata.clone(),
        stream: request.stream,
        store: request.param("store").and_then(Value::as_bool),
        tools,
        tool_choice: request.tool_choice.as_ref().map(convert_tool_choice),
        parallel_tool_calls: request.param("parallel_tool_calls").and_then(Value::as_bool),
    })
}

fn convert_message(message: &Message) -> Result<Vec<InputItem>, CastError> {
    match message.role {
        Role::System | Role::Developer | Role::User => {
            let role = message.role.as_str().to_string();

            Ok(vec![InputItem::Message {
                role,
                content: convert_content(&message.content, false)?,
            }])
        }
        Role::Assistant => {
            let mut items = Vec::new();
            let mut parts = Vec::new();

            for block in message.content.to_blocks() {
                match block {
                    ContentBlock::ToolUse { id, name, input } => items.push(InputItem::FunctionCall {
                        call_id: id,
                        name,
                        arguments: serde_json::to_string(&input).unwrap_or_else(|_| "{}".to_string()),
                    }),
                    other => parts.push(convert_part(&other, true)?),
                }
            }

            if !parts.is_empty() {
                items.insert(0, InputItem::Message {
                    role: "assistant".to_string(),
                    content: ItemContent::Parts(parts),
                });
            }

            Ok(items)
        }
        Role::Tool => {
            let blocks = message.content.to_blocks();
            let mut items = Vec::with_capacity(blocks.len());

            for block in blocks {
                let ContentBlock::ToolResult {
                    tool_use_id, content, ..
                } = block
                else {
                    return Err(CastError::MissingField {
                        context: "tool message",
                        field: "tool_use_id",
                    });
                };

                items.push(InputItem::FunctionCallOutput {
                    call_id: tool_use_id,
                    output: flatten(&content),
                });
            }

            if items.is_empty() {
                return Err(CastError::MissingField {
                    context: "tool message",
                    field: "tool_use_id",
                });
            }

            Ok(items)
        }
    }
}

fn flatten(content: &Content) -> String {
    match content {
        Content::Text(text) => text.clone(),
        Content::Blocks(blocks) => blocks
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn convert_content(content: &Content, assistant: bool) -> Result<ItemContent, CastError> {
    match content {
        Content::Text(text) => Ok(ItemContent::Text(text.clone())),
        Content::Blocks(blocks) => {
            let parts = blocks
                .iter()
                .map(|b| convert_part(b, assistant))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ItemContent::Parts(parts).compressed())
        }
    }
}

fn convert_part(block: &ContentBlock, assistant: bool) -> Result<ItemPart, CastError> {
    match block {
        ContentBlock::Text { text } => {
            if assistant {
                Ok(ItemPart::OutputText { text: text.clone() })
            } else {
                Ok(ItemPart::InputText { text: text.clone() })
            }
        }
        ContentBlock::Image { source } => match source {
            Source::File { file_id } => Ok(ItemPart::InputImage {
                image_url: None,
                file_id: Some(file_id.clone()),
                detail: None,
            }),
            _ => Ok(ItemPart::InputImage {
                image_url: source.to_data_uri(),
                file_id: None,
                detail: None,
            }),
        },
        ContentBlock::Document { source } => match source {
            Source::File { file_id } => Ok(ItemPart::InputFile {
                file_id: Some(file_id.clone()),
                file_data: None,
                filename: None,
            }),
            Source::Base64 { .. } => Ok(ItemPart::InputFile {
                file_id: None,
                file_data: source.to_data_uri(),
                filename: None,
            }),
            Source::Text { text, .. } => Ok(ItemPart::InputText { text: text.clone() }),
            Source::Url { .. } => Err(CastError::Unsupported {
                provider: PROVIDER,
                what: "document URLs",
            }),
        },
        ContentBlock::Refusal { refusal } => Ok(ItemPart::InputText {
            text: refusal.clone(),
        }),
        _ => Err(CastError::Unsupported {
            provider: PROVIDER,
            what: "audio, thinking and search result content",
        }),
    }
}

fn convert_tool(tool: &Tool) -> Result<ResponsesTool, CastError> {
    match tool {
        Tool::Function {
            name,
            description,
            parameters,
            strict,
        } => Ok(ResponsesTool::Function {
            name: name.clone(),
            description: description.clone(),
            parameters: parameters.clone(),
            strict: *strict,
        }),
        Tool::Custom { .. } => Err(CastError::Unsupported {
            provider: PROVIDER,
            what: "custom tools",
        }),
    }
}

fn convert_tool_choice(choice: &ToolChoice) -> ResponsesToolChoice {
    match choice {
        ToolChoice::Auto => ResponsesToolChoice::Mode(ToolChoiceMode::Auto),
        ToolChoice::Any => ResponsesToolChoice::Mode(ToolChoiceMode::Required),
        ToolChoice::None => ResponsesToolChoice::Mode(ToolChoiceMode::None),
        ToolChoice::Tool { name } => ResponsesToolChoice::Specific {
            kind: ResponsesToolKind::Function,
            name: name.clone(),
        },
    }
}

impl Validate for ResponsesRequest {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        validation::check_range(&mut errors, "temperature", self.temperature, 0.0, 2.0);
        validation::check_range_exclusive_min(&mut errors, "top_p", self.top_p, 0.0, 1.0);
        validation::check_min(&mut errors, "max_output_tokens", self.max_output_tokens, 1);
        validation::check_metadata(
            &mut errors,
            "metadata",
            self.metadata.as_ref(),
            METADATA_MAX_ENTRIES,
            METADATA_MAX_KEY_LEN,
            METADATA_MAX_VALUE_LEN,
        );

        if self.conversation.is_some() && self.previous_response_id.is_some() {
            errors.push(ValidationError::new(
                "conversation",
                "cannot be combined with previous_response_id",
            ));
        }

        if self.input.is_empty() {
            errors.push(ValidationError::new("input", "must not be empty"));
        }

        errors
    }
}
