//! Canonical request to OpenAI Chat Completions wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CastError;
use crate::messages::canonical::{Content, ContentBlock, Message, Role, Source, Tool, ToolChoice};
use crate::messages::openai::{
    ChatContent, ChatMessage, ChatRequest, ChatRole, ContentPart, FileRef, FunctionCall, FunctionChoice, FunctionDef,
    ImageUrl, InputAudio, ToolCall, ToolCallKind, ToolChoiceKind, ToolChoiceMode,
};
use crate::request::{EmbedInput, EmbedRequest, GenerateRequest};
use crate::validation::{self, Validate, ValidationError};

const PROVIDER: &str = "openai";

/// Build the wire request. Instructions become a leading system message.
pub(crate) fn chat_request(request: &GenerateRequest) -> Result<ChatRequest, CastError> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(instructions) = &request.instructions {
        messages.push(ChatMessage {
            role: ChatRole::System,
            content: Some(ChatContent::Text(instructions.clone())),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for message in &request.messages {
        messages.extend(convert_message(message)?);
    }

    let tools = match &request.tools {
        Some(tools) => Some(tools.iter().map(convert_tool).collect::<Result<Vec<_>, _>>()?),
        None => None,
    };

    Ok(ChatRequest {
        model: request.model.clone(),
        messages,
        temperature: request.temperature,
        top_p: request.top_p,
        frequency_penalty: request.frequency_penalty,
        presence_penalty: request.presence_penalty,
        max_tokens: request.max_tokens,
        stop: request.stop_sequences.clone(),
        stream: request.stream,
        tools,
        tool_choice: request.tool_choice.as_ref().map(convert_tool_choice),
        parallel_tool_calls: request.param("parallel_tool_calls").and_then(Value::as_bool),
        user: request.param("user").and_then(Value::as_str).map(str::to_string),
    })
}

/// One canonical message can expand into several wire messages: every tool
/// result becomes its own `tool`-role message correlated by call id.
pub(crate) fn convert_message(message: &Message) -> Result<Vec<ChatMessage>, CastError> {
    match message.role {
        Role::System | Role::Developer | Role::User => {
            let role = match message.role {
                Role::System => ChatRole::System,
                Role::Developer => ChatRole::Developer,
                _ => ChatRole::User,
            };

            Ok(vec![ChatMessage {
                role,
                content: Some(convert_content(&message.content)?),
                name: message.name.clone(),
                tool_calls: None,
                tool_call_id: None,
            }])
        }
        Role::Assistant => convert_assistant(message),
        Role::Tool => convert_tool_results(message),
    }
}

fn convert_assistant(message: &Message) -> Result<Vec<ChatMessage>, CastError> {
    let blocks = match &message.content {
        Content::Text(text) => {
            return Ok(vec![ChatMessage {
                role: ChatRole::Assistant,
                content: Some(ChatContent::Text(text.clone())),
                name: message.name.clone(),
                tool_calls: None,
                tool_call_id: None,
            }]);
        }
        Content::Blocks(blocks) => blocks,
    };

    let mut parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id: id.clone(),
                kind: ToolCallKind::Function,
                function: FunctionCall {
                    name: name.clone(),
                    arguments: serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string()),
                },
            }),
            other => parts.push(convert_part(other)?),
        }
    }

    let content = if parts.is_empty() {
        None
    } else {
        Some(ChatContent::Parts(parts).compressed())
    };

    Ok(vec![ChatMessage {
        role: ChatRole::Assistant,
        content,
        name: message.name.clone(),
        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
        tool_call_id: None,
    }])
}

fn convert_tool_results(message: &Message) -> Result<Vec<ChatMessage>, CastError> {
    let blocks = message.content.to_blocks();
    let mut messages = Vec::with_capacity(blocks.len());

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

        messages.push(ChatMessage {
            role: ChatRole::Tool,
            content: Some(convert_content(&content)?),
            name: message.name.clone(),
            tool_calls: None,
            tool_call_id: Some(tool_use_id),
        });
    }

    if messages.is_empty() {
        return Err(CastError::MissingField {
            context: "tool message",
            field: "tool_use_id",
        });
    }

    Ok(messages)
}

fn convert_content(content: &Content) -> Result<ChatContent, CastError> {
    match content {
        Content::Text(text) => Ok(ChatContent::Text(text.clone())),
        Content::Blocks(blocks) => {
            let parts = blocks.iter().map(convert_part).collect::<Result<Vec<_>, _>>()?;
            Ok(ChatContent::Parts(parts).compressed())
        }
    }
}

fn convert_part(block: &ContentBlock) -> Result<ContentPart, CastError> {
    match block {
        ContentBlock::Text { text } => Ok(ContentPart::Text { text: text.clone() }),
        ContentBlock::Image { source } => match source.to_data_uri() {
            // Chat Completions embeds images as (data) URLs and keeps the
            // data-URI prefix intact.
            Some(url) => Ok(ContentPart::ImageUrl {
                image_url: ImageUrl { url, detail: None },
            }),
            None => Err(CastError::Unsupported {
                provider: PROVIDER,
                what: "file-id image sources",
            }),
        },
        ContentBlock::Document { source } => match source {
            Source::File { file_id } => Ok(ContentPart::File {
                file: FileRef {
                    file_id: Some(file_id.clone()),
                    ..FileRef::default()
                },
            }),
            Source::Base64 { .. } => Ok(ContentPart::File {
                file: FileRef {
                    file_data: source.to_data_uri(),
                    ..FileRef::default()
                },
            }),
            Source::Text { text, .. } => Ok(ContentPart::Text { text: text.clone() }),
            Source::Url { .. } => Err(CastError::Unsupported {
                provider: PROVIDER,
                what: "document URLs",
            }),
        },
        ContentBlock::Audio { source } => match source {
            Source::Base64 { media_type, data } => Ok(ContentPart::InputAudio {
                input_audio: InputAudio {
                    data: data.clone(),
                    format: media_type.strip_prefix("audio/").unwrap_or(media_type).to_string(),
                },
            }),
            _ => Err(CastError::Unsupported {
                provider: PROVIDER,
                what: "non-inline audio sources",
            }),
        },
        ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. } => Err(CastError::Unsupported {
            provider: PROVIDER,
            what: "tool blocks outside assistant/tool messages",
        }),
        ContentBlock::Thinking { .. } | ContentBlock::RedactedThinking { .. } => Err(CastError::Unsupported {
            provider: PROVIDER,
            what: "thinking content",
        }),
        ContentBlock::SearchResult { .. } => Err(CastError::Unsupported {
            provider: PROVIDER,
            what: "search result content",
        }),
        ContentBlock::Refusal { refusal } => Ok(ContentPart::Text { text: refusal.clone() }),
    }
}

pub(crate) fn convert_tool(tool: &Tool) -> Result<crate::messages::openai::Tool, CastError> {
    match tool {
        Tool::Function {
            name,
            description,
            parameters,
            strict,
        } => Ok(crate::messages::openai::Tool::Function {
            function: FunctionDef {
                name: name.clone(),
                description: description.clone(),
                parameters: parameters.clone(),
                strict: *strict,
            },
        }),
        Tool::Custom { .. } => Err(CastError::Unsupported {
            provider: PROVIDER,
            what: "custom tools",
        }),
    }
}

pub(crate) fn convert_tool_choice(choice: &ToolChoice) -> crate::messages::openai::ToolChoice {
    use crate::messages::openai::ToolChoice as Wire;

    match choice {
        ToolChoice::Auto => Wire::Mode(ToolChoiceMode::Auto),
        ToolChoice::Any => Wire::Mode(ToolChoiceMode::Required),
        ToolChoice::None => Wire::Mode(ToolChoiceMode::None),
        ToolChoice::Tool { name } => Wire::Specific {
            kind: ToolChoiceKind::Function,
            function: FunctionChoice { name: name.clone() },
        },
    }
}

impl Validate for ChatRequest {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        validation::check_range(&mut errors, "temperature", self.temperature, 0.0, 2.0);
        validation::check_range_exclusive_min(&mut errors, "top_p", self.top_p, 0.0, 1.0);
        validation::check_range(&mut errors, "frequency_penalty", self.frequency_penalty, -2.0, 2.0);
        validation::check_range(&mut errors, "presence_penalty", self.presence_penalty, -2.0, 2.0);
        validation::check_min(&mut errors, "max_tokens", self.max_tokens, 1);

        if self.messages.is_empty() {
            errors.push(ValidationError::new("messages", "must not be empty"));
        }

        for (i, message) in self.messages.iter().enumerate() {
            let requires_content = matches!(message.role, ChatRole::User | ChatRole::Assistant);
            let has_content = message.content.as_ref().is_some_and(|c| !c.is_empty());
            let has_tool_calls = message.tool_calls.as_ref().is_some_and(|c| !c.is_empty());

            if requires_content && !has_content && !has_tool_calls {
                errors.push(ValidationError::new(format!("messages[{i}].content"), "must not be empty"));
            }
        }

        errors
    }
}

/// Request body for `POST /v1/embeddings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EmbeddingsRequest {
    pub model: String,

    pub input: EmbedInput,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
}

pub(crate) fn embed_request(request: &EmbedRequest) -> EmbeddingsRequest {
    EmbeddingsRequest {
        model: request.model.clone(),
        input: request.input.clone(),
        dimensions: request.dimensions,
        encoding_format: request
            .param("encoding_format")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

impl Validate for EmbeddingsRequest {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.input.is_empty() {
            errors.push(ValidationError::new("input", "must not be empty"));
        }

        validation::check_min(&mut errors, "dimensions", self.dimensions, 1);

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_json_snapshot;
    use serde_json::json;

    fn request_with(messages: Vec<Message>) -> GenerateRequest {
        GenerateRequest {
            messages,
            ..GenerateRequest::new("gpt-4o")
        }
    }

    #[test]
    fn bare_string_content_serializes_as_bare_string() {
        let wire = chat_request(&request_with(vec![Message::user("Hello")])).unwrap();

        assert_json_snapshot!(wire, @r###"
        {
          "model": "gpt-4o",
          "messages": [
            {
              "role": "user",
              "content": "Hello"
            }
          ]
        }
        "###);
    }

    #[test]
    fn single_text_block_compresses_to_bare_string() {
        let message = Message::user(vec![ContentBlock::Text {
            text: "Hello".to_string(),
        }]);
        let wire = chat_request(&request_with(vec![message])).unwrap();

        assert_eq!(
            serde_json::to_value(&wire.messages[0].content).unwrap(),
            json!("Hello")
        );
    }

    #[test]
    fn instructions_become_a_leading_system_message() {
        let mut request = request_with(vec![Message::user("Hi")]);
        request.instructions = Some("Be terse.".to_string());

        let wire = chat_request(&request).unwrap();
        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].role, ChatRole::System);
        assert_eq!(
            wire.messages[0].content,
            Some(ChatContent::Text("Be terse.".to_string()))
        );
    }

    #[test]
    fn assistant_tool_use_blocks_become_tool_calls() {
        let message = Message::assistant(vec![
            ContentBlock::Text {
                text: "Checking.".to_string(),
            },
            ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "get_weather".to_string(),
                input: json!({"city": "Paris"}),
            },
        ]);

        let wire = chat_request(&request_with(vec![message])).unwrap();

        assert_json_snapshot!(wire.messages[0], @r###"
        {
          "role": "assistant",
          "content": "Checking.",
          "tool_calls": [
            {
              "id": "call_1",
              "type": "function",
              "function": {
                "name": "get_weather",
                "arguments": "{\"city\":\"Paris\"}"
              }
            }
          ]
        }
        "###);
    }

    #[test]
    fn tool_results_expand_to_tool_role_messages() {
        let message = Message {
            role: Role::Tool,
            content: Content::Blocks(vec![
                ContentBlock::ToolResult {
                    tool_use_id: "call_1".to_string(),
                    content: Content::Text("22C".to_string()),
                    is_error: None,
                },
                ContentBlock::ToolResult {
                    tool_use_id: "call_2".to_string(),
                    content: Content::Text("rainy".to_string()),
                    is_error: Some(false),
                },
            ]),
            name: None,
        };

        let wire = chat_request(&request_with(vec![message])).unwrap();

        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(wire.messages[1].tool_call_id.as_deref(), Some("call_2"));
        assert!(wire.messages.iter().all(|m| m.role == ChatRole::Tool));
    }

    #[test]
    fn image_sources_keep_data_uris_intact() {
        let message = Message::user(vec![ContentBlock::Image {
            source: Source::Base64 {
                media_type: "image/png".to_string(),
                data: "QUJD".to_string(),
            },
        }]);

        let wire = chat_request(&request_with(vec![message])).unwrap();

        assert_eq!(
            serde_json::to_value(&wire.messages[0].content).unwrap(),
            json!([{
                "type": "image_url",
                "image_url": {"url": "data:image/png;base64,QUJD"},
            }])
        );
    }

    #[test]
    fn thinking_content_is_rejected_not_dropped() {
        let message = Message::assistant(vec![ContentBlock::Thinking {
            thinking: "hmm".to_string(),
            signature: None,
        }]);

        let err = chat_request(&request_with(vec![message])).unwrap_err();
        assert!(matches!(err, CastError::Unsupported { .. }));
    }

    #[test]
    fn temperature_boundary() {
        let mut request = request_with(vec![Message::user("Hi")]);

        request.temperature = Some(2.0);
        assert!(chat_request(&request).unwrap().is_valid());

        request.temperature = Some(2.0001);
        let errors = chat_request(&request).unwrap().validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "temperature");
    }

    #[test]
    fn empty_user_content_fails_validation() {
        let wire = chat_request(&request_with(vec![Message::user("")])).unwrap();

        let errors = wire.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "messages[0].content");
    }

    #[test]
    fn serialize_is_idempotent() {
        let mut request = request_with(vec![Message::user("Hello")]);
        request.temperature = Some(0.7);

        let wire = chat_request(&request).unwrap();
        let first = serde_json::to_value(&wire).unwrap();
        let second = serde_json::to_value(&wire).unwrap();
        assert_eq!(first, second);
    }
}
