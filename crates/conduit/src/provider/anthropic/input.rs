//! Canonical request to Anthropic Messages wire format.

use crate::error::CastError;
use crate::messages::anthropic::{
    AnthropicBlock, AnthropicMessage, AnthropicRole, AnthropicSource, AnthropicTool, AnthropicToolChoice,
    MessageContent, MessagesRequest, Metadata,
};
use crate::messages::canonical::{Content, ContentBlock, Role, Source, Tool, ToolChoice};
use crate::request::GenerateRequest;
use crate::validation::{self, Validate, ValidationError};

const PROVIDER: &str = "anthropic";

/// The API requires `max_tokens`; this is the default when the canonical
/// request leaves it unset.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Build the wire request.
///
/// System content rides only in the top-level `system` field: canonical
/// system/developer messages are dropped from the turn list, instructions
/// fill `system`. Consecutive same-role turns are merged, and tool results
/// embed into user turns as the API requires.
pub(crate) fn messages_request(request: &GenerateRequest) -> Result<MessagesRequest, CastError> {
    let mut messages = Vec::with_capacity(request.messages.len());

    for message in &request.messages {
        match message.role {
            Role::System | Role::Developer => {
                log::warn!("dropping {} message; system content belongs in instructions", message.role.as_str());
            }
            Role::User | Role::Tool => messages.push(AnthropicMessage {
                role: AnthropicRole::User,
                content: convert_content(&message.content)?,
            }),
            Role::Assistant => messages.push(AnthropicMessage {
                role: AnthropicRole::Assistant,
                content: convert_content(&message.content)?,
            }),
        }
    }

    let messages = group_messages(messages)
        .into_iter()
        .map(|m| AnthropicMessage {
            role: m.role,
            content: m.content.compressed(),
        })
        .collect();

    let tools = match &request.tools {
        Some(tools) => Some(tools.iter().map(convert_tool).collect::<Result<Vec<_>, _>>()?),
        None => None,
    };

    Ok(MessagesRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        system: request.instructions.clone(),
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
        stop_sequences: request.stop_sequences.clone(),
        stream: request.stream,
        metadata: request.metadata.as_ref().and_then(|m| {
            m.get("user_id").map(|user_id| Metadata {
                user_id: Some(user_id.clone()),
            })
        }),
        tools,
        tool_choice: request.tool_choice.as_ref().map(convert_tool_choice),
    })
}

/// Merge consecutive same-role turns; the API rejects adjacent turns with
/// the same role.
fn group_messages(messages: Vec<AnthropicMessage>) -> Vec<AnthropicMessage> {
    let mut grouped: Vec<AnthropicMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        match grouped.last_mut() {
            Some(last) if last.role == message.role => {
                let content = std::mem::replace(&mut last.content, MessageContent::Text(String::new()));
                last.content = content.concat(message.content);
            }
            _ => grouped.push(message),
        }
    }

    grouped
}

fn convert_content(content: &Content) -> Result<MessageContent, CastError> {
    match content {
        Content::Text(text) => Ok(MessageContent::Text(text.clone())),
        Content::Blocks(blocks) => Ok(MessageContent::Blocks(
            blocks.iter().map(convert_block).collect::<Result<Vec<_>, _>>()?,
        )),
    }
}

fn convert_block(block: &ContentBlock) -> Result<AnthropicBlock, CastError> {
    match block {
        ContentBlock::Text { text } => Ok(AnthropicBlock::Text { text: text.clone() }),
        ContentBlock::Image { source } => Ok(AnthropicBlock::Image {
            source: convert_source(source),
        }),
        ContentBlock::Document { source } => Ok(AnthropicBlock::Document {
            source: convert_source(source),
        }),
        ContentBlock::Audio { .. } => Err(CastError::Unsupported {
            provider: PROVIDER,
            what: "audio content",
        }),
        ContentBlock::ToolUse { id, name, input } => Ok(AnthropicBlock::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        }),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => Ok(AnthropicBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: Box::new(convert_content(content)?.compressed()),
            is_error: *is_error,
        }),
        ContentBlock::Thinking { thinking, signature } => Ok(AnthropicBlock::Thinking {
            thinking: thinking.clone(),
            signature: signature.clone(),
        }),
        ContentBlock::RedactedThinking { data } => Ok(AnthropicBlock::RedactedThinking { data: data.clone() }),
        ContentBlock::SearchResult { source, title, content } => Ok(AnthropicBlock::SearchResult {
            source: source.clone(),
            title: title.clone(),
            content: content.iter().map(convert_block).collect::<Result<Vec<_>, _>>()?,
        }),
        ContentBlock::Refusal { refusal } => Ok(AnthropicBlock::Text {
            text: refusal.clone(),
        }),
    }
}

// Canonical sources are already stripped of data-URI prefixes at cast
// time; the mapping here is shape-for-shape.
fn convert_source(source: &Source) -> AnthropicSource {
    match source {
        Source::Base64 { media_type, data } => AnthropicSource::Base64 {
            media_type: media_type.clone(),
            data: data.clone(),
        },
        Source::Url { url } => AnthropicSource::Url { url: url.clone() },
        Source::File { file_id } => AnthropicSource::File {
            file_id: file_id.clone(),
        },
        Source::Text { media_type, text } => AnthropicSource::Text {
            media_type: media_type.clone(),
            data: text.clone(),
        },
    }
}

fn convert_tool(tool: &Tool) -> Result<AnthropicTool, CastError> {
    match tool {
        Tool::Function {
            name,
            description,
            parameters,
            ..
        } => Ok(AnthropicTool {
            name: name.clone(),
            description: description.clone(),
            input_schema: parameters.clone(),
        }),
        Tool::Custom { .. } => Err(CastError::Unsupported {
            provider: PROVIDER,
            what: "custom tools",
        }),
    }
}

fn convert_tool_choice(choice: &ToolChoice) -> AnthropicToolChoice {
    match choice {
        ToolChoice::Auto => AnthropicToolChoice::Auto,
        ToolChoice::Any => AnthropicToolChoice::Any,
        ToolChoice::None => AnthropicToolChoice::None,
        ToolChoice::Tool { name } => AnthropicToolChoice::Tool { name: name.clone() },
    }
}

impl Validate for MessagesRequest {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        validation::check_range(&mut errors, "temperature", self.temperature, 0.0, 1.0);
        validation::check_range_exclusive_min(&mut errors, "top_p", self.top_p, 0.0, 1.0);
        validation::check_min(&mut errors, "top_k", self.top_k, 1);
        validation::check_min(&mut errors, "max_tokens", Some(self.max_tokens), 1);

        if self.messages.is_empty() {
            errors.push(ValidationError::new("messages", "must not be empty"));
        }

        for (i, message) in self.messages.iter().enumerate() {
            let empty = match &message.content {
                MessageContent::Text(text) => text.is_empty(),
                MessageContent::Blocks(blocks) => blocks.is_empty(),
            };

            if empty {
                errors.push(ValidationError::new(format!("messages[{i}].content"), "must not be empty"));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::canonical::Message;
    use insta::assert_json_snapshot;
    use serde_json::json;

    fn request_with(messages: Vec<Message>) -> GenerateRequest {
        GenerateRequest {
            messages,
            ..GenerateRequest::new("claude-sonnet-4-5")
        }
    }

    #[test]
    fn full_request_shape() {
        let mut request = request_with(vec![Message::user("Hello")]);
        request.instructions = Some("Be helpful.".to_string());
        request.temperature = Some(0.5);
        request.max_tokens = Some(1024);

        let wire = messages_request(&request).unwrap();
        assert!(wire.is_valid());

        assert_json_snapshot!(wire, @r###"
        {
          "model": "claude-sonnet-4-5",
          "messages": [
            {
              "role": "user",
              "content": "Hello"
            }
          ],
          "max_tokens": 1024,
          "system": "Be helpful.",
          "temperature": 0.5
        }
        "###);
    }

    #[test]
    fn consecutive_same_role_messages_merge_into_one() {
        let wire = messages_request(&request_with(vec![
            Message::user("A"),
            Message::user("B"),
            Message::assistant("C"),
        ]))
        .unwrap();

        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].content, MessageContent::Text("AB".to_string()));
        assert_eq!(wire.messages[1].content, MessageContent::Text("C".to_string()));
    }

    #[test]
    fn merge_law_for_n_consecutive_messages() {
        let wire = messages_request(&request_with(vec![
            Message::user("1"),
            Message::user("2"),
            Message::user("3"),
        ]))
        .unwrap();

        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.messages[0].content, MessageContent::Text("123".to_string()));
    }

    #[test]
    fn mixed_content_merge_coerces_to_blocks() {
        let wire = messages_request(&request_with(vec![
            Message::user("look at this"),
            Message::user(vec![ContentBlock::Image {
                source: Source::Url {
                    url: "https://x.test/a.png".to_string(),
                },
            }]),
        ]))
        .unwrap();

        assert_eq!(wire.messages.len(), 1);
        let MessageContent::Blocks(blocks) = &wire.messages[0].content else {
            panic!("expected blocks");
        };
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], AnthropicBlock::Text { text } if text == "look at this"));
    }

    #[test]
    fn system_messages_are_dropped_from_the_turn_list() {
        let mut request = request_with(vec![Message::system("ignored"), Message::user("Hi")]);
        request.instructions = Some("From instructions.".to_string());

        let wire = messages_request(&request).unwrap();

        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.system.as_deref(), Some("From instructions."));
    }

    #[test]
    fn tool_result_messages_become_user_turns() {
        let request = request_with(vec![
            Message::assistant(vec![ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "get_weather".to_string(),
                input: json!({"city": "Paris"}),
            }]),
            Message {
                role: Role::Tool,
                content: Content::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: "toolu_1".to_string(),
                    content: Content::Text("22C".to_string()),
                    is_error: None,
                }]),
                name: None,
            },
        ]);

        let wire = messages_request(&request).unwrap();

        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[1].role, AnthropicRole::User);
        let MessageContent::Blocks(blocks) = &wire.messages[1].content else {
            panic!("expected blocks");
        };
        assert!(matches!(&blocks[0], AnthropicBlock::ToolResult { tool_use_id, .. } if tool_use_id == "toolu_1"));
    }

    #[test]
    fn image_data_uri_arrives_stripped() {
        let wire = messages_request(&request_with(vec![Message::user(vec![ContentBlock::Image {
            source: Source::cast(json!("data:image/png;base64,QUJD")).unwrap(),
        }])]))
        .unwrap();

        let body = serde_json::to_value(&wire).unwrap();
        assert_eq!(
            body["messages"][0]["content"],
            json!([{
                "type": "image",
                "source": {"type": "base64", "media_type": "image/png", "data": "QUJD"},
            }])
        );
    }

    #[test]
    fn temperature_range_is_tighter_than_openai() {
        let mut request = request_with(vec![Message::user("Hi")]);

        request.temperature = Some(1.0);
        assert!(messages_request(&request).unwrap().is_valid());

        request.temperature = Some(1.5);
        let errors = messages_request(&request).unwrap().validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "temperature");
    }

    #[test]
    fn max_tokens_defaults_when_unset() {
        let wire = messages_request(&request_with(vec![Message::user("Hi")])).unwrap();
        assert_eq!(wire.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
