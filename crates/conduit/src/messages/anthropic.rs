//! Wire types for the Anthropic Messages API.
//!
//! Differences from the OpenAI format that matter here: system text is a
//! separate top-level field, `max_tokens` is required, tool interactions
//! are content blocks rather than side arrays, and adjacent same-role
//! messages must be merged before serialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST /v1/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// Model identifier, e.g. `"claude-sonnet-4-5"`.
    pub model: String,

    /// User/assistant turns. Roles must alternate; consecutive same-role
    /// canonical messages are merged by the builder.
    pub messages: Vec<AnthropicMessage>,

    /// Maximum tokens to generate. Required by the API.
    pub max_tokens: u32,

    /// System prompt, separate from the messages array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Sampling temperature, 0.0 to 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Sequences that stop generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    /// Whether to stream the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Request metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// Tools available to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<AnthropicTool>>,

    /// How the model should use the tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<AnthropicToolChoice>,
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    pub role: AnthropicRole,
    pub content: MessageContent,
}

/// Message sender role. The API accepts only these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnthropicRole {
    User,
    Assistant,
}

/// String-or-blocks message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Bare string shorthand, equivalent to one text block.
    Text(String),
    /// Ordered content blocks.
    Blocks(Vec<AnthropicBlock>),
}

impl MessageContent {
    /// Collapse a one-element text block array to the bare string form.
    pub fn compressed(self) -> Self {
        match self {
            Self::Blocks(blocks) if blocks.len() == 1 => match blocks.into_iter().next() {
                Some(AnthropicBlock::Text { text }) => Self::Text(text),
                Some(block) => Self::Blocks(vec![block]),
                None => Self::Blocks(Vec::new()),
            },
            other => other,
        }
    }

    fn into_blocks(self) -> Vec<AnthropicBlock> {
        match self {
            Self::Text(text) => vec![AnthropicBlock::Text { text }],
            Self::Blocks(blocks) => blocks,
        }
    }

    /// Ordered concatenation for same-role merging: string + string
    /// concatenates directly, anything else coerces to block arrays and
    /// concatenates those.
    pub fn concat(self, other: Self) -> Self {
        match (self, other) {
            (Self::Text(mut a), Self::Text(b)) => {
                a.push_str(&b);
                Self::Text(a)
            }
            (a, b) => {
                let mut blocks = a.into_blocks();
                blocks.extend(b.into_blocks());
                Self::Blocks(blocks)
            }
        }
    }
}

/// One content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicBlock {
    /// Plain text.
    Text { text: String },

    /// Image with a typed source.
    Image { source: AnthropicSource },

    /// Document with a typed source.
    Document { source: AnthropicSource },

    /// A tool invocation.
    ToolUse { id: String, name: String, input: Value },

    /// The result of a tool invocation.
    ToolResult {
        tool_use_id: String,
        content: Box<MessageContent>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },

    /// Extended thinking, replayed on multi-turn tool use.
    Thinking {
        thinking: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },

    /// Thinking the API withheld.
    RedactedThinking { data: String },

    /// A search result block.
    SearchResult {
        source: String,
        title: String,
        content: Vec<AnthropicBlock>,
    },
}

/// Media source for image/document blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicSource {
    /// Inline base64 payload. The API rejects data-URI prefixes; the
    /// builder strips them.
    Base64 { media_type: String, data: String },

    /// Fetched by the API.
    Url { url: String },

    /// A file uploaded through the Files API.
    File { file_id: String },

    /// Plain-text document content. Note the field is `data`, not `text`.
    Text { media_type: String, data: String },
}

/// Request metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A tool definition. The schema field is `input_schema`, not
/// `parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicTool {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub input_schema: Value,
}

/// Tool usage control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicToolChoice {
    /// The model decides.
    Auto,
    /// The model must call some tool.
    Any,
    /// Tools are disabled.
    None,
    /// The model must call this tool.
    Tool { name: String },
}

/// Response body of a non-streaming message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    pub content: Vec<ResponseBlock>,

    #[serde(default)]
    pub stop_reason: Option<String>,

    #[serde(default)]
    pub stop_sequence: Option<String>,
}

/// One block of response content.
///
/// Unknown tags fail deserialization on purpose: silently dropping a
/// block the protocol grew would hide drift from callers.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    /// Narrative text.
    Text { text: String },

    /// A client-side tool invocation.
    ToolUse { id: String, name: String, input: Value },

    /// A server-side tool invocation (web search and friends).
    ServerToolUse { id: String, name: String, input: Value },

    /// An MCP tool invocation.
    McpToolUse {
        id: String,
        name: String,
        input: Value,
        #[serde(default)]
        server_name: Option<String>,
    },

    /// The result of an MCP tool invocation.
    McpToolResult {
        tool_use_id: String,
        #[serde(default)]
        is_error: Option<bool>,
        #[serde(default)]
        content: Value,
    },

    /// Extended thinking.
    Thinking {
        thinking: String,
        #[serde(default)]
        signature: Option<String>,
    },

    /// Withheld thinking.
    RedactedThinking { data: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_text_block_compresses_to_bare_string() {
        let content = MessageContent::Blocks(vec![AnthropicBlock::Text {
            text: "Hello".to_string(),
        }]);

        assert_eq!(
            serde_json::to_value(content.compressed()).unwrap(),
            json!("Hello")
        );
    }

    #[test]
    fn concat_follows_the_merge_law() {
        // string + string concatenates directly
        let merged = MessageContent::Text("A".to_string()).concat(MessageContent::Text("B".to_string()));
        assert_eq!(merged, MessageContent::Text("AB".to_string()));

        // array + array concatenates the arrays
        let merged = MessageContent::Blocks(vec![AnthropicBlock::Text { text: "a".to_string() }])
            .concat(MessageContent::Blocks(vec![AnthropicBlock::Text { text: "b".to_string() }]));
        let MessageContent::Blocks(blocks) = &merged else {
            panic!("expected blocks");
        };
        assert_eq!(blocks.len(), 2);

        // mixed coerces to arrays first
        let merged = MessageContent::Text("a".to_string())
            .concat(MessageContent::Blocks(vec![AnthropicBlock::Text { text: "b".to_string() }]));
        let MessageContent::Blocks(blocks) = merged else {
            panic!("expected blocks");
        };
        assert_eq!(blocks, vec![
            AnthropicBlock::Text { text: "a".to_string() },
            AnthropicBlock::Text { text: "b".to_string() },
        ]);
    }

    #[test]
    fn response_with_unknown_block_type_fails_to_parse() {
        let result: Result<MessagesResponse, _> = serde_json::from_value(json!({
            "id": "msg_1",
            "content": [{"type": "bogus_block", "text": "?"}],
        }));

        assert!(result.is_err());
    }

    #[test]
    fn response_parses_mixed_content() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "model": "claude-sonnet-4-5",
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "Paris"}},
            ],
            "stop_reason": "tool_use",
        }))
        .unwrap();

        assert_eq!(response.content.len(), 2);
        assert!(matches!(&response.content[1], ResponseBlock::ToolUse { name, .. } if name == "get_weather"));
    }
}
