//! Wire types for the OpenAI Responses API.
//!
//! The Responses API replaces the messages array with a list of typed
//! input items, hoists instructions to a top-level field, and flattens
//! function tools (no nested `function` object). Tool calls and their
//! outputs are sibling items rather than message attachments.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::openai::ToolChoiceMode;

/// Request body for `POST /v1/responses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Model identifier, e.g. `"gpt-4o"`.
    pub model: String,

    /// Typed input items in conversation order.
    pub input: Vec<InputItem>,

    /// System/developer instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Server-side conversation to continue. Mutually exclusive with
    /// `previous_response_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,

    /// Previous response to continue from. Mutually exclusive with
    /// `conversation`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,

    /// Sampling temperature, 0.0 to 2.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff, (0.0, 1.0].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate, reasoning included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Request metadata: at most 16 entries, keys up to 64 characters,
    /// values up to 512.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMap<String, String>>,

    /// Whether to stream the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Whether the response is persisted server-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,

    /// Tools available to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ResponsesTool>>,

    /// How the model should use the tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ResponsesToolChoice>,

    /// Whether multiple tool calls may be emitted in one turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
}

/// One typed input item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    /// A conversation message.
    Message { role: String, content: ItemContent },

    /// A function call the model made earlier in the conversation.
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },

    /// The output of a function call, fed back to the model.
    FunctionCallOutput { call_id: String, output: String },
}

/// String-or-parts item content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemContent {
    /// Bare string shorthand.
    Text(String),
    /// Typed content parts.
    Parts(Vec<ItemPart>),
}

impl ItemContent {
    /// Collapse a one-element input-text part array to the bare string.
    pub fn compressed(self) -> Self {
        match self {
            Self::Parts(parts) if parts.len() == 1 => match parts.into_iter().next() {
                Some(ItemPart::InputText { text }) => Self::Text(text),
                Some(part) => Self::Parts(vec![part]),
                None => Self::Parts(Vec::new()),
            },
            other => other,
        }
    }
}

/// One typed content part of an input item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemPart {
    /// Text sent to the model.
    InputText { text: String },

    /// Text previously produced by the model.
    OutputText { text: String },

    /// An image, by URL/data URI or uploaded file.
    InputImage {
        #[serde(skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    /// A file, by upload id or inline data.
    InputFile {
        #[serde(skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_data: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
}

/// A tool definition. Function fields sit directly on the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesTool {
    Function {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        parameters: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        strict: Option<bool>,
    },
}

/// Tool usage control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsesToolChoice {
    /// `"none"`, `"auto"` or `"required"`.
    Mode(ToolChoiceMode),

    /// Force a specific function; the name sits directly on the object.
    Specific {
        #[serde(rename = "type")]
        kind: ResponsesToolKind,
        name: String,
    },
}

/// Discriminator for a specific tool choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsesToolKind {
    Function,
}

/// Response body of a non-streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    pub output: Vec<OutputItem>,

    #[serde(default)]
    pub incomplete_details: Option<Value>,
}

/// One output item.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// A generated message.
    Message {
        #[serde(default)]
        id: Option<String>,
        role: String,
        content: Vec<OutputPart>,
    },

    /// A function call the model wants executed.
    FunctionCall {
        #[serde(default)]
        id: Option<String>,
        call_id: String,
        name: String,
        arguments: String,
    },

    /// A reasoning trace item.
    Reasoning {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        summary: Value,
    },
}

/// One part of a generated message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputPart {
    OutputText { text: String },
    Refusal { refusal: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_input_text_part_compresses_to_bare_string() {
        let content = ItemContent::Parts(vec![ItemPart::InputText {
            text: "Hello".to_string(),
        }]);

        assert_eq!(
            serde_json::to_value(content.compressed()).unwrap(),
            json!("Hello")
        );
    }

    #[test]
    fn output_text_part_does_not_compress() {
        let content = ItemContent::Parts(vec![ItemPart::OutputText {
            text: "Hello".to_string(),
        }]);

        assert!(matches!(content.compressed(), ItemContent::Parts(_)));
    }

    #[test]
    fn specific_tool_choice_serializes_flat() {
        let choice = ResponsesToolChoice::Specific {
            kind: ResponsesToolKind::Function,
            name: "get_weather".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&choice).unwrap(),
            json!({"type": "function", "name": "get_weather"})
        );
    }

    #[test]
    fn response_parses_message_and_function_call_items() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_1",
            "status": "completed",
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": []},
                {"type": "message", "id": "msg_1", "role": "assistant", "content": [
                    {"type": "output_text", "text": "Checking."},
                ]},
                {"type": "function_call", "call_id": "call_1", "name": "get_weather", "arguments": "{}"},
            ],
        }))
        .unwrap();

        assert_eq!(response.output.len(), 3);
        assert!(matches!(&response.output[2], OutputItem::FunctionCall { name, .. } if name == "get_weather"));
    }
}
