//! Wire types for the OpenAI Chat Completions API.
//!
//! The request side is `Serialize` only and is produced exclusively by
//! [`crate::provider::openai`]; the response side is `Deserialize` only.
//! OpenRouter reuses these types and layers its own routing fields on top.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::streaming::StreamDelta;

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier, e.g. `"gpt-4o"`.
    pub model: String,

    /// Conversation messages, system/developer instructions first.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature, 0.0 to 2.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff, (0.0, 1.0].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Repetition penalty, -2.0 to 2.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    /// Topic-diversity penalty, -2.0 to 2.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sequences that stop generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    /// Whether to stream the response as SSE chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Tools available to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    /// How the model should use the tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Whether multiple tool calls may be emitted in one turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,

    /// End-user identifier for abuse tracking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// One message in the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender role.
    pub role: ChatRole,

    /// Message content. Absent for assistant messages that only carry
    /// tool calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ChatContent>,

    /// Optional participant name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// For `tool` role messages, the call this message answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Message sender role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    Developer,
    User,
    Assistant,
    Tool,
    /// Any role not yet known, preserved for forward compatibility.
    #[serde(untagged)]
    Other(String),
}

/// String-or-parts message content.
///
/// A single text part serializes as the bare string; the array form is
/// reserved for multi-modal content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    /// Bare string shorthand.
    Text(String),
    /// Multi-modal content parts.
    Parts(Vec<ContentPart>),
}

impl ChatContent {
    /// Collapse a one-element text part array to the bare string form.
    ///
    /// The two forms are documented as equivalent by the API; the string
    /// form is what the provider's own SDKs emit.
    pub fn compressed(self) -> Self {
        match self {
            Self::Parts(parts) if parts.len() == 1 => match parts.into_iter().next() {
                Some(ContentPart::Text { text }) => Self::Text(text),
                Some(part) => Self::Parts(vec![part]),
                None => Self::Parts(Vec::new()),
            },
            other => other,
        }
    }

    /// Whether the content carries nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Parts(parts) => parts.is_empty(),
        }
    }
}

/// One multi-modal content part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text { text: String },

    /// Image by URL or data URI.
    ImageUrl { image_url: ImageUrl },

    /// Inline audio input.
    InputAudio { input_audio: InputAudio },

    /// An attached file, uploaded or inline.
    File { file: FileRef },
}

/// Image reference. Data URIs are passed through intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,

    /// Detail level hint: `"low"`, `"high"` or `"auto"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Inline audio data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAudio {
    /// Base64 audio payload, no data-URI prefix.
    pub data: String,

    /// Audio format, e.g. `"wav"` or `"mp3"`.
    pub format: String,
}

/// File attachment, either by upload id or inline data URI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// A tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    /// A function with a JSON Schema contract.
    Function { function: FunctionDef },
}

/// Function specification nested inside a tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub parameters: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Tool usage control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// `"none"`, `"auto"` or `"required"`.
    Mode(ToolChoiceMode),

    /// Force a specific function.
    Specific {
        #[serde(rename = "type")]
        kind: ToolChoiceKind,
        function: FunctionChoice,
    },
}

/// Mode-based tool choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoiceMode {
    None,
    Auto,
    Required,
}

/// Discriminator for a specific tool choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoiceKind {
    Function,
}

/// The chosen function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionChoice {
    pub name: String,
}

/// A tool call emitted by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: ToolCallKind,

    pub function: FunctionCall,
}

/// Discriminator for tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallKind {
    Function,
}

/// Function call with stringified JSON arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Response body of a non-streaming chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    pub choices: Vec<ChatChoice>,
}

/// One response candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,

    pub message: ResponseMessage,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<ChatRole>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub refusal: Option<String>,

    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// One SSE chunk of a streaming chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    pub id: String,

    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// Incremental update for one choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,

    pub delta: ChunkDelta,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The incremental content of a chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<ChatRole>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub tool_calls: Option<Vec<StreamingToolCall>>,
}

/// Tool call fragments in streaming responses.
///
/// The first fragment carries the id and function name; subsequent
/// fragments append argument JSON piece by piece.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StreamingToolCall {
    /// Start of a new tool call.
    Start {
        index: usize,
        id: String,
        function: FunctionStart,
    },

    /// Argument fragment for the call at `index`.
    Delta { index: usize, function: FunctionDelta },
}

/// Initial function information of a streaming tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionStart {
    pub name: String,

    #[serde(default)]
    pub arguments: String,
}

/// Incremental function arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDelta {
    pub arguments: String,
}

impl ChatChunk {
    /// Break the chunk into resolver deltas, paired with the generation id
    /// they belong to.
    pub fn into_deltas(self) -> (String, Vec<StreamDelta>) {
        let mut deltas = Vec::new();

        for choice in self.choices {
            if let Some(text) = choice.delta.content {
                deltas.push(StreamDelta::Text(text));
            }

            for call in choice.delta.tool_calls.into_iter().flatten() {
                deltas.push(match call {
                    StreamingToolCall::Start { index, id, function } => StreamDelta::ToolCallStart {
                        index,
                        id,
                        name: function.name,
                        arguments: function.arguments,
                    },
                    StreamingToolCall::Delta { index, function } => StreamDelta::ToolCallDelta {
                        index,
                        arguments: function.arguments,
                    },
                });
            }

            if let Some(reason) = choice.finish_reason {
                deltas.push(StreamDelta::Finish(crate::response::FinishReason::from_wire(&reason)));
            }
        }

        (self.id, deltas)
    }
}
