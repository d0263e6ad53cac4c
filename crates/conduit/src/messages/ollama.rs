//! Wire types for the Ollama chat and embed APIs.
//!
//! Ollama keeps message content as a plain string with a separate `images`
//! array of bare base64 payloads, nests all sampling parameters under
//! `options`, and reports token counts at the response's top level. Tool
//! definitions reuse the OpenAI function shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::messages::openai;
use crate::request::EmbedInput;

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier, e.g. `"llama3.2"`.
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<OllamaMessage>,

    /// Tools available to the model, in OpenAI function format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<openai::Tool>>,

    /// Whether to stream. Ollama streams by default, so the builder always
    /// sets this explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Output format: the string `"json"` or a JSON Schema object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,

    /// How long the model stays loaded: a duration string like `"5m"` or
    /// seconds as a number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<Value>,

    /// Bypass prompt templating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,

    /// Runtime options: sampling parameters, context size, seed, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

/// One conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: OllamaRole,

    /// Message text. Always a plain string; images travel separately.
    pub content: String,

    /// Bare base64 image payloads, data-URI prefixes stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    /// Tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OllamaToolCall>>,
}

impl OllamaMessage {
    /// Merge `other` into this message for same-role grouping: text
    /// concatenates directly, image lists concatenate in order.
    pub fn merge(&mut self, other: Self) {
        self.content.push_str(&other.content);

        if let Some(images) = other.images {
            self.images.get_or_insert_with(Vec::new).extend(images);
        }

        if let Some(calls) = other.tool_calls {
            self.tool_calls.get_or_insert_with(Vec::new).extend(calls);
        }
    }
}

/// Message sender role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OllamaRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call. Unlike OpenAI, arguments arrive as a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaToolCall {
    pub function: OllamaFunctionCall,
}

/// The function invoked by a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaFunctionCall {
    pub name: String,
    pub arguments: Value,
}

/// Response body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,

    pub message: ResponseMessage,

    #[serde(default)]
    pub done: bool,

    #[serde(default)]
    pub done_reason: Option<String>,
}

/// The generated message.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<OllamaRole>,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub tool_calls: Option<Vec<OllamaToolCall>>,
}

/// Request body for `POST /api/embed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub model: String,

    /// One string or a batch.
    pub input: EmbedInput,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<Value>,
}

/// Response body of `POST /api/embed`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    #[serde(default)]
    pub model: Option<String>,

    pub embeddings: Vec<Vec<f32>>,
}
