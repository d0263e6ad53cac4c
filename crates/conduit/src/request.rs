//! Canonical, provider-neutral request descriptions.
//!
//! The orchestrator builds one of these per generation call; a
//! [`crate::Provider`] turns it into the provider's wire payload. Fields a
//! provider does not know are ignored by that provider's builder; fields a
//! provider needs beyond the common set travel in the [`GenerateRequest::params`]
//! bag and are extracted by the builder that owns them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::messages::canonical::{Message, Tool, ToolChoice};

/// A provider-agnostic generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier, e.g. `"gpt-4o"` or `"claude-sonnet-4-5"`.
    pub model: String,

    /// System/developer instructions, kept separate from the messages.
    ///
    /// Providers place this where their API wants it: Anthropic's `system`
    /// field, OpenAI's leading `system` message, Responses' `instructions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Conversation messages in order.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Tools the model may call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    /// How the model should use the tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Sampling temperature. Valid range is provider-specific and checked
    /// by the provider's builder, not here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling, where the provider supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Frequency penalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    /// Presence penalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    /// Sequences that stop generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    /// Whether the response should stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Request metadata for tracking, where the provider supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMap<String, String>>,

    /// Provider-specific parameters (Ollama's `keep_alive`/`options`,
    /// OpenRouter's `route`/`transforms`, ...), extracted by the builder
    /// that understands them.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl GenerateRequest {
    /// A request for `model` with no messages yet.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// A provider-specific parameter from the extras bag.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// A provider-agnostic embedding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Model identifier.
    pub model: String,

    /// Text(s) to embed.
    pub input: EmbedInput,

    /// Requested vector dimensionality, where the provider supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,

    /// Provider-specific parameters.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl EmbedRequest {
    /// A provider-specific parameter from the extras bag.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// One string or a batch of strings to embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbedInput {
    /// A single input.
    Single(String),
    /// A batch, embedded in order.
    Batch(Vec<String>),
}

impl EmbedInput {
    /// Number of inputs.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(items) => items.len(),
        }
    }

    /// Whether there is nothing to embed.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(text) => text.is_empty(),
            Self::Batch(items) => items.is_empty(),
        }
    }
}
