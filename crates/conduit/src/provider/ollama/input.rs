//! Canonical request to Ollama wire format.
//!
//! Ollama nests every sampling/runtime parameter under `options`. The
//! builder folds the canonical sampling fields and any recognized
//! top-level option keys from the params bag into that object; an explicit
//! `options` entry in the params bag always wins over a folded value.

use serde_json::{Map, Value};

use crate::error::CastError;
use crate::messages::canonical::{Content, ContentBlock, Message, Role, Source};
use crate::messages::ollama::{ChatRequest, EmbedRequest as WireEmbedRequest, OllamaFunctionCall, OllamaMessage, OllamaRole, OllamaToolCall};
use crate::provider::openai::input::convert_tool;
use crate::request::{EmbedRequest, GenerateRequest};
use crate::validation::{self, Validate, ValidationError};

const PROVIDER: &str = "ollama";

/// Option keys recognized when they appear flattened at the top level of
/// the params bag.
const OPTION_KEYS: &[&str] = &[
    "mirostat",
    "mirostat_eta",
    "mirostat_tau",
    "min_p",
    "num_ctx",
    "num_gpu",
    "num_keep",
    "num_predict",
    "num_thread",
    "repeat_last_n",
    "repeat_penalty",
    "seed",
    "typical_p",
];

/// Build the wire request.
pub(crate) fn chat_request(request: &GenerateRequest) -> Result<ChatRequest, CastError> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(instructions) = &request.instructions {
        messages.push(OllamaMessage {
            role: OllamaRole::System,
            content: instructions.clone(),
            images: None,
            tool_calls: None,
        });
    }

    for message in &request.messages {
        messages.push(convert_message(message)?);
    }

    let messages = group_messages(messages);

    let tools = match &request.tools {
        Some(tools) => Some(tools.iter().map(convert_tool).collect::<Result<Vec<_>, _>>()?),
        None => None,
    };

    let options = fold_options(request);

    Ok(ChatRequest {
        model: request.model.clone(),
        messages,
        tools,
        // Ollama streams unless told otherwise.
        stream: Some(request.stream.unwrap_or(false)),
        format: request.param("format").cloned(),
        keep_alive: request.param("keep_alive").cloned(),
        raw: request.param("raw").and_then(Value::as_bool),
        options: if options.is_empty() { None } else { Some(options) },
    })
}

/// Merge consecutive same-role messages; text concatenates directly.
fn group_messages(messages: Vec<OllamaMessage>) -> Vec<OllamaMessage> {
    let mut grouped: Vec<OllamaMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        match grouped.last_mut() {
            Some(last) if last.role == message.role => last.merge(message),
            _ => grouped.push(message),
        }
    }

    grouped
}

/// Assemble the `options` object: explicit `options` entries from the
/// params bag win, then flattened top-level option keys, then the
/// canonical sampling fields.
fn fold_options(request: &GenerateRequest) -> Map<String, Value> {
    let mut options = match request.param("options") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    for key in OPTION_KEYS {
        if let Some(value) = request.param(key) {
            options.entry((*key).to_string()).or_insert_with(|| value.clone());
        }
    }

    let folded: [(&str, Option<Value>); 7] = [
        ("temperature", request.temperature.map(f32_value)),
        ("top_p", request.top_p.map(f32_value)),
        ("top_k", request.top_k.map(Value::from)),
        ("num_predict", request.max_tokens.map(Value::from)),
        ("frequency_penalty", request.frequency_penalty.map(f32_value)),
        ("presence_penalty", request.presence_penalty.map(f32_value)),
        ("stop", request.stop_sequences.as_ref().map(|s| Value::from(s.clone()))),
    ];

    for (key, value) in folded {
        if let Some(value) = value {
            options.entry(key.to_string()).or_insert(value);
        }
    }

    options
}

fn f32_value(v: f32) -> Value {
    serde_json::Number::from_f64(f64::from(v))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn convert_message(message: &Message) -> Result<OllamaMessage, CastError> {
    let role = match message.role {
        Role::System | Role::Developer => OllamaRole::System,
        Role::User => OllamaRole::User,
        Role::Assistant => OllamaRole::Assistant,
        Role::Tool => OllamaRole::Tool,
    };

    let mut content = String::new();
    let mut images = Vec::new();
    let mut tool_calls = Vec::new();

    match &message.content {
        Content::Text(text) => content.push_str(text),
        Content::Blocks(blocks) => {
            for block in blocks {
                match block {
                    ContentBlock::Text { text } => {
                        if !content.is_empty() {
                            content.push('\n');
                        }
                        content.push_str(text);
                    }
                    ContentBlock::Image { source } => match source {
                        // Ollama wants bare base64, no data-URI prefix.
                        Source::Base64 { data, .. } => images.push(data.clone()),
                        _ => {
                            return Err(CastError::Unsupported {
                                provider: PROVIDER,
                                what: "non-inline image sources",
                            });
                        }
                    },
                    ContentBlock::ToolUse { name, input, .. } => tool_calls.push(OllamaToolCall {
                        function: OllamaFunctionCall {
                            name: name.clone(),
                            arguments: input.clone(),
                        },
                    }),
                    ContentBlock::ToolResult { content: result, .. } => {
                        if !content.is_empty() {
                            content.push('\n');
                        }
                        match result {
                            Content::Text(text) => content.push_str(text),
                            Content::Blocks(blocks) => {
                                let text = blocks
                                    .iter()
                                    .filter_map(ContentBlock::as_text)
                                    .collect::<Vec<_>>()
                                    .join("\n");
                                content.push_str(&text);
                            }
                        }
                    }
                    _ => {
                        return Err(CastError::Unsupported {
                            provider: PROVIDER,
                            what: "document, audio and thinking content",
                        });
                    }
                }
            }
        }
    }

    Ok(OllamaMessage {
        role,
        content,
        images: if images.is_empty() { None } else { Some(images) },
        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
    })
}

impl Validate for ChatRequest {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let option_f32 = |key: &str| {
            self.options
                .as_ref()
                .and_then(|o| o.get(key))
                .and_then(Value::as_f64)
                .map(|v| v as f32)
        };

        validation::check_range(&mut errors, "options.temperature", option_f32("temperature"), 0.0, 2.0);
        validation::check_range_exclusive_min(&mut errors, "options.top_p", option_f32("top_p"), 0.0, 1.0);

        if self.messages.is_empty() {
            errors.push(ValidationError::new("messages", "must not be empty"));
        }

        for (i, message) in self.messages.iter().enumerate() {
            let has_images = message.images.as_ref().is_some_and(|im| !im.is_empty());
            let has_tool_calls = message.tool_calls.as_ref().is_some_and(|c| !c.is_empty());
            let requires_content = matches!(message.role, OllamaRole::User | OllamaRole::Assistant);

            if requires_content && message.content.is_empty() && !has_images && !has_tool_calls {
                errors.push(ValidationError::new(format!("messages[{i}].content"), "must not be empty"));
            }
        }

        errors
    }
}

/// Build the wire embed request.
pub(crate) fn embed_request(request: &EmbedRequest) -> WireEmbedRequest {
    WireEmbedRequest {
        model: request.model.clone(),
        input: request.input.clone(),
        options: match request.param("options") {
            Some(Value::Object(map)) => Some(map.clone()),
            _ => None,
        },
        keep_alive: request.param("keep_alive").cloned(),
    }
}

impl Validate for WireEmbedRequest {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.input.is_empty() {
            errors.push(ValidationError::new("input", "must not be empty"));
        }

        errors
    }
}
