//! Provider-neutral message and content model.
//!
//! Every provider adapter converts to and from these types. Casting is
//! deliberately forgiving — a bare string becomes a one-block text array,
//! untagged mappings are inferred from the keys they carry — while
//! serialization is strict and emits exactly one canonical form.
//!
//! The dispatch order for untagged mappings is part of the contract and is
//! enumerated per type below; ambiguous shapes are rejected rather than
//! guessed at, and unknown `type` tags are always a hard error.

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CastError;

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// Developer instructions (OpenAI's successor to system).
    Developer,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Tool execution result.
    Tool,
}

impl Role {
    pub(crate) fn cast(value: &Value) -> Result<Self, CastError> {
        let Some(s) = value.as_str() else {
            return Err(CastError::shape("role", value));
        };

        match s {
            "system" => Ok(Self::System),
            "developer" => Ok(Self::Developer),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "tool" => Ok(Self::Tool),
            other => Err(CastError::UnknownTag {
                context: "role",
                tag: other.to_string(),
            }),
        }
    }

    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Developer => "developer",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A canonical conversation message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Sender role.
    pub role: Role,

    /// Message content, a string or an ordered sequence of blocks.
    pub content: Content,

    /// Optional participant name, propagated through response splitting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// A user message from anything castable to content.
    pub fn user(content: impl Into<Content>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            name: None,
        }
    }

    /// An assistant message from anything castable to content.
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            name: None,
        }
    }

    /// A system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Content::Text(text.into()),
            name: None,
        }
    }

    /// Flattened textual representation: all text blocks in order,
    /// newline-separated. Non-text blocks contribute nothing here but stay
    /// accessible through [`Message::content`].
    pub fn flatten_text(&self) -> String {
        match &self.content {
            Content::Text(text) => text.clone(),
            Content::Blocks(blocks) => blocks.iter().filter_map(ContentBlock::as_text).join("\n"),
        }
    }

    pub(crate) fn cast(value: Value) -> Result<Self, CastError> {
        let Value::Object(mut map) = value else {
            return Err(CastError::shape("message", &value));
        };

        let role = map
            .get("role")
            .ok_or(CastError::MissingField {
                context: "message",
                field: "role",
            })
            .and_then(Role::cast)?;

        let content = match map.remove("content") {
            Some(Value::Null) | None => Content::default(),
            Some(value) => Content::cast(value)?,
        };

        let name = match map.remove("name") {
            Some(Value::String(name)) => Some(name),
            Some(Value::Null) | None => None,
            Some(other) => return Err(CastError::shape("message name", &other)),
        };

        Ok(Self { role, content, name })
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::cast(value).map_err(serde::de::Error::custom)
    }
}

/// Message content: a plain string or an ordered sequence of blocks.
///
/// The string form is shorthand for a single text block; the two cast to
/// equivalent collections and serialize identically where the target
/// provider accepts the compressed form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    /// Shorthand for one text block.
    Text(String),
    /// Ordered content blocks.
    Blocks(Vec<ContentBlock>),
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<ContentBlock>> for Content {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        Self::Blocks(blocks)
    }
}

impl Content {
    /// Cast any accepted content shape.
    ///
    /// A string is the text shorthand, an array casts element-wise, and a
    /// lone mapping is treated as a single block.
    pub fn cast(value: Value) -> Result<Self, CastError> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Array(items) => Ok(Self::Blocks(
                items.into_iter().map(ContentBlock::cast).collect::<Result<_, _>>()?,
            )),
            value @ Value::Object(_) => Ok(Self::Blocks(vec![ContentBlock::cast(value)?])),
            other => Err(CastError::shape("content", &other)),
        }
    }

    /// The content as a uniform block list; the text shorthand becomes a
    /// single text block.
    pub fn to_blocks(&self) -> Vec<ContentBlock> {
        match self {
            Self::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
            Self::Blocks(blocks) => blocks.clone(),
        }
    }

    /// Whether the content carries nothing at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Blocks(blocks) => blocks.is_empty(),
        }
    }

    /// Ordered concatenation for same-role message grouping.
    ///
    /// String + string concatenates directly; anything else coerces both
    /// sides to block lists and concatenates those.
    pub fn concat(self, other: Self) -> Self {
        match (self, other) {
            (Self::Text(mut a), Self::Text(b)) => {
                a.push_str(&b);
                Self::Text(a)
            }
            (a, b) => {
                let mut blocks = a.to_blocks();
                blocks.extend(b.to_blocks());
                Self::Blocks(blocks)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::cast(value).map_err(serde::de::Error::custom)
    }
}

/// One tagged unit of message content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },

    /// An image, inline or by reference.
    Image { source: Source },

    /// A document (PDF, plain text, or an uploaded file).
    Document { source: Source },

    /// Audio input.
    Audio { source: Source },

    /// A tool invocation requested by the model.
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },

    /// The result of executing a tool, correlated by id.
    ToolResult {
        tool_use_id: String,
        content: Content,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },

    /// Extended thinking emitted by the model.
    Thinking {
        thinking: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },

    /// Thinking the provider withheld.
    RedactedThinking { data: String },

    /// A search result with its own nested content.
    SearchResult {
        source: String,
        title: String,
        content: Vec<ContentBlock>,
    },

    /// The model declined to answer.
    Refusal { refusal: String },
}

impl ContentBlock {
    /// The text of a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Cast any accepted block shape.
    ///
    /// Dispatch order:
    /// 1. a mapping with an explicit `type` switches on the tag, and an
    ///    unrecognized tag is fatal;
    /// 2. a mapping without `type` is inferred from its keys, checked in
    ///    this order: `text`, `image`, `document`, `tool_use_id`,
    ///    `data` + `media_type`, `url`, `file_id`;
    /// 3. a bare string is a text block.
    pub fn cast(value: Value) -> Result<Self, CastError> {
        match value {
            Value::String(text) => Ok(Self::Text { text }),
            Value::Object(map) => {
                if let Some(tag) = map.get("type") {
                    let Some(tag) = tag.as_str() else {
                        return Err(CastError::shape("content block type", tag));
                    };
                    Self::cast_tagged(tag, &map)
                } else {
                    Self::infer(map)
                }
            }
            other => Err(CastError::shape("content block", &other)),
        }
    }

    fn cast_tagged(tag: &str, map: &serde_json::Map<String, Value>) -> Result<Self, CastError> {
        match tag {
            "text" => Ok(Self::Text {
                text: require_str(map, "text", "text block")?,
            }),
            "image" => Ok(Self::Image {
                source: require_source(map, "image block")?,
            }),
            "document" => Ok(Self::Document {
                source: require_source(map, "document block")?,
            }),
            "audio" => Ok(Self::Audio {
                source: require_source(map, "audio block")?,
            }),
            "tool_use" => Ok(Self::ToolUse {
                id: require_str(map, "id", "tool_use block")?,
                name: require_str(map, "name", "tool_use block")?,
                input: map.get("input").cloned().ok_or(CastError::MissingField {
                    context: "tool_use block",
                    field: "input",
                })?,
            }),
            "tool_result" => Ok(Self::ToolResult {
                tool_use_id: require_str(map, "tool_use_id", "tool_result block")?,
                content: match map.get("content") {
                    Some(value) => Content::cast(value.clone())?,
                    None => Content::default(),
                },
                is_error: map.get("is_error").and_then(Value::as_bool),
            }),
            "thinking" => Ok(Self::Thinking {
                thinking: require_str(map, "thinking", "thinking block")?,
                signature: map.get("signature").and_then(Value::as_str).map(str::to_string),
            }),
            "redacted_thinking" => Ok(Self::RedactedThinking {
                data: require_str(map, "data", "redacted_thinking block")?,
            }),
            "search_result" => Ok(Self::SearchResult {
                source: require_str(map, "source", "search_result block")?,
                title: require_str(map, "title", "search_result block")?,
                content: match map.get("content") {
                    Some(value) => Content::cast(value.clone())?.to_blocks(),
                    None => Vec::new(),
                },
            }),
            "refusal" => Ok(Self::Refusal {
                refusal: require_str(map, "refusal", "refusal block")?,
            }),
            other => Err(CastError::UnknownTag {
                context: "content block",
                tag: other.to_string(),
            }),
        }
    }

    // Best-effort inference for untagged mappings. The precedence order is
    // fixed; shapes matching none of the rules are an error, never a guess.
    fn infer(map: serde_json::Map<String, Value>) -> Result<Self, CastError> {
        if map.contains_key("text") {
            return Ok(Self::Text {
                text: require_str(&map, "text", "text block")?,
            });
        }

        if let Some(image) = map.get("image") {
            return Ok(Self::Image {
                source: Source::cast(image.clone())?,
            });
        }

        if let Some(document) = map.get("document") {
            return Ok(Self::Document {
                source: Source::cast(document.clone())?,
            });
        }

        if map.contains_key("tool_use_id") {
            return Self::cast_tagged("tool_result", &map);
        }

        if map.contains_key("data") && map.contains_key("media_type") {
            let source = Source::cast(Value::Object(map))?;
            let is_image = match &source {
                Source::Base64 { media_type, .. } => media_type.starts_with("image/"),
                _ => true,
            };

            return Ok(if is_image {
                Self::Image { source }
            } else {
                Self::Document { source }
            });
        }

        if map.contains_key("url") {
            return Ok(Self::Image {
                source: Source::cast(Value::Object(map))?,
            });
        }

        if map.contains_key("file_id") {
            return Ok(Self::Document {
                source: Source::cast(Value::Object(map))?,
            });
        }

        Err(CastError::UnsupportedShape {
            target: "content block",
            found: format!("an object with keys [{}]", map.keys().join(", ")),
        })
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::cast(value).map_err(serde::de::Error::custom)
    }
}

/// Where image/document/audio bytes come from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    /// Inline base64 data, without any data-URI prefix.
    Base64 { media_type: String, data: String },

    /// External URL the provider fetches.
    Url { url: String },

    /// A file previously uploaded to the provider.
    File { file_id: String },

    /// Plain text, used for text-media documents.
    Text { media_type: String, text: String },
}

impl Source {
    /// Cast any accepted source shape.
    ///
    /// Dispatch order: explicit `type` tag, then key inference
    /// (`data` + `media_type`, `url`, `file_id`, `text`), then string
    /// sniffing — a `data:` URI becomes a base64 source with the prefix
    /// stripped, an `http(s)://` string becomes a URL source.
    pub fn cast(value: Value) -> Result<Self, CastError> {
        match value {
            Value::String(s) => Self::from_string(s),
            Value::Object(map) => {
                if let Some(tag) = map.get("type") {
                    let Some(tag) = tag.as_str() else {
                        return Err(CastError::shape("source type", tag));
                    };
                    Self::cast_tagged(tag, &map)
                } else {
                    Self::infer(&map)
                }
            }
            other => Err(CastError::shape("source", &other)),
        }
    }

    fn cast_tagged(tag: &str, map: &serde_json::Map<String, Value>) -> Result<Self, CastError> {
        match tag {
            "base64" => Ok(Self::Base64 {
                media_type: require_str(map, "media_type", "base64 source")?,
                data: strip_data_uri(&require_str(map, "data", "base64 source")?),
            }),
            "url" => Ok(Self::Url {
                url: require_str(map, "url", "url source")?,
            }),
            "file" => Ok(Self::File {
                file_id: require_str(map, "file_id", "file source")?,
            }),
            "text" => Ok(Self::Text {
                media_type: match map.get("media_type").and_then(Value::as_str) {
                    Some(media_type) => media_type.to_string(),
                    None => "text/plain".to_string(),
                },
                text: require_str(map, "text", "text source")?,
            }),
            other => Err(CastError::UnknownTag {
                context: "source",
                tag: other.to_string(),
            }),
        }
    }

    fn infer(map: &serde_json::Map<String, Value>) -> Result<Self, CastError> {
        if map.contains_key("data") && map.contains_key("media_type") {
            return Self::cast_tagged("base64", map);
        }

        if map.contains_key("url") {
            return Self::cast_tagged("url", map);
        }

        if map.contains_key("file_id") {
            return Self::cast_tagged("file", map);
        }

        if map.contains_key("text") {
            return Self::cast_tagged("text", map);
        }

        Err(CastError::UnsupportedShape {
            target: "source",
            found: format!("an object with keys [{}]", map.keys().join(", ")),
        })
    }

    fn from_string(s: String) -> Result<Self, CastError> {
        if let Some(rest) = s.strip_prefix("data:") {
            let Some((header, data)) = rest.split_once(',') else {
                return Err(CastError::UnsupportedShape {
                    target: "source",
                    found: "a data: URI without a comma".to_string(),
                });
            };

            let media_type = header.strip_suffix(";base64").unwrap_or(header);

            return Ok(Self::Base64 {
                media_type: media_type.to_string(),
                data: data.to_string(),
            });
        }

        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Url { url: s });
        }

        Err(CastError::UnsupportedShape {
            target: "source",
            found: "a string that is neither a data: URI nor an http(s) URL".to_string(),
        })
    }

    /// Reassemble the data-URI form, for providers that embed images as
    /// `data:<media>;base64,<data>` URLs.
    pub fn to_data_uri(&self) -> Option<String> {
        match self {
            Self::Base64 { media_type, data } => Some(format!("data:{media_type};base64,{data}")),
            Self::Url { url } => Some(url.clone()),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::cast(value).map_err(serde::de::Error::custom)
    }
}

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    /// A function with a JSON Schema parameter contract.
    Function {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        parameters: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        strict: Option<bool>,
    },

    /// A free-form tool the model calls with unconstrained text.
    Custom {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Tool {
    /// Tool name regardless of variant.
    pub fn name(&self) -> &str {
        match self {
            Self::Function { name, .. } | Self::Custom { name, .. } => name,
        }
    }

    /// Cast any accepted tool shape: an explicit `type` tag, the OpenAI
    /// nested `{function: {...}}` wrapper, or the Anthropic flat
    /// `{name, input_schema}` form.
    pub fn cast(value: Value) -> Result<Self, CastError> {
        let Value::Object(map) = value else {
            return Err(CastError::shape("tool", &value));
        };

        if let Some(tag) = map.get("type") {
            let Some(tag) = tag.as_str() else {
                return Err(CastError::shape("tool type", tag));
            };

            return match tag {
                "function" => match map.get("function") {
                    Some(Value::Object(function)) => Self::function_from(function),
                    Some(other) => Err(CastError::shape("tool function", other)),
                    None => Self::function_from(&map),
                },
                "custom" => Ok(Self::Custom {
                    name: require_str(&map, "name", "custom tool")?,
                    description: map.get("description").and_then(Value::as_str).map(str::to_string),
                }),
                other => Err(CastError::UnknownTag {
                    context: "tool",
                    tag: other.to_string(),
                }),
            };
        }

        if let Some(Value::Object(function)) = map.get("function") {
            return Self::function_from(function);
        }

        if map.contains_key("name") {
            return Self::function_from(&map);
        }

        Err(CastError::shape("tool", &Value::Object(map)))
    }

    fn function_from(map: &serde_json::Map<String, Value>) -> Result<Self, CastError> {
        let parameters = map
            .get("parameters")
            .or_else(|| map.get("input_schema"))
            .cloned()
            .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}}));

        Ok(Self::Function {
            name: require_str(map, "name", "function tool")?,
            description: map.get("description").and_then(Value::as_str).map(str::to_string),
            parameters,
            strict: map.get("strict").and_then(Value::as_bool),
        })
    }
}

impl<'de> Deserialize<'de> for Tool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::cast(value).map_err(serde::de::Error::custom)
    }
}

/// How the model should use the available tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// The model decides.
    Auto,
    /// The model must call at least one tool.
    Any,
    /// Tools are disabled for this turn.
    None,
    /// The model must call this specific tool.
    Tool { name: String },
}

impl ToolChoice {
    /// Cast any accepted choice shape. String shorthands `"auto"`,
    /// `"any"`/`"required"` and `"none"` map to the corresponding variants;
    /// any other string is an unknown tag, not a tool name.
    pub fn cast(value: Value) -> Result<Self, CastError> {
        match value {
            Value::String(s) => match s.as_str() {
                "auto" => Ok(Self::Auto),
                "any" | "required" => Ok(Self::Any),
                "none" => Ok(Self::None),
                other => Err(CastError::UnknownTag {
                    context: "tool choice",
                    tag: other.to_string(),
                }),
            },
            Value::Object(map) => {
                if let Some(tag) = map.get("type").and_then(Value::as_str) {
                    return match tag {
                        "auto" => Ok(Self::Auto),
                        "any" | "required" => Ok(Self::Any),
                        "none" => Ok(Self::None),
                        "tool" => Ok(Self::Tool {
                            name: require_str(&map, "name", "tool choice")?,
                        }),
                        "function" => match map.get("function") {
                            Some(Value::Object(function)) => Ok(Self::Tool {
                                name: require_str(function, "name", "tool choice")?,
                            }),
                            _ => Err(CastError::MissingField {
                                context: "tool choice",
                                field: "function",
                            }),
                        },
                        other => Err(CastError::UnknownTag {
                            context: "tool choice",
                            tag: other.to_string(),
                        }),
                    };
                }

                if map.contains_key("name") {
                    return Ok(Self::Tool {
                        name: require_str(&map, "name", "tool choice")?,
                    });
                }

                Err(CastError::shape("tool choice", &Value::Object(map)))
            }
            other => Err(CastError::shape("tool choice", &other)),
        }
    }
}

impl<'de> Deserialize<'de> for ToolChoice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::cast(value).map_err(serde::de::Error::custom)
    }
}

fn require_str(map: &serde_json::Map<String, Value>, field: &'static str, context: &'static str) -> Result<String, CastError> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(CastError::shape(context, other)),
        None => Err(CastError::MissingField { context, field }),
    }
}

fn require_source(map: &serde_json::Map<String, Value>, context: &'static str) -> Result<Source, CastError> {
    match map.get("source") {
        Some(value) => Source::cast(value.clone()),
        None => Err(CastError::MissingField {
            context,
            field: "source",
        }),
    }
}

fn strip_data_uri(data: &str) -> String {
    match data.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((_, payload)) => payload.to_string(),
        None => data.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_shorthand_casts_to_text_content() {
        let content = Content::cast(json!("Hello")).unwrap();
        assert_eq!(content, Content::Text("Hello".to_string()));
    }

    #[test]
    fn shorthand_and_block_array_cast_to_equivalent_collections() {
        let short = Content::cast(json!("Hello")).unwrap();
        let long = Content::cast(json!([{"type": "text", "text": "Hello"}])).unwrap();

        assert_eq!(short.to_blocks(), long.to_blocks());
    }

    #[test]
    fn round_trip_is_stable_after_one_cycle() {
        let inputs = [
            json!("Hello"),
            json!([{"type": "text", "text": "a"}, {"type": "image", "source": {"type": "url", "url": "https://x.test/a.png"}}]),
            json!([{"type": "tool_use", "id": "t1", "name": "search", "input": {"q": "rust"}}]),
            json!([{"type": "tool_result", "tool_use_id": "t1", "content": "42", "is_error": false}]),
            json!([{"type": "thinking", "thinking": "hm", "signature": "sig"}]),
            json!([{"type": "search_result", "source": "https://x.test", "title": "A", "content": [{"type": "text", "text": "b"}]}]),
        ];

        for input in inputs {
            let once = serde_json::to_value(Content::cast(input).unwrap()).unwrap();
            let twice = serde_json::to_value(Content::cast(once.clone()).unwrap()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn unknown_block_tag_is_a_hard_error() {
        let err = ContentBlock::cast(json!({"type": "bogus_block"})).unwrap_err();

        match err {
            CastError::UnknownTag { context, tag } => {
                assert_eq!(context, "content block");
                assert_eq!(tag, "bogus_block");
            }
            other => panic!("expected unknown tag error, got {other}"),
        }
    }

    #[test]
    fn block_inference_precedence() {
        // text wins over everything else
        let block = ContentBlock::cast(json!({"text": "hi", "url": "https://x.test"})).unwrap();
        assert!(matches!(block, ContentBlock::Text { .. }));

        // image key before raw source keys
        let block = ContentBlock::cast(json!({"image": {"url": "https://x.test/a.png"}})).unwrap();
        assert!(matches!(block, ContentBlock::Image { source: Source::Url { .. } }));

        let block = ContentBlock::cast(json!({"document": "data:application/pdf;base64,QUJD"})).unwrap();
        match block {
            ContentBlock::Document {
                source: Source::Base64 { media_type, data },
            } => {
                assert_eq!(media_type, "application/pdf");
                assert_eq!(data, "QUJD");
            }
            other => panic!("expected document block, got {other:?}"),
        }

        // bare data + media_type: image media goes to an image block
        let block = ContentBlock::cast(json!({"data": "QUJD", "media_type": "image/png"})).unwrap();
        assert!(matches!(block, ContentBlock::Image { .. }));

        let block = ContentBlock::cast(json!({"data": "QUJD", "media_type": "application/pdf"})).unwrap();
        assert!(matches!(block, ContentBlock::Document { .. }));

        let block = ContentBlock::cast(json!({"url": "https://x.test/b.png"})).unwrap();
        assert!(matches!(block, ContentBlock::Image { .. }));

        let block = ContentBlock::cast(json!({"file_id": "file-123"})).unwrap();
        assert!(matches!(block, ContentBlock::Document { source: Source::File { .. } }));
    }

    #[test]
    fn ambiguous_block_shape_is_rejected() {
        let err = ContentBlock::cast(json!({"foo": 1, "bar": 2})).unwrap_err();
        assert!(matches!(err, CastError::UnsupportedShape { .. }));
    }

    #[test]
    fn source_string_sniffing() {
        let source = Source::cast(json!("data:image/jpeg;base64,/9j/4AAQ")).unwrap();
        assert_eq!(
            source,
            Source::Base64 {
                media_type: "image/jpeg".to_string(),
                data: "/9j/4AAQ".to_string(),
            }
        );

        let source = Source::cast(json!("https://example.com/cat.png")).unwrap();
        assert_eq!(
            source,
            Source::Url {
                url: "https://example.com/cat.png".to_string()
            }
        );

        assert!(Source::cast(json!("just some text")).is_err());
    }

    #[test]
    fn base64_source_strips_data_uri_prefix_from_data_field() {
        let source = Source::cast(json!({
            "type": "base64",
            "media_type": "image/png",
            "data": "data:image/png;base64,QUJD",
        }))
        .unwrap();

        assert_eq!(
            source,
            Source::Base64 {
                media_type: "image/png".to_string(),
                data: "QUJD".to_string(),
            }
        );
    }

    #[test]
    fn tool_use_requires_all_fields() {
        let err = ContentBlock::cast(json!({"type": "tool_use", "id": "t1", "name": "search"})).unwrap_err();
        assert!(matches!(
            err,
            CastError::MissingField {
                field: "input",
                ..
            }
        ));
    }

    #[test]
    fn tool_cast_accepts_all_three_shapes() {
        let tagged = Tool::cast(json!({
            "type": "function",
            "function": {"name": "get_weather", "parameters": {"type": "object"}},
        }))
        .unwrap();

        let nested = Tool::cast(json!({
            "function": {"name": "get_weather", "parameters": {"type": "object"}},
        }))
        .unwrap();

        let flat = Tool::cast(json!({
            "name": "get_weather",
            "input_schema": {"type": "object"},
        }))
        .unwrap();

        assert_eq!(tagged, nested);
        assert_eq!(tagged, flat);
        assert_eq!(tagged.name(), "get_weather");
    }

    #[test]
    fn tool_choice_string_shorthand() {
        assert_eq!(ToolChoice::cast(json!("auto")).unwrap(), ToolChoice::Auto);
        assert_eq!(ToolChoice::cast(json!("required")).unwrap(), ToolChoice::Any);
        assert_eq!(ToolChoice::cast(json!("none")).unwrap(), ToolChoice::None);
        assert!(ToolChoice::cast(json!("my_tool")).is_err());

        let specific = ToolChoice::cast(json!({"type": "tool", "name": "search"})).unwrap();
        assert_eq!(
            specific,
            ToolChoice::Tool {
                name: "search".to_string()
            }
        );

        let openai_style = ToolChoice::cast(json!({"type": "function", "function": {"name": "search"}})).unwrap();
        assert_eq!(specific, openai_style);
    }

    #[test]
    fn flatten_text_joins_text_blocks_only() {
        let message = Message::assistant(vec![
            ContentBlock::Text { text: "one".to_string() },
            ContentBlock::ToolUse {
                id: "t1".to_string(),
                name: "search".to_string(),
                input: json!({}),
            },
            ContentBlock::Text { text: "two".to_string() },
        ]);

        assert_eq!(message.flatten_text(), "one\ntwo");
    }

    #[test]
    fn message_cast_requires_role() {
        let err = Message::cast(json!({"content": "hi"})).unwrap_err();
        assert!(matches!(err, CastError::MissingField { field: "role", .. }));

        let err = Message::cast(json!({"role": "robot", "content": "hi"})).unwrap_err();
        assert!(matches!(err, CastError::UnknownTag { context: "role", .. }));
    }
}
