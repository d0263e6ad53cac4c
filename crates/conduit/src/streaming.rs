//! Assembly of streamed deltas into canonical messages.
//!
//! A [`StreamingMessageResolver`] serves exactly one logical stream and
//! must be driven from a single sequential callback chain; independent
//! generations each own their own resolver. The message list is
//! append-only: once a message has a completed tool call, later text opens
//! a fresh message instead of mutating the finished one.

use serde_json::Value;

use crate::messages::canonical::{Content, ContentBlock, Message, Role};
use crate::response::FinishReason;

/// One incremental update from a streaming response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamDelta {
    /// Text to append to the open message.
    Text(String),

    /// A new tool call starts; its arguments arrive in later deltas.
    ToolCallStart {
        index: usize,
        id: String,
        name: String,
        arguments: String,
    },

    /// An argument fragment for a previously started tool call.
    ToolCallDelta { index: usize, arguments: String },

    /// The provider finished this generation.
    Finish(FinishReason),
}

/// A tool call under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingToolCall {
    /// Provider-assigned call id.
    pub id: String,

    /// Tool name.
    pub name: String,

    /// Argument JSON, accumulated fragment by fragment.
    pub arguments: String,

    complete: bool,
}

impl StreamingToolCall {
    /// Whether the provider has finished emitting this call.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// An assistant message under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamingMessage {
    /// Generation id this message belongs to, set by the first delta.
    pub id: Option<String>,

    /// Accumulated text.
    pub content: String,

    /// Tool calls accumulated so far, in start order.
    pub tool_calls: Vec<StreamingToolCall>,
}

impl StreamingMessage {
    /// Append a text fragment.
    pub fn append_text(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Whether any tool call on this message has been completed, which
    /// finalizes the message for further text.
    pub fn has_completed_tool_calls(&self) -> bool {
        self.tool_calls.iter().any(StreamingToolCall::is_complete)
    }

    /// Mark every pending tool call complete.
    pub fn complete_tool_calls(&mut self) {
        for call in &mut self.tool_calls {
            call.complete = true;
        }
    }

    /// The canonical message assembled so far.
    ///
    /// Accumulated argument fragments are parsed as JSON when they form a
    /// complete document; partial JSON is preserved as a string.
    pub fn to_message(&self) -> Message {
        if self.tool_calls.is_empty() {
            return Message::assistant(self.content.clone());
        }

        let mut blocks = Vec::with_capacity(self.tool_calls.len() + 1);

        if !self.content.is_empty() {
            blocks.push(ContentBlock::Text {
                text: self.content.clone(),
            });
        }

        for call in &self.tool_calls {
            let input = serde_json::from_str(&call.arguments)
                .unwrap_or_else(|_| Value::String(call.arguments.clone()));

            blocks.push(ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input,
            });
        }

        Message {
            role: Role::Assistant,
            content: Content::Blocks(blocks),
            name: None,
        }
    }
}

/// Stateful assembler deciding which in-progress message each streamed
/// delta attaches to.
#[derive(Debug, Default)]
pub struct StreamingMessageResolver {
    messages: Vec<StreamingMessage>,
}

impl StreamingMessageResolver {
    /// An empty resolver for a fresh stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// The message new deltas should attach to.
    ///
    /// Appends a blank assistant message when the list is empty or the
    /// last message is already finalized by a completed tool call; the
    /// same open message is returned until then.
    pub fn current_message(&mut self) -> &mut StreamingMessage {
        let needs_new = match self.messages.last() {
            None => true,
            Some(last) => last.has_completed_tool_calls(),
        };

        if needs_new {
            self.messages.push(StreamingMessage::default());
        }

        // Cannot be empty here.
        let index = self.messages.len() - 1;
        &mut self.messages[index]
    }

    /// Look up a message by generation id.
    pub fn find(&self, id: &str) -> Option<&StreamingMessage> {
        self.messages.iter().find(|m| m.id.as_deref() == Some(id))
    }

    /// Look up a message by generation id for appending.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut StreamingMessage> {
        self.messages.iter_mut().find(|m| m.id.as_deref() == Some(id))
    }

    /// Apply one delta from the stream identified by `generation_id`.
    pub fn apply(&mut self, generation_id: Option<&str>, delta: StreamDelta) {
        let message = self.current_message();

        if message.id.is_none() {
            message.id = generation_id.map(str::to_string);
        }

        match delta {
            StreamDelta::Text(text) => message.append_text(&text),
            StreamDelta::ToolCallStart {
                index,
                id,
                name,
                arguments,
            } => {
                if index != message.tool_calls.len() {
                    log::warn!(
                        "tool call started at index {index}, expected {}",
                        message.tool_calls.len()
                    );
                }

                message.tool_calls.push(StreamingToolCall {
                    id,
                    name,
                    arguments,
                    complete: false,
                });
            }
            StreamDelta::ToolCallDelta { index, arguments } => match message.tool_calls.get_mut(index) {
                Some(call) => call.arguments.push_str(&arguments),
                None => log::warn!("argument fragment for unknown tool call index {index}"),
            },
            StreamDelta::Finish(reason) => {
                if reason == FinishReason::ToolCalls {
                    message.complete_tool_calls();
                }
            }
        }
    }

    /// All messages assembled so far, open ones included.
    pub fn messages(&self) -> &[StreamingMessage] {
        &self.messages
    }

    /// Finish the stream, yielding canonical messages in order.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages.iter().map(StreamingMessage::to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_call_creates_exactly_one_message() {
        let mut resolver = StreamingMessageResolver::new();
        assert!(resolver.messages().is_empty());

        resolver.current_message();
        assert_eq!(resolver.messages().len(), 1);

        // Still the same open message.
        resolver.current_message();
        resolver.current_message();
        assert_eq!(resolver.messages().len(), 1);
    }

    #[test]
    fn completed_tool_calls_finalize_the_message() {
        let mut resolver = StreamingMessageResolver::new();

        resolver.apply(
            Some("gen-1"),
            StreamDelta::ToolCallStart {
                index: 0,
                id: "call_1".to_string(),
                name: "search".to_string(),
                arguments: String::new(),
            },
        );
        resolver.apply(Some("gen-1"), StreamDelta::ToolCallDelta {
            index: 0,
            arguments: r#"{"q":"#.to_string(),
        });
        resolver.apply(Some("gen-1"), StreamDelta::ToolCallDelta {
            index: 0,
            arguments: r#""rust"}"#.to_string(),
        });
        assert_eq!(resolver.messages().len(), 1);

        resolver.apply(Some("gen-1"), StreamDelta::Finish(FinishReason::ToolCalls));

        // The finalized turn never receives appended text; a fresh message
        // starts instead.
        resolver.apply(Some("gen-2"), StreamDelta::Text("and then".to_string()));
        assert_eq!(resolver.messages().len(), 2);
        assert_eq!(resolver.messages()[1].content, "and then");
        assert!(resolver.messages()[0].content.is_empty());
    }

    #[test]
    fn argument_fragments_concatenate_into_json() {
        let mut resolver = StreamingMessageResolver::new();

        resolver.apply(
            Some("gen-1"),
            StreamDelta::ToolCallStart {
                index: 0,
                id: "call_1".to_string(),
                name: "get_weather".to_string(),
                arguments: String::new(),
            },
        );

        for fragment in [r#"{"location"#, r#"": "Par"#, r#"is"}"#] {
            resolver.apply(Some("gen-1"), StreamDelta::ToolCallDelta {
                index: 0,
                arguments: fragment.to_string(),
            });
        }
        resolver.apply(Some("gen-1"), StreamDelta::Finish(FinishReason::ToolCalls));

        let messages = resolver.into_messages();
        assert_eq!(messages.len(), 1);

        let Content::Blocks(blocks) = &messages[0].content else {
            panic!("expected blocks");
        };
        assert_eq!(blocks[0], ContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "get_weather".to_string(),
            input: json!({"location": "Paris"}),
        });
    }

    #[test]
    fn text_deltas_append_to_the_open_message() {
        let mut resolver = StreamingMessageResolver::new();

        for piece in ["Hel", "lo, ", "world"] {
            resolver.apply(Some("gen-1"), StreamDelta::Text(piece.to_string()));
        }

        assert_eq!(resolver.messages().len(), 1);
        assert_eq!(resolver.messages()[0].content, "Hello, world");

        let messages = resolver.into_messages();
        assert_eq!(messages[0].flatten_text(), "Hello, world");
    }

    #[test]
    fn find_by_generation_id_is_a_pure_read() {
        let mut resolver = StreamingMessageResolver::new();
        resolver.apply(Some("gen-1"), StreamDelta::Text("a".to_string()));

        assert!(resolver.find("gen-1").is_some());
        assert!(resolver.find("gen-2").is_none());
        assert_eq!(resolver.messages().len(), 1);

        resolver.find_mut("gen-1").unwrap().append_text("b");
        assert_eq!(resolver.messages()[0].content, "ab");
    }
}
