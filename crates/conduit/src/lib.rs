//! Provider-agnostic request/response translation for generative AI APIs.
//!
//! This crate owns the bidirectional mapping between a canonical
//! message/content model and each supported provider's native JSON schema:
//! OpenAI Chat Completions, OpenAI Responses, Anthropic Messages, Ollama,
//! OpenRouter, and a deterministic mock used by tests.
//!
//! The flow is always the same:
//!
//! ```text
//! GenerateRequest -> Provider::build -> wire JSON -> (transport, elsewhere)
//!                 -> raw response JSON -> Provider::normalize_prompt -> PromptResponse
//! ```
//!
//! Builders cast permissively (string shorthands, untagged mappings) and
//! serialize strictly; normalizers reconstruct canonical messages, split
//! mixed assistant content, and map heterogeneous token-usage payloads onto
//! one [`Usage`] shape. Streaming deltas are assembled by
//! [`StreamingMessageResolver`].
//!
//! Nothing in here performs I/O. Transport, retries and authentication
//! headers belong to the caller; credential resolution lives in the
//! `config` crate.

mod error;
mod messages;
mod provider;
mod request;
mod response;
mod streaming;
mod validation;

pub use error::{CastError, Error, NormalizeError, Result};
pub use messages::canonical::{Content, ContentBlock, Message, Role, Source, Tool, ToolChoice};
pub use provider::{BuiltRequest, Provider};
pub use request::{EmbedInput, EmbedRequest, GenerateRequest};
pub use response::{EmbedResponse, FinishReason, PromptResponse, Usage};
pub use streaming::{StreamDelta, StreamingMessage, StreamingMessageResolver, StreamingToolCall};
pub use validation::{Validate, ValidationError};
