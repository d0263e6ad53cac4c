//! OpenRouter provider.
//!
//! Requests are the OpenAI chat shape plus routing extras; responses are
//! OpenAI-shaped and normalized by [`crate::provider::openai::output`].

pub(crate) mod input;
