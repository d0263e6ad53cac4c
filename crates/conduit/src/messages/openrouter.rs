//! Wire types for the OpenRouter chat API.
//!
//! OpenRouter speaks the OpenAI Chat Completions format with extra
//! routing controls layered on top, so the request embeds
//! [`openai::ChatRequest`] and flattens it on serialization. Responses are
//! OpenAI-shaped and reuse those types directly.

use serde::{Deserialize, Serialize};

use crate::messages::openai;

/// Request body for `POST /api/v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The OpenAI-compatible core of the request.
    #[serde(flatten)]
    pub chat: openai::ChatRequest,

    /// Prompt transforms, e.g. `["middle-out"]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transforms: Option<Vec<String>>,

    /// Fallback model list tried in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,

    /// Routing strategy. The only accepted value is `"fallback"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// Upstream provider preferences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderPreferences>,
}

/// Preferences for which upstream providers may serve the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderPreferences {
    /// Providers to try, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<String>>,

    /// Whether to fall back beyond `order`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_fallbacks: Option<bool>,

    /// Only use providers that support every request parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_parameters: Option<bool>,

    /// Data collection policy: `"allow"` or `"deny"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_collection: Option<DataCollection>,

    /// Acceptable quantization levels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantizations: Option<Vec<String>>,

    /// Provider ordering criterion, e.g. `"price"` or `"throughput"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Price ceilings per million tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<MaxPrice>,
}

/// Data collection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCollection {
    Allow,
    Deny,
}

/// Price ceilings, in USD per million tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaxPrice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn routing_fields_flatten_beside_the_chat_core() {
        let request = ChatRequest {
            chat: openai::ChatRequest {
                model: "openrouter/auto".to_string(),
                messages: vec![openai::ChatMessage {
                    role: openai::ChatRole::User,
                    content: Some(openai::ChatContent::Text("hi".to_string())),
                    name: None,
                    tool_calls: None,
                    tool_call_id: None,
                }],
                temperature: None,
                top_p: None,
                frequency_penalty: None,
                presence_penalty: None,
                max_tokens: None,
                stop: None,
                stream: None,
                tools: None,
                tool_choice: None,
                parallel_tool_calls: None,
                user: None,
            },
            transforms: Some(vec!["middle-out".to_string()]),
            models: None,
            route: Some("fallback".to_string()),
            provider: Some(ProviderPreferences {
                sort: Some("price".to_string()),
                ..Default::default()
            }),
        };

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["model"], json!("openrouter/auto"));
        assert_eq!(wire["route"], json!("fallback"));
        assert_eq!(wire["transforms"], json!(["middle-out"]));
        assert_eq!(wire["provider"], json!({"sort": "price"}));
    }
}
