//! Canonical request to OpenRouter wire format.

use serde_json::Value;

use crate::error::CastError;
use crate::messages::openrouter::{ChatRequest, ProviderPreferences};
use crate::provider::openai;
use crate::request::GenerateRequest;
use crate::validation::{self, Validate, ValidationError};

/// Build the wire request: the OpenAI core plus routing extras pulled
/// from the params bag.
pub(crate) fn chat_request(request: &GenerateRequest) -> Result<ChatRequest, CastError> {
    let chat = openai::input::chat_request(request)?;

    let provider = match request.param("provider") {
        Some(value) => Some(
            serde_json::from_value::<ProviderPreferences>(value.clone())
                .map_err(|_| CastError::shape("provider preferences", value))?,
        ),
        None => None,
    };

    Ok(ChatRequest {
        chat,
        transforms: string_list(request.param("transforms"))?,
        models: string_list(request.param("models"))?,
        route: request.param("route").and_then(Value::as_str).map(str::to_string),
        provider,
    })
}

fn string_list(value: Option<&Value>) -> Result<Option<Vec<String>>, CastError> {
    let Some(value) = value else { return Ok(None) };

    let Some(items) = value.as_array() else {
        return Err(CastError::shape("string list", value));
    };

    items
        .iter()
        .map(|item| match item.as_str() {
            Some(s) => Ok(s.to_string()),
            None => Err(CastError::shape("string list", item)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

impl Validate for ChatRequest {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.chat.validate();

        validation::check_inclusion(&mut errors, "route", self.route.as_deref(), &["fallback"]);

        if let Some(preferences) = &self.provider {
            if let Some(max_price) = &preferences.max_price {
                for (field, value) in [("prompt", max_price.prompt), ("completion", max_price.completion)] {
                    if let Some(v) = value {
                        if v < 0.0 {
                            errors.push(ValidationError::new(
                                format!("provider.max_price.{field}"),
                                format!("must not be negative, got {v}"),
                            ));
                        }
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::canonical::Message;
    use serde_json::json;

    fn request_with_params(params: &[(&str, Value)]) -> GenerateRequest {
        let mut request = GenerateRequest::new("openrouter/auto");
        request.messages = vec![Message::user("Hi")];

        for (key, value) in params {
            request.params.insert((*key).to_string(), value.clone());
        }

        request
    }

    #[test]
    fn routing_extras_are_extracted_from_the_params_bag() {
        let request = request_with_params(&[
            ("transforms", json!(["middle-out"])),
            ("models", json!(["anthropic/claude-sonnet-4-5", "openai/gpt-4o"])),
            ("route", json!("fallback")),
            ("provider", json!({"order": ["anthropic"], "allow_fallbacks": false})),
            ("user", json!("user-123")),
        ]);

        let wire = chat_request(&request).unwrap();
        assert!(wire.is_valid());

        let body = serde_json::to_value(&wire).unwrap();
        assert_eq!(body["route"], json!("fallback"));
        assert_eq!(body["models"], json!(["anthropic/claude-sonnet-4-5", "openai/gpt-4o"]));
        assert_eq!(body["provider"]["order"], json!(["anthropic"]));
        assert_eq!(body["user"], json!("user-123"));
    }

    #[test]
    fn route_accepts_only_the_fallback_literal() {
        let request = request_with_params(&[("route", json!("fallback"))]);
        assert!(chat_request(&request).unwrap().is_valid());

        let request = request_with_params(&[("route", json!("round-robin"))]);
        let errors = chat_request(&request).unwrap().validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "route");
    }

    #[test]
    fn malformed_provider_preferences_are_a_cast_error() {
        let request = request_with_params(&[("provider", json!("anthropic"))]);
        assert!(chat_request(&request).is_err());
    }

    #[test]
    fn negative_max_price_fails_validation() {
        let request = request_with_params(&[("provider", json!({"max_price": {"prompt": -1.0}}))]);

        let errors = chat_request(&request).unwrap().validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "provider.max_price.prompt");
    }

    #[test]
    fn openai_core_validation_still_applies() {
        let mut request = request_with_params(&[]);
        request.temperature = Some(9.0);

        let errors = chat_request(&request).unwrap().validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "temperature");
    }
}
