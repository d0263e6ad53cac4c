use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the translation engine.
#[derive(Debug, Error)]
pub enum Error {
    /// An input value could not be cast into the target model.
    #[error(transparent)]
    Cast(#[from] CastError),

    /// A raw provider response could not be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// JSON (de)serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A value's shape cannot be mapped onto any known variant or type.
///
/// These are programmer/integration errors: they are surfaced immediately
/// and never retried or auto-corrected.
#[derive(Debug, Error)]
pub enum CastError {
    /// An explicit `type` discriminator outside the known set.
    ///
    /// Unrecognized tags are always fatal; dropping them silently would
    /// hide provider-protocol drift.
    #[error("unknown {context} type: '{tag}'")]
    UnknownTag { context: &'static str, tag: String },

    /// The value's overall shape fits none of the accepted forms.
    #[error("cannot cast {found} into {target}")]
    UnsupportedShape { target: &'static str, found: String },

    /// A required field is absent from a mapping.
    #[error("missing field '{field}' for {context}")]
    MissingField { context: &'static str, field: &'static str },

    /// The target provider has no representation for this content.
    #[error("{provider} does not support {what}")]
    Unsupported { provider: &'static str, what: &'static str },
}

impl CastError {
    /// Shorthand for an [`CastError::UnsupportedShape`] naming the JSON kind
    /// of the offending value.
    pub(crate) fn shape(target: &'static str, value: &serde_json::Value) -> Self {
        Self::UnsupportedShape {
            target,
            found: json_kind(value).to_string(),
        }
    }
}

/// A raw provider response is missing required structure.
///
/// Optional pieces (usage, stop reasons) degrade to `None`; these errors
/// cover the cases where guessing would produce a half-populated response
/// silently treated as successful.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A required top-level structure is absent.
    #[error("provider response is missing {what}")]
    MissingStructure { what: &'static str },

    /// The response body does not match the provider's documented schema.
    #[error("malformed provider response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Reconstructing canonical content from the response failed.
    #[error(transparent)]
    Cast(#[from] CastError),
}

/// Human-readable kind of a JSON value, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
