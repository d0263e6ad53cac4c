//! Field-scoped request validation.
//!
//! Validation never raises: rules collect [`ValidationError`]s and the
//! caller decides whether to treat a non-empty list as fatal before
//! handing the serialized request to a transport. The engine does not
//! auto-correct invalid data.

use std::fmt;

use indexmap::IndexMap;

/// One violated rule, scoped to the field that carries the bad value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `"options.temperature"`.
    pub field: String,
    /// What the rule expected.
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Declarative validation over a constructed request.
pub trait Validate {
    /// Run every rule, collecting all violations.
    fn validate(&self) -> Vec<ValidationError>;

    /// Whether the value passes all rules.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// `value` must lie in `[min, max]`. Absence is valid.
pub(crate) fn check_range(errors: &mut Vec<ValidationError>, field: &str, value: Option<f32>, min: f32, max: f32) {
    if let Some(v) = value {
        if !(min..=max).contains(&v) {
            errors.push(ValidationError::new(
                field,
                format!("must be between {min} and {max}, got {v}"),
            ));
        }
    }
}

/// `value` must lie in `(min, max]`. Absence is valid.
pub(crate) fn check_range_exclusive_min(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: Option<f32>,
    min: f32,
    max: f32,
) {
    if let Some(v) = value {
        if v <= min || v > max {
            errors.push(ValidationError::new(
                field,
                format!("must be greater than {min} and at most {max}, got {v}"),
            ));
        }
    }
}

/// `value` must be at least `min`. Absence is valid.
pub(crate) fn check_min(errors: &mut Vec<ValidationError>, field: &str, value: Option<u32>, min: u32) {
    if let Some(v) = value {
        if v < min {
            errors.push(ValidationError::new(field, format!("must be at least {min}, got {v}")));
        }
    }
}

/// `value` must be one of `allowed`. Absence is valid.
pub(crate) fn check_inclusion(errors: &mut Vec<ValidationError>, field: &str, value: Option<&str>, allowed: &[&str]) {
    if let Some(v) = value {
        if !allowed.contains(&v) {
            errors.push(ValidationError::new(
                field,
                format!("must be one of {allowed:?}, got '{v}'"),
            ));
        }
    }
}

/// Metadata maps are capped in size and entry length.
pub(crate) fn check_metadata(
    errors: &mut Vec<ValidationError>,
    field: &str,
    metadata: Option<&IndexMap<String, String>>,
    max_entries: usize,
    max_key_len: usize,
    max_value_len: usize,
) {
    let Some(map) = metadata else { return };

    if map.len() > max_entries {
        errors.push(ValidationError::new(
            field,
            format!("must have at most {max_entries} entries, got {}", map.len()),
        ));
    }

    for (key, value) in map {
        if key.chars().count() > max_key_len {
            errors.push(ValidationError::new(
                format!("{field}.{key}"),
                format!("key must be at most {max_key_len} characters"),
            ));
        }

        if value.chars().count() > max_value_len {
            errors.push(ValidationError::new(
                format!("{field}.{key}"),
                format!("value must be at most {max_value_len} characters"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_values_are_inside_the_range() {
        let mut errors = Vec::new();
        check_range(&mut errors, "temperature", Some(2.0), 0.0, 2.0);
        assert!(errors.is_empty());

        check_range(&mut errors, "temperature", Some(2.0001), 0.0, 2.0);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "temperature");
    }

    #[test]
    fn absence_is_always_valid() {
        let mut errors = Vec::new();
        check_range(&mut errors, "temperature", None, 0.0, 2.0);
        check_range_exclusive_min(&mut errors, "top_p", None, 0.0, 1.0);
        check_min(&mut errors, "max_tokens", None, 1);
        check_inclusion(&mut errors, "route", None, &["fallback"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn exclusive_minimum_rejects_the_bound_itself() {
        let mut errors = Vec::new();
        check_range_exclusive_min(&mut errors, "top_p", Some(0.0), 0.0, 1.0);
        assert_eq!(errors.len(), 1);

        errors.clear();
        check_range_exclusive_min(&mut errors, "top_p", Some(1.0), 0.0, 1.0);
        assert!(errors.is_empty());
    }

    #[test]
    fn metadata_caps() {
        let mut map = IndexMap::new();
        for i in 0..16 {
            map.insert(format!("k{i}"), "v".to_string());
        }

        let mut errors = Vec::new();
        check_metadata(&mut errors, "metadata", Some(&map), 16, 64, 512);
        assert!(errors.is_empty());

        map.insert("k16".to_string(), "v".to_string());
        check_metadata(&mut errors, "metadata", Some(&map), 16, 64, 512);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn metadata_entry_lengths() {
        let mut errors = Vec::new();

        let ok: IndexMap<String, String> = [("k".repeat(64), "v".repeat(512))].into_iter().collect();
        check_metadata(&mut errors, "metadata", Some(&ok), 16, 64, 512);
        assert!(errors.is_empty());

        let long_key: IndexMap<String, String> = [("k".repeat(65), "v".to_string())].into_iter().collect();
        check_metadata(&mut errors, "metadata", Some(&long_key), 16, 64, 512);
        assert_eq!(errors.len(), 1);

        errors.clear();
        let long_value: IndexMap<String, String> = [("k".to_string(), "v".repeat(513))].into_iter().collect();
        check_metadata(&mut errors, "metadata", Some(&long_value), 16, 64, 512);
        assert_eq!(errors.len(), 1);
    }
}
