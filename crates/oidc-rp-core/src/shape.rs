//! Collect-all-errors shape checks over untrusted JSON objects.

use crate::error::FieldError;
use serde_json::{Map, Value};
use url::Url;

/// Walks the members of a JSON object, recording every problem instead of
/// stopping at the first.
pub(crate) struct ShapeCheck<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> ShapeCheck<'a> {
    /// Start checking `value`, which must be a JSON object.
    pub(crate) fn new(value: &'a Value, what: &str) -> Result<Self, Vec<FieldError>> {
        match value {
            Value::Object(object) => Ok(Self {
                object,
                errors: Vec::new(),
            }),
            other => Err(vec![FieldError::new(
                "$",
                format!("{what} must be a JSON object, found {}", type_name(other)),
            )]),
        }
    }

    pub(crate) fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(FieldError::new(field, reason));
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|v| !v.is_null())
    }

    pub(crate) fn required_string(&mut self, field: &str) -> Option<&'a str> {
        match self.present(field) {
            None => {
                self.push(field, "is required");
                None
            }
            Some(value) => self.string(field, value),
        }
    }

    pub(crate) fn optional_string(&mut self, field: &str) -> Option<&'a str> {
        let value = self.present(field)?;
        self.string(field, value)
    }

    fn string(&mut self, field: &str, value: &'a Value) -> Option<&'a str> {
        match value {
            Value::String(s) if s.is_empty() => {
                self.push(field, "must not be empty");
                None
            }
            Value::String(s) => Some(s),
            other => {
                self.push(field, format!("must be a string, found {}", type_name(other)));
                None
            }
        }
    }

    pub(crate) fn required_url(&mut self, field: &str) -> Option<&'a str> {
        let raw = self.required_string(field)?;
        self.url(field, raw)
    }

    pub(crate) fn optional_url(&mut self, field: &str) -> Option<&'a str> {
        let raw = self.optional_string(field)?;
        self.url(field, raw)
    }

    fn url(&mut self, field: &str, raw: &'a str) -> Option<&'a str> {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "https" || url.scheme() == "http" => Some(raw),
            Ok(url) => {
                self.push(field, format!("unsupported URL scheme '{}'", url.scheme()));
                None
            }
            Err(e) => {
                self.push(field, format!("is not a valid URL: {e}"));
                None
            }
        }
    }

    /// A non-empty array of strings.
    pub(crate) fn required_string_list(&mut self, field: &str) {
        match self.present(field) {
            None => self.push(field, "is required"),
            Some(value) => self.string_list(field, value),
        }
    }

    pub(crate) fn optional_string_list(&mut self, field: &str) {
        if let Some(value) = self.present(field) {
            self.string_list(field, value);
        }
    }

    fn string_list(&mut self, field: &str, value: &Value) {
        match value {
            Value::Array(items) if items.is_empty() => self.push(field, "must not be empty"),
            Value::Array(items) => {
                if let Some(index) = items.iter().position(|item| !item.is_string()) {
                    self.push(field, format!("element {index} must be a string"));
                }
            }
            other => self.push(
                field,
                format!("must be an array of strings, found {}", type_name(other)),
            ),
        }
    }

    /// A string, or a non-empty array of strings (the `aud` claim).
    pub(crate) fn string_or_list(&mut self, field: &str) {
        match self.present(field) {
            None => self.push(field, "is required"),
            Some(Value::String(s)) if s.is_empty() => self.push(field, "must not be empty"),
            Some(Value::String(_)) => {}
            Some(value) => self.string_list(field, value),
        }
    }

    pub(crate) fn required_timestamp(&mut self, field: &str) -> Option<u64> {
        match self.present(field) {
            None => {
                self.push(field, "is required");
                None
            }
            Some(value) => self.timestamp(field, value),
        }
    }

    pub(crate) fn optional_timestamp(&mut self, field: &str) -> Option<u64> {
        let value = self.present(field)?;
        self.timestamp(field, value)
    }

    fn timestamp(&mut self, field: &str, value: &Value) -> Option<u64> {
        let seconds = numeric_date(value);
        if seconds.is_none() {
            self.push(
                field,
                "must be a non-negative number of seconds since the epoch",
            );
        }
        seconds
    }

    pub(crate) fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// NumericDate (RFC 7519, section 2) as whole seconds; fractions are
/// truncated.
pub(crate) fn numeric_date(value: &Value) -> Option<u64> {
    if let Some(seconds) = value.as_u64() {
        return Some(seconds);
    }
    value
        .as_f64()
        .filter(|s| s.is_finite() && *s >= 0.0 && *s < u64::MAX as f64)
        .map(|s| s.floor() as u64)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
