//! GraphQL error objects and failure coercion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Typed error codes carried in error extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    ParseError,
    ValidationError,
    ExecutionError,
    SubscriptionError,
    InternalError,
    Custom,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::SubscriptionError => "SUBSCRIPTION_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source location inside the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// A segment of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        Self::Field(s)
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        Self::Field(s.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// A GraphQL error object as it appears in a response's `errors` list.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct GraphQLError {
    /// The error message.
    pub message: String,
    /// Locations in the query text this error points at.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<Location>,
    /// The response path of the field that failed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<Vec<PathSegment>>,
    /// Error extensions.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
    /// Rendered original cause, kept out of the wire shape.
    #[serde(skip)]
    pub original: Option<String>,
}

impl GraphQLError {
    /// Creates a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
            original: None,
        }
    }

    /// Coerces an arbitrary failure into the standard error-object shape.
    pub fn coerce<E: fmt::Display>(failure: E) -> Self {
        let rendered = failure.to_string();
        let mut error = Self::new(rendered.clone());
        error.original = Some(rendered);
        error
    }

    /// Adds a source location.
    pub fn with_location(mut self, line: u32, column: u32) -> Self {
        self.locations.push(Location { line, column });
        self
    }

    /// Sets the response path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    /// Adds an extension entry.
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Sets the error code extension.
    pub fn with_code(self, code: ErrorCode) -> Self {
        self.with_extension("code", serde_json::Value::String(code.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = GraphQLError::new("Something went wrong")
            .with_location(1, 5)
            .with_path(vec!["user".into(), 0.into(), "name".into()])
            .with_code(ErrorCode::ExecutionError);

        assert_eq!(error.message, "Something went wrong");
        assert_eq!(error.locations.len(), 1);
        assert_eq!(
            error.path,
            Some(vec![
                PathSegment::Field("user".to_string()),
                PathSegment::Index(0),
                PathSegment::Field("name".to_string()),
            ])
        );
        assert!(error.extensions.is_some());
    }

    #[test]
    fn test_error_serialization() {
        let error = GraphQLError::new("Bad field").with_code(ErrorCode::ValidationError);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("Bad field"));
        assert!(json.contains("VALIDATION_ERROR"));
        // Empty locations are omitted from the wire shape.
        assert!(!json.contains("locations"));
    }

    #[test]
    fn test_path_segment_serialization() {
        let path = vec![PathSegment::Field("items".to_string()), PathSegment::Index(2)];
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["items",2]"#);
    }

    #[test]
    fn test_coerce_keeps_original() {
        let io = std::io::Error::other("stream reset");
        let error = GraphQLError::coerce(&io);
        assert_eq!(error.message, "stream reset");
        assert_eq!(error.original.as_deref(), Some("stream reset"));
    }
}
