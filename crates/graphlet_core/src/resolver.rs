//! Resolver arguments and field info passed through the resolve chain.

use crate::error::{ErrorCode, GraphQLError, PathSegment};
use serde_json::Value;
use std::collections::HashMap;

/// Arguments passed to a field resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    args: HashMap<String, Value>,
}

impl ResolverArgs {
    /// Creates empty resolver args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from a list of (name, value) pairs.
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self {
            args: pairs.into_iter().collect(),
        }
    }

    /// Gets an argument by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument as a specific type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets a required argument, returning an error if absent or mistyped.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, GraphQLError> {
        let value = self.args.get(name).ok_or_else(|| {
            GraphQLError::new(format!("Missing required argument `{name}`"))
                .with_code(ErrorCode::ExecutionError)
        })?;
        serde_json::from_value(value.clone()).map_err(|e| {
            GraphQLError::new(format!("Invalid value for argument `{name}`: {e}"))
                .with_code(ErrorCode::ExecutionError)
        })
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }

    /// Returns true if no arguments were provided.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Info about the field being resolved.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    /// The field name being resolved.
    pub field_name: String,
    /// The parent type name.
    pub parent_type: String,
    /// The return type name.
    pub return_type: String,
    /// Response path to this field.
    pub path: Vec<PathSegment>,
}

impl ResolverInfo {
    /// Creates new resolver info.
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            parent_type: parent_type.into(),
            return_type: String::new(),
            path: Vec::new(),
        }
    }

    /// Sets the return type.
    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Sets the response path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}
