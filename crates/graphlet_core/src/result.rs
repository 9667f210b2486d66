//! The `{ data, errors, extensions }` response shape.

use crate::error::GraphQLError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The result of executing one operation, or of one subscription event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The data produced by the executor.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<serde_json::Value>,
    /// Errors collected while producing the data.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<GraphQLError>,
    /// The merged extension contributions for this result.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl ExecutionResult {
    /// Creates a successful result with data.
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
            extensions: IndexMap::new(),
        }
    }

    /// Creates a result carrying a single error.
    pub fn error(error: GraphQLError) -> Self {
        Self::from_errors(vec![error])
    }

    /// Creates a result carrying multiple errors and no data.
    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        Self {
            data: None,
            errors,
            extensions: IndexMap::new(),
        }
    }

    /// Returns true if the result carries any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if the result carries data.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}
