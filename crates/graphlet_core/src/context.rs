//! User context and the request-scoped execution context.

use crate::document::Document;
use crate::error::GraphQLError;
use crate::result::ExecutionResult;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The kind of operation being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Returns the lowercase name of the operation kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request-scoped user data, shared with resolvers and extensions.
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value in the context.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.into(), v);
        }
    }

    /// Gets a value from the context.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Mutable state for one operation, owned by that operation for its lifetime.
///
/// The engine sets `document`, `operation_kind`, `result` and `errors` at
/// well-defined points; extensions may read everything and may set `result`
/// to short-circuit execution. During a subscription, `extensions_results`
/// is reset before every event.
#[derive(Debug)]
pub struct ExecutionContext {
    /// The raw query text.
    pub query: String,
    /// Variables supplied with the request.
    pub variables: HashMap<String, serde_json::Value>,
    /// The requested operation name, if any.
    pub operation_name: Option<String>,
    /// The root value handed to the executor.
    pub root_value: Option<serde_json::Value>,
    /// User data shared with resolvers and extensions.
    pub context: Context,
    /// The parsed document, absent until parsing succeeds.
    pub document: Option<Document>,
    /// The operation kind, resolved during parsing.
    pub operation_kind: Option<OperationKind>,
    /// The execution result; extensions may set this to short-circuit.
    pub result: Option<ExecutionResult>,
    /// Errors accumulated so far.
    pub errors: Vec<GraphQLError>,
    /// Extension contributions for the current result, reset per event.
    pub extensions_results: IndexMap<String, serde_json::Value>,
    /// When set, the validation step is skipped.
    pub validation_disabled: bool,
}

impl ExecutionContext {
    /// Creates a context for the given query text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: HashMap::new(),
            operation_name: None,
            root_value: None,
            context: Context::new(),
            document: None,
            operation_kind: None,
            result: None,
            errors: Vec::new(),
            extensions_results: IndexMap::new(),
            validation_disabled: false,
        }
    }

    /// Sets the request variables.
    pub fn with_variables(mut self, variables: HashMap<String, serde_json::Value>) -> Self {
        self.variables = variables;
        self
    }

    /// Sets the operation name.
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the root value.
    pub fn with_root_value(mut self, root_value: serde_json::Value) -> Self {
        self.root_value = Some(root_value);
        self
    }

    /// Sets the user context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Supplies an already-parsed document, skipping the parse step.
    pub fn with_document(mut self, document: Document, kind: OperationKind) -> Self {
        self.document = Some(document);
        self.operation_kind = Some(kind);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_round_trip() {
        let mut context = Context::new();
        context.set("user_id", "123");
        assert_eq!(context.get::<String>("user_id"), Some("123".to_string()));
        assert_eq!(context.get::<String>("missing"), None);
    }

    #[test]
    fn test_execution_context_builders() {
        let mut variables = HashMap::new();
        variables.insert("id".to_string(), serde_json::json!(7));

        let cx = ExecutionContext::new("query Q { node(id: $id) { id } }")
            .with_variables(variables)
            .with_operation_name("Q");

        assert_eq!(cx.operation_name.as_deref(), Some("Q"));
        assert_eq!(cx.variables["id"], serde_json::json!(7));
        assert!(cx.document.is_none());
        assert!(!cx.validation_disabled);
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Subscription.to_string(), "subscription");
    }
}
