//! Contracts for the external collaborators the engine orchestrates.

use async_trait::async_trait;
use futures::stream::BoxStream;
use graphlet_core::{
    Context, Document, ExecutionContext, ExecutionResult, GraphQLError, OperationKind,
};
use graphlet_extensions::ResolveChain;
use serde_json::Value;
use std::collections::HashMap;

/// The artifact produced by a successful parse.
pub struct ParsedOperation {
    /// The opaque parsed document.
    pub document: Document,
    /// The kind of the selected operation.
    pub kind: OperationKind,
}

impl ParsedOperation {
    /// Creates a parse artifact.
    pub fn new(document: Document, kind: OperationKind) -> Self {
        Self { document, kind }
    }
}

/// Borrowed view of one operation's inputs, handed to collaborators.
pub struct OperationRequest<'a> {
    pub document: &'a Document,
    pub query: &'a str,
    pub variables: &'a HashMap<String, Value>,
    pub operation_name: Option<&'a str>,
    pub root_value: Option<&'a Value>,
    pub context: &'a Context,
}

impl<'a> OperationRequest<'a> {
    /// Builds a request view over the execution context.
    pub fn new(cx: &'a ExecutionContext, document: &'a Document) -> Self {
        Self {
            document,
            query: &cx.query,
            variables: &cx.variables,
            operation_name: cx.operation_name.as_deref(),
            root_value: cx.root_value.as_ref(),
            context: &cx.context,
        }
    }
}

/// Parses and validates query documents.
pub trait DocumentProcessor: Send + Sync {
    /// Parses the context's query text.
    ///
    /// A failure is a structured pre-execution error list, not a panic; the
    /// engine folds it into a normal result.
    fn parse(&self, cx: &ExecutionContext) -> Result<ParsedOperation, Vec<GraphQLError>>;

    /// Validates a parsed document, returning any validation errors.
    fn validate(&self, cx: &ExecutionContext, document: &Document) -> Vec<GraphQLError>;
}

/// Executes a single query or mutation operation.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Runs the operation, threading every field resolution through the
    /// composed resolve chain (first-registered extension outermost).
    async fn execute(&self, request: OperationRequest<'_>, resolve: &ResolveChain)
        -> ExecutionResult;
}

/// A failure raised while pulling the next subscription event.
pub type EventError = Box<dyn std::error::Error + Send + Sync>;

/// The live event stream of one subscription.
///
/// An `Err` item is a failed pull for one event; it does not by itself
/// terminate the stream — termination policy is the driver's decision.
pub type EventStream = BoxStream<'static, Result<ExecutionResult, EventError>>;

/// What a subscription source produces when first invoked.
pub enum SubscriptionStart {
    /// The source completed (or failed) immediately with a single result.
    Immediate(ExecutionResult),
    /// A live event stream.
    Events(EventStream),
}

/// Starts subscription operations.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// Subscribes to the operation's event stream.
    async fn subscribe(&self, request: OperationRequest<'_>) -> SubscriptionStart;
}
