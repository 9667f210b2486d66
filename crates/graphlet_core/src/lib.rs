//! Core types for Graphlet.
//!
//! This crate provides the shared vocabulary of the engine:
//! - `error`: GraphQL error objects and failure coercion
//! - `result`: the `{ data, errors, extensions }` response shape
//! - `document`: the opaque parsed-document handle
//! - `resolver`: resolver arguments and field info
//! - `context`: the user context and the request-scoped execution context

pub mod context;
pub mod document;
pub mod error;
pub mod resolver;
pub mod result;

pub use context::{Context, ExecutionContext, OperationKind};
pub use document::Document;
pub use error::{ErrorCode, GraphQLError, Location, PathSegment};
pub use resolver::{ResolverArgs, ResolverInfo};
pub use result::ExecutionResult;
