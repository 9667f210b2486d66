//! Orchestration runtime for Graphlet.
//!
//! This crate drives operations end to end against external collaborators:
//! - `collaborator`: the parser/validator, executor and subscription-source
//!   contracts
//! - `config`: engine configuration
//! - `engine`: the engine facade and the query/mutation drivers
//! - `subscribe`: the subscription driver and its lazy result sequence
//! - `error`: fatal engine errors

pub mod collaborator;
pub mod config;
pub mod engine;
pub mod error;
pub mod subscribe;

pub use collaborator::{
    DocumentProcessor, EventError, EventStream, OperationExecutor, OperationRequest,
    ParsedOperation, SubscriptionSource, SubscriptionStart,
};
pub use config::{EngineConfig, SubscriptionErrorPolicy};
pub use engine::Engine;
pub use error::EngineError;
pub use subscribe::{SubscriptionResponse, SubscriptionStream};
