//! Extension lifecycle runner for Graphlet.
//!
//! This crate wraps each execution phase (operation, validation, parsing,
//! executing) with ordered before/after extension hooks:
//! - `extension`: the `Extension` trait and its declared-capability set
//! - `wrapper`: the two-phase step state machine around one hook
//! - `phase`: the per-phase runner driving wrappers in registration order
//! - `registry`: extension factories and registration-time validation
//! - `runner`: the per-operation runner and results aggregation
//! - `resolve`: the composed field-resolver middleware chain
//! - `builtin`: extensions shipped with the engine

pub mod builtin;
pub mod error;
pub mod extension;
pub mod phase;
pub mod registry;
pub mod resolve;
pub mod runner;
mod wrapper;

pub use error::{ExtensionError, HookResult, LifecycleError};
pub use extension::{
    DeclaredHooks, Extension, ExtensionFactory, HookMode, LifecycleStep, PhaseDecl, ScopedDecl,
};
pub use phase::{Phase, PhaseRunner};
pub use registry::{DeprecationNotice, ExtensionRegistry};
pub use resolve::{NextResolve, ResolveChain, ResolveFuture, TerminalResolver};
pub use runner::ExtensionRunner;
