//! Fatal engine errors.

use graphlet_core::OperationKind;
use graphlet_extensions::LifecycleError;
use thiserror::Error;

/// Errors that indicate a programming defect or misuse of the engine.
///
/// Operation-level failures (parse, validation, execution, per-event
/// subscription errors) never surface here; they are folded into the
/// `errors` list of an emitted result.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A configuration or usage error from the extension machinery, or a
    /// propagated extension hook failure.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The request carried no query text.
    #[error("no query was provided for execution")]
    MissingQuery,

    /// The document processor reported success but produced no document.
    #[error("the document processor returned no document")]
    MissingDocument,

    /// The operation kind is excluded by the engine configuration.
    #[error("{kind} operations are not allowed by this engine")]
    DisallowedOperation { kind: OperationKind },

    /// The executor suspended during blocking execution.
    #[error("execution failed to complete synchronously")]
    ExecutionNotSynchronous,
}
