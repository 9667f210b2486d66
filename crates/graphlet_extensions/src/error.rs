//! Errors raised by the extension lifecycle machinery.

use crate::phase::Phase;
use graphlet_core::GraphQLError;
use thiserror::Error;

/// A failure raised inside an extension hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExtensionError {
    /// Human-readable failure message.
    pub message: String,
    /// The underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExtensionError {
    /// Creates a new failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl From<GraphQLError> for ExtensionError {
    fn from(error: GraphQLError) -> Self {
        Self::new(error.message.clone()).with_source(error)
    }
}

/// The result type returned by lifecycle hooks.
pub type HookResult = Result<(), ExtensionError>;

/// Fatal misconfiguration or misuse of the extension machinery, plus
/// propagated hook failures.
///
/// Configuration and usage errors indicate a programming defect and always
/// surface to the caller; they are never folded into a response.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// An extension declares both legacy and scoped hooks for one phase.
    #[error("extension `{extension}` defines both legacy and scoped hooks for the {phase} phase")]
    ConflictingHooks { extension: String, phase: Phase },

    /// A suspending hook was driven from a blocking context.
    #[error("extension hook `{extension}.{hook}` failed to complete synchronously")]
    HookNotSynchronous { extension: String, hook: &'static str },

    /// A suspending `get_results` hook was called during blocking execution.
    #[error("cannot call the suspending `get_results` of extension `{extension}` during blocking execution")]
    ResultsNotSynchronous { extension: String },

    /// A hook failure, propagated unchanged.
    #[error(transparent)]
    Extension(#[from] ExtensionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_error_source_chain() {
        let inner = std::io::Error::other("connection lost");
        let error = ExtensionError::new("tracer flush failed").with_source(inner);
        assert_eq!(error.to_string(), "tracer flush failed");
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_lifecycle_error_messages() {
        let conflict = LifecycleError::ConflictingHooks {
            extension: "Tracer".to_string(),
            phase: Phase::Executing,
        };
        assert!(conflict.to_string().contains("executing"));

        let not_sync = LifecycleError::HookNotSynchronous {
            extension: "Tracer".to_string(),
            hook: "on_execute",
        };
        assert!(not_sync.to_string().contains("on_execute"));
    }
}
