//! Opaque handle to a collaborator-parsed query document.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A parsed query document.
///
/// The engine never inspects the document; it is produced by the document
/// processor and threaded back into the executor and subscription source.
/// Cloning is cheap (shared ownership of the underlying parse artifact).
#[derive(Clone)]
pub struct Document {
    inner: Arc<dyn Any + Send + Sync>,
}

impl Document {
    /// Wraps a parse artifact of any type.
    pub fn new<T: Send + Sync + 'static>(document: T) -> Self {
        Self {
            inner: Arc::new(document),
        }
    }

    /// Recovers the concrete parse artifact, if the type matches.
    pub fn downcast_ref<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}
