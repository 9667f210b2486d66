//! Engine configuration.

use graphlet_core::OperationKind;

/// What happens to a subscription after an event pull fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionErrorPolicy {
    /// End the stream after emitting the error-bearing result.
    ///
    /// The safe default: most sources make no guarantee about remaining
    /// usable after a failed pull.
    #[default]
    Terminate,
    /// Keep pulling events after emitting the error-bearing result.
    ///
    /// Only sound when the source guarantees its stream survives a failed
    /// pull.
    Continue,
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Operation kinds this engine accepts.
    pub allowed_operations: Vec<OperationKind>,
    /// Per-event error handling for subscriptions.
    pub subscription_error_policy: SubscriptionErrorPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allowed_operations: vec![
                OperationKind::Query,
                OperationKind::Mutation,
                OperationKind::Subscription,
            ],
            subscription_error_policy: SubscriptionErrorPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the accepted operation kinds.
    pub fn with_allowed_operations(mut self, kinds: Vec<OperationKind>) -> Self {
        self.allowed_operations = kinds;
        self
    }

    /// Sets the per-event subscription error policy.
    pub fn with_subscription_error_policy(mut self, policy: SubscriptionErrorPolicy) -> Self {
        self.subscription_error_policy = policy;
        self
    }
}
