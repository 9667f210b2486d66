//! Skips the validation step for trusted queries.

use crate::error::HookResult;
use crate::extension::{DeclaredHooks, Extension, HookMode, LifecycleStep, PhaseDecl};
use async_trait::async_trait;
use graphlet_core::ExecutionContext;

/// Disables query validation for the operation.
///
/// Useful when queries are known ahead of time and already validated, e.g.
/// generated clients or an allow-listed query set.
pub struct DisableValidation;

#[async_trait]
impl Extension for DisableValidation {
    fn name(&self) -> &'static str {
        "DisableValidation"
    }

    fn declared_hooks(&self) -> DeclaredHooks {
        DeclaredHooks::new().with_operation(PhaseDecl::enter_only(HookMode::Blocking))
    }

    async fn on_operation(&self, _step: LifecycleStep, cx: &mut ExecutionContext) -> HookResult {
        cx.validation_disabled = true;
        Ok(())
    }
}
