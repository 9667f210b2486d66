//! Structured logging around every lifecycle phase.

use crate::error::HookResult;
use crate::extension::{DeclaredHooks, Extension, HookMode, LifecycleStep, PhaseDecl};
use async_trait::async_trait;
use graphlet_core::ExecutionContext;

/// Emits a `tracing` event at the entry and exit of every phase.
pub struct RequestLogger;

impl RequestLogger {
    fn log(phase: &'static str, step: LifecycleStep, cx: &ExecutionContext) {
        let operation = cx.operation_name.as_deref().unwrap_or("anonymous");
        match step {
            LifecycleStep::Enter => {
                tracing::debug!(operation, phase, "phase started");
            }
            LifecycleStep::Exit => {
                tracing::debug!(operation, phase, errors = cx.errors.len(), "phase finished");
            }
        }
    }
}

#[async_trait]
impl Extension for RequestLogger {
    fn name(&self) -> &'static str {
        "RequestLogger"
    }

    fn declared_hooks(&self) -> DeclaredHooks {
        DeclaredHooks::new()
            .with_operation(PhaseDecl::two_phase(HookMode::Blocking))
            .with_validation(PhaseDecl::two_phase(HookMode::Blocking))
            .with_parsing(PhaseDecl::two_phase(HookMode::Blocking))
            .with_execution(PhaseDecl::two_phase(HookMode::Blocking))
    }

    async fn on_operation(&self, step: LifecycleStep, cx: &mut ExecutionContext) -> HookResult {
        Self::log("operation", step, cx);
        Ok(())
    }

    async fn on_validate(&self, step: LifecycleStep, cx: &mut ExecutionContext) -> HookResult {
        Self::log("validation", step, cx);
        Ok(())
    }

    async fn on_parse(&self, step: LifecycleStep, cx: &mut ExecutionContext) -> HookResult {
        Self::log("parsing", step, cx);
        Ok(())
    }

    async fn on_execute(&self, step: LifecycleStep, cx: &mut ExecutionContext) -> HookResult {
        Self::log("executing", step, cx);
        Ok(())
    }
}
