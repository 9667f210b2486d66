//! The `Extension` trait and its declared-capability set.

use crate::error::HookResult;
use crate::phase::Phase;
use crate::resolve::NextResolve;
use async_trait::async_trait;
use graphlet_core::{ExecutionContext, GraphQLError, ResolverArgs, ResolverInfo};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Which half of a two-phase step a scoped hook is being driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    /// Phase entry, before the wrapped work runs.
    Enter,
    /// Phase exit, after the wrapped work completed.
    Exit,
}

/// Whether a hook can be driven without a suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMode {
    /// The hook completes without suspending; usable from blocking callers.
    Blocking,
    /// The hook may suspend and must be awaited.
    Suspend,
}

/// The shape of a scoped (`on_<phase>`) hook declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopedDecl {
    /// The hook runs at phase entry and again at phase exit.
    TwoPhase(HookMode),
    /// The hook runs once, at phase entry.
    EnterOnly(HookMode),
}

impl ScopedDecl {
    /// The driving mode of the declared hook.
    pub const fn mode(&self) -> HookMode {
        match self {
            Self::TwoPhase(mode) | Self::EnterOnly(mode) => *mode,
        }
    }
}

/// What one extension declares for one lifecycle phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseDecl {
    /// The scoped hook, if implemented.
    pub scoped: Option<ScopedDecl>,
    /// The legacy start callback, if implemented.
    pub legacy_start: Option<HookMode>,
    /// The legacy end callback, if implemented.
    pub legacy_end: Option<HookMode>,
}

impl PhaseDecl {
    /// Declares a scoped hook driven at entry and exit.
    pub const fn two_phase(mode: HookMode) -> Self {
        Self {
            scoped: Some(ScopedDecl::TwoPhase(mode)),
            legacy_start: None,
            legacy_end: None,
        }
    }

    /// Declares a scoped hook driven once, at entry.
    pub const fn enter_only(mode: HookMode) -> Self {
        Self {
            scoped: Some(ScopedDecl::EnterOnly(mode)),
            legacy_start: None,
            legacy_end: None,
        }
    }

    /// Declares legacy start/end callbacks.
    pub const fn legacy(start: Option<HookMode>, end: Option<HookMode>) -> Self {
        Self {
            scoped: None,
            legacy_start: start,
            legacy_end: end,
        }
    }

    /// Returns true if either legacy callback is declared.
    pub const fn is_legacy(&self) -> bool {
        self.legacy_start.is_some() || self.legacy_end.is_some()
    }

    /// Returns true if nothing is declared for this phase.
    pub const fn is_empty(&self) -> bool {
        self.scoped.is_none() && !self.is_legacy()
    }
}

/// The capability set of one extension, computed once at registration.
///
/// An undeclared hook is never invoked, even if the trait method is
/// overridden; declaring a hook that keeps the default no-op body is
/// harmless.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredHooks {
    pub operation: PhaseDecl,
    pub validation: PhaseDecl,
    pub parsing: PhaseDecl,
    pub execution: PhaseDecl,
    /// Declared mode of the `get_results` override, if any.
    pub results: Option<HookMode>,
    /// Whether `resolve` participates in the field-resolver chain.
    pub resolve: bool,
}

impl DeclaredHooks {
    /// Creates an empty declaration (no hooks contributed).
    pub fn new() -> Self {
        Self::default()
    }

    /// The declaration for one phase.
    pub fn phase(&self, phase: Phase) -> PhaseDecl {
        match phase {
            Phase::Operation => self.operation,
            Phase::Validation => self.validation,
            Phase::Parsing => self.parsing,
            Phase::Executing => self.execution,
        }
    }

    /// Declares the operation-phase hook.
    pub const fn with_operation(mut self, decl: PhaseDecl) -> Self {
        self.operation = decl;
        self
    }

    /// Declares the validation-phase hook.
    pub const fn with_validation(mut self, decl: PhaseDecl) -> Self {
        self.validation = decl;
        self
    }

    /// Declares the parsing-phase hook.
    pub const fn with_parsing(mut self, decl: PhaseDecl) -> Self {
        self.parsing = decl;
        self
    }

    /// Declares the executing-phase hook.
    pub const fn with_execution(mut self, decl: PhaseDecl) -> Self {
        self.execution = decl;
        self
    }

    /// Declares a `get_results` override.
    pub const fn with_results(mut self, mode: HookMode) -> Self {
        self.results = Some(mode);
        self
    }

    /// Declares a `resolve` override.
    pub const fn with_resolve(mut self) -> Self {
        self.resolve = true;
        self
    }
}

/// A unit of user-supplied instrumentation around the execution lifecycle.
///
/// One instance exists per registered extension per operation. Hooks take
/// `&self`; state shared between the enter and exit halves of a hook (or
/// between phases) lives in interior-mutable fields. Lifecycle hooks receive
/// the operation's `ExecutionContext` and may mutate it — including setting
/// `result` to short-circuit execution.
#[async_trait]
pub trait Extension: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str {
        "extension"
    }

    /// The capability set, inspected once at registration.
    fn declared_hooks(&self) -> DeclaredHooks {
        DeclaredHooks::default()
    }

    /// Scoped hook around the whole operation.
    async fn on_operation(&self, _step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Scoped hook around the validation step.
    async fn on_validate(&self, _step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Scoped hook around the parsing step.
    async fn on_parse(&self, _step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Scoped hook around the executing step.
    async fn on_execute(&self, _step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Legacy paired callback: operation entry.
    async fn on_operation_start(&self, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Legacy paired callback: operation exit.
    async fn on_operation_end(&self, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Legacy paired callback: validation entry.
    async fn on_validation_start(&self, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Legacy paired callback: validation exit.
    async fn on_validation_end(&self, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Legacy paired callback: parsing entry.
    async fn on_parsing_start(&self, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Legacy paired callback: parsing exit.
    async fn on_parsing_end(&self, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Legacy paired callback: executing entry.
    async fn on_executing_start(&self, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Legacy paired callback: executing exit.
    async fn on_executing_end(&self, _cx: &mut ExecutionContext) -> HookResult {
        Ok(())
    }

    /// Wraps one field resolver invocation.
    ///
    /// Declared via [`DeclaredHooks::with_resolve`]. May short-circuit by
    /// returning without calling `next`, or post-process the resolved value.
    async fn resolve<'a>(
        &self,
        next: NextResolve<'a>,
        parent: &'a Value,
        args: &'a ResolverArgs,
        info: &'a ResolverInfo,
    ) -> Result<Value, GraphQLError> {
        next.run(parent, args, info).await
    }

    /// Contributes a mapping merged into the response's `extensions` key.
    async fn get_results(&self, _cx: &ExecutionContext) -> IndexMap<String, Value> {
        IndexMap::new()
    }
}

/// Builds one fresh [`Extension`] instance per operation.
pub trait ExtensionFactory: Send + Sync {
    /// Creates a new instance for one operation.
    fn create(&self) -> Arc<dyn Extension>;
}

impl<F> ExtensionFactory for F
where
    F: Fn() -> Arc<dyn Extension> + Send + Sync,
{
    fn create(&self) -> Arc<dyn Extension> {
        (self)()
    }
}
