//! Per-phase runners driving hook wrappers in registration order.

use crate::error::LifecycleError;
use crate::extension::Extension;
use crate::wrapper::WrappedHook;
use graphlet_core::ExecutionContext;
use std::fmt;
use std::sync::Arc;

/// One of the four lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Operation,
    Validation,
    Parsing,
    Executing,
}

impl Phase {
    /// All phases, in nesting order.
    pub const ALL: [Phase; 4] = [
        Phase::Operation,
        Phase::Validation,
        Phase::Parsing,
        Phase::Executing,
    ];

    /// Returns the lowercase name of the phase.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Operation => "operation",
            Self::Validation => "validation",
            Self::Parsing => "parsing",
            Self::Executing => "executing",
        }
    }

    /// Returns the name of the scoped hook for this phase.
    pub const fn hook_name(&self) -> &'static str {
        match self {
            Self::Operation => "on_operation",
            Self::Validation => "on_validate",
            Self::Parsing => "on_parse",
            Self::Executing => "on_execute",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runs one phase's hook wrappers with scoped-acquisition semantics.
///
/// `enter` drives every wrapper's first advance in registration order;
/// `exit` drives every second advance in the same order (not reversed).
/// Exhausted steps are suppressed on exit; hook failures propagate and
/// abort the remaining steps of the phase.
pub struct PhaseRunner {
    phase: Phase,
    hooks: Vec<WrappedHook>,
}

impl PhaseRunner {
    /// Builds the wrapper list for `phase` from the registered extensions.
    pub(crate) fn new(
        phase: Phase,
        extensions: &[Arc<dyn Extension>],
    ) -> Result<Self, LifecycleError> {
        let mut hooks = Vec::new();
        for extension in extensions {
            if let Some(hook) = WrappedHook::for_phase(extension, phase)? {
                hooks.push(hook);
            }
        }
        Ok(Self { phase, hooks })
    }

    /// The phase this runner drives.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true if no extension hooks into this phase.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every wrapper's "before" step, awaiting suspending hooks.
    ///
    /// Entering again after the previous cycle completed begins a fresh
    /// cycle; this is what re-enters the executing phase once per
    /// subscription event.
    pub async fn enter(&mut self, cx: &mut ExecutionContext) -> Result<(), LifecycleError> {
        for hook in &mut self.hooks {
            hook.begin_cycle();
        }
        for hook in &mut self.hooks {
            hook.advance(cx).await?;
        }
        Ok(())
    }

    /// Runs every wrapper's "after" step, awaiting suspending hooks.
    pub async fn exit(&mut self, cx: &mut ExecutionContext) -> Result<(), LifecycleError> {
        for hook in &mut self.hooks {
            hook.advance(cx).await?;
        }
        Ok(())
    }

    /// Runs every wrapper's "before" step without a suspension point.
    pub fn enter_sync(&mut self, cx: &mut ExecutionContext) -> Result<(), LifecycleError> {
        for hook in &mut self.hooks {
            hook.begin_cycle();
        }
        for hook in &mut self.hooks {
            hook.advance_sync(cx)?;
        }
        Ok(())
    }

    /// Runs every wrapper's "after" step without a suspension point.
    pub fn exit_sync(&mut self, cx: &mut ExecutionContext) -> Result<(), LifecycleError> {
        for hook in &mut self.hooks {
            hook.advance_sync(cx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtensionError, HookResult};
    use crate::extension::{DeclaredHooks, HookMode, LifecycleStep, PhaseDecl};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn new(tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                tag,
                log: Arc::clone(log),
            })
        }

        fn record(&self, what: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", self.tag, what));
        }
    }

    #[async_trait]
    impl Extension for Recorder {
        fn name(&self) -> &'static str {
            "Recorder"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_execution(PhaseDecl::two_phase(HookMode::Blocking))
        }

        async fn on_execute(&self, step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
            match step {
                LifecycleStep::Enter => self.record("enter"),
                LifecycleStep::Exit => self.record("exit"),
            }
            Ok(())
        }
    }

    struct Suspending;

    #[async_trait]
    impl Extension for Suspending {
        fn name(&self) -> &'static str {
            "Suspending"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_execution(PhaseDecl::two_phase(HookMode::Suspend))
        }

        async fn on_execute(&self, _step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
            tokio::task::yield_now().await;
            Ok(())
        }
    }

    /// Declares itself blocking but suspends anyway.
    struct Lying;

    #[async_trait]
    impl Extension for Lying {
        fn name(&self) -> &'static str {
            "Lying"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_execution(PhaseDecl::two_phase(HookMode::Blocking))
        }

        async fn on_execute(&self, _step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
            tokio::task::yield_now().await;
            Ok(())
        }
    }

    struct FailingEnter;

    #[async_trait]
    impl Extension for FailingEnter {
        fn name(&self) -> &'static str {
            "FailingEnter"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_execution(PhaseDecl::two_phase(HookMode::Blocking))
        }

        async fn on_execute(&self, step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
            match step {
                LifecycleStep::Enter => Err(ExtensionError::new("refused")),
                LifecycleStep::Exit => Ok(()),
            }
        }
    }

    struct EnterOnly {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Extension for EnterOnly {
        fn name(&self) -> &'static str {
            "EnterOnly"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_execution(PhaseDecl::enter_only(HookMode::Blocking))
        }

        async fn on_execute(&self, _step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
            self.log.lock().unwrap().push("ran".to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_before_and_after_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let extensions: Vec<Arc<dyn Extension>> = vec![
            Recorder::new("first", &log),
            Recorder::new("second", &log),
        ];
        let mut runner = PhaseRunner::new(Phase::Executing, &extensions).unwrap();
        let mut cx = ExecutionContext::new("{ hello }");

        runner.enter(&mut cx).await.unwrap();
        runner.exit(&mut cx).await.unwrap();

        // The after steps run in registration order too, not reversed.
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:enter", "second:enter", "first:exit", "second:exit"]
        );
    }

    #[tokio::test]
    async fn test_third_advance_is_suppressed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let extensions: Vec<Arc<dyn Extension>> = vec![Recorder::new("only", &log)];
        let mut runner = PhaseRunner::new(Phase::Executing, &extensions).unwrap();
        let mut cx = ExecutionContext::new("{ hello }");

        runner.enter(&mut cx).await.unwrap();
        runner.exit(&mut cx).await.unwrap();
        runner.exit(&mut cx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["only:enter", "only:exit"]);
    }

    #[tokio::test]
    async fn test_reentry_begins_a_fresh_cycle() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let extensions: Vec<Arc<dyn Extension>> = vec![Recorder::new("hook", &log)];
        let mut runner = PhaseRunner::new(Phase::Executing, &extensions).unwrap();
        let mut cx = ExecutionContext::new("subscription { ticks }");

        for _ in 0..2 {
            runner.enter(&mut cx).await.unwrap();
            runner.exit(&mut cx).await.unwrap();
        }

        assert_eq!(
            *log.lock().unwrap(),
            vec!["hook:enter", "hook:exit", "hook:enter", "hook:exit"]
        );
    }

    #[test]
    fn test_suspending_hook_fails_in_blocking_runner() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(Suspending)];
        let mut runner = PhaseRunner::new(Phase::Executing, &extensions).unwrap();
        let mut cx = ExecutionContext::new("{ hello }");

        let err = runner.enter_sync(&mut cx).unwrap_err();
        assert!(matches!(err, LifecycleError::HookNotSynchronous { .. }));
    }

    #[tokio::test]
    async fn test_blocking_declaration_is_verified() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(Lying)];
        let mut runner = PhaseRunner::new(Phase::Executing, &extensions).unwrap();
        let mut cx = ExecutionContext::new("{ hello }");

        let err = runner.enter_sync(&mut cx).unwrap_err();
        assert!(matches!(err, LifecycleError::HookNotSynchronous { .. }));
    }

    #[tokio::test]
    async fn test_blocking_and_suspending_hooks_mix_in_async_runner() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let extensions: Vec<Arc<dyn Extension>> = vec![
            Recorder::new("blocking", &log),
            Arc::new(Suspending),
        ];
        let mut runner = PhaseRunner::new(Phase::Executing, &extensions).unwrap();
        let mut cx = ExecutionContext::new("{ hello }");

        runner.enter(&mut cx).await.unwrap();
        runner.exit(&mut cx).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["blocking:enter", "blocking:exit"]
        );
    }

    #[tokio::test]
    async fn test_hook_failure_aborts_remaining_steps() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let extensions: Vec<Arc<dyn Extension>> = vec![
            Arc::new(FailingEnter),
            Recorder::new("later", &log),
        ];
        let mut runner = PhaseRunner::new(Phase::Executing, &extensions).unwrap();
        let mut cx = ExecutionContext::new("{ hello }");

        let err = runner.enter(&mut cx).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Extension(_)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enter_only_hook_runs_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(EnterOnly {
            log: Arc::clone(&log),
        })];
        let mut runner = PhaseRunner::new(Phase::Executing, &extensions).unwrap();
        let mut cx = ExecutionContext::new("{ hello }");

        runner.enter(&mut cx).await.unwrap();
        runner.exit(&mut cx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["ran"]);
    }
}
