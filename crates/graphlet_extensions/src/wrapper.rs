//! The two-phase step state machine around one extension hook.

use crate::error::{ExtensionError, LifecycleError};
use crate::extension::{Extension, HookMode, LifecycleStep, ScopedDecl};
use crate::phase::Phase;
use futures::FutureExt;
use graphlet_core::ExecutionContext;
use std::sync::Arc;

/// Where a step stands in its enter/exit cycle.
///
/// Once `Finished`, further advances are suppressed rather than rejected,
/// tolerating hooks that contribute no exit half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepState {
    NotStarted,
    AwaitingExit,
    Finished,
}

/// How the extension authored its hook for this phase, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookShape {
    /// Scoped hook driven at entry and exit.
    TwoPhase,
    /// Scoped hook driven once, at entry.
    EnterOnly,
    /// Legacy paired start/end callbacks.
    Legacy,
}

/// Which underlying method an advance dispatches to.
#[derive(Debug, Clone, Copy)]
enum Call {
    Scoped(LifecycleStep),
    LegacyStart,
    LegacyEnd,
}

/// One extension's hook for one phase, normalized into a two-phase step.
pub(crate) struct WrappedHook {
    extension: Arc<dyn Extension>,
    phase: Phase,
    shape: HookShape,
    mode: HookMode,
    state: StepState,
}

impl WrappedHook {
    /// Builds the wrapper for one extension/phase pair, or `None` when the
    /// extension declares nothing for the phase.
    pub(crate) fn for_phase(
        extension: &Arc<dyn Extension>,
        phase: Phase,
    ) -> Result<Option<Self>, LifecycleError> {
        let decl = extension.declared_hooks().phase(phase);
        match (decl.scoped, decl.is_legacy()) {
            (Some(_), true) => Err(LifecycleError::ConflictingHooks {
                extension: extension.name().to_string(),
                phase,
            }),
            (None, true) => {
                let mode = match (decl.legacy_start, decl.legacy_end) {
                    (Some(HookMode::Suspend), _) | (_, Some(HookMode::Suspend)) => {
                        HookMode::Suspend
                    }
                    _ => HookMode::Blocking,
                };
                Ok(Some(Self::new(extension, phase, HookShape::Legacy, mode)))
            }
            (Some(ScopedDecl::TwoPhase(mode)), false) => {
                Ok(Some(Self::new(extension, phase, HookShape::TwoPhase, mode)))
            }
            (Some(ScopedDecl::EnterOnly(mode)), false) => {
                Ok(Some(Self::new(extension, phase, HookShape::EnterOnly, mode)))
            }
            (None, false) => Ok(None),
        }
    }

    fn new(extension: &Arc<dyn Extension>, phase: Phase, shape: HookShape, mode: HookMode) -> Self {
        Self {
            extension: Arc::clone(extension),
            phase,
            shape,
            mode,
            state: StepState::NotStarted,
        }
    }

    /// Starts a fresh enter/exit cycle (used on phase re-entry).
    pub(crate) fn begin_cycle(&mut self) {
        self.state = StepState::NotStarted;
    }

    /// Drives the step one checkpoint forward; a no-op once finished.
    pub(crate) async fn advance(&mut self, cx: &mut ExecutionContext) -> Result<(), ExtensionError> {
        let call = match (self.state, self.shape) {
            (StepState::Finished, _) => return Ok(()),
            (StepState::NotStarted, HookShape::TwoPhase) => {
                self.state = StepState::AwaitingExit;
                Call::Scoped(LifecycleStep::Enter)
            }
            (StepState::NotStarted, HookShape::EnterOnly) => {
                self.state = StepState::Finished;
                Call::Scoped(LifecycleStep::Enter)
            }
            (StepState::NotStarted, HookShape::Legacy) => {
                self.state = StepState::AwaitingExit;
                Call::LegacyStart
            }
            (StepState::AwaitingExit, HookShape::TwoPhase) => {
                self.state = StepState::Finished;
                Call::Scoped(LifecycleStep::Exit)
            }
            (StepState::AwaitingExit, HookShape::Legacy) => {
                self.state = StepState::Finished;
                Call::LegacyEnd
            }
            // An enter-only step never waits for an exit.
            (StepState::AwaitingExit, HookShape::EnterOnly) => return Ok(()),
        };
        let result = self.dispatch(call, cx).await;
        if result.is_err() {
            // A failed step is dead; later advances are suppressed.
            self.state = StepState::Finished;
        }
        result
    }

    /// Drives the step from a blocking caller.
    ///
    /// A step that declares suspension, or whose future does not resolve on
    /// the first poll, is a fatal usage error: the caller has no suspension
    /// point available.
    pub(crate) fn advance_sync(&mut self, cx: &mut ExecutionContext) -> Result<(), LifecycleError> {
        if self.state == StepState::Finished {
            return Ok(());
        }
        if self.mode == HookMode::Suspend {
            return Err(LifecycleError::HookNotSynchronous {
                extension: self.extension.name().to_string(),
                hook: self.phase.hook_name(),
            });
        }
        match self.advance(cx).now_or_never() {
            Some(result) => result.map_err(LifecycleError::from),
            None => Err(LifecycleError::HookNotSynchronous {
                extension: self.extension.name().to_string(),
                hook: self.phase.hook_name(),
            }),
        }
    }

    async fn dispatch(&self, call: Call, cx: &mut ExecutionContext) -> Result<(), ExtensionError> {
        match (call, self.phase) {
            (Call::Scoped(step), Phase::Operation) => self.extension.on_operation(step, cx).await,
            (Call::Scoped(step), Phase::Validation) => self.extension.on_validate(step, cx).await,
            (Call::Scoped(step), Phase::Parsing) => self.extension.on_parse(step, cx).await,
            (Call::Scoped(step), Phase::Executing) => self.extension.on_execute(step, cx).await,
            (Call::LegacyStart, Phase::Operation) => self.extension.on_operation_start(cx).await,
            (Call::LegacyEnd, Phase::Operation) => self.extension.on_operation_end(cx).await,
            (Call::LegacyStart, Phase::Validation) => self.extension.on_validation_start(cx).await,
            (Call::LegacyEnd, Phase::Validation) => self.extension.on_validation_end(cx).await,
            (Call::LegacyStart, Phase::Parsing) => self.extension.on_parsing_start(cx).await,
            (Call::LegacyEnd, Phase::Parsing) => self.extension.on_parsing_end(cx).await,
            (Call::LegacyStart, Phase::Executing) => self.extension.on_executing_start(cx).await,
            (Call::LegacyEnd, Phase::Executing) => self.extension.on_executing_end(cx).await,
        }
    }
}
