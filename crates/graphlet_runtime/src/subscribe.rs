//! The subscription driver and its lazy result sequence.

use crate::collaborator::{EventStream, OperationRequest, SubscriptionSource, SubscriptionStart};
use crate::config::SubscriptionErrorPolicy;
use crate::engine::{finish_result, log_errors, Engine, PreparedOperation};
use crate::error::EngineError;
use futures::StreamExt;
use graphlet_core::{
    Document, ErrorCode, ExecutionContext, ExecutionResult, GraphQLError, OperationKind,
};
use graphlet_extensions::{ExtensionRunner, LifecycleError, Phase};
use indexmap::IndexMap;
use std::sync::Arc;

/// What `subscribe` hands back to the caller.
pub enum SubscriptionResponse {
    /// A single terminal result produced before any event was pulled:
    /// a parse/validate failure, or an immediate result from the source.
    PreExecution(ExecutionResult),
    /// A live sequence of per-event results.
    Stream(SubscriptionStream),
}

impl Engine {
    /// Starts a subscription.
    ///
    /// The operation-phase hooks stay entered for the lifetime of the
    /// returned stream; the executing-phase hooks re-enter once per event.
    pub async fn subscribe(
        &self,
        mut cx: ExecutionContext,
    ) -> Result<SubscriptionResponse, EngineError> {
        if cx.query.trim().is_empty() {
            return Err(EngineError::MissingQuery);
        }
        let source = match &self.source {
            Some(source) => Arc::clone(source),
            None => {
                return Err(EngineError::DisallowedOperation {
                    kind: OperationKind::Subscription,
                })
            }
        };
        let policy = self.config.subscription_error_policy;
        let mut runner = self.runner()?;

        runner.enter(Phase::Operation, &mut cx).await?;

        let prepared = match self.parse_and_validate(&mut cx, &mut runner).await {
            Ok(prepared) => prepared,
            Err(error) => {
                abort_operation(&mut runner, &mut cx).await;
                return Err(error);
            }
        };
        let document = match prepared {
            PreparedOperation::PreExecution(result) => {
                let result = finish_result(&runner, &mut cx, result).await;
                runner.exit(Phase::Operation, &mut cx).await?;
                return Ok(SubscriptionResponse::PreExecution(result));
            }
            PreparedOperation::Ready(document) => document,
        };

        let started = match self
            .start_subscription(&mut cx, &mut runner, &source, &document)
            .await
        {
            Ok(started) => started,
            Err(EngineError::Lifecycle(LifecycleError::Extension(failure))) => {
                // An executing-phase hook failed around the subscribe call:
                // the failure becomes the stream's only emitted result.
                let result = ExecutionResult::error(GraphQLError::coerce(&failure));
                let result = finish_result(&runner, &mut cx, result).await;
                return Ok(SubscriptionResponse::Stream(SubscriptionStream::terminal(
                    cx, runner, result, policy,
                )));
            }
            Err(error) => {
                abort_operation(&mut runner, &mut cx).await;
                return Err(error);
            }
        };

        match started {
            SubscriptionStart::Immediate(result) => {
                let result = finish_result(&runner, &mut cx, result).await;
                runner.exit(Phase::Operation, &mut cx).await?;
                Ok(SubscriptionResponse::PreExecution(result))
            }
            SubscriptionStart::Events(events) => Ok(SubscriptionResponse::Stream(
                SubscriptionStream::new(cx, runner, events, policy),
            )),
        }
    }

    /// Calls the source inside one executing-phase scope.
    async fn start_subscription(
        &self,
        cx: &mut ExecutionContext,
        runner: &mut ExtensionRunner,
        source: &Arc<dyn SubscriptionSource>,
        document: &Document,
    ) -> Result<SubscriptionStart, EngineError> {
        runner.enter(Phase::Executing, cx).await?;
        let request = OperationRequest::new(cx, document);
        let started = source.subscribe(request).await;
        runner.exit(Phase::Executing, cx).await?;
        Ok(started)
    }
}

async fn abort_operation(runner: &mut ExtensionRunner, cx: &mut ExecutionContext) {
    if let Err(exit_error) = runner.exit(Phase::Operation, cx).await {
        tracing::debug!(error = %exit_error, "operation exit failed while aborting");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Pulling events.
    Active,
    /// Terminal result emitted; the operation scope still needs its exit.
    Draining,
    /// Exhausted or closed; nothing left to do.
    Closed,
}

/// A single-pass, non-restartable sequence of subscription results.
///
/// Each call to [`next`](Self::next) re-enters the executing-phase hooks,
/// pulls one event, exits the hooks, and only then aggregates extension
/// results — identically on the event path and the error path. Dropping the
/// consumer early should go through [`close`](Self::close) so the
/// operation-phase hooks see their exit; dropping without closing still
/// releases the event source.
pub struct SubscriptionStream {
    cx: ExecutionContext,
    runner: ExtensionRunner,
    events: Option<EventStream>,
    staged: Option<ExecutionResult>,
    policy: SubscriptionErrorPolicy,
    state: StreamState,
}

impl SubscriptionStream {
    pub(crate) fn new(
        cx: ExecutionContext,
        runner: ExtensionRunner,
        events: EventStream,
        policy: SubscriptionErrorPolicy,
    ) -> Self {
        Self {
            cx,
            runner,
            events: Some(events),
            staged: None,
            policy,
            state: StreamState::Active,
        }
    }

    /// A stream that emits one prepared result and then finishes.
    pub(crate) fn terminal(
        cx: ExecutionContext,
        runner: ExtensionRunner,
        result: ExecutionResult,
        policy: SubscriptionErrorPolicy,
    ) -> Self {
        Self {
            cx,
            runner,
            events: None,
            staged: Some(result),
            policy,
            state: StreamState::Draining,
        }
    }

    /// Produces the next result, or `None` once the sequence is exhausted.
    ///
    /// An `Err` carries a configuration/usage defect; per-event failures
    /// come back as error-bearing results instead.
    pub async fn next(&mut self) -> Result<Option<ExecutionResult>, EngineError> {
        if let Some(result) = self.staged.take() {
            return Ok(Some(result));
        }
        match self.state {
            StreamState::Closed => Ok(None),
            StreamState::Draining => {
                self.finish_operation().await?;
                Ok(None)
            }
            StreamState::Active => self.pull_event().await,
        }
    }

    /// Ends the sequence early: releases the event source and runs the
    /// pending operation-phase exits exactly once.
    pub async fn close(&mut self) -> Result<(), EngineError> {
        self.staged = None;
        match self.state {
            StreamState::Closed => Ok(()),
            StreamState::Active | StreamState::Draining => self.finish_operation().await,
        }
    }

    /// The execution context owned by this subscription.
    pub fn context(&self) -> &ExecutionContext {
        &self.cx
    }

    async fn pull_event(&mut self) -> Result<Option<ExecutionResult>, EngineError> {
        // Extension contributions are per event.
        self.cx.extensions_results = IndexMap::new();

        if let Err(error) = self.runner.enter(Phase::Executing, &mut self.cx).await {
            return self.hook_failure(error).await;
        }

        let pulled = match self.events.as_mut() {
            Some(events) => events.next().await,
            None => None,
        };

        let (result, terminating) = match pulled {
            None => {
                if let Err(error) = self.runner.exit(Phase::Executing, &mut self.cx).await {
                    return self.hook_failure(error).await;
                }
                self.finish_operation().await?;
                return Ok(None);
            }
            Some(Ok(result)) => (result, false),
            Some(Err(failure)) => {
                // The source may not survive a failed pull; converting the
                // failure into a result keeps the sequence well-formed.
                let error = GraphQLError::coerce(&failure).with_code(ErrorCode::SubscriptionError);
                (
                    ExecutionResult::error(error),
                    self.policy == SubscriptionErrorPolicy::Terminate,
                )
            }
        };

        if let Err(error) = self.runner.exit(Phase::Executing, &mut self.cx).await {
            return self.hook_failure(error).await;
        }

        // Aggregation happens only after the executing exit completed, on
        // the event path and the error path alike.
        let result = self.handle_result(result).await;

        if terminating {
            self.events = None;
            self.state = StreamState::Draining;
        }
        Ok(Some(result))
    }

    /// An executing-phase hook failed: emit one error-bearing result and
    /// stop pulling events.
    async fn hook_failure(
        &mut self,
        error: LifecycleError,
    ) -> Result<Option<ExecutionResult>, EngineError> {
        match error {
            LifecycleError::Extension(failure) => {
                self.events = None;
                self.state = StreamState::Draining;
                let result = ExecutionResult::error(GraphQLError::coerce(&failure));
                Ok(Some(self.handle_result(result).await))
            }
            other => {
                self.events = None;
                self.state = StreamState::Closed;
                Err(EngineError::from(other))
            }
        }
    }

    async fn handle_result(&mut self, mut result: ExecutionResult) -> ExecutionResult {
        if result.has_errors() {
            self.cx.errors = result.errors.clone();
            log_errors(&result.errors);
        }
        result.extensions = self.runner.get_extension_results(&self.cx).await;
        self.cx.result = Some(result.clone());
        result
    }

    async fn finish_operation(&mut self) -> Result<(), EngineError> {
        self.state = StreamState::Closed;
        self.events = None;
        self.runner.exit(Phase::Operation, &mut self.cx).await?;
        Ok(())
    }
}
