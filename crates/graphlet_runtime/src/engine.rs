//! The engine facade and the query/mutation drivers.

use crate::collaborator::{DocumentProcessor, OperationExecutor, OperationRequest, SubscriptionSource};
use crate::config::EngineConfig;
use crate::error::EngineError;
use futures::FutureExt;
use graphlet_core::{Document, ExecutionContext, ExecutionResult, GraphQLError, OperationKind};
use graphlet_extensions::{ExtensionFactory, ExtensionRegistry, ExtensionRunner, LifecycleError, Phase};
use std::sync::Arc;

/// Outcome of the parse/validate stage.
pub(crate) enum PreparedOperation {
    /// Parsing and validation succeeded; execution may proceed.
    Ready(Document),
    /// A pre-execution error result, to be surfaced without executing.
    PreExecution(ExecutionResult),
}

/// A GraphQL execution engine bound to its external collaborators.
///
/// The engine owns no schema knowledge of its own: parsing, validation,
/// execution and subscription events all come from the collaborators. What
/// it contributes is the lifecycle — ordered extension hooks around every
/// phase, error recovery into results, and the subscription event loop.
pub struct Engine {
    pub(crate) processor: Arc<dyn DocumentProcessor>,
    pub(crate) executor: Arc<dyn OperationExecutor>,
    pub(crate) source: Option<Arc<dyn SubscriptionSource>>,
    pub(crate) registry: ExtensionRegistry,
    pub(crate) config: EngineConfig,
}

impl Engine {
    /// Creates an engine over a document processor and an executor.
    pub fn new(processor: Arc<dyn DocumentProcessor>, executor: Arc<dyn OperationExecutor>) -> Self {
        Self {
            processor,
            executor,
            source: None,
            registry: ExtensionRegistry::new(),
            config: EngineConfig::default(),
        }
    }

    /// Enables subscriptions through the given source.
    pub fn with_subscriptions(mut self, source: Arc<dyn SubscriptionSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Replaces the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers an extension factory, validating its declared hooks.
    pub fn register_extension(
        &mut self,
        factory: impl ExtensionFactory + 'static,
    ) -> Result<(), LifecycleError> {
        self.registry.register(factory)
    }

    /// The extension registry.
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn runner(&self) -> Result<ExtensionRunner, LifecycleError> {
        ExtensionRunner::new(self.registry.instantiate())
    }

    /// Executes a query or mutation, awaiting suspending hooks and the
    /// executor.
    ///
    /// Parse, validation and executor errors come back inside the result;
    /// an `Err` means a configuration/usage defect or an extension failure.
    pub async fn execute(&self, mut cx: ExecutionContext) -> Result<ExecutionResult, EngineError> {
        if cx.query.trim().is_empty() {
            return Err(EngineError::MissingQuery);
        }
        let mut runner = self.runner()?;

        runner.enter(Phase::Operation, &mut cx).await?;
        let outcome = self.run_operation(&mut cx, &mut runner).await;
        let exited = runner.exit(Phase::Operation, &mut cx).await;
        let result = outcome?;
        exited?;

        Ok(finish_result(&runner, &mut cx, result).await)
    }

    /// Blocking variant of [`execute`](Self::execute).
    ///
    /// Every hook, and the executor itself, must complete without
    /// suspending; anything else is a fatal usage error.
    pub fn execute_sync(&self, mut cx: ExecutionContext) -> Result<ExecutionResult, EngineError> {
        if cx.query.trim().is_empty() {
            return Err(EngineError::MissingQuery);
        }
        let mut runner = self.runner()?;

        runner.enter_sync(Phase::Operation, &mut cx)?;
        let outcome = self.run_operation_sync(&mut cx, &mut runner);
        let exited = runner.exit_sync(Phase::Operation, &mut cx);
        let mut result = outcome?;
        exited?;

        if result.has_errors() {
            cx.errors = result.errors.clone();
            log_errors(&result.errors);
        }
        result.extensions = runner.get_extension_results_sync(&cx)?;
        cx.result = Some(result.clone());
        Ok(result)
    }

    async fn run_operation(
        &self,
        cx: &mut ExecutionContext,
        runner: &mut ExtensionRunner,
    ) -> Result<ExecutionResult, EngineError> {
        match self.parse_and_validate(cx, runner).await? {
            PreparedOperation::PreExecution(result) => Ok(result),
            PreparedOperation::Ready(document) => {
                runner.enter(Phase::Executing, cx).await?;
                let result = match cx.result.clone() {
                    // An extension short-circuited execution.
                    Some(result) => result,
                    None => {
                        let chain = runner.resolve_chain();
                        let request = OperationRequest::new(cx, &document);
                        let result = self.executor.execute(request, &chain).await;
                        cx.result = Some(result.clone());
                        result
                    }
                };
                runner.exit(Phase::Executing, cx).await?;
                Ok(result)
            }
        }
    }

    fn run_operation_sync(
        &self,
        cx: &mut ExecutionContext,
        runner: &mut ExtensionRunner,
    ) -> Result<ExecutionResult, EngineError> {
        match self.parse_and_validate_sync(cx, runner)? {
            PreparedOperation::PreExecution(result) => Ok(result),
            PreparedOperation::Ready(document) => {
                runner.enter_sync(Phase::Executing, cx)?;
                let result = match cx.result.clone() {
                    Some(result) => result,
                    None => {
                        let chain = runner.resolve_chain();
                        let request = OperationRequest::new(cx, &document);
                        match self.executor.execute(request, &chain).now_or_never() {
                            Some(result) => {
                                cx.result = Some(result.clone());
                                result
                            }
                            None => return Err(EngineError::ExecutionNotSynchronous),
                        }
                    }
                };
                runner.exit_sync(Phase::Executing, cx)?;
                Ok(result)
            }
        }
    }

    pub(crate) async fn parse_and_validate(
        &self,
        cx: &mut ExecutionContext,
        runner: &mut ExtensionRunner,
    ) -> Result<PreparedOperation, EngineError> {
        runner.enter(Phase::Parsing, cx).await?;
        let parse_errors = self.run_parse(cx).err();
        runner.exit(Phase::Parsing, cx).await?;
        if let Some(errors) = parse_errors {
            return Ok(PreparedOperation::PreExecution(ExecutionResult::from_errors(errors)));
        }

        self.check_operation_allowed(cx)?;

        runner.enter(Phase::Validation, cx).await?;
        self.run_validation(cx);
        let failed = !cx.errors.is_empty();
        runner.exit(Phase::Validation, cx).await?;
        if failed {
            return Ok(PreparedOperation::PreExecution(ExecutionResult::from_errors(
                cx.errors.clone(),
            )));
        }

        match cx.document.clone() {
            Some(document) => Ok(PreparedOperation::Ready(document)),
            None => Err(EngineError::MissingDocument),
        }
    }

    fn parse_and_validate_sync(
        &self,
        cx: &mut ExecutionContext,
        runner: &mut ExtensionRunner,
    ) -> Result<PreparedOperation, EngineError> {
        runner.enter_sync(Phase::Parsing, cx)?;
        let parse_errors = self.run_parse(cx).err();
        runner.exit_sync(Phase::Parsing, cx)?;
        if let Some(errors) = parse_errors {
            return Ok(PreparedOperation::PreExecution(ExecutionResult::from_errors(errors)));
        }

        self.check_operation_allowed(cx)?;

        runner.enter_sync(Phase::Validation, cx)?;
        self.run_validation(cx);
        let failed = !cx.errors.is_empty();
        runner.exit_sync(Phase::Validation, cx)?;
        if failed {
            return Ok(PreparedOperation::PreExecution(ExecutionResult::from_errors(
                cx.errors.clone(),
            )));
        }

        match cx.document.clone() {
            Some(document) => Ok(PreparedOperation::Ready(document)),
            None => Err(EngineError::MissingDocument),
        }
    }

    fn run_parse(&self, cx: &mut ExecutionContext) -> Result<(), Vec<GraphQLError>> {
        if cx.document.is_some() {
            return Ok(());
        }
        match self.processor.parse(cx) {
            Ok(parsed) => {
                cx.operation_kind = Some(parsed.kind);
                cx.document = Some(parsed.document);
                Ok(())
            }
            Err(errors) => {
                cx.errors = errors.clone();
                Err(errors)
            }
        }
    }

    fn run_validation(&self, cx: &mut ExecutionContext) {
        // Skipped when disabled by an extension, or when an earlier stage
        // already recorded errors.
        if cx.validation_disabled || !cx.errors.is_empty() {
            return;
        }
        if let Some(document) = cx.document.clone() {
            cx.errors = self.processor.validate(cx, &document);
        }
    }

    fn check_operation_allowed(&self, cx: &ExecutionContext) -> Result<(), EngineError> {
        let kind = cx.operation_kind.unwrap_or(OperationKind::Query);
        if self.config.allowed_operations.contains(&kind) {
            Ok(())
        } else {
            Err(EngineError::DisallowedOperation { kind })
        }
    }
}

/// Records result errors on the context, logs them before extensions can
/// rewrite them, and merges the extension contributions into the result.
pub(crate) async fn finish_result(
    runner: &ExtensionRunner,
    cx: &mut ExecutionContext,
    mut result: ExecutionResult,
) -> ExecutionResult {
    if result.has_errors() {
        cx.errors = result.errors.clone();
        log_errors(&result.errors);
    }
    result.extensions = runner.get_extension_results(cx).await;
    cx.result = Some(result.clone());
    result
}

pub(crate) fn log_errors(errors: &[GraphQLError]) {
    for error in errors {
        tracing::error!(error = %error, "operation produced an error");
    }
}
