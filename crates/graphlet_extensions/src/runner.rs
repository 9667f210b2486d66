//! The per-operation extension runner and results aggregation.

use crate::error::LifecycleError;
use crate::extension::{Extension, HookMode};
use crate::phase::{Phase, PhaseRunner};
use crate::resolve::ResolveChain;
use futures::FutureExt;
use graphlet_core::ExecutionContext;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Drives one operation's extensions through the four lifecycle phases.
///
/// The four phase runners are built once per operation from the same
/// extension-instance list, each filtering to the hooks declared for its
/// phase.
pub struct ExtensionRunner {
    extensions: Vec<Arc<dyn Extension>>,
    operation: PhaseRunner,
    validation: PhaseRunner,
    parsing: PhaseRunner,
    executing: PhaseRunner,
}

impl ExtensionRunner {
    /// Builds the phase runners for one operation.
    pub fn new(extensions: Vec<Arc<dyn Extension>>) -> Result<Self, LifecycleError> {
        let operation = PhaseRunner::new(Phase::Operation, &extensions)?;
        let validation = PhaseRunner::new(Phase::Validation, &extensions)?;
        let parsing = PhaseRunner::new(Phase::Parsing, &extensions)?;
        let executing = PhaseRunner::new(Phase::Executing, &extensions)?;
        Ok(Self {
            extensions,
            operation,
            validation,
            parsing,
            executing,
        })
    }

    fn phase_runner(&mut self, phase: Phase) -> &mut PhaseRunner {
        match phase {
            Phase::Operation => &mut self.operation,
            Phase::Validation => &mut self.validation,
            Phase::Parsing => &mut self.parsing,
            Phase::Executing => &mut self.executing,
        }
    }

    /// Runs the "before" steps of one phase, awaiting suspending hooks.
    pub async fn enter(
        &mut self,
        phase: Phase,
        cx: &mut ExecutionContext,
    ) -> Result<(), LifecycleError> {
        self.phase_runner(phase).enter(cx).await
    }

    /// Runs the "after" steps of one phase, awaiting suspending hooks.
    pub async fn exit(
        &mut self,
        phase: Phase,
        cx: &mut ExecutionContext,
    ) -> Result<(), LifecycleError> {
        self.phase_runner(phase).exit(cx).await
    }

    /// Runs the "before" steps of one phase without a suspension point.
    pub fn enter_sync(
        &mut self,
        phase: Phase,
        cx: &mut ExecutionContext,
    ) -> Result<(), LifecycleError> {
        self.phase_runner(phase).enter_sync(cx)
    }

    /// Runs the "after" steps of one phase without a suspension point.
    pub fn exit_sync(
        &mut self,
        phase: Phase,
        cx: &mut ExecutionContext,
    ) -> Result<(), LifecycleError> {
        self.phase_runner(phase).exit_sync(cx)
    }

    /// The composed resolver middleware for this operation's extensions.
    pub fn resolve_chain(&self) -> ResolveChain {
        ResolveChain::new(&self.extensions)
    }

    /// Collects every extension's `get_results` contribution.
    ///
    /// Mappings merge in registration order (later extensions overwrite
    /// earlier keys); the context's per-iteration mapping overlays last and
    /// always wins.
    pub async fn get_extension_results(
        &self,
        cx: &ExecutionContext,
    ) -> IndexMap<String, Value> {
        let mut data = IndexMap::new();
        for extension in &self.extensions {
            if extension.declared_hooks().results.is_some() {
                data.extend(extension.get_results(cx).await);
            }
        }
        for (key, value) in &cx.extensions_results {
            data.insert(key.clone(), value.clone());
        }
        data
    }

    /// Blocking variant of [`get_extension_results`](Self::get_extension_results).
    ///
    /// Fails if any extension declares a suspending results hook.
    pub fn get_extension_results_sync(
        &self,
        cx: &ExecutionContext,
    ) -> Result<IndexMap<String, Value>, LifecycleError> {
        let mut data = IndexMap::new();
        for extension in &self.extensions {
            match extension.declared_hooks().results {
                None => {}
                Some(HookMode::Suspend) => {
                    return Err(LifecycleError::ResultsNotSynchronous {
                        extension: extension.name().to_string(),
                    });
                }
                Some(HookMode::Blocking) => match extension.get_results(cx).now_or_never() {
                    Some(results) => data.extend(results),
                    None => {
                        return Err(LifecycleError::ResultsNotSynchronous {
                            extension: extension.name().to_string(),
                        });
                    }
                },
            }
        }
        for (key, value) in &cx.extensions_results {
            data.insert(key.clone(), value.clone());
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookResult;
    use crate::extension::{DeclaredHooks, LifecycleStep, PhaseDecl};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Contributing {
        name: &'static str,
        key: &'static str,
        value: &'static str,
        mode: HookMode,
    }

    #[async_trait]
    impl Extension for Contributing {
        fn name(&self) -> &'static str {
            self.name
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_results(self.mode)
        }

        async fn get_results(&self, _cx: &ExecutionContext) -> IndexMap<String, Value> {
            if self.mode == HookMode::Suspend {
                tokio::task::yield_now().await;
            }
            let mut data = IndexMap::new();
            data.insert(self.key.to_string(), serde_json::json!(self.value));
            data
        }
    }

    #[tokio::test]
    async fn test_results_merge_in_registration_order() {
        let extensions: Vec<Arc<dyn Extension>> = vec![
            Arc::new(Contributing {
                name: "first",
                key: "shared",
                value: "from-first",
                mode: HookMode::Blocking,
            }),
            Arc::new(Contributing {
                name: "second",
                key: "shared",
                value: "from-second",
                mode: HookMode::Blocking,
            }),
        ];
        let runner = ExtensionRunner::new(extensions).unwrap();
        let cx = ExecutionContext::new("{ hello }");

        let results = runner.get_extension_results(&cx).await;
        assert_eq!(results["shared"], serde_json::json!("from-second"));
    }

    #[tokio::test]
    async fn test_context_mapping_overlays_last() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(Contributing {
            name: "ext",
            key: "trace",
            value: "from-extension",
            mode: HookMode::Blocking,
        })];
        let runner = ExtensionRunner::new(extensions).unwrap();
        let mut cx = ExecutionContext::new("{ hello }");
        cx.extensions_results
            .insert("trace".to_string(), serde_json::json!("from-context"));

        let results = runner.get_extension_results(&cx).await;
        assert_eq!(results["trace"], serde_json::json!("from-context"));

        let sync_results = runner.get_extension_results_sync(&cx).unwrap();
        assert_eq!(sync_results["trace"], serde_json::json!("from-context"));
    }

    #[tokio::test]
    async fn test_suspending_results_hook_fails_in_blocking_aggregation() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(Contributing {
            name: "slow",
            key: "k",
            value: "v",
            mode: HookMode::Suspend,
        })];
        let runner = ExtensionRunner::new(extensions).unwrap();
        let cx = ExecutionContext::new("{ hello }");

        let err = runner.get_extension_results_sync(&cx).unwrap_err();
        assert!(matches!(err, LifecycleError::ResultsNotSynchronous { .. }));

        // The suspending hook is fine when awaited.
        let results = runner.get_extension_results(&cx).await;
        assert_eq!(results["k"], serde_json::json!("v"));
    }

    struct LegacyRecorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Extension for LegacyRecorder {
        fn name(&self) -> &'static str {
            "LegacyRecorder"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_execution(PhaseDecl::legacy(
                Some(HookMode::Blocking),
                Some(HookMode::Blocking),
            ))
        }

        async fn on_executing_start(&self, _cx: &mut ExecutionContext) -> HookResult {
            self.log.lock().unwrap().push("start".to_string());
            Ok(())
        }

        async fn on_executing_end(&self, _cx: &mut ExecutionContext) -> HookResult {
            self.log.lock().unwrap().push("end".to_string());
            Ok(())
        }
    }

    struct ScopedRecorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Extension for ScopedRecorder {
        fn name(&self) -> &'static str {
            "ScopedRecorder"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_execution(PhaseDecl::two_phase(HookMode::Blocking))
        }

        async fn on_execute(&self, step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
            let what = match step {
                LifecycleStep::Enter => "start",
                LifecycleStep::Exit => "end",
            };
            self.log.lock().unwrap().push(what.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_legacy_pair_matches_scoped_hook_behavior() {
        let legacy_log = Arc::new(Mutex::new(Vec::new()));
        let scoped_log = Arc::new(Mutex::new(Vec::new()));

        let mut legacy_runner = ExtensionRunner::new(vec![Arc::new(LegacyRecorder {
            log: Arc::clone(&legacy_log),
        }) as Arc<dyn Extension>])
        .unwrap();
        let mut scoped_runner = ExtensionRunner::new(vec![Arc::new(ScopedRecorder {
            log: Arc::clone(&scoped_log),
        }) as Arc<dyn Extension>])
        .unwrap();

        let mut cx = ExecutionContext::new("{ hello }");
        legacy_runner.enter(Phase::Executing, &mut cx).await.unwrap();
        legacy_runner.exit(Phase::Executing, &mut cx).await.unwrap();
        scoped_runner.enter(Phase::Executing, &mut cx).await.unwrap();
        scoped_runner.exit(Phase::Executing, &mut cx).await.unwrap();

        assert_eq!(*legacy_log.lock().unwrap(), *scoped_log.lock().unwrap());
    }
}
