//! Wall-clock timing contributed to the response extensions.

use crate::error::HookResult;
use crate::extension::{DeclaredHooks, Extension, HookMode, LifecycleStep, PhaseDecl};
use async_trait::async_trait;
use graphlet_core::ExecutionContext;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Measures the duration of the whole operation and reports it under the
/// `timing` key of the response extensions.
#[derive(Default)]
pub struct Timing {
    started: Mutex<Option<Instant>>,
    elapsed: Mutex<Option<Duration>>,
}

impl Timing {
    /// Creates a fresh timer.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Extension for Timing {
    fn name(&self) -> &'static str {
        "Timing"
    }

    fn declared_hooks(&self) -> DeclaredHooks {
        DeclaredHooks::new()
            .with_operation(PhaseDecl::two_phase(HookMode::Blocking))
            .with_results(HookMode::Blocking)
    }

    async fn on_operation(&self, step: LifecycleStep, _cx: &mut ExecutionContext) -> HookResult {
        match step {
            LifecycleStep::Enter => {
                *self.started.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(Instant::now());
            }
            LifecycleStep::Exit => {
                let started = self
                    .started
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(started) = started {
                    *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some(started.elapsed());
                }
            }
        }
        Ok(())
    }

    async fn get_results(&self, _cx: &ExecutionContext) -> IndexMap<String, Value> {
        let mut data = IndexMap::new();
        let elapsed = *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(elapsed) = elapsed {
            data.insert(
                "timing".to_string(),
                serde_json::json!({ "duration_ms": elapsed.as_secs_f64() * 1000.0 }),
            );
        }
        data
    }
}
