//! Extension factories and registration-time validation.

use crate::error::LifecycleError;
use crate::extension::{Extension, ExtensionFactory};
use crate::phase::Phase;
use std::fmt;
use std::sync::Arc;

/// A recorded use of the deprecated legacy hook style.
#[derive(Debug, Clone)]
pub struct DeprecationNotice {
    /// The extension using legacy hooks.
    pub extension: String,
    /// The phase the legacy pair instruments.
    pub phase: Phase,
}

impl fmt::Display for DeprecationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "extension `{}` uses deprecated start/end hooks for the {} phase; implement `{}` instead",
            self.extension,
            self.phase,
            self.phase.hook_name()
        )
    }
}

/// The set of extension types registered with an engine.
///
/// Registration validates each extension's declared capability set once,
/// before any operation executes; per-operation instances are created from
/// the stored factories.
#[derive(Default)]
pub struct ExtensionRegistry {
    factories: Vec<Arc<dyn ExtensionFactory>>,
    deprecations: Vec<DeprecationNotice>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extension factory, validating its declarations.
    ///
    /// Declaring both legacy and scoped hooks for one phase is a fatal
    /// configuration error. Legacy-only declarations are accepted but
    /// recorded as deprecated.
    pub fn register(
        &mut self,
        factory: impl ExtensionFactory + 'static,
    ) -> Result<(), LifecycleError> {
        let factory: Arc<dyn ExtensionFactory> = Arc::new(factory);
        let probe = factory.create();
        let declared = probe.declared_hooks();
        for phase in Phase::ALL {
            let decl = declared.phase(phase);
            if decl.scoped.is_some() && decl.is_legacy() {
                return Err(LifecycleError::ConflictingHooks {
                    extension: probe.name().to_string(),
                    phase,
                });
            }
            if decl.is_legacy() {
                let notice = DeprecationNotice {
                    extension: probe.name().to_string(),
                    phase,
                };
                tracing::warn!(
                    extension = %notice.extension,
                    phase = %notice.phase,
                    "legacy start/end extension hooks are deprecated"
                );
                self.deprecations.push(notice);
            }
        }
        self.factories.push(factory);
        Ok(())
    }

    /// Deprecation notices recorded during registration.
    pub fn deprecations(&self) -> &[DeprecationNotice] {
        &self.deprecations
    }

    /// Creates one fresh instance per registered extension, in order.
    pub fn instantiate(&self) -> Vec<Arc<dyn Extension>> {
        self.factories.iter().map(|factory| factory.create()).collect()
    }

    /// Returns true if no extensions are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// The number of registered extensions.
    pub fn len(&self) -> usize {
        self.factories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{DeclaredHooks, HookMode, PhaseDecl};
    use async_trait::async_trait;

    struct LegacyOnly;

    #[async_trait]
    impl Extension for LegacyOnly {
        fn name(&self) -> &'static str {
            "LegacyOnly"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            DeclaredHooks::new().with_execution(PhaseDecl::legacy(
                Some(HookMode::Blocking),
                Some(HookMode::Blocking),
            ))
        }
    }

    struct Conflicted;

    #[async_trait]
    impl Extension for Conflicted {
        fn name(&self) -> &'static str {
            "Conflicted"
        }

        fn declared_hooks(&self) -> DeclaredHooks {
            let mut decl = PhaseDecl::two_phase(HookMode::Blocking);
            decl.legacy_start = Some(HookMode::Blocking);
            DeclaredHooks::new().with_parsing(decl)
        }
    }

    #[test]
    fn test_conflicting_hooks_fail_at_registration() {
        let mut registry = ExtensionRegistry::new();
        let err = registry
            .register(|| Arc::new(Conflicted) as Arc<dyn Extension>)
            .unwrap_err();

        match err {
            LifecycleError::ConflictingHooks { extension, phase } => {
                assert_eq!(extension, "Conflicted");
                assert_eq!(phase, Phase::Parsing);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_legacy_only_is_recorded_as_deprecated() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(|| Arc::new(LegacyOnly) as Arc<dyn Extension>)
            .unwrap();

        assert_eq!(registry.len(), 1);
        let notices = registry.deprecations();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].extension, "LegacyOnly");
        assert_eq!(notices[0].phase, Phase::Executing);
        assert!(notices[0].to_string().contains("on_execute"));
    }

    #[test]
    fn test_instantiate_creates_fresh_instances_in_order() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(|| Arc::new(LegacyOnly) as Arc<dyn Extension>)
            .unwrap();
        registry
            .register(|| Arc::new(LegacyOnly) as Arc<dyn Extension>)
            .unwrap();

        let first = registry.instantiate();
        let second = registry.instantiate();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert!(!Arc::ptr_eq(&first[0], &second[0]));
    }
}
