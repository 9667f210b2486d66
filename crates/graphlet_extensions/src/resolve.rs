//! The composed field-resolver middleware chain.

use crate::extension::Extension;
use futures::future::BoxFuture;
use graphlet_core::{GraphQLError, ResolverArgs, ResolverInfo};
use serde_json::Value;
use std::sync::Arc;

/// Boxed future produced by resolver middleware.
pub type ResolveFuture<'a> = BoxFuture<'a, Result<Value, GraphQLError>>;

/// The innermost resolver for one field, supplied by the executor.
pub type TerminalResolver = Box<
    dyn Fn(Value, ResolverArgs, ResolverInfo) -> BoxFuture<'static, Result<Value, GraphQLError>>
        + Send
        + Sync,
>;

/// The remainder of the resolve chain, handed to each `resolve` hook.
///
/// Calling [`run`](Self::run) invokes the next extension in registration
/// order, or the terminal resolver once the chain is exhausted.
pub struct NextResolve<'a> {
    links: &'a [Arc<dyn Extension>],
    terminal: &'a TerminalResolver,
}

impl<'a> NextResolve<'a> {
    /// Invokes the rest of the chain for this field.
    pub fn run(
        self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        info: &'a ResolverInfo,
    ) -> ResolveFuture<'a> {
        match self.links.split_first() {
            Some((head, rest)) => {
                let next = NextResolve {
                    links: rest,
                    terminal: self.terminal,
                };
                Box::pin(async move { head.resolve(next, parent, args, info).await })
            }
            None => (self.terminal)(parent.clone(), args.clone(), info.clone()),
        }
    }
}

/// The composed `resolve` hooks of one operation's extensions.
///
/// The first-registered extension is outermost. Executors thread every
/// field resolution through [`dispatch`](Self::dispatch).
pub struct ResolveChain {
    links: Vec<Arc<dyn Extension>>,
}

impl ResolveChain {
    /// Collects the extensions declaring a `resolve` override, in order.
    pub fn new(extensions: &[Arc<dyn Extension>]) -> Self {
        Self {
            links: extensions
                .iter()
                .filter(|extension| extension.declared_hooks().resolve)
                .cloned()
                .collect(),
        }
    }

    /// Returns true if no extension wraps field resolution.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Resolves one field through the chain, ending at `terminal`.
    pub fn dispatch<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        info: &'a ResolverInfo,
        terminal: &'a TerminalResolver,
    ) -> ResolveFuture<'a> {
        NextResolve {
            links: &self.links,
            terminal,
        }
        .run(parent, args, info)
    }
}
