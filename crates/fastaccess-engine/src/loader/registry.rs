//! Scope registry: one loading context per parent scope

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::model::{ClassId, ScopeId, ScopeResolver};

use super::context::LoadingContext;

static GLOBAL: Lazy<Arc<ScopeRegistry>> = Lazy::new(|| Arc::new(ScopeRegistry::new(ScopeId::SYSTEM)));

/// Maps isolation scopes to the loading contexts that host their units.
///
/// The system scope resolves without locking. Every other scope goes
/// through a linear scan under one mutex; the number of distinct scopes in a
/// process is expected to stay small. Contexts are never evicted.
#[derive(Debug)]
pub struct ScopeRegistry {
    system_scope: ScopeId,
    system: Arc<LoadingContext>,
    contexts: Mutex<Vec<Arc<LoadingContext>>>,
}

impl ScopeRegistry {
    /// Create a registry whose fast path serves `system_scope`
    pub fn new(system_scope: ScopeId) -> Self {
        Self {
            system_scope,
            system: Arc::new(LoadingContext::new(system_scope)),
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Process-wide registry, created on first use
    pub fn global() -> Arc<ScopeRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Scope served by the fast path
    pub fn system_scope(&self) -> ScopeId {
        self.system_scope
    }

    /// Context hosting the system scope
    pub fn system_context(&self) -> &Arc<LoadingContext> {
        &self.system
    }

    /// Context parented to `scope`, created on first request
    pub fn resolve(&self, scope: ScopeId) -> Arc<LoadingContext> {
        if scope == self.system_scope {
            return Arc::clone(&self.system);
        }

        let mut contexts = self.contexts.lock();
        if let Some(ctx) = contexts.iter().find(|ctx| ctx.parent() == scope) {
            return Arc::clone(ctx);
        }

        let ctx = Arc::new(LoadingContext::new(scope));
        tracing::debug!(scope = scope.0, context = ctx.id(), "created loading context");
        contexts.push(Arc::clone(&ctx));
        ctx
    }

    /// Context for the scope that defines `class`
    pub fn resolve_class(&self, resolver: &dyn ScopeResolver, class: ClassId) -> Arc<LoadingContext> {
        self.resolve(resolver.scope_of(class))
    }

    /// Number of contexts, the system context included
    pub fn context_count(&self) -> usize {
        self.contexts.lock().len() + 1
    }
}
