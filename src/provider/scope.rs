//! Scoped service resolution.
//!
//! This module contains the Scope type for request-scoped services.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::registration::{AnyArc, Registration};
use crate::traits::{Resolver, ResolverCore};
use crate::{DiError, DiResult, Key, Lifetime};

use super::{ResolverContext, ServiceProvider};

/// Scoped service container for request-scoped dependency resolution.
///
/// # Lifetime Behavior
///
/// - **Singleton**: Resolved and cached in the root provider (shared across all scopes)
/// - **Scoped**: Resolved and cached within this specific scope
/// - **Transient**: Created fresh on every resolution (no caching)
///
/// Clones of a `Scope` are handles on the same scope and share its cache.
/// A scoped factory runs at most once per scope, even when several threads
/// resolve it at the same time.
///
/// # Examples
///
/// ```
/// use ferrous_bindings::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct DatabaseConnection(String);
/// struct UserService { db: Arc<DatabaseConnection> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_scoped_factory::<DatabaseConnection, _>(|_| {
///     DatabaseConnection("connection-123".to_string())
/// });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<DatabaseConnection>() }
/// });
///
/// let provider = collection.build();
/// let scope = provider.create_scope();
///
/// let user1 = scope.get_required::<UserService>();
/// let user2 = scope.get_required::<UserService>();
/// assert!(Arc::ptr_eq(&user1.db, &user2.db));
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    root: ServiceProvider,
    // Keyed by registration slot
    scoped: Mutex<HashMap<usize, Arc<OnceCell<AnyArc>>>>,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                root,
                scoped: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The provider this scope was created from.
    pub fn root(&self) -> &ServiceProvider {
        &self.inner.root
    }

    fn resolve_scoped(&self, reg: &Registration) -> DiResult<AnyArc> {
        let cell = self.inner.scoped.lock().entry(reg.slot).or_default().clone();

        // The map lock is released here; only this slot's cell blocks
        cell.get_or_try_init(|| (reg.ctor)(&ResolverContext::scope(self.clone()))).cloned()
    }

    fn resolve_registration(&self, reg: &Registration) -> DiResult<AnyArc> {
        match reg.lifetime {
            Lifetime::Singleton => self.inner.root.resolve_singleton(reg),
            Lifetime::Scoped => self.resolve_scoped(reg),
            Lifetime::Transient => (reg.ctor)(&ResolverContext::scope(self.clone())),
        }
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        match self.inner.root.inner().registry.get(key) {
            Some(reg) => self.resolve_registration(reg),
            None => Err(DiError::NotFound(key.display_name())),
        }
    }

    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        self.inner
            .root
            .inner()
            .registry
            .get_all(key)
            .map(|reg| self.resolve_registration(reg))
            .collect()
    }
}

impl Resolver for Scope {}
