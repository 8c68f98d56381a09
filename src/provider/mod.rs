//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type and related functionality
//! for resolving registered services from the DI container.

use std::sync::Arc;

use crate::registration::{AnyArc, Registration, Registry};
use crate::traits::{Resolver, ResolverCore};
use crate::{DiError, DiResult, Key, Lifetime};

pub mod context;
pub mod scope;
pub use context::ResolverContext;
pub use scope::Scope;

/// Service provider for resolving dependencies from the DI container.
///
/// The `ServiceProvider` resolves services according to their registered
/// lifetimes. Singletons are cached per registration and created at most
/// once, even when several threads race on first access. Scoped services
/// can only be resolved from a [`Scope`].
///
/// Cloning a provider is cheap; clones share the same registrations and
/// singleton caches.
///
/// # Examples
///
/// ```
/// use ferrous_bindings::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub(crate) registry: Registry,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(ProviderInner { registry }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// Each scope keeps its own cache of scoped instances and shares the
    /// root's singletons.
    ///
    /// ```
    /// use ferrous_bindings::{ServiceCollection, Resolver};
    /// use std::sync::{Arc, Mutex};
    ///
    /// struct RequestId(String);
    ///
    /// let mut collection = ServiceCollection::new();
    /// let counter = Arc::new(Mutex::new(0));
    /// let counter_clone = counter.clone();
    ///
    /// collection.add_scoped_factory::<RequestId, _>(move |_| {
    ///     let mut c = counter_clone.lock().unwrap();
    ///     *c += 1;
    ///     RequestId(format!("req-{}", *c))
    /// });
    ///
    /// let provider = collection.build();
    /// let scope1 = provider.create_scope();
    /// let scope2 = provider.create_scope();
    ///
    /// let req1a = scope1.get_required::<RequestId>();
    /// let req1b = scope1.get_required::<RequestId>();
    /// let req2 = scope2.get_required::<RequestId>();
    ///
    /// assert!(Arc::ptr_eq(&req1a, &req1b));
    /// assert!(!Arc::ptr_eq(&req1a, &req2));
    /// ```
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Resolves a singleton registration, creating it on first use.
    pub(crate) fn resolve_singleton(&self, reg: &Registration) -> DiResult<AnyArc> {
        match &reg.singleton {
            Some(cell) => cell
                .get_or_try_init(|| {
                    tracing::trace!(service = %reg.key, "creating singleton");
                    (reg.ctor)(&ResolverContext::root(self.clone()))
                })
                .cloned(),
            None => (reg.ctor)(&ResolverContext::root(self.clone())),
        }
    }

    fn resolve_registration(&self, reg: &Registration) -> DiResult<AnyArc> {
        match reg.lifetime {
            Lifetime::Singleton => self.resolve_singleton(reg),
            Lifetime::Scoped => Err(DiError::WrongLifetime(
                "Cannot resolve scoped service from root provider",
            )),
            Lifetime::Transient => (reg.ctor)(&ResolverContext::root(self.clone())),
        }
    }

    /// Number of registrations held by this provider.
    pub fn registration_count(&self) -> usize {
        self.inner().registry.len()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        for reg in self.inner().registry.iter() {
            s.push_str(&format!(
                "  {} -> {:?} ({})\n",
                reg.key, reg.implementation, reg.lifetime
            ));
        }
        s
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        match self.inner().registry.get(key) {
            Some(reg) => self.resolve_registration(reg),
            None => Err(DiError::NotFound(key.display_name())),
        }
    }

    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        self.inner()
            .registry
            .get_all(key)
            .map(|reg| self.resolve_registration(reg))
            .collect()
    }
}

impl Resolver for ServiceProvider {}
