//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use crate::registration::AnyArc;
use crate::traits::{Resolver, ResolverCore};
use crate::{DiResult, Key};

use super::{Scope, ServiceProvider};

/// Context passed to factory functions for resolving dependencies.
///
/// A `ResolverContext` is an owned handle on whichever resolver is running
/// the factory: the root provider for singletons and transients resolved
/// from the root, or a [`Scope`] otherwise. Because it is owned and cheap to
/// clone, a declared factory function can take it as an ordinary parameter.
///
/// Keeping a context inside a scoped service keeps that scope alive.
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
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
/// ```
#[derive(Clone)]
pub struct ResolverContext {
    origin: Origin,
}

#[derive(Clone)]
enum Origin {
    Root(ServiceProvider),
    Scope(Scope),
}

impl ResolverContext {
    pub(crate) fn root(provider: ServiceProvider) -> Self {
        Self {
            origin: Origin::Root(provider),
        }
    }

    pub(crate) fn scope(scope: Scope) -> Self {
        Self {
            origin: Origin::Scope(scope),
        }
    }

    /// Whether this context resolves through a scope.
    pub fn is_scoped(&self) -> bool {
        matches!(self.origin, Origin::Scope(_))
    }
}

impl From<&ServiceProvider> for ResolverContext {
    fn from(provider: &ServiceProvider) -> Self {
        Self::root(provider.clone())
    }
}

impl From<&Scope> for ResolverContext {
    fn from(scope: &Scope) -> Self {
        Self::scope(scope.clone())
    }
}

impl ResolverCore for ResolverContext {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        match &self.origin {
            Origin::Root(provider) => provider.resolve_any(key),
            Origin::Scope(scope) => scope.resolve_any(key),
        }
    }

    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        match &self.origin {
            Origin::Root(provider) => provider.resolve_all(key),
            Origin::Scope(scope) => scope.resolve_all(key),
        }
    }
}

impl Resolver for ResolverContext {}
