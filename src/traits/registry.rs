//! The registration side of the container, as seen by the binding engine.

use std::fmt;

use crate::error::DiResult;
use crate::invoke::DeferredFactory;
use crate::key::TypeInfo;
use crate::lifetime::Lifetime;
use crate::marker::Contract;
use crate::provider::ResolverContext;
use crate::registration::AnyArc;

/// Construction of an implementation type from its dependencies.
///
/// Types declared with [`bind_type!`](crate::bind_type) are built through
/// this trait each time the container needs a new instance.
///
/// ```rust
/// use ferrous_bindings::{Injectable, Resolver, ResolverContext, DiResult};
/// use std::sync::Arc;
///
/// struct Clock;
/// struct Scheduler { clock: Arc<Clock> }
///
/// impl Injectable for Scheduler {
///     fn inject(resolver: &ResolverContext) -> DiResult<Self> {
///         Ok(Scheduler { clock: resolver.get::<Clock>()? })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    fn inject(resolver: &ResolverContext) -> DiResult<Self>;
}

/// An implementation type and the function that constructs it.
#[derive(Clone, Copy)]
pub struct TypeActivator {
    pub type_info: TypeInfo,
    pub activate: fn(&ResolverContext) -> DiResult<AnyArc>,
}

impl TypeActivator {
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            activate: |resolver| T::inject(resolver).map(|instance| crate::erase(std::sync::Arc::new(instance))),
        }
    }
}

impl fmt::Debug for TypeActivator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeActivator").field(&self.type_info.name).finish()
    }
}

/// A container the binding engine can write registrations into.
///
/// Each call appends exactly one registration. Implementations must not
/// merge or deduplicate registrations for the same contract.
pub trait ServiceRegistry {
    /// Registers an implementation type under `contract`.
    fn register_type(&mut self, contract: Contract, implementation: TypeActivator, lifetime: Lifetime);

    /// Registers a deferred factory under `contract`.
    fn register_factory(&mut self, contract: Contract, factory: DeferredFactory, lifetime: Lifetime);
}
