//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type and related functionality
//! for registering services and building service providers.

use std::sync::Arc;

use crate::bindings::configure_bindings;
use crate::descriptors::{Implementation, ServiceDescriptor};
use crate::invoke::DeferredFactory;
use crate::key::{Key, TypeInfo};
use crate::marker::Contract;
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::{erase, AnyArc, Ctor, Registry};
use crate::scan::Modules;
use crate::traits::{ServiceRegistry, TypeActivator};
use crate::{DiResult, Lifetime};

/// Registrations waiting to be built into a [`ServiceProvider`].
///
/// Registrations are appended, never replaced: registering the same
/// contract twice keeps both, single resolution returns the last one and
/// `get_all` returns every one of them in order.
///
/// # Examples
///
/// ```rust
/// use ferrous_bindings::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Config { database_url: String }
/// struct Repository { config: Arc<Config> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Config { database_url: "postgres://localhost".to_string() });
/// services.add_scoped_factory::<Repository, _>(|r| Repository {
///     config: r.get_required::<Config>(),
/// });
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// assert_eq!(scope.get_required::<Repository>().config.database_url, "postgres://localhost");
/// ```
pub struct ServiceCollection {
    registry: Registry,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: Key, lifetime: Lifetime, implementation: Implementation, ctor: Ctor) {
        self.registry.insert(key, lifetime, implementation, ctor);
    }

    // ----- Concrete Type Registrations -----

    /// Registers a singleton instance that will be shared across the entire application.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_bindings::ServiceCollection;
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// ```
    pub fn add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.add_instance(Key::of::<T>(), value)
    }

    /// Registers a singleton instance under a service name.
    pub fn add_named_singleton<T: 'static + Send + Sync>(&mut self, name: &'static str, value: T) -> &mut Self {
        self.add_instance(Key::named::<T>(name), value)
    }

    fn add_instance<T: 'static + Send + Sync>(&mut self, key: Key, value: T) -> &mut Self {
        let instance = erase(Arc::new(value));
        self.insert(
            key,
            Lifetime::Singleton,
            Implementation::Instance(TypeInfo::of::<T>()),
            Arc::new(move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(instance.clone()) }),
        );
        self
    }

    /// Registers a singleton factory that creates the instance on first request.
    ///
    /// The factory is called only once, and the result is cached and shared across
    /// all subsequent requests.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, factory)
    }

    /// Registers a scoped factory that creates one instance per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Scoped, factory)
    }

    /// Registers a transient factory that creates a new instance on every request.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_bindings::{ServiceCollection, Resolver};
    /// struct Logger { timestamp: std::time::SystemTime }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_transient_factory::<Logger, _>(|_| {
    ///     Logger { timestamp: std::time::SystemTime::now() }
    /// });
    /// ```
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.insert(
            Key::of::<T>(),
            lifetime,
            Implementation::Closure,
            Arc::new(move |r: &ResolverContext| -> DiResult<AnyArc> { Ok(erase(Arc::new(factory(r)))) }),
        );
        self
    }

    // ----- Trait Registrations -----

    /// Registers a singleton trait implementation.
    ///
    /// Binds an implementation to a trait object contract. Several
    /// implementations of the same trait can be registered and enumerated
    /// with `get_all`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_bindings::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct FileLogger { path: String }
    /// impl Logger for FileLogger {
    ///     fn log(&self, message: &str) {}
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// let logger = Arc::new(FileLogger { path: "/var/log/app.log".to_string() });
    /// services.add_singleton_trait::<dyn Logger>(logger);
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        let instance = erase(value);
        self.insert(
            Key::of::<T>(),
            Lifetime::Singleton,
            Implementation::Closure,
            Arc::new(move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(instance.clone()) }),
        );
        self
    }

    /// Registers a singleton trait factory.
    ///
    /// ```rust
    /// # use ferrous_bindings::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Clock: Send + Sync { fn now(&self) -> u64; }
    /// struct Fixed;
    /// impl Clock for Fixed { fn now(&self) -> u64 { 7 } }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait_factory::<dyn Clock, _>(|_| Arc::new(Fixed));
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<dyn Clock>().now(), 7);
    /// ```
    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Singleton, factory)
    }

    /// Registers a scoped trait factory.
    pub fn add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Scoped, factory)
    }

    /// Registers a transient trait factory.
    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Transient, factory)
    }

    fn add_trait_factory<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.insert(
            Key::of::<Trait>(),
            lifetime,
            Implementation::Closure,
            Arc::new(move |r: &ResolverContext| -> DiResult<AnyArc> { Ok(erase(factory(r))) }),
        );
        self
    }

    // ----- Declarative Registrations -----

    /// Registers every type and factory function declared in `modules`.
    ///
    /// ```rust
    /// use ferrous_bindings::{bind_factory, Modules, Resolver, ServiceCollection};
    ///
    /// pub struct Greeting(String);
    ///
    /// pub fn greeting() -> Greeting {
    ///     Greeting("hello".to_string())
    /// }
    ///
    /// bind_factory! {
    ///     #[singleton]
    ///     greeting => Greeting
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_bindings(&Modules::of([module_path!()])).unwrap();
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Greeting>().0, "hello");
    /// ```
    pub fn add_bindings(&mut self, modules: &Modules) -> DiResult<&mut Self> {
        configure_bindings(self, modules)?;
        Ok(self)
    }

    // ----- Introspection -----

    /// Describes every registration, in registration order.
    ///
    /// ```rust
    /// use ferrous_bindings::{ServiceCollection, Lifetime};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(1u8);
    /// services.add_transient_factory::<String, _>(|_| String::new());
    ///
    /// let descriptors = services.get_service_descriptors();
    /// assert_eq!(descriptors.len(), 2);
    /// assert_eq!(descriptors[1].lifetime, Lifetime::Transient);
    /// ```
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry
            .iter()
            .map(|reg| ServiceDescriptor {
                key: reg.key,
                lifetime: reg.lifetime,
                implementation: reg.implementation,
            })
            .collect()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether at least one registration answers to `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.registry.contains_key(key)
    }

    /// Builds the service provider.
    ///
    /// Consumes the collection. Nothing is constructed until first resolution.
    pub fn build(self) -> ServiceProvider {
        tracing::debug!(registrations = self.registry.len(), "building service provider");
        ServiceProvider::new(self.registry)
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry for ServiceCollection {
    fn register_type(&mut self, contract: Contract, implementation: TypeActivator, lifetime: Lifetime) {
        let activate = implementation.activate;
        self.insert(
            contract.key,
            lifetime,
            Implementation::Type(implementation.type_info),
            Arc::new(move |r: &ResolverContext| -> DiResult<AnyArc> { contract.upcast(activate(r)?) }),
        );
    }

    fn register_factory(&mut self, contract: Contract, factory: DeferredFactory, lifetime: Lifetime) {
        let name = factory.name();
        self.insert(
            contract.key,
            lifetime,
            Implementation::Factory(name),
            Arc::new(move |r: &ResolverContext| -> DiResult<AnyArc> { contract.upcast(factory.invoke(r)?) }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Resolver;
    use crate::{DiError, Injectable};
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Named: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct First;
    impl Named for First {
        fn name(&self) -> &'static str {
            "first"
        }
    }

    struct Second;
    impl Named for Second {
        fn name(&self) -> &'static str {
            "second"
        }
    }

    impl Injectable for Second {
        fn inject(_: &ResolverContext) -> DiResult<Self> {
            Ok(Second)
        }
    }

    #[test]
    fn registrations_are_appended_not_replaced() {
        let mut sc = ServiceCollection::new();
        sc.add_singleton_trait::<dyn Named>(Arc::new(First));
        sc.add_singleton_trait::<dyn Named>(Arc::new(Second));
        assert_eq!(sc.len(), 2);

        let sp = sc.build();
        assert_eq!(sp.get_required::<dyn Named>().name(), "second");
        let all: Vec<_> = sp.get_all::<dyn Named>().unwrap().iter().map(|n| n.name()).collect();
        assert_eq!(all, ["first", "second"]);
    }

    #[test]
    fn register_type_upcasts_through_the_contract() {
        let mut sc = ServiceCollection::new();
        let contract = crate::BindingMarker::with_contract(
            Lifetime::Transient,
            crate::contract!(Second => dyn Named),
        )
        .effective_contract(Key::of::<Second>());
        sc.register_type(contract, TypeActivator::of::<Second>(), Lifetime::Transient);

        let descriptors = sc.get_service_descriptors();
        assert_eq!(descriptors[0].key, Key::of::<dyn Named>());
        assert_eq!(descriptors[0].implementation_type(), Some(TypeInfo::of::<Second>()));

        let sp = sc.build();
        assert_eq!(sp.get_required::<dyn Named>().name(), "second");
        assert!(matches!(sp.get::<Second>(), Err(DiError::NotFound(_))));
    }

    #[test]
    fn register_factory_invokes_per_lifetime() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn make() -> u16 {
            CALLS.fetch_add(1, Ordering::SeqCst);
            3
        }

        let mut sc = ServiceCollection::new();
        let factory = crate::bind_factory(crate::FactoryFn::new("make", make), Vec::new()).unwrap();
        sc.register_factory(Contract::implicit(Key::of::<u16>()), factory, Lifetime::Scoped);
        assert!(sc.get_service_descriptors()[0].is_factory());

        let sp = sc.build();
        let scope = sp.create_scope();
        assert_eq!(*scope.get_required::<u16>(), 3);
        assert_eq!(*scope.get_required::<u16>(), 3);
        assert_eq!(*sp.create_scope().get_required::<u16>(), 3);
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn named_singletons_do_not_collide_with_unnamed_ones() {
        let mut sc = ServiceCollection::new();
        sc.add_singleton(1u32).add_named_singleton("other", 2u32);
        assert!(sc.contains(&Key::named::<u32>("other")));

        let sp = sc.build();
        assert_eq!(*sp.get_required::<u32>(), 1);
        assert_eq!(*sp.get_named_required::<u32>("other"), 2);
        assert!(sp.get_named::<u32>("missing").is_err());
    }
}
