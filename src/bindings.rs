//! Turns scanned binding markers into container registrations.

use crate::invoke::{bind_factory, DeferredFactory};
use crate::lifetime::Lifetime;
use crate::marker::{describe, Contract};
use crate::scan::{scan, FactoryDeclaration, Modules, TypeDeclaration};
use crate::traits::{ServiceRegistry, TypeActivator};
use crate::DiResult;

enum Planned {
    Type {
        contract: Contract,
        implementation: TypeActivator,
        lifetime: Lifetime,
    },
    Factory {
        contract: Contract,
        factory: DeferredFactory,
        lifetime: Lifetime,
    },
}

/// Registers every type and factory function declared in `modules`.
///
/// Each marker becomes exactly one registration: under its explicit
/// contract if it names one, otherwise under the declaring type (for types)
/// or the return type (for factory functions). Registrations are planned
/// first and written only once every marker has been processed, so a
/// failing call leaves `registry` untouched.
///
/// Calling this twice for the same modules registers everything twice.
///
/// Returns the number of registrations written.
///
/// ```rust
/// use ferrous_bindings::{
///     bind_type, configure_bindings, DiResult, Injectable, Lifetime, Modules, Resolver,
///     ResolverContext, ServiceCollection,
/// };
///
/// pub trait Repository: Send + Sync {
///     fn table(&self) -> &str;
/// }
///
/// pub struct UserRepository;
///
/// impl Repository for UserRepository {
///     fn table(&self) -> &str { "users" }
/// }
///
/// impl Injectable for UserRepository {
///     fn inject(_: &ResolverContext) -> DiResult<Self> {
///         Ok(UserRepository)
///     }
/// }
///
/// bind_type! {
///     #[scoped(dyn Repository)]
///     UserRepository
/// }
///
/// let mut services = ServiceCollection::new();
/// let written = configure_bindings(&mut services, &Modules::of([module_path!()])).unwrap();
/// assert_eq!(written, 1);
/// assert_eq!(services.get_service_descriptors()[0].lifetime, Lifetime::Scoped);
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// assert_eq!(scope.get_required::<dyn Repository>().table(), "users");
/// ```
pub fn configure_bindings<R>(registry: &mut R, modules: &Modules) -> DiResult<usize>
where
    R: ServiceRegistry + ?Sized,
{
    let mut plan = Vec::new();

    for (declaration, marker) in scan::<TypeDeclaration>(modules) {
        let implementation = (declaration.activator)();
        tracing::trace!(binding = %describe(&implementation.type_info, marker), "planning type binding");
        plan.push(Planned::Type {
            contract: marker.effective_contract(implementation.type_info.key()),
            implementation,
            lifetime: marker.lifetime,
        });
    }

    for (declaration, marker) in scan::<FactoryDeclaration>(modules) {
        let function = (declaration.function)();
        tracing::trace!(binding = %describe(&function.returns(), marker), function = declaration.name, "planning factory binding");
        let contract = marker.effective_contract(function.returns().key());
        plan.push(Planned::Factory {
            contract,
            factory: bind_factory(function, Vec::new())?,
            lifetime: marker.lifetime,
        });
    }

    let count = plan.len();
    for planned in plan {
        match planned {
            Planned::Type {
                contract,
                implementation,
                lifetime,
            } => {
                tracing::debug!(
                    contract = %contract.key,
                    implementation = implementation.type_info.name,
                    %lifetime,
                    "registering type"
                );
                registry.register_type(contract, implementation, lifetime);
            }
            Planned::Factory {
                contract,
                factory,
                lifetime,
            } => {
                tracing::debug!(
                    contract = %contract.key,
                    factory = factory.name(),
                    %lifetime,
                    "registering factory"
                );
                registry.register_factory(contract, factory, lifetime);
            }
        }
    }

    tracing::info!(registrations = count, ?modules, "configured bindings");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::DeferredFactory;
    use crate::key::Key;
    use crate::{Injectable, ResolverContext};
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        entries: Vec<(Key, &'static str, Lifetime)>,
    }

    impl ServiceRegistry for Recorder {
        fn register_type(&mut self, contract: Contract, implementation: TypeActivator, lifetime: Lifetime) {
            self.entries.push((contract.key, implementation.type_info.name, lifetime));
        }

        fn register_factory(&mut self, contract: Contract, factory: DeferredFactory, lifetime: Lifetime) {
            self.entries.push((contract.key, factory.name(), lifetime));
        }
    }

    trait Sink: Send + Sync {}

    struct FileSink;
    impl Sink for FileSink {}

    impl Injectable for FileSink {
        fn inject(_: &ResolverContext) -> DiResult<Self> {
            Ok(FileSink)
        }
    }

    fn open_sink(_: Arc<String>) -> FileSink {
        FileSink
    }

    crate::bind_type! {
        #[binding]
        #[binding(Singleton, dyn Sink)]
        FileSink
    }

    crate::bind_factory! {
        #[transient(dyn Sink)]
        open_sink => FileSink
    }

    #[test]
    fn every_marker_is_one_registration() {
        let mut recorder = Recorder::default();
        let written = configure_bindings(&mut recorder, &Modules::of([module_path!()])).unwrap();
        assert_eq!(written, 3);

        let entries = &recorder.entries;
        assert!(entries.contains(&(Key::of::<FileSink>(), std::any::type_name::<FileSink>(), Lifetime::Transient)));
        assert!(entries.contains(&(Key::of::<dyn Sink>(), std::any::type_name::<FileSink>(), Lifetime::Singleton)));
        assert!(entries.contains(&(Key::of::<dyn Sink>(), "open_sink", Lifetime::Transient)));
    }

    #[test]
    fn type_registrations_precede_factory_registrations() {
        let mut recorder = Recorder::default();
        configure_bindings(&mut recorder, &Modules::of([module_path!()])).unwrap();
        assert_eq!(recorder.entries.last().map(|e| e.1), Some("open_sink"));
    }

    #[test]
    fn empty_module_set_registers_nothing() {
        let mut recorder = Recorder::default();
        let written = configure_bindings(&mut recorder, &Modules::of(["no::such::module"])).unwrap();
        assert_eq!(written, 0);
        assert!(recorder.entries.is_empty());
    }
}
