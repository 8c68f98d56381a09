use ferrous_bindings::{
    bind_factory, configure_bindings, invoke_with_services, DiError, FactoryFn, Key, Lifetime, Modules, Resolver,
    ResolverContext, ServiceCollection,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct FakeDependency {
    pub label: &'static str,
}

fn bound_services() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services.add_singleton(FakeDependency { label: "fake" });
    configure_bindings(&mut services, &Modules::of([module_path!()])).unwrap();
    services
}

pub struct ImplicitSingletonFactoryService {
    pub dependency: Arc<FakeDependency>,
}

pub fn implicit_singleton(resolver: ResolverContext) -> ImplicitSingletonFactoryService {
    ImplicitSingletonFactoryService {
        dependency: resolver.get_required::<FakeDependency>(),
    }
}

bind_factory! {
    #[singleton]
    implicit_singleton => ImplicitSingletonFactoryService
}

pub trait IExplicitFactoryService: Send + Sync {
    fn label(&self) -> &'static str;
}

pub struct ExplicitTransientFactoryService {
    dependency: Arc<FakeDependency>,
}

impl IExplicitFactoryService for ExplicitTransientFactoryService {
    fn label(&self) -> &'static str {
        self.dependency.label
    }
}

pub fn explicit_transient(dependency: Arc<FakeDependency>) -> ExplicitTransientFactoryService {
    ExplicitTransientFactoryService { dependency }
}

bind_factory! {
    #[binding(Transient, dyn IExplicitFactoryService)]
    explicit_transient => ExplicitTransientFactoryService
}

pub struct ScopedHelperService {
    pub dependency: Arc<FakeDependency>,
    pub implicit: Arc<ImplicitSingletonFactoryService>,
}

pub mod helpers {
    use super::*;

    pub fn scoped_helper(
        dependency: Arc<FakeDependency>,
        implicit: Arc<ImplicitSingletonFactoryService>,
    ) -> ScopedHelperService {
        ScopedHelperService { dependency, implicit }
    }

    bind_factory! {
        #[scoped]
        scoped_helper => ScopedHelperService
    }
}

pub struct Ticket(pub usize);

static TICKETS: AtomicUsize = AtomicUsize::new(0);

pub fn next_ticket() -> Ticket {
    Ticket(TICKETS.fetch_add(1, Ordering::SeqCst))
}

bind_factory! {
    #[transient]
    next_ticket => Ticket
}

pub struct NeedsUnregistered;
pub struct Unregistered;

pub fn needs_unregistered(_: Arc<Unregistered>) -> NeedsUnregistered {
    NeedsUnregistered
}

bind_factory! {
    #[transient]
    needs_unregistered => NeedsUnregistered
}

#[test]
fn implicit_singleton_factory_receives_the_resolver() {
    let provider = bound_services().build();
    let first = provider.get_required::<ImplicitSingletonFactoryService>();
    let second = provider.get_required::<ImplicitSingletonFactoryService>();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.dependency.label, "fake");
    assert!(Arc::ptr_eq(&first.dependency, &provider.get_required::<FakeDependency>()));
}

#[test]
fn explicit_contract_factory_is_invoked_per_resolution() {
    let services = bound_services();
    let descriptor = services
        .get_service_descriptors()
        .into_iter()
        .find(|d| d.key == Key::of::<dyn IExplicitFactoryService>())
        .unwrap();
    assert_eq!(descriptor.lifetime, Lifetime::Transient);
    assert!(descriptor.is_factory());
    assert!(!services.contains(&Key::of::<ExplicitTransientFactoryService>()));

    let provider = services.build();
    let first = provider.get_required::<dyn IExplicitFactoryService>();
    let second = provider.get_required::<dyn IExplicitFactoryService>();
    assert_eq!(first.label(), "fake");
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn factories_in_submodules_are_scanned_with_their_parent() {
    let provider = bound_services().build();
    let scope = provider.create_scope();

    let helper = scope.get_required::<ScopedHelperService>();
    assert!(Arc::ptr_eq(&helper, &scope.get_required::<ScopedHelperService>()));
    assert!(Arc::ptr_eq(&helper.implicit, &provider.get_required::<ImplicitSingletonFactoryService>()));
    assert_eq!(helper.dependency.label, "fake");
}

#[test]
fn submodule_can_be_scanned_on_its_own() {
    let mut services = ServiceCollection::new();
    let written = configure_bindings(&mut services, &Modules::of([concat!(module_path!(), "::helpers")])).unwrap();
    assert_eq!(written, 1);
    assert!(services.contains(&Key::of::<ScopedHelperService>()));
}

#[test]
fn zero_parameter_factory_is_bindable() {
    let provider = bound_services().build();
    let first = provider.get_required::<Ticket>();
    let second = provider.get_required::<Ticket>();
    assert_ne!(first.0, second.0);
}

#[test]
fn missing_parameter_fails_when_resolved() {
    let services = bound_services();
    assert!(services.contains(&Key::of::<NeedsUnregistered>()));

    let provider = services.build();
    assert!(matches!(provider.get::<NeedsUnregistered>(), Err(DiError::NotFound(_))));
}

#[test]
fn explicit_arguments_fill_the_leading_parameters() {
    let provider = bound_services().build();
    let resolver = ResolverContext::from(&provider);

    let function = FactoryFn::new("explicit_transient", explicit_transient);
    let supplied = Arc::new(FakeDependency { label: "supplied" });
    let made = invoke_with_services(&resolver, function, vec![ferrous_bindings::erase(supplied)]).unwrap();
    let made = ferrous_bindings::downcast::<ExplicitTransientFactoryService>(&made).unwrap();
    assert_eq!(made.label(), "supplied");
}

#[test]
fn too_many_explicit_arguments_is_an_arity_error() {
    let provider = bound_services().build();
    let resolver = ResolverContext::from(&provider);

    let function = FactoryFn::new("next_ticket", next_ticket);
    let extra = ferrous_bindings::erase(Arc::new(1u8));
    match invoke_with_services(&resolver, function, vec![extra]) {
        Err(DiError::Arity {
            function,
            parameters,
            supplied,
        }) => {
            assert_eq!(function, "next_ticket");
            assert_eq!(parameters, 0);
            assert_eq!(supplied, 1);
        }
        _ => panic!("expected an arity error"),
    }
}
