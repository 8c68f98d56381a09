//! Deferred invocation of factory functions.
//!
//! A [`FactoryFn`] is an ordinary Rust function value together with a
//! description of its parameters. [`bind_factory`] pairs it with a prefix of
//! explicit arguments; the resulting [`DeferredFactory`] resolves the
//! remaining parameters from a resolver each time it runs.

use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{Key, TypeInfo};
use crate::provider::ResolverContext;
use crate::registration::{downcast, erase, AnyArc};
use crate::traits::ResolverCore;

type InvokeFn = Arc<dyn Fn(Vec<AnyArc>) -> DiResult<AnyArc> + Send + Sync>;

/// How a factory parameter is filled when no explicit argument covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The resolver running the factory
    Resolver,
    /// A service resolved by key
    Service(Key),
}

/// One parameter of a factory function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub position: usize,
    pub type_name: &'static str,
    pub kind: ParamKind,
}

impl ParamDescriptor {
    fn of<P: FactoryParam>(position: usize) -> Self {
        Self {
            position,
            type_name: std::any::type_name::<P>(),
            kind: P::kind(),
        }
    }
}

/// A type that can appear as a factory function parameter.
///
/// Services are taken as `Arc<T>` (with `T` a concrete type or a
/// `dyn Trait`); the resolver itself is taken as [`ResolverContext`].
pub trait FactoryParam: Sized + Send + Sync + 'static {
    fn kind() -> ParamKind;

    /// Rebuilds the parameter from its erased form.
    fn from_instance(instance: AnyArc) -> DiResult<Self>;
}

impl<T: ?Sized + Send + Sync + 'static> FactoryParam for Arc<T> {
    fn kind() -> ParamKind {
        ParamKind::Service(Key::of::<T>())
    }

    fn from_instance(instance: AnyArc) -> DiResult<Self> {
        downcast::<T>(&instance)
    }
}

impl FactoryParam for ResolverContext {
    fn kind() -> ParamKind {
        ParamKind::Resolver
    }

    fn from_instance(instance: AnyArc) -> DiResult<Self> {
        downcast::<ResolverContext>(&instance).map(|context| (*context).clone())
    }
}

/// A function value the binding engine can call with erased arguments.
///
/// ```rust
/// use ferrous_bindings::{FactoryFn, ParamKind, Key};
/// use std::sync::Arc;
///
/// struct Endpoint(String);
/// struct Client { endpoint: Arc<Endpoint>, retries: Arc<u32> }
///
/// fn make_client(endpoint: Arc<Endpoint>, retries: Arc<u32>) -> Client {
///     Client { endpoint, retries }
/// }
///
/// let function = FactoryFn::new("make_client", make_client);
/// assert_eq!(function.arity(), 2);
/// assert_eq!(function.params()[1].kind, ParamKind::Service(Key::of::<u32>()));
/// assert_eq!(function.returns().key(), Key::of::<Client>());
/// ```
#[derive(Clone)]
pub struct FactoryFn {
    name: &'static str,
    params: Vec<ParamDescriptor>,
    returns: TypeInfo,
    invoke: InvokeFn,
}

impl FactoryFn {
    pub fn new<Args, F>(name: &'static str, function: F) -> Self
    where
        F: IntoFactoryFn<Args>,
    {
        function.into_factory_fn(name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns(&self) -> TypeInfo {
        self.returns
    }

    /// Calls the function with a full argument list.
    pub fn call(&self, args: Vec<AnyArc>) -> DiResult<AnyArc> {
        if args.len() != self.arity() {
            return Err(DiError::Arity {
                function: self.name,
                parameters: self.arity(),
                supplied: args.len(),
            });
        }
        (self.invoke)(args)
    }
}

impl fmt::Debug for FactoryFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryFn")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns.name)
            .finish()
    }
}

/// Conversion from a Rust function or closure into a [`FactoryFn`].
///
/// Implemented for every `Fn(P1, .., Pn) -> R` with up to eight parameters
/// where each parameter is a [`FactoryParam`].
pub trait IntoFactoryFn<Args>: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn into_factory_fn(self, name: &'static str) -> FactoryFn;
}

fn next_arg(args: &mut std::vec::IntoIter<AnyArc>, function: &'static str) -> DiResult<AnyArc> {
    args.next().ok_or(DiError::NotFound(function))
}

macro_rules! impl_into_factory_fn {
    ($($P:ident),*) => {
        impl<F, R, $($P,)*> IntoFactoryFn<($($P,)*)> for F
        where
            F: Fn($($P),*) -> R + Send + Sync + 'static,
            R: Send + Sync + 'static,
            $($P: FactoryParam,)*
        {
            type Output = R;

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_factory_fn(self, name: &'static str) -> FactoryFn {
                let mut params: Vec<ParamDescriptor> = Vec::new();
                $(params.push(ParamDescriptor::of::<$P>(params.len()));)*

                let invoke = move |args: Vec<AnyArc>| -> DiResult<AnyArc> {
                    let mut args = args.into_iter();
                    $(let $P = <$P as FactoryParam>::from_instance(next_arg(&mut args, name)?)?;)*
                    Ok(erase(Arc::new((self)($($P),*))))
                };

                FactoryFn {
                    name,
                    params,
                    returns: TypeInfo::of::<R>(),
                    invoke: Arc::new(invoke),
                }
            }
        }
    };
}

impl_into_factory_fn!();
impl_into_factory_fn!(P1);
impl_into_factory_fn!(P1, P2);
impl_into_factory_fn!(P1, P2, P3);
impl_into_factory_fn!(P1, P2, P3, P4);
impl_into_factory_fn!(P1, P2, P3, P4, P5);
impl_into_factory_fn!(P1, P2, P3, P4, P5, P6);
impl_into_factory_fn!(P1, P2, P3, P4, P5, P6, P7);
impl_into_factory_fn!(P1, P2, P3, P4, P5, P6, P7, P8);

/// Builds a [`FactoryFn`] whose return type is checked against `R`.
#[doc(hidden)]
pub fn factory_returning<R, Args, F>(name: &'static str, function: F) -> FactoryFn
where
    F: IntoFactoryFn<Args, Output = R>,
{
    function.into_factory_fn(name)
}

/// A factory function with its explicit argument prefix, ready to be invoked
/// by the container.
#[derive(Clone)]
pub struct DeferredFactory {
    target: FactoryFn,
    explicit: Arc<[AnyArc]>,
}

impl DeferredFactory {
    pub fn name(&self) -> &'static str {
        self.target.name
    }

    pub fn returns(&self) -> TypeInfo {
        self.target.returns
    }

    /// Number of parameters resolved at invocation time.
    pub fn resolved_params(&self) -> usize {
        self.target.arity() - self.explicit.len()
    }

    /// Resolves the unfilled parameters and calls the function.
    ///
    /// Resolution failures are returned as-is; nothing is cached.
    pub fn invoke(&self, resolver: &ResolverContext) -> DiResult<AnyArc> {
        let mut args = Vec::with_capacity(self.target.arity());
        args.extend(self.explicit.iter().cloned());

        for param in &self.target.params[self.explicit.len()..] {
            let arg = match param.kind {
                ParamKind::Resolver => erase(Arc::new(resolver.clone())),
                ParamKind::Service(key) => resolver.resolve_any(&key)?,
            };
            args.push(arg);
        }

        tracing::trace!(
            function = self.target.name,
            explicit = self.explicit.len(),
            resolved = self.resolved_params(),
            "invoking factory"
        );
        self.target.call(args)
    }
}

impl fmt::Debug for DeferredFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredFactory")
            .field("target", &self.target)
            .field("explicit", &self.explicit.len())
            .finish()
    }
}

/// Pairs `target` with explicit leading arguments.
///
/// Fails with [`DiError::Arity`] when more arguments are supplied than the
/// function declares. Parameters past the explicit prefix are resolved from
/// the resolver, in order, each time the factory is invoked.
///
/// ```rust
/// use ferrous_bindings::{bind_factory, erase, downcast, FactoryFn, DiError, ServiceCollection, ResolverContext};
/// use std::sync::Arc;
///
/// fn greet(greeting: Arc<String>, name: Arc<&'static str>) -> String {
///     format!("{greeting}, {name}")
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton("world");
/// let provider = services.build();
///
/// let factory = bind_factory(
///     FactoryFn::new("greet", greet),
///     vec![erase(Arc::new("hello".to_string()))],
/// ).unwrap();
/// let value = factory.invoke(&ResolverContext::from(&provider)).unwrap();
/// assert_eq!(*downcast::<String>(&value).unwrap(), "hello, world");
///
/// let too_many = vec![erase(Arc::new(1u8)), erase(Arc::new(2u8)), erase(Arc::new(3u8))];
/// assert!(matches!(
///     bind_factory(FactoryFn::new("greet", greet), too_many),
///     Err(DiError::Arity { parameters: 2, supplied: 3, .. })
/// ));
/// ```
pub fn bind_factory(target: FactoryFn, explicit_args: Vec<AnyArc>) -> DiResult<DeferredFactory> {
    if explicit_args.len() > target.arity() {
        return Err(DiError::Arity {
            function: target.name,
            parameters: target.arity(),
            supplied: explicit_args.len(),
        });
    }

    Ok(DeferredFactory {
        target,
        explicit: explicit_args.into(),
    })
}

/// Binds and invokes `target` in one step.
pub fn invoke_with_services(
    resolver: &ResolverContext,
    target: FactoryFn,
    explicit_args: Vec<AnyArc>,
) -> DiResult<AnyArc> {
    bind_factory(target, explicit_args)?.invoke(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Resolver;
    use crate::ServiceCollection;

    struct Dependency(u32);
    struct Product {
        dependency: Arc<Dependency>,
        tag: Arc<String>,
    }

    fn make_product(dependency: Arc<Dependency>, tag: Arc<String>) -> Product {
        Product { dependency, tag }
    }

    fn context() -> ResolverContext {
        let mut services = ServiceCollection::new();
        services.add_singleton(Dependency(9));
        services.add_singleton("resolved".to_string());
        ResolverContext::from(&services.build())
    }

    #[test]
    fn descriptors_follow_parameter_order() {
        let function = FactoryFn::new("make_product", make_product);
        let positions: Vec<_> = function.params().iter().map(|p| p.position).collect();
        assert_eq!(positions, [0, 1]);
        assert_eq!(function.params()[0].kind, ParamKind::Service(Key::of::<Dependency>()));
        assert!(function.params()[1].type_name.contains("String"));
    }

    #[test]
    fn explicit_prefix_takes_precedence_over_resolution() {
        let factory = bind_factory(
            FactoryFn::new("make_product", make_product),
            vec![erase(Arc::new(Dependency(1)))],
        )
        .unwrap();
        assert_eq!(factory.resolved_params(), 1);

        let product = downcast::<Product>(&factory.invoke(&context()).unwrap()).unwrap();
        assert_eq!(product.dependency.0, 1);
        assert_eq!(product.tag.as_str(), "resolved");
    }

    #[test]
    fn all_explicit_arguments_need_no_resolver_entries() {
        let empty = ResolverContext::from(&ServiceCollection::new().build());
        let value = invoke_with_services(
            &empty,
            FactoryFn::new("make_product", make_product),
            vec![erase(Arc::new(Dependency(2))), erase(Arc::new("x".to_string()))],
        )
        .unwrap();
        assert_eq!(downcast::<Product>(&value).unwrap().dependency.0, 2);
    }

    #[test]
    fn resolver_parameter_receives_the_running_resolver() {
        let function = FactoryFn::new("via_resolver", |resolver: ResolverContext| {
            resolver.get_required::<Dependency>().0 + 1
        });
        assert_eq!(function.params()[0].kind, ParamKind::Resolver);

        let value = invoke_with_services(&context(), function, Vec::new()).unwrap();
        assert_eq!(*downcast::<u32>(&value).unwrap(), 10);
    }

    #[test]
    fn missing_dependency_surfaces_at_invocation() {
        let factory = bind_factory(FactoryFn::new("make_product", make_product), Vec::new()).unwrap();
        let empty = ResolverContext::from(&ServiceCollection::new().build());
        assert!(matches!(factory.invoke(&empty), Err(DiError::NotFound(_))));
    }

    #[test]
    fn wrongly_typed_explicit_argument_is_a_mismatch() {
        let factory = bind_factory(
            FactoryFn::new("make_product", make_product),
            vec![erase(Arc::new(5u8))],
        )
        .unwrap();
        assert!(matches!(factory.invoke(&context()), Err(DiError::TypeMismatch(_))));
    }

    #[test]
    fn arity_error_names_the_function() {
        let err = bind_factory(
            FactoryFn::new("nullary", || 0u8),
            vec![erase(Arc::new(1u8))],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot invoke 'nullary': it takes 0 parameter(s) but 1 were supplied"
        );
    }
}
