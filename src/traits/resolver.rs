//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::registration::{downcast, AnyArc};

/// Core resolver trait for object-safe service resolution.
///
/// This is the primitive the binding engine relies on: given a key, return
/// a registered instance or fail. Deferred factories call it once per
/// unfilled parameter, every time they run.
pub trait ResolverCore: Send + Sync {
    /// Resolves the most recent registration for `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - The resolved service in its erased form
    /// * `Err(DiError)` - Not found, wrong lifetime, or an error raised by
    ///   the registration's factory
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;

    /// Resolves every registration for `key`, in registration order.
    ///
    /// Unknown keys yield an empty vector.
    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>>;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Concrete types and trait objects go through the same methods:
///
/// ```
/// use ferrous_bindings::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String { format!("LOG: {msg}") }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(42usize);
/// collection.add_singleton_trait::<dyn Logger>(Arc::new(ConsoleLogger));
///
/// let provider = collection.build();
/// assert_eq!(*provider.get_required::<usize>(), 42);
/// assert_eq!(provider.get_required::<dyn Logger>().log("hi"), "LOG: hi");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a service registered under `T`.
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&Key::of::<T>())?;
        downcast::<T>(&any)
    }

    /// Resolves a service, panicking if it is not available.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error's message.
    fn get_required<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        match self.get::<T>() {
            Ok(service) => service,
            Err(e) => panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e),
        }
    }

    /// Resolves a service registered under `T` with a service name.
    fn get_named<T: ?Sized + Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&Key::named::<T>(name))?;
        downcast::<T>(&any)
    }

    /// Resolves a named service, panicking if it is not available.
    fn get_named_required<T: ?Sized + Send + Sync + 'static>(&self, name: &'static str) -> Arc<T> {
        match self.get_named::<T>(name) {
            Ok(service) => service,
            Err(e) => panic!(
                "Failed to resolve {}[{}]: {}",
                std::any::type_name::<T>(),
                name,
                e
            ),
        }
    }

    /// Resolves every service registered under `T`.
    ///
    /// ```
    /// use ferrous_bindings::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Plugin: Send + Sync { fn name(&self) -> &str; }
    /// struct A;
    /// impl Plugin for A { fn name(&self) -> &str { "a" } }
    /// struct B;
    /// impl Plugin for B { fn name(&self) -> &str { "b" } }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Plugin>(Arc::new(A));
    /// services.add_singleton_trait::<dyn Plugin>(Arc::new(B));
    ///
    /// let provider = services.build();
    /// let names: Vec<_> = provider.get_all::<dyn Plugin>().unwrap()
    ///     .iter().map(|p| p.name().to_string()).collect();
    /// assert_eq!(names, ["a", "b"]);
    /// ```
    fn get_all<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(&Key::of::<T>())?
            .iter()
            .map(downcast::<T>)
            .collect()
    }
}
