//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::descriptors::Implementation;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;

/// Type-erased service instance.
///
/// Every instance is stored as an `Arc<T>` boxed inside `Arc<dyn Any>`, so
/// concrete types and trait objects share one representation. Use [`erase`]
/// and [`downcast`] to move between the two.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Constructor stored for every registration.
pub(crate) type Ctor = Arc<dyn Fn(&ResolverContext) -> DiResult<AnyArc> + Send + Sync>;

/// Wraps a shared instance into the container's erased representation.
///
/// ```rust
/// use ferrous_bindings::{erase, downcast};
/// use std::sync::Arc;
///
/// let instance = erase(Arc::new(7u8));
/// assert_eq!(*downcast::<u8>(&instance).unwrap(), 7);
/// assert!(downcast::<u16>(&instance).is_err());
/// ```
#[inline]
pub fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
    Arc::new(value)
}

/// Recovers the `Arc<T>` stored by [`erase`].
#[inline]
pub fn downcast<T: ?Sized + Send + Sync + 'static>(instance: &AnyArc) -> DiResult<Arc<T>> {
    instance
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Service registration with lifetime and constructor
pub(crate) struct Registration {
    /// Position in the registry, used as the scoped cache slot
    pub(crate) slot: usize,
    pub(crate) key: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    pub(crate) implementation: Implementation,
    /// Singleton cache, present only for singleton registrations
    pub(crate) singleton: Option<OnceCell<AnyArc>>,
}

/// Service registry holding all registrations
///
/// Registrations are append-only. Several registrations may share a key;
/// single resolution uses the last one, enumeration returns all of them in
/// registration order.
#[derive(Default)]
pub(crate) struct Registry {
    by_key: HashMap<Key, Vec<usize>>,
    entries: Vec<Registration>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        key: Key,
        lifetime: Lifetime,
        implementation: Implementation,
        ctor: Ctor,
    ) {
        let slot = self.entries.len();
        let singleton = (lifetime == Lifetime::Singleton).then(OnceCell::new);
        self.entries.push(Registration {
            slot,
            key,
            lifetime,
            ctor,
            implementation,
            singleton,
        });
        self.by_key.entry(key).or_default().push(slot);
    }

    /// Most recent registration for `key`.
    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.by_key
            .get(key)
            .and_then(|slots| slots.last())
            .map(|&slot| &self.entries[slot])
    }

    /// Every registration for `key`, oldest first.
    pub(crate) fn get_all<'a>(&'a self, key: &Key) -> impl Iterator<Item = &'a Registration> + 'a {
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .map(move |&slot| &self.entries[slot])
    }

    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.by_key.contains_key(key)
    }

    /// All registrations in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctor_returning(value: u32) -> Ctor {
        Arc::new(move |_: &ResolverContext| Ok(erase(Arc::new(value))))
    }

    #[test]
    fn last_registration_wins_for_single_lookup() {
        let mut registry = Registry::new();
        registry.insert(Key::of::<u32>(), Lifetime::Transient, Implementation::Closure, ctor_returning(1));
        registry.insert(Key::of::<u32>(), Lifetime::Singleton, Implementation::Closure, ctor_returning(2));

        let reg = registry.get(&Key::of::<u32>()).unwrap();
        assert_eq!(reg.slot, 1);
        assert_eq!(reg.lifetime, Lifetime::Singleton);
        assert!(reg.singleton.is_some());
        assert_eq!(registry.get_all(&Key::of::<u32>()).count(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn missing_key_yields_nothing() {
        let registry = Registry::new();
        assert!(registry.get(&Key::of::<u32>()).is_none());
        assert!(!registry.contains_key(&Key::of::<u32>()));
        assert_eq!(registry.get_all(&Key::of::<u32>()).count(), 0);
    }
}
