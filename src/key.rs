//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a Rust type, usable for sized types and trait objects alike.
///
/// `TypeInfo` is what the binding engine knows about a declaring entity:
/// the implementation type of a type-level binding, or the return type of a
/// factory function.
///
/// ```rust
/// use ferrous_bindings::TypeInfo;
///
/// trait Greeter: Send + Sync {}
///
/// let concrete = TypeInfo::of::<String>();
/// let contract = TypeInfo::of::<dyn Greeter>();
/// assert_eq!(concrete.name, "alloc::string::String");
/// assert_ne!(concrete, contract);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeInfo {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The unnamed service key for this type.
    #[inline]
    pub fn key(&self) -> Key {
        Key {
            id: self.id,
            type_name: self.name,
            service_name: None,
        }
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

/// Key for service storage and lookup.
///
/// A key is the contract a service is registered under: a `TypeId` (of a
/// concrete type or of a `dyn Trait`) plus an optional service name for
/// named registrations such as named options instances. The type name is
/// carried for diagnostics only and never takes part in equality.
///
/// # Examples
///
/// ```rust
/// use ferrous_bindings::{ServiceCollection, Resolver, Key};
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42u32);
/// services.add_named_singleton("config_port", 8080u32);
///
/// let provider = services.build();
/// assert_eq!(*provider.get_required::<u32>(), 42);
/// assert_eq!(*provider.get_named_required::<u32>("config_port"), 8080);
///
/// assert_ne!(Key::of::<u32>(), Key::named::<u32>("config_port"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Key {
    id: TypeId,
    type_name: &'static str,
    service_name: Option<&'static str>,
}

impl Key {
    /// Unnamed key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeInfo::of::<T>().key()
    }

    /// Named key for `T`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::of::<T>().with_name(Some(name))
    }

    /// Same contract type, different service name.
    pub fn with_name(mut self, name: Option<&'static str>) -> Self {
        self.service_name = name;
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Get the type or trait name for display
    ///
    /// ```rust
    /// use ferrous_bindings::Key;
    ///
    /// assert_eq!(Key::of::<String>().display_name(), "alloc::string::String");
    /// assert_eq!(Key::named::<u32>("port").display_name(), "u32");
    /// ```
    pub fn display_name(&self) -> &'static str {
        self.type_name
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        self.service_name
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.service_name == other.service_name
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.service_name.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.service_name {
            Some(name) => write!(f, "{}[{}]", self.type_name, name),
            None => f.write_str(self.type_name),
        }
    }
}
