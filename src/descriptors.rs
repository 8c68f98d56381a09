//! Service descriptors for introspection and diagnostics.

use crate::key::{Key, TypeInfo};
use crate::lifetime::Lifetime;

/// What backs a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implementation {
    /// An implementation type constructed through `Injectable`
    Type(TypeInfo),
    /// A factory function, by name
    Factory(&'static str),
    /// A pre-built instance
    Instance(TypeInfo),
    /// An ad-hoc closure registered by hand
    Closure,
}

/// Service descriptor for introspection and diagnostics
///
/// A read-only view of one registration: the contract it answers to, its
/// lifetime and what produces the instance. Every binding marker found by
/// the scanner shows up here as exactly one descriptor.
///
/// # Examples
///
/// ```rust
/// use ferrous_bindings::{ServiceCollection, Lifetime, Implementation};
///
/// struct Database { url: String }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_named_singleton("config_value", 42u32);
///
/// let descriptors = services.get_service_descriptors();
///
/// let db = descriptors.iter()
///     .find(|d| d.type_name().contains("Database"))
///     .unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert!(matches!(db.implementation, Implementation::Instance(_)));
/// assert!(!db.is_named());
///
/// let config = descriptors.iter().find(|d| d.is_named()).unwrap();
/// assert_eq!(config.service_name(), Some("config_value"));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The contract key (type or trait, with optional service name)
    pub key: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// What produces instances for this registration
    pub implementation: Implementation,
}

impl ServiceDescriptor {
    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        self.key.service_name()
    }

    /// Get the contract type/trait name
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Check if this is a named service
    pub fn is_named(&self) -> bool {
        self.service_name().is_some()
    }

    /// Implementation type, when the registration is backed by one.
    pub fn implementation_type(&self) -> Option<TypeInfo> {
        match self.implementation {
            Implementation::Type(info) | Implementation::Instance(info) => Some(info),
            Implementation::Factory(_) | Implementation::Closure => None,
        }
    }

    /// Whether instances come from a factory rather than a type or value.
    pub fn is_factory(&self) -> bool {
        matches!(self.implementation, Implementation::Factory(_))
    }
}
