//! Binding and options markers.
//!
//! A marker is the declarative half of a registration: the lifetime a
//! binding asks for and, optionally, the contract it should answer to.
//! Markers are plain `const` data so the declaration macros can place them
//! in static tables.

use std::fmt;

use crate::error::DiResult;
use crate::key::{Key, TypeInfo};
use crate::lifetime::Lifetime;
use crate::registration::AnyArc;

/// An explicitly named contract for a binding.
///
/// Carries the key the registration is stored under and an upcast from the
/// declaring entity's instance to an instance of the contract. The upcast is
/// generated by [`contract!`](crate::contract) as an unsizing coercion, so a
/// contract the implementation does not implement fails to compile.
#[derive(Clone, Copy)]
pub struct ContractType {
    key: fn() -> Key,
    upcast: fn(AnyArc) -> DiResult<AnyArc>,
}

impl ContractType {
    pub const fn new(key: fn() -> Key, upcast: fn(AnyArc) -> DiResult<AnyArc>) -> Self {
        Self { key, upcast }
    }

    pub fn key(&self) -> Key {
        (self.key)()
    }

    fn resolve(&self) -> Contract {
        Contract {
            key: self.key(),
            upcast: Some(self.upcast),
        }
    }
}

impl fmt::Debug for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContractType").field(&self.key()).finish()
    }
}

/// Declarative request for one registration.
///
/// A marker with no contract registers under the declaring type, or under
/// the return type for factory functions. The default marker is a transient
/// binding with an inferred contract.
///
/// ```rust
/// use ferrous_bindings::{BindingMarker, Key, Lifetime};
///
/// const SINGLETON: BindingMarker = BindingMarker::new(Lifetime::Singleton);
///
/// assert_eq!(BindingMarker::default().lifetime, Lifetime::Transient);
/// assert!(SINGLETON.contract.is_none());
///
/// let contract = SINGLETON.effective_contract(Key::of::<String>());
/// assert_eq!(contract.key, Key::of::<String>());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingMarker {
    pub lifetime: Lifetime,
    pub contract: Option<ContractType>,
}

impl BindingMarker {
    pub const fn new(lifetime: Lifetime) -> Self {
        Self {
            lifetime,
            contract: None,
        }
    }

    pub const fn with_contract(lifetime: Lifetime, contract: ContractType) -> Self {
        Self {
            lifetime,
            contract: Some(contract),
        }
    }

    /// The explicit contract if one was given, otherwise `default`.
    pub fn effective_contract(&self, default: Key) -> Contract {
        match &self.contract {
            Some(explicit) => explicit.resolve(),
            None => Contract::implicit(default),
        }
    }
}

/// A contract resolved for one registration.
#[derive(Clone, Copy)]
pub struct Contract {
    pub key: Key,
    upcast: Option<fn(AnyArc) -> DiResult<AnyArc>>,
}

impl Contract {
    /// The entity registers as itself.
    pub fn implicit(key: Key) -> Self {
        Self { key, upcast: None }
    }

    pub fn is_implicit(&self) -> bool {
        self.upcast.is_none()
    }

    /// Converts an instance of the declaring entity into the contract.
    pub fn upcast(&self, instance: AnyArc) -> DiResult<AnyArc> {
        match self.upcast {
            Some(upcast) => upcast(instance),
            None => Ok(instance),
        }
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract").field("key", &self.key).finish()
    }
}

/// Marks a type whose instances are bound from configuration.
///
/// `section` is a colon-separated configuration path; `None` binds the
/// configuration root. `name` selects a named options instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionsMarker {
    pub section: Option<&'static str>,
    pub name: Option<&'static str>,
}

impl OptionsMarker {
    pub const fn new(section: Option<&'static str>, name: Option<&'static str>) -> Self {
        Self { section, name }
    }
}

/// What the scanner knows about a declaring entity.
pub(crate) fn describe(info: &TypeInfo, marker: &BindingMarker) -> String {
    let contract = marker.effective_contract(info.key());
    format!("{} as {} ({})", info.name, contract.key, marker.lifetime)
}
