//! Declaration tables and the scanner that walks them.
//!
//! The declaration macros ([`bind_type!`](crate::bind_type),
//! [`bind_factory!`](crate::bind_factory) and
//! [`bind_options!`](crate::bind_options)) submit entries into process-wide
//! tables at program load time. Scanning filters those tables by module and
//! flattens every declaration into one item per attached marker.

use std::fmt;

use crate::configuration::Configuration;
use crate::invoke::FactoryFn;
use crate::key::TypeInfo;
use crate::marker::{BindingMarker, OptionsMarker};
use crate::traits::TypeActivator;
use crate::ServiceCollection;

/// A type declared with one or more binding markers.
pub struct TypeDeclaration {
    pub module: &'static str,
    pub activator: fn() -> TypeActivator,
    pub markers: &'static [BindingMarker],
}

/// A factory function declared with one or more binding markers.
pub struct FactoryDeclaration {
    pub module: &'static str,
    pub name: &'static str,
    pub function: fn() -> FactoryFn,
    pub markers: &'static [BindingMarker],
}

/// An options type declared with one or more options markers.
pub struct OptionsDeclaration {
    pub module: &'static str,
    pub type_info: fn() -> TypeInfo,
    pub register: fn(&mut ServiceCollection, &Configuration, &OptionsMarker),
    pub markers: &'static [OptionsMarker],
}

inventory::collect!(TypeDeclaration);
inventory::collect!(FactoryDeclaration);
inventory::collect!(OptionsDeclaration);

/// A kind of declaration the scanner can walk.
pub trait Declaration: inventory::Collect {
    type Marker: 'static;

    fn module(&self) -> &'static str;

    fn markers(&self) -> &'static [Self::Marker];
}

impl Declaration for TypeDeclaration {
    type Marker = BindingMarker;

    fn module(&self) -> &'static str {
        self.module
    }

    fn markers(&self) -> &'static [BindingMarker] {
        self.markers
    }
}

impl Declaration for FactoryDeclaration {
    type Marker = BindingMarker;

    fn module(&self) -> &'static str {
        self.module
    }

    fn markers(&self) -> &'static [BindingMarker] {
        self.markers
    }
}

impl Declaration for OptionsDeclaration {
    type Marker = OptionsMarker;

    fn module(&self) -> &'static str {
        self.module
    }

    fn markers(&self) -> &'static [OptionsMarker] {
        self.markers
    }
}

/// The set of modules a scan covers.
///
/// Modules are matched by path prefix on `::` boundaries, so
/// `Modules::of(["app::services"])` covers `app::services` and
/// `app::services::mail` but not `app::services_old`.
///
/// ```rust
/// use ferrous_bindings::Modules;
///
/// let modules = Modules::of(["app::services"]);
/// assert!(modules.contains("app::services"));
/// assert!(modules.contains("app::services::mail"));
/// assert!(!modules.contains("app::services_old"));
/// assert!(Modules::all().contains("anything"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Modules {
    // None covers every module linked into the program
    prefixes: Option<Vec<&'static str>>,
}

impl Modules {
    pub fn all() -> Self {
        Self { prefixes: None }
    }

    pub fn of<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        Self {
            prefixes: Some(paths.into_iter().collect()),
        }
    }

    pub fn contains(&self, module: &str) -> bool {
        match &self.prefixes {
            None => true,
            Some(prefixes) => prefixes.iter().any(|prefix| {
                module
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
            }),
        }
    }
}

impl fmt::Debug for Modules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefixes {
            None => f.write_str("Modules(*)"),
            Some(prefixes) => f.debug_tuple("Modules").field(prefixes).finish(),
        }
    }
}

/// Every `(declaration, marker)` pair of kind `D` in `modules`.
///
/// A declaration with several markers yields one pair per marker. The
/// sequence is recomputed on every call.
pub fn scan<D: Declaration>(modules: &Modules) -> impl Iterator<Item = (&'static D, &'static D::Marker)> + '_ {
    inventory::iter::<D>
        .into_iter()
        .filter(move |declaration| modules.contains(declaration.module()))
        .flat_map(|declaration| {
            tracing::trace!(module = declaration.module(), markers = declaration.markers().len(), "scanned declaration");
            declaration.markers().iter().map(move |marker| (declaration, marker))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Injectable, Lifetime, ResolverContext, DiResult};

    struct Widget;

    impl Injectable for Widget {
        fn inject(_: &ResolverContext) -> DiResult<Self> {
            Ok(Widget)
        }
    }

    fn make_gadget() -> u64 {
        7
    }

    crate::bind_type! {
        #[singleton]
        #[transient]
        Widget
    }

    crate::bind_factory! {
        #[scoped]
        make_gadget => u64
    }

    fn here() -> Modules {
        Modules::of([module_path!()])
    }

    #[test]
    fn one_pair_per_marker() {
        let lifetimes: Vec<_> = scan::<TypeDeclaration>(&here())
            .map(|(_, marker)| marker.lifetime)
            .collect();
        assert_eq!(lifetimes.len(), 2);
        assert!(lifetimes.contains(&Lifetime::Singleton));
        assert!(lifetimes.contains(&Lifetime::Transient));
    }

    #[test]
    fn declarations_record_their_module() {
        let (declaration, marker) = scan::<FactoryDeclaration>(&here()).next().unwrap();
        assert_eq!(declaration.module, module_path!());
        assert_eq!(declaration.name, "make_gadget");
        assert_eq!(marker.lifetime, Lifetime::Scoped);
        assert_eq!((declaration.function)().returns(), TypeInfo::of::<u64>());
    }

    #[test]
    fn foreign_modules_are_excluded() {
        let elsewhere = Modules::of(["not_linked::anywhere"]);
        assert_eq!(scan::<TypeDeclaration>(&elsewhere).count(), 0);
        assert_eq!(scan::<OptionsDeclaration>(&here()).count(), 0);
    }

    #[test]
    fn prefix_matching_respects_path_boundaries() {
        let modules = Modules::of(["crate_a", "crate_b::inner"]);
        assert!(modules.contains("crate_a::x"));
        assert!(modules.contains("crate_b::inner"));
        assert!(!modules.contains("crate_b"));
        assert!(!modules.contains("crate_ab"));
        assert_eq!(Modules::default(), Modules::all());
    }
}
