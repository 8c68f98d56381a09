//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior
///
/// A lifetime is the part of a binding marker that tells the container how
/// many instances a registration produces. Markers that do not name a
/// lifetime get [`Lifetime::Transient`].
///
/// # Examples
///
/// ```rust
/// use ferrous_bindings::{ServiceCollection, Resolver, Lifetime};
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_scoped_factory::<Repository, _>(|r| {
///     let db = r.get_required::<Database>();
///     Repository { db_url: db.url.clone() }
/// });
/// services.add_transient_factory::<RequestModel, _>(|_| RequestModel { id: 12345 });
///
/// let provider = services.build();
///
/// // Singleton: same instance across scopes
/// let db1 = provider.get_required::<Database>();
/// let scope1 = provider.create_scope();
/// let db2 = scope1.get_required::<Database>();
/// assert!(std::ptr::eq(&*db1, &*db2));
///
/// // Scoped: same within scope, different across scopes
/// let repo1a = scope1.get_required::<Repository>();
/// let repo1b = scope1.get_required::<Repository>();
/// assert!(std::ptr::eq(&*repo1a, &*repo1b));
/// let scope2 = provider.create_scope();
/// let repo2 = scope2.get_required::<Repository>();
/// assert!(!std::ptr::eq(&*repo1a, &*repo2));
///
/// // Transient: always different instances
/// let model1 = scope1.get_required::<RequestModel>();
/// let model2 = scope1.get_required::<RequestModel>();
/// assert!(!std::ptr::eq(&*model1, &*model2));
///
/// assert_eq!(Lifetime::default(), Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Single instance per root provider, cached forever
    ///
    /// Created on first request and shared by every scope and thread.
    Singleton,
    /// Single instance per scope, cached for scope lifetime
    Scoped,
    /// New instance per resolution, never cached
    #[default]
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        })
    }
}
