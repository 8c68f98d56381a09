//! # ferrous-bindings
//!
//! Declarative service registration for a small dependency injection
//! container, inspired by Microsoft.Extensions.DependencyInjection.
//!
//! Types and factory functions carry binding markers that name a lifetime
//! and, optionally, a contract. A single call scans the chosen modules and
//! turns every marker into exactly one registration.
//!
//! ## Features
//!
//! - **Binding markers**: `#[singleton]`, `#[scoped]`, `#[transient]` and
//!   `#[binding(..)]` on types and factory functions
//! - **Explicit contracts**: register under a trait object, checked at
//!   compile time
//! - **Deferred factories**: factory parameters are resolved from the
//!   container at the moment the service is requested
//! - **Options**: configuration sections bound onto typed options and
//!   validated with `validator` annotations
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_bindings::{
//!     bind_factory, bind_type, DiResult, Injectable, Modules, Resolver, ResolverContext,
//!     ServiceCollection,
//! };
//! use std::sync::Arc;
//!
//! pub trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! pub struct FixedClock;
//!
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 { 42 }
//! }
//!
//! impl Injectable for FixedClock {
//!     fn inject(_: &ResolverContext) -> DiResult<Self> {
//!         Ok(FixedClock)
//!     }
//! }
//!
//! bind_type! {
//!     #[singleton(dyn Clock)]
//!     FixedClock
//! }
//!
//! pub struct Stamp(pub u64);
//!
//! pub fn stamp(clock: Arc<dyn Clock>) -> Stamp {
//!     Stamp(clock.now())
//! }
//!
//! bind_factory! {
//!     #[transient]
//!     stamp => Stamp
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_bindings(&Modules::of([module_path!()])).unwrap();
//!
//! let provider = services.build();
//! assert_eq!(provider.get_required::<Stamp>().0, 42);
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once and shared across the entire application
//! - **Scoped**: Created once per scope (ideal for web request contexts)
//! - **Transient**: Created fresh on every resolution
//!
//! ## Options
//!
//! ```rust
//! use ferrous_bindings::{bind_options, ConfigurationBuilder, Modules, Options, Resolver, ServiceCollection};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//! use validator::Validate;
//!
//! #[derive(Default, Deserialize, Serialize, Validate)]
//! pub struct Retry {
//!     #[validate(range(max = 10))]
//!     pub attempts: u32,
//! }
//!
//! bind_options! {
//!     #[options(section = "Retry")]
//!     Retry
//! }
//!
//! let configuration = ConfigurationBuilder::new()
//!     .add_value(json!({ "Retry": { "attempts": 3 } }))
//!     .build()
//!     .unwrap();
//!
//! let mut services = ServiceCollection::new();
//! services.add_options_from(&configuration, &Modules::of([module_path!()])).unwrap();
//!
//! let provider = services.build();
//! assert_eq!(provider.get_required::<Options<Retry>>().get().attempts, 3);
//! ```

pub mod bindings;
pub mod collection;
pub mod configuration;
pub mod descriptors;
pub mod error;
pub mod invoke;
pub mod key;
pub mod lifetime;
mod macros;
pub mod marker;
pub mod options;
pub mod provider;
pub mod scan;
pub mod traits;

mod registration;

#[doc(hidden)]
pub use inventory;

pub use bindings::configure_bindings;
pub use collection::ServiceCollection;
pub use configuration::{Configuration, ConfigurationBuilder};
pub use descriptors::{Implementation, ServiceDescriptor};
pub use error::{DiError, DiResult};
pub use invoke::{
    bind_factory, invoke_with_services, DeferredFactory, FactoryFn, FactoryParam, IntoFactoryFn, ParamDescriptor,
    ParamKind,
};
pub use key::{Key, TypeInfo};
pub use lifetime::Lifetime;
pub use marker::{BindingMarker, Contract, ContractType, OptionsMarker};
pub use options::{
    configure_options, AnnotatedOptionsValidator, IOptions, Options, OptionsBuilder, ValidateOptions,
    ValidateOptionsResult, ValidationFailure,
};
pub use provider::{ResolverContext, Scope, ServiceProvider};
pub use registration::{downcast, erase, AnyArc};
pub use scan::{scan, Declaration, FactoryDeclaration, Modules, OptionsDeclaration, TypeDeclaration};
pub use traits::{Injectable, Resolver, ResolverCore, ServiceRegistry, TypeActivator};
