//! Core traits for the dependency injection container.

mod registry;
mod resolver;

pub use registry::{Injectable, ServiceRegistry, TypeActivator};
pub use resolver::{Resolver, ResolverCore};
