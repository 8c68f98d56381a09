//! Error types for the binding engine and its container.

use thiserror::Error;

use crate::options::ValidationFailure;

/// Binding and resolution errors
///
/// Covers the failure modes of the declarative binding engine (arity
/// mismatches found while building deferred factories), of the container it
/// writes into (unresolved dependencies, lifetime misuse) and of the options
/// bridge (configuration binding and validation).
///
/// # Examples
///
/// ```rust
/// use ferrous_bindings::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_bindings::DiError;
///
/// let arity = DiError::Arity { function: "make_client", parameters: 1, supplied: 2 };
/// assert_eq!(
///     arity.to_string(),
///     "Cannot invoke 'make_client': it takes 1 parameter(s) but 2 were supplied"
/// );
/// ```
///
/// Validation errors keep each failure's section and members:
///
/// ```rust
/// use ferrous_bindings::{DiError, ValidationFailure};
///
/// let err = DiError::OptionsValidation {
///     options: "app::Pool",
///     failures: vec![ValidationFailure {
///         section: "Pool".into(),
///         member_names: vec!["size".into()],
///         message: "too large".into(),
///     }],
/// };
/// assert_eq!(
///     err.to_string(),
///     "Options<app::Pool> validation failed: Configuration failure in section 'Pool' for member 'size' with message: too large"
/// );
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Service not registered
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Invalid lifetime resolution (e.g., scoped from root)
    #[error("Lifetime error: {0}")]
    WrongLifetime(&'static str),
    /// More explicit arguments than the factory function declares
    #[error("Cannot invoke '{function}': it takes {parameters} parameter(s) but {supplied} were supplied")]
    Arity {
        function: &'static str,
        parameters: usize,
        supplied: usize,
    },
    /// A bound options instance failed one or more validators
    #[error("Options<{options}> validation failed: {}", join_failures(.failures))]
    OptionsValidation {
        options: &'static str,
        failures: Vec<ValidationFailure>,
    },
    /// Configuration could not be loaded or bound
    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn join_failures(failures: &[ValidationFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
///
/// ```rust
/// use ferrous_bindings::{DiResult, DiError};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::NotFound("some_service"))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
