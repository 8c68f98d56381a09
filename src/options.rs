//! Options pattern bridged to configuration and declarative validation.
//!
//! `Options<T>` is a singleton snapshot built from `T::default()`, a chain of
//! configure steps (typically binding a configuration section) and every
//! registered [`ValidateOptions<T>`]. Types declared with
//! [`bind_options!`](crate::bind_options) get a configuration binding and an
//! [`AnnotatedOptionsValidator`] per marker.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::configuration::Configuration;
use crate::descriptors::Implementation;
use crate::key::TypeInfo;
use crate::marker::OptionsMarker;
use crate::provider::ResolverContext;
use crate::registration::{erase, AnyArc};
use crate::scan::{scan, Modules, OptionsDeclaration};
use crate::traits::Resolver;
use crate::{DiError, DiResult, Key, Lifetime, ServiceCollection};

/// Options interface for dependency injection.
///
/// This trait provides access to immutable configuration snapshots that are
/// resolved once and remain consistent for the lifetime of the provider.
pub trait IOptions<T>: Send + Sync + 'static {
    /// Gets the configured options instance.
    fn get(&self) -> Arc<T>;
}

/// Immutable options wrapper that implements `IOptions<T>`.
///
/// # Examples
///
/// ```
/// use ferrous_bindings::{ServiceCollection, Options, Resolver};
///
/// #[derive(Default)]
/// struct DatabaseConfig {
///     connection_string: String,
///     max_connections: u32,
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_options::<DatabaseConfig>()
///     .default_with(|| DatabaseConfig {
///         connection_string: "postgres://localhost".to_string(),
///         max_connections: 10,
///     })
///     .validate(|cfg| {
///         if cfg.max_connections == 0 {
///             Err("max_connections must be > 0".to_string())
///         } else {
///             Ok(())
///         }
///     })
///     .register();
///
/// let provider = services.build();
/// let config = provider.get_required::<Options<DatabaseConfig>>();
/// assert_eq!(config.get().max_connections, 10);
/// ```
pub struct Options<T> {
    inner: Arc<T>,
    name: Option<&'static str>,
}

impl<T> Options<T> {
    /// Creates a new `Options<T>` wrapping the given value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            name: None,
        }
    }

    fn named(value: T, name: Option<&'static str>) -> Self {
        Self {
            inner: Arc::new(value),
            name,
        }
    }

    /// Gets a reference to the inner `Arc<T>`.
    pub fn value(&self) -> &Arc<T> {
        &self.inner
    }

    /// Gets a clone of the inner `Arc<T>` containing the configured options.
    pub fn get(&self) -> Arc<T> {
        self.inner.clone()
    }

    /// The instance name, `None` for the default instance.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

impl<T> IOptions<T> for Options<T>
where
    T: Send + Sync + 'static,
{
    fn get(&self) -> Arc<T> {
        self.inner.clone()
    }
}

/// One validation failure, attributed to a configuration section and the
/// members that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub section: String,
    pub member_names: Vec<String>,
    pub message: String,
}

impl ValidationFailure {
    /// A failure not tied to any member.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            section: String::new(),
            member_names: Vec::new(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.section.is_empty() && self.member_names.is_empty() {
            return f.write_str(&self.message);
        }
        write!(
            f,
            "Configuration failure in section '{}' for member '{}' with message: {}",
            self.section,
            self.member_names.join(", "),
            self.message
        )
    }
}

/// Outcome of one options validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateOptionsResult {
    /// The validator does not apply to this options instance
    Skip,
    Success,
    Fail(Vec<ValidationFailure>),
}

impl ValidateOptionsResult {
    pub fn failed(&self) -> bool {
        matches!(self, ValidateOptionsResult::Fail(_))
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        match self {
            ValidateOptionsResult::Fail(failures) => failures,
            _ => &[],
        }
    }

    /// Every failure rendered as one message per line.
    pub fn failure_message(&self) -> String {
        self.failures()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Validates a named options instance once it has been configured.
///
/// Validators are registered as `dyn ValidateOptions<T>` multi-bindings and
/// all of them run when `Options<T>` is first resolved.
pub trait ValidateOptions<T>: Send + Sync {
    fn validate(&self, name: Option<&str>, options: &T) -> ValidateOptionsResult;
}

/// Runs the `validator` rules declared on `T`.
///
/// A validator created for a name skips every other name; one created
/// without a name validates every instance. Failing members are reported
/// under their configuration names, as the value serializes them.
///
/// ```rust
/// use ferrous_bindings::{AnnotatedOptionsValidator, ValidateOptions, ValidateOptionsResult};
/// use serde::Serialize;
/// use validator::Validate;
///
/// #[derive(Serialize, Validate)]
/// #[serde(rename_all = "PascalCase")]
/// struct Limits {
///     #[validate(range(max = 10))]
///     burst_size: u32,
/// }
///
/// let validator = AnnotatedOptionsValidator::<Limits>::new(Some("api"), "Limits");
/// let invalid = Limits { burst_size: 50 };
///
/// assert_eq!(validator.validate(Some("db"), &invalid), ValidateOptionsResult::Skip);
///
/// let result = validator.validate(Some("api"), &invalid);
/// assert_eq!(result.failures()[0].section, "Limits");
/// assert_eq!(result.failures()[0].member_names, ["BurstSize"]);
/// ```
pub struct AnnotatedOptionsValidator<T> {
    name: Option<&'static str>,
    section: String,
    _options: PhantomData<fn() -> T>,
}

impl<T> AnnotatedOptionsValidator<T> {
    pub fn new(name: Option<&'static str>, section: impl Into<String>) -> Self {
        Self {
            name,
            section: section.into(),
            _options: PhantomData,
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn section(&self) -> &str {
        &self.section
    }
}

impl<T: Validate + Serialize> ValidateOptions<T> for AnnotatedOptionsValidator<T> {
    fn validate(&self, name: Option<&str>, options: &T) -> ValidateOptionsResult {
        if self.name.is_some() && name != self.name {
            return ValidateOptionsResult::Skip;
        }

        match options.validate() {
            Ok(()) => ValidateOptionsResult::Success,
            Err(errors) => {
                let tree = serde_json::to_value(options).ok();
                let mut failures = Vec::new();
                flatten_errors(&self.section, "", &errors, tree.as_ref(), &mut failures);
                failures.sort_by(|a, b| a.member_names.cmp(&b.member_names));
                ValidateOptionsResult::Fail(failures)
            }
        }
    }
}

fn flatten_errors(
    section: &str,
    prefix: &str,
    errors: &ValidationErrors,
    node: Option<&Value>,
    out: &mut Vec<ValidationFailure>,
) {
    for (field, kind) in errors.errors() {
        let (key, child) = configured_member(node, field);
        let member = format!("{prefix}{key}");
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let member_names = if *field == "__all__" {
                    Vec::new()
                } else {
                    vec![member.clone()]
                };
                for error in field_errors {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("validation rule '{}' failed", error.code),
                    };
                    out.push(ValidationFailure {
                        section: section.to_string(),
                        member_names: member_names.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_errors(section, &format!("{member}."), nested, child, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let item = child.and_then(|list| list.get(*index));
                    flatten_errors(section, &format!("{member}[{index}]."), nested, item, out);
                }
            }
        }
    }
}

/// Finds the serialized key for a Rust field: exact, then ignoring ASCII
/// case, then ignoring case and word separators.
fn configured_member<'v>(node: Option<&'v Value>, field: &str) -> (String, Option<&'v Value>) {
    let map = match node {
        Some(Value::Object(map)) if field != "__all__" => map,
        _ => return (field.to_string(), None),
    };

    let folded = fold_member(field);
    map.iter()
        .find(|(key, _)| key.as_str() == field)
        .or_else(|| map.iter().find(|(key, _)| key.eq_ignore_ascii_case(field)))
        .or_else(|| map.iter().find(|(key, _)| fold_member(key) == folded))
        .map(|(key, value)| (key.clone(), Some(value)))
        .unwrap_or_else(|| (field.to_string(), None))
}

fn fold_member(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Adapts a closure into a validator for one options name.
struct FnValidator<T> {
    name: Option<&'static str>,
    check: ValidateFn<T>,
}

impl<T: Send + Sync + 'static> ValidateOptions<T> for FnValidator<T> {
    fn validate(&self, name: Option<&str>, options: &T) -> ValidateOptionsResult {
        if name != self.name {
            return ValidateOptionsResult::Skip;
        }
        match (self.check)(options) {
            Ok(()) => ValidateOptionsResult::Success,
            Err(message) => ValidateOptionsResult::Fail(vec![ValidationFailure::message(message)]),
        }
    }
}

type ConfigureFn<T> = Arc<dyn Fn(&ResolverContext, &mut T) -> DiResult<()> + Send + Sync>;
type ValidateFn<T> = Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// Options builder for configuring options from configuration, code and
/// other services.
///
/// The configuration process follows this order when `Options<T>` is first
/// resolved:
/// 1. Create the initial value (`default_with` or `T::default()`)
/// 2. Run configure steps, including configuration binding, in order
/// 3. Run post-configure steps in order
/// 4. Run every registered `ValidateOptions<T>` for this name
///
/// # Examples
///
/// ```
/// use ferrous_bindings::{ServiceCollection, Resolver, Options, Configuration};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Deserialize, Serialize)]
/// struct ApiConfig {
///     base_url: String,
///     timeout_ms: u64,
/// }
///
/// let configuration = Configuration::from_json(
///     r#"{ "Api": { "base_url": "https://api.example.com", "timeout_ms": 5000 } }"#,
/// ).unwrap();
///
/// let mut services = ServiceCollection::new();
/// services.add_options::<ApiConfig>()
///     .bind(configuration.get_section("Api"))
///     .post_configure(|_resolver, config| {
///         if !config.base_url.ends_with('/') {
///             config.base_url.push('/');
///         }
///     })
///     .register();
///
/// let provider = services.build();
/// let api = provider.get_required::<Options<ApiConfig>>().get();
/// assert_eq!(api.base_url, "https://api.example.com/");
/// assert_eq!(api.timeout_ms, 5000);
/// ```
pub struct OptionsBuilder<'a, T>
where
    T: Default + Send + Sync + 'static,
{
    services: &'a mut ServiceCollection,
    name: Option<&'static str>,
    section: Option<String>,
    default_maker: Option<Arc<dyn Fn() -> T + Send + Sync>>,
    configures: Vec<ConfigureFn<T>>,
    post_configures: Vec<ConfigureFn<T>>,
    validates: Vec<ValidateFn<T>>,
}

impl<'a, T> OptionsBuilder<'a, T>
where
    T: Default + Send + Sync + 'static,
{
    pub(crate) fn new(services: &'a mut ServiceCollection) -> Self {
        Self {
            services,
            name: None,
            section: None,
            default_maker: None,
            configures: Vec::new(),
            post_configures: Vec::new(),
            validates: Vec::new(),
        }
    }

    /// Builds a named instance, resolved with `get_named::<Options<T>>(name)`.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Provide a custom default value creator (otherwise `T::default()`).
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_maker = Some(Arc::new(f));
        self
    }

    /// Binds a configuration section onto the options.
    ///
    /// Members named in the section overwrite the value built so far; every
    /// other member keeps what the default and earlier configure steps set.
    /// A section that does not exist leaves the value untouched.
    pub fn bind(mut self, section: Configuration) -> Self
    where
        T: Serialize + DeserializeOwned,
    {
        self.section = Some(section.path().to_string());
        self.configures.push(Arc::new(move |_: &ResolverContext, value: &mut T| {
            section.bind_onto(value)
        }));
        self
    }

    /// Configure options with a callback that can resolve other services.
    ///
    /// ```
    /// use ferrous_bindings::{ServiceCollection, Options, Resolver};
    ///
    /// #[derive(Default)]
    /// struct AppConfig {
    ///     feature_enabled: bool,
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton("production".to_string());
    ///
    /// services.add_options::<AppConfig>()
    ///     .configure(|resolver, config| {
    ///         let env = resolver.get_required::<String>();
    ///         config.feature_enabled = env.as_str() == "production";
    ///     })
    ///     .register();
    ///
    /// let provider = services.build();
    /// assert!(provider.get_required::<Options<AppConfig>>().get().feature_enabled);
    /// ```
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResolverContext, &mut T) + Send + Sync + 'static,
    {
        self.configures.push(Arc::new(move |resolver: &ResolverContext, value: &mut T| {
            f(resolver, value);
            Ok(())
        }));
        self
    }

    /// Post-configure options after all configure actions have been applied.
    pub fn post_configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResolverContext, &mut T) + Send + Sync + 'static,
    {
        self.post_configures.push(Arc::new(move |resolver: &ResolverContext, value: &mut T| {
            f(resolver, value);
            Ok(())
        }));
        self
    }

    /// Validate the final options with a callback.
    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validates.push(Arc::new(f));
        self
    }

    /// Validate the final options with the `validator` rules declared on `T`.
    pub fn validate_annotations(self) -> Self
    where
        T: Validate + Serialize,
    {
        let validator = AnnotatedOptionsValidator::<T>::new(self.name, self.section.clone().unwrap_or_default());
        self.services
            .add_singleton_trait::<dyn ValidateOptions<T>>(Arc::new(validator));
        self
    }

    /// Finish building and register `Options<T>` as a singleton.
    ///
    /// Validation failures surface as [`DiError::OptionsValidation`] when
    /// `Options<T>` is resolved.
    pub fn register(self) {
        let name = self.name;

        for check in self.validates {
            self.services
                .add_singleton_trait::<dyn ValidateOptions<T>>(Arc::new(FnValidator { name, check }));
        }

        let default_maker = self.default_maker;
        let configures = self.configures;
        let post_configures = self.post_configures;

        let ctor = move |resolver: &ResolverContext| -> DiResult<AnyArc> {
            let mut value = match &default_maker {
                Some(make) => make(),
                None => T::default(),
            };
            for step in configures.iter().chain(&post_configures) {
                step(resolver, &mut value)?;
            }

            let mut failures = Vec::new();
            for validator in resolver.get_all::<dyn ValidateOptions<T>>()? {
                let result = validator.validate(name, &value);
                failures.extend(result.failures().iter().cloned());
            }

            if !failures.is_empty() {
                tracing::warn!(
                    options = std::any::type_name::<T>(),
                    name = name.unwrap_or_default(),
                    failures = failures.len(),
                    "options validation failed"
                );
                return Err(DiError::OptionsValidation {
                    options: std::any::type_name::<T>(),
                    failures,
                });
            }

            Ok(erase(Arc::new(Options::named(value, name))))
        };

        self.services.insert(
            Key::of::<Options<T>>().with_name(name),
            Lifetime::Singleton,
            Implementation::Type(TypeInfo::of::<Options<T>>()),
            Arc::new(ctor),
        );
    }
}

/// Registers options for one declaration marker.
#[doc(hidden)]
pub fn register_declared<T>(services: &mut ServiceCollection, configuration: &Configuration, marker: &OptionsMarker)
where
    T: Serialize + DeserializeOwned + Default + Validate + Send + Sync + 'static,
{
    let node = match marker.section {
        Some(section) => configuration.get_section(section),
        None => configuration.clone(),
    };

    let mut builder = services.add_options::<T>();
    if let Some(name) = marker.name {
        builder = builder.named(name);
    }
    builder.bind(node).validate_annotations().register();
}

/// Registers every options type declared in `modules`, bound to
/// `configuration`.
///
/// Returns the number of options instances registered.
pub fn configure_options(
    services: &mut ServiceCollection,
    configuration: &Configuration,
    modules: &Modules,
) -> DiResult<usize> {
    let mut count = 0;
    for (declaration, marker) in scan::<OptionsDeclaration>(modules) {
        (declaration.register)(services, configuration, marker);
        tracing::debug!(
            options = (declaration.type_info)().name,
            section = marker.section.unwrap_or_default(),
            name = marker.name.unwrap_or_default(),
            "registered options"
        );
        count += 1;
    }

    tracing::info!(options = count, ?modules, "configured options");
    Ok(count)
}

/// Extensions to ServiceCollection for the Options pattern.
impl ServiceCollection {
    /// Start building `Options<T>`. Call `.register()` to finalize.
    ///
    /// ```
    /// use ferrous_bindings::{ServiceCollection, Options, Resolver};
    ///
    /// #[derive(Default)]
    /// struct MySettings {
    ///     enabled: bool,
    ///     timeout: u64,
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_options::<MySettings>()
    ///     .configure(|_resolver, settings| {
    ///         settings.enabled = true;
    ///         settings.timeout = 5000;
    ///     })
    ///     .register();
    ///
    /// let provider = services.build();
    /// let settings = provider.get_required::<Options<MySettings>>().get();
    /// assert!(settings.enabled);
    /// assert_eq!(settings.timeout, 5000);
    /// ```
    pub fn add_options<T>(&mut self) -> OptionsBuilder<'_, T>
    where
        T: Default + Send + Sync + 'static,
    {
        OptionsBuilder::new(self)
    }

    /// Registers the options types declared in `modules`.
    pub fn add_options_from(&mut self, configuration: &Configuration, modules: &Modules) -> DiResult<&mut Self> {
        configure_options(self, configuration, modules)?;
        Ok(self)
    }
}
