//! Declaration macros.
//!
//! Each macro submits one declaration into the scanner's tables. Markers are
//! written as attributes in front of the declared item:
//!
//! | marker                            | lifetime   | contract        |
//! |-----------------------------------|------------|-----------------|
//! | `#[binding]`                      | transient  | inferred        |
//! | `#[binding(Singleton)]`           | given      | inferred        |
//! | `#[binding(dyn Contract)]`        | transient  | `dyn Contract`  |
//! | `#[binding(Scoped, dyn Contract)]`| given      | `dyn Contract`  |
//! | `#[singleton]`, `#[scoped]`, `#[transient]` | named | inferred |
//! | `#[singleton(dyn Contract)]` and friends    | named | `dyn Contract` |

/// Builds a [`ContractType`](crate::ContractType) that registers instances
/// of `$implementation` under `$contract`.
///
/// The conversion is an unsizing coercion, so `$implementation` must
/// implement the contract trait.
///
/// ```rust
/// use ferrous_bindings::{contract, Key};
///
/// trait Greeter: Send + Sync {}
/// struct English;
/// impl Greeter for English {}
///
/// let contract = contract!(English => dyn Greeter);
/// assert_eq!(contract.key(), Key::of::<dyn Greeter>());
/// ```
#[macro_export]
macro_rules! contract {
    ($implementation:ty => $contract:ty) => {{
        fn upcast(instance: $crate::AnyArc) -> $crate::DiResult<$crate::AnyArc> {
            let implementation = $crate::downcast::<$implementation>(&instance)?;
            let contract: ::std::sync::Arc<$contract> = implementation;
            ::core::result::Result::Ok($crate::erase(contract))
        }
        $crate::ContractType::new($crate::Key::of::<$contract>, upcast)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __binding_marker {
    (@lifetime $owner:ty; $lifetime:ident) => {
        $crate::BindingMarker::new($crate::Lifetime::$lifetime)
    };
    (@lifetime $owner:ty; $lifetime:ident, $contract:ty) => {
        $crate::BindingMarker::with_contract(
            $crate::Lifetime::$lifetime,
            $crate::contract!($owner => $contract),
        )
    };
    ($owner:ty; binding) => {
        $crate::BindingMarker::new($crate::Lifetime::Transient)
    };
    ($owner:ty; binding(dyn $($contract:tt)+)) => {
        $crate::BindingMarker::with_contract(
            $crate::Lifetime::Transient,
            $crate::contract!($owner => dyn $($contract)+),
        )
    };
    ($owner:ty; binding($lifetime:ident)) => {
        $crate::BindingMarker::new($crate::Lifetime::$lifetime)
    };
    ($owner:ty; binding($lifetime:ident, $contract:ty)) => {
        $crate::BindingMarker::with_contract(
            $crate::Lifetime::$lifetime,
            $crate::contract!($owner => $contract),
        )
    };
    ($owner:ty; singleton $(($contract:ty))?) => {
        $crate::__binding_marker!(@lifetime $owner; Singleton $(, $contract)?)
    };
    ($owner:ty; scoped $(($contract:ty))?) => {
        $crate::__binding_marker!(@lifetime $owner; Scoped $(, $contract)?)
    };
    ($owner:ty; transient $(($contract:ty))?) => {
        $crate::__binding_marker!(@lifetime $owner; Transient $(, $contract)?)
    };
}

/// Declares binding markers on an implementation type.
///
/// The type must implement [`Injectable`](crate::Injectable). Every marker
/// becomes one registration when
/// [`configure_bindings`](crate::configure_bindings) scans the declaring
/// module.
///
/// ```rust
/// use ferrous_bindings::{bind_type, Injectable, ResolverContext, DiResult};
///
/// pub trait Mailer: Send + Sync {}
///
/// pub struct SmtpMailer;
/// impl Mailer for SmtpMailer {}
///
/// impl Injectable for SmtpMailer {
///     fn inject(_: &ResolverContext) -> DiResult<Self> {
///         Ok(SmtpMailer)
///     }
/// }
///
/// bind_type! {
///     #[singleton]
///     #[scoped(dyn Mailer)]
///     SmtpMailer
/// }
/// ```
#[macro_export]
macro_rules! bind_type {
    ($(#[$($marker:tt)+])+ $implementation:ty) => {
        $crate::inventory::submit! {
            $crate::scan::TypeDeclaration {
                module: ::core::module_path!(),
                activator: $crate::TypeActivator::of::<$implementation>,
                markers: &[$($crate::__binding_marker!($implementation; $($marker)+)),+],
            }
        }
    };
}

/// Declares binding markers on a factory function.
///
/// The return type is written after `=>`. With no explicit contract the
/// function registers under its return type. Parameters are resolved from
/// the container when the service is requested.
///
/// ```rust
/// use ferrous_bindings::bind_factory;
/// use std::sync::Arc;
///
/// pub struct Settings { pub url: String }
/// pub struct Client { pub url: String }
///
/// pub fn connect(settings: Arc<Settings>) -> Client {
///     Client { url: settings.url.clone() }
/// }
///
/// bind_factory! {
///     #[singleton]
///     connect => Client
/// }
/// ```
#[macro_export]
macro_rules! bind_factory {
    ($(#[$($marker:tt)+])+ $function:path => $returns:ty) => {
        $crate::inventory::submit! {
            $crate::scan::FactoryDeclaration {
                module: ::core::module_path!(),
                name: ::core::stringify!($function),
                function: || $crate::invoke::factory_returning::<$returns, _, _>(
                    ::core::stringify!($function),
                    $function,
                ),
                markers: &[$($crate::__binding_marker!($returns; $($marker)+)),+],
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __options_marker {
    (options) => {
        $crate::OptionsMarker::new(::core::option::Option::None, ::core::option::Option::None)
    };
    (options(section = $section:literal)) => {
        $crate::OptionsMarker::new(::core::option::Option::Some($section), ::core::option::Option::None)
    };
    (options(name = $name:literal)) => {
        $crate::OptionsMarker::new(::core::option::Option::None, ::core::option::Option::Some($name))
    };
    (options(section = $section:literal, name = $name:literal)) => {
        $crate::OptionsMarker::new(
            ::core::option::Option::Some($section),
            ::core::option::Option::Some($name),
        )
    };
}

/// Declares an options type bound from configuration.
///
/// The type must be `Default`, serializable both ways with serde and
/// validated with `validator`. Each marker registers one `Options<T>`
/// instance together with an annotation validator.
///
/// ```rust
/// use ferrous_bindings::bind_options;
/// use serde::{Deserialize, Serialize};
/// use validator::Validate;
///
/// #[derive(Default, Deserialize, Serialize, Validate)]
/// pub struct SmtpOptions {
///     #[validate(length(min = 1))]
///     pub host: String,
/// }
///
/// bind_options! {
///     #[options(section = "Smtp")]
///     #[options(section = "Backup:Smtp", name = "backup")]
///     SmtpOptions
/// }
/// ```
#[macro_export]
macro_rules! bind_options {
    ($(#[$($marker:tt)+])+ $options:ty) => {
        $crate::inventory::submit! {
            $crate::scan::OptionsDeclaration {
                module: ::core::module_path!(),
                type_info: $crate::TypeInfo::of::<$options>,
                register: $crate::options::register_declared::<$options>,
                markers: &[$($crate::__options_marker!($($marker)+)),+],
            }
        }
    };
}
