use std::sync::Arc;

use thiserror::Error;

use crate::metadata::typesystem::TypeScope;

/// Builds an [`Error::MethodNotFound`] from a receiver type name, the requested method name,
/// the derived argument type names and a [`NotFoundReason`].
///
/// ```rust, ignore
/// return Err(method_not_found!(receiver.name(), name, &arg_types, NotFoundReason::Ambiguous));
/// ```
macro_rules! method_not_found {
    ($type_name:expr, $method:expr, $arg_types:expr, $reason:expr) => {
        crate::Error::MethodNotFound {
            type_name: $type_name.to_string(),
            method: $method.to_string(),
            arg_types: $arg_types.iter().map(|t| t.to_string()).collect(),
            reason: $reason,
        }
    };
}

/// Builds an [`Error::Evaluation`] without an underlying cause.
///
/// ```rust, ignore
/// return Err(evaluation_error!("'{}' has no body", method.name()));
/// ```
macro_rules! evaluation_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Evaluation {
            message: $msg.to_string(),
            source: None,
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Evaluation {
            message: format!($fmt, $($arg)*),
            source: None,
        }
    };
}

/// Error type raised by a method body when the invoked operation itself fails.
///
/// Bodies registered through [`crate::metadata::typesystem::ClassBuilder`] return this boxed
/// error; the engine wraps it into [`Error::Evaluation`] and keeps it reachable through
/// [`std::error::Error::source`].
pub type InvocationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a method lookup produced no invocable target.
///
/// Callers in a resolver chain use this to tell a plain miss (continue with the next resolver)
/// apart from a call site that matched several overloads equally well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum NotFoundReason {
    /// No candidate survived any matching phase
    #[strum(to_string = "no applicable method")]
    NoApplicableMethod,
    /// Two or more candidates were equally specific
    #[strum(to_string = "ambiguous call")]
    Ambiguous,
    /// An explicitly requested parameter signature does not exist
    #[strum(to_string = "no method with the requested signature")]
    NoSuchSignature,
}

/// A coercion policy refused to convert a value into the requested type.
///
/// During candidate filtering this error only means "no match" and is swallowed. Raised while
/// binding the arguments of an already resolved method, it is surfaced as
/// [`Error::Evaluation`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot coerce '{value}' to {target}")]
pub struct CoercionError {
    /// Display form of the rejected value
    pub value: String,
    /// Name of the requested target type
    pub target: String,
}

impl CoercionError {
    /// Create a new coercion error for a value and the name of its target type.
    pub fn new(value: impl Into<String>, target: impl Into<String>) -> Self {
        CoercionError {
            value: value.into(),
            target: target.into(),
        }
    }
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants follow the outcome classes of member resolution:
///
/// ## Not found
/// - [`Error::PropertyNotFound`] - Property is undeclared on the receiver type, or its name is null
/// - [`Error::MethodNotFound`] - No applicable method, an ambiguous call, or a missing signature
///
/// ## Not permitted
/// - [`Error::PropertyNotWritable`] - Write on a read-only resolver or a property without setter
///
/// ## Invocation failures
/// - [`Error::Evaluation`] - The accessor or method itself failed, or argument binding failed
///
/// ## Type system
/// - [`Error::TypeNotFound`] - Requested type is not registered
/// - [`Error::TypeError`] - Invalid registration request, or token space exhausted
/// - [`Error::ScopeUnloaded`] - Receiver type belongs to an unloaded scope
///
/// # Examples
///
/// ```rust,no_run
/// use elresolve::prelude::*;
///
/// fn describe(result: elresolve::Result<Value>) {
///     match result {
///         Ok(value) => println!("value: {value}"),
///         Err(e) if e.is_not_found() => println!("not handled here: {e}"),
///         Err(e) => eprintln!("evaluation failed: {e}"),
///     }
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The requested property is not declared on the receiver type.
    ///
    /// Also raised when the property name itself is null, or when a property exists but has
    /// no readable accessor and a read was attempted.
    #[error("Property '{property}' not found on type {type_name}")]
    PropertyNotFound {
        /// Name of the receiver type
        type_name: String,
        /// Requested property name
        property: String,
    },

    /// The property cannot be written.
    ///
    /// Raised when the resolver is configured read-only, or when the property lacks a
    /// public setter.
    #[error("Property '{property}' is not writable on type {type_name}")]
    PropertyNotWritable {
        /// Name of the receiver type
        type_name: String,
        /// Requested property name
        property: String,
    },

    /// Method resolution produced no invocable target.
    ///
    /// # Fields
    ///
    /// * `type_name` - Receiver type the lookup ran against
    /// * `method` - Requested method name
    /// * `arg_types` - Runtime argument type names, `null` for null arguments
    /// * `reason` - Whether nothing matched or several candidates matched equally well
    #[error("Method {method}({}) not found on type {type_name}: {reason}", arg_types.join(", "))]
    MethodNotFound {
        /// Name of the receiver type
        type_name: String,
        /// Requested method name
        method: String,
        /// Derived argument type names
        arg_types: Vec<String>,
        /// Classification of the failure
        reason: NotFoundReason,
    },

    /// The resolved accessor or method raised an error, or its arguments could not be bound.
    ///
    /// The original cause is preserved and returned from [`std::error::Error::source`].
    #[error("{message}")]
    Evaluation {
        /// Description of the failed evaluation
        message: String,
        /// The error raised by the invoked operation, if any
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The requested type is not present in the registry.
    #[error("Type '{0}' is not registered")]
    TypeNotFound(String),

    /// A type registration request was invalid.
    #[error("{0}")]
    TypeError(String),

    /// The types of this scope have been unloaded.
    #[error("Type scope {0} has been unloaded")]
    ScopeUnloaded(TypeScope),
}

impl Error {
    /// Wrap an error raised by an invoked method or accessor.
    pub(crate) fn invocation(context: impl std::fmt::Display, cause: InvocationError) -> Self {
        Error::Evaluation {
            message: format!("{context}: {cause}"),
            source: Some(Arc::from(cause)),
        }
    }

    /// Returns `true` for the "continue with the next resolver" class of errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PropertyNotFound { .. } | Error::MethodNotFound { .. }
        )
    }

    /// Returns `true` if method resolution failed because the call was ambiguous.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Error::MethodNotFound {
                reason: NotFoundReason::Ambiguous,
                ..
            }
        )
    }

    /// Returns `true` if the resolved operation itself failed.
    #[must_use]
    pub fn is_invocation_failure(&self) -> bool {
        matches!(self, Error::Evaluation { .. })
    }
}
