//! Property and method resolution on arbitrary receivers.
//!
//! This module is the engine behind member access in an expression language: given a receiver
//! value, it reads and writes bean properties and selects and invokes the right overload of a
//! method for a list of argument values.
//!
//! # Key Components
//!
//! - [`BeanResolver`] / [`Resolver`]: The evaluator-facing entry point
//! - [`Dispatcher`]: Phased overload resolution (subtyping, conversion, policy coercion, and
//!   their variadic counterparts) with most-specific selection
//! - [`PropertyTable`]: Bean properties derived from accessor methods
//! - [`ResolutionCache`]: Concurrent caches for property tables and resolved methods
//! - [`CoercionPolicy`] / [`StandardCoercion`]: Pluggable value conversion
//! - [`EvalContext`]: Per-evaluation resolved flag and context objects
//!
//! # Resolution Flow
//!
//! ```text
//! invoke_method(base, name, args)
//!   -> cache hit?                       -> MethodHandle
//!   -> exact signature?                 -> MethodHandle (cached)
//!   -> phases 1, 2, 2*, 3, 3*           -> most specific candidate (cached) | ambiguous
//!   -> bind_arguments (coercion, varargs packing)
//!   -> MethodHandle::invoke
//! ```

mod bean;
mod binder;
mod cache;
mod coercion;
mod config;
mod context;
mod dispatcher;
mod predicates;
mod property;
pub mod specificity;

pub use bean::{BeanResolver, Resolver};
pub use binder::bind_arguments;
pub use cache::{ResolutionCache, ResolutionKey};
pub use coercion::{coerce_value, default_policy, CoercionPolicy, StandardCoercion};
pub use config::ResolverConfig;
pub use context::EvalContext;
pub use dispatcher::{Dispatcher, Phase};
pub use predicates::{fixed_arity, var_arity, ArgMatcher, Conversion, PolicyCoerce, SubType};
pub use property::{FeatureDescriptor, PropertyDescriptor, PropertyTable};
