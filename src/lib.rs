// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # elresolve
//!
//! Property and method resolution for embeddable expression languages.
//!
//! When an expression such as `order.customer.name` or `calc.add(1, "2", 3)` is evaluated, the
//! evaluator hands each member access to a chain of resolvers. `elresolve` implements the
//! general-purpose resolver of that chain: it treats any non-null value as a bean, reads and
//! writes its properties through accessor methods, and picks the overload a method call runs
//! using phased, Java-style applicability rules extended with a pluggable coercion policy.
//!
//! ## Features
//!
//! - **Declarative type registry** - Classes, interfaces, primitives and arrays registered up
//!   front instead of discovered through host reflection
//! - **Phased overload resolution** - Subtyping, boxing conversion and policy coercion for
//!   fixed-arity methods, then conversion and coercion for variadic methods
//! - **Strict ambiguity handling** - Calls without a single most specific candidate fail
//!   instead of being settled by declaration order
//! - **Varargs packing** - Trailing arguments become the variadic array, a single array
//!   argument is passed through
//! - **Concurrent caches** - Property tables and resolved methods shared across threads, with
//!   scope-wise purging when types are unloaded
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use elresolve::prelude::*;
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let int = registry.primitive(PrimitiveKind::Int);
//! let ints = registry.array_of(&int)?;
//!
//! let calc = registry
//!     .class("Calc")
//!     .with(
//!         MethodSpec::new("add")
//!             .param(&int)
//!             .param(&ints)
//!             .varargs()
//!             .returns(&int)
//!             .body(|_, args| {
//!                 let first = args[0].as_i64().unwrap_or_default();
//!                 let rest = args[1].as_array().map(|a| a.to_vec()).unwrap_or_default();
//!                 let sum = first + rest.iter().filter_map(Value::as_i64).sum::<i64>();
//!                 Ok(Value::Int(sum as i32))
//!             }),
//!     )
//!     .build()?;
//!
//! let resolver = BeanResolver::new(registry.clone(), false);
//! let mut ctx = EvalContext::new();
//! let args = [Value::Int(1), Value::from("2"), Value::Long(3)];
//! let sum = resolver.invoke_method(&mut ctx, &Value::object(&calc), &Value::from("add"), None, Some(&args))?;
//! assert_eq!(sum, Value::Int(6));
//! assert!(ctx.is_property_resolved());
//! # Ok::<(), elresolve::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - Tokens, the type system and registry, methods and values
//! - [`resolver`] - The bean resolver, overload dispatch, coercion and caching
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Not-found errors tell the evaluator to continue with the next resolver; everything else is
//! a real failure of the expression:
//!
//! ```rust,no_run
//! use elresolve::{Error, prelude::*};
//!
//! fn call(resolver: &BeanResolver, base: &Value, name: &str) -> elresolve::Result<Option<Value>> {
//!     let mut ctx = EvalContext::new();
//!     match resolver.invoke_method(&mut ctx, base, &Value::from(name), None, None) {
//!         Ok(value) => Ok(Some(value)),
//!         Err(e) if e.is_ambiguous() => Err(e),
//!         Err(Error::MethodNotFound { .. }) => Ok(None),
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use elresolve::prelude::*;
///
/// let registry = TypeRegistry::new();
/// let string = registry.builtin(BuiltinType::String);
/// assert!(registry.builtin(BuiltinType::Object).is_assignable_from(&string));
/// ```
pub mod prelude;

/// Runtime metadata: tokens, types, methods and values
///
/// # Key Components
///
/// - [`metadata::typesystem::TypeRegistry`] - Registry of all resolvable types
/// - [`metadata::typesystem::ClassBuilder`] - Declarative class and interface registration
/// - [`metadata::method::MethodHandle`] - Invocable, publicly reachable methods
/// - [`metadata::value::Value`] - Dynamically typed values
pub mod metadata;

/// Property access and method dispatch
///
/// # Key Components
///
/// - [`BeanResolver`] - The evaluator-facing resolver
/// - [`resolver::Dispatcher`] - Phased overload resolution
/// - [`resolver::ResolutionCache`] - Shared property and method caches
/// - [`resolver::CoercionPolicy`] - Pluggable value coercion
pub mod resolver;

/// `elresolve` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `elresolve` Error type
///
/// Distinguishes "not handled here" ([`Error::PropertyNotFound`], [`Error::MethodNotFound`])
/// from failures of the evaluated expression itself.
pub use error::Error;

pub use error::{CoercionError, InvocationError, NotFoundReason};

/// Main entry point for resolving members of arbitrary values.
///
/// See [`resolver::BeanResolver`] for construction and configuration.
pub use resolver::{BeanResolver, Resolver};
