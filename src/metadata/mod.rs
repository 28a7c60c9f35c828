//! The runtime metadata the resolver works on.
//!
//! Instead of reflecting over a host runtime, every type, method and value the engine sees is
//! described here explicitly.
//!
//! # Key Components
//!
//! - [`token`] - Compact identities of registered types and methods
//! - [`typesystem`] - Types, their relations and the [`typesystem::TypeRegistry`]
//! - [`method`] - Declared methods and invocable method handles
//! - [`value`] - Dynamically typed values passed to and returned from methods
//!
//! # Examples
//!
//! ```rust,no_run
//! use elresolve::metadata::{typesystem::{PrimitiveKind, TypeRegistry}, value::Value};
//!
//! let registry = TypeRegistry::new();
//! let int = registry.primitive(PrimitiveKind::Int);
//! let point = registry
//!     .class("Point")
//!     .property("x", &int)
//!     .property("y", &int)
//!     .build()?;
//!
//! let origin = Value::object(&point);
//! assert_eq!(origin.type_name(), "Point");
//! # Ok::<(), elresolve::Error>(())
//! ```

/// Declared methods, accessibility resolution and invocation
pub mod method;
/// Identities of registered types and methods
pub mod token;
/// Runtime types, type relations and the type registry
pub mod typesystem;
/// Dynamically typed values
pub mod value;
