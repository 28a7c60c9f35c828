//! # elresolve Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the elresolve library. Import this module to get quick access to the essential
//! types for registering types and resolving members.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all elresolve operations
pub use crate::Error;

/// The result type used throughout elresolve
pub use crate::Result;

/// Error details: not-found classification, coercion failures, errors raised by method bodies
pub use crate::{CoercionError, InvocationError, NotFoundReason};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The bean resolver and the evaluator-facing resolver trait
pub use crate::resolver::{BeanResolver, Resolver};

/// Construction-time configuration and per-evaluation context
pub use crate::resolver::{EvalContext, ResolverConfig};

// ================================================================================================
// Type System
// ================================================================================================

/// Metadata token type identifying types and methods
pub use crate::metadata::token::Token;

/// Core type system components
pub use crate::metadata::typesystem::{
    BuiltinType, ClassBuilder, MethodSpec, PrimitiveKind, RuntimeType, TypeAttributes,
    TypeFlavor, TypeRc, TypeRegistry, TypeScope,
};

/// Methods and invocable handles
pub use crate::metadata::method::{MethodAttributes, MethodDef, MethodHandle, MethodRc};

// ================================================================================================
// Values
// ================================================================================================

/// Dynamically typed values, arrays and object instances
pub use crate::metadata::value::{ArrayValue, Instance, Value};

// ================================================================================================
// Resolution
// ================================================================================================

/// Pluggable coercion
pub use crate::resolver::{coerce_value, default_policy, CoercionPolicy, StandardCoercion};

/// Caching and bean introspection
pub use crate::resolver::{
    FeatureDescriptor, PropertyDescriptor, PropertyTable, ResolutionCache, ResolutionKey,
};

/// Overload resolution
pub use crate::resolver::{Dispatcher, Phase};
