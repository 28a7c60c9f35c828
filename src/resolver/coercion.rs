//! Value coercion.
//!
//! Scalar conversions are delegated to a pluggable [`CoercionPolicy`]; this module adds the
//! engine's own structural rule on top of it, [`coerce_value`], which walks arrays element by
//! element and rebuilds them when their type does not fit the target.
//!
//! # Key Components
//!
//! - [`CoercionPolicy`]: The pluggable scalar conversion seam
//! - [`StandardCoercion`]: The process-default policy, see [`default_policy`]
//! - [`coerce_value`]: Array-aware coercion used for argument binding
//!
//! # Thread Safety
//!
//! Policies are shared between evaluation threads and must be `Send + Sync`.

use std::{
    any::TypeId,
    sync::{Arc, OnceLock},
};

use crate::{
    error::CoercionError,
    metadata::{
        typesystem::{BuiltinType, PrimitiveKind, TypeRc},
        value::Value,
    },
};

/// Converts a runtime value into a target type.
///
/// The resolver calls the policy while probing candidates (phases 2* and 3*), where a
/// [`CoercionError`] only means "this candidate does not match", and again when binding the
/// arguments of the resolved method, where it becomes an evaluation error.
///
/// Resolved methods are cached per policy type: [`CoercionPolicy::policy_id`] is part of the
/// cache key, so two policies of the same type must accept the same conversions.
///
/// # Examples
///
/// ```rust,no_run
/// use elresolve::prelude::*;
///
/// struct Strict;
///
/// impl CoercionPolicy for Strict {
///     fn coerce(&self, value: &Value, target: &TypeRc) -> std::result::Result<Value, CoercionError> {
///         if value.is_null() || value.is_instance_of(target) {
///             Ok(value.clone())
///         } else {
///             Err(CoercionError::new(value.to_string(), target.name.clone()))
///         }
///     }
/// }
/// ```
pub trait CoercionPolicy: Send + Sync + 'static {
    /// Convert `value` into a value of type `target`.
    ///
    /// # Errors
    /// Returns [`CoercionError`] if the value cannot be represented as `target`.
    fn coerce(&self, value: &Value, target: &TypeRc) -> Result<Value, CoercionError>;

    /// Identity used in method cache keys
    fn policy_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Human-readable policy name
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The default coercion rules.
///
/// - `null` becomes the zero value of a primitive target and stays `null` otherwise
/// - values that already are instances of the target pass through unchanged
/// - numbers convert between all numeric types, narrowing by truncation
/// - strings parse into numbers, `boolean` (`"true"`, ignoring case) and `char` (first
///   character); the empty string becomes zero
/// - every value converts to `String` through its display form
/// - arrays are never created; everything else is rejected
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCoercion;

impl CoercionPolicy for StandardCoercion {
    fn coerce(&self, value: &Value, target: &TypeRc) -> Result<Value, CoercionError> {
        let reject = || CoercionError::new(value.to_string(), target.name.clone());

        if let Some(kind) = target.primitive() {
            return coerce_primitive(value, kind).ok_or_else(reject);
        }
        if value.is_null() {
            return Ok(Value::Null);
        }
        if value.is_instance_of(target) {
            return Ok(value.clone());
        }

        match target.builtin() {
            Some(BuiltinType::String) => Ok(Value::from(value.to_string())),
            Some(wrapper) => wrapper
                .unboxed()
                .and_then(|kind| coerce_primitive(value, kind))
                .ok_or_else(reject),
            None => Err(reject()),
        }
    }
}

fn coerce_primitive(value: &Value, kind: PrimitiveKind) -> Option<Value> {
    if value.is_null() {
        return Some(kind.zero());
    }

    match kind {
        PrimitiveKind::Boolean => match value {
            Value::Boolean(b) => Some(Value::Boolean(*b)),
            Value::String(s) => Some(Value::Boolean(s.eq_ignore_ascii_case("true"))),
            _ => None,
        },
        PrimitiveKind::Char => match value {
            Value::Char(c) => Some(Value::Char(*c)),
            Value::String(s) => Some(Value::Char(s.chars().next().unwrap_or('\0'))),
            other => other
                .as_i64()
                .and_then(|n| u32::try_from(n).ok())
                .and_then(char::from_u32)
                .map(Value::Char),
        },
        _ => match value {
            Value::Boolean(_) => None,
            Value::String(s) if s.is_empty() => Some(kind.zero()),
            Value::String(s) => parse_numeric(s, kind),
            Value::Char(c) => Some(from_i64(i64::from(u32::from(*c)), kind)),
            other => match other.as_i64() {
                Some(n) => Some(from_i64(n, kind)),
                None => other.as_f64().map(|f| from_f64(f, kind)),
            },
        },
    }
}

fn parse_numeric(s: &str, kind: PrimitiveKind) -> Option<Value> {
    match kind {
        PrimitiveKind::Byte => s.parse().ok().map(Value::Byte),
        PrimitiveKind::Short => s.parse().ok().map(Value::Short),
        PrimitiveKind::Int => s.parse().ok().map(Value::Int),
        PrimitiveKind::Long => s.parse().ok().map(Value::Long),
        PrimitiveKind::Float => s.parse().ok().map(Value::Float),
        PrimitiveKind::Double => s.parse().ok().map(Value::Double),
        PrimitiveKind::Boolean | PrimitiveKind::Char => None,
    }
}

fn from_i64(n: i64, kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Byte => Value::Byte(n as i8),
        PrimitiveKind::Short => Value::Short(n as i16),
        PrimitiveKind::Int => Value::Int(n as i32),
        PrimitiveKind::Long => Value::Long(n),
        PrimitiveKind::Float => Value::Float(n as f32),
        PrimitiveKind::Double => Value::Double(n as f64),
        PrimitiveKind::Boolean => Value::Boolean(n != 0),
        PrimitiveKind::Char => Value::Char(char::from_u32(n as u32).unwrap_or('\0')),
    }
}

fn from_f64(f: f64, kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Float => Value::Float(f as f32),
        PrimitiveKind::Double => Value::Double(f),
        _ => from_i64(f as i64, kind),
    }
}

/// The process-wide default policy, created on first use
#[must_use]
pub fn default_policy() -> Arc<dyn CoercionPolicy> {
    static DEFAULT: OnceLock<Arc<dyn CoercionPolicy>> = OnceLock::new();
    DEFAULT
        .get_or_init(|| Arc::new(StandardCoercion))
        .clone()
}

/// Coerce `value` into `target`, recursing into arrays.
///
/// - primitive targets, and non-array targets given a non-null value, go through `policy`
/// - an array value given an array target is coerced element by element; if the array
///   already is an instance of `target` its elements are replaced in place, otherwise a new
///   array of the target element type is created
/// - anything else (`null` for a reference target, a non-array value for an array target) is
///   returned unchanged
///
/// # Errors
/// Returns the policy's [`CoercionError`] for the first element it rejects.
pub fn coerce_value(
    policy: &dyn CoercionPolicy,
    value: &Value,
    target: &TypeRc,
) -> Result<Value, CoercionError> {
    if target.is_primitive() || (!target.is_array() && !value.is_null()) {
        return policy.coerce(value, target);
    }

    if let (Value::Array(array), Some(element)) = (value, target.element()) {
        let items = array.to_vec();
        if value.is_instance_of(target) {
            for (index, item) in items.iter().enumerate() {
                array.set(index, coerce_value(policy, item, element)?);
            }
            return Ok(value.clone());
        }

        let coerced = items
            .iter()
            .map(|item| coerce_value(policy, item, element))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::typed_array(target.clone(), coerced));
    }

    Ok(value.clone())
}
