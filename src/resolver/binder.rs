//! Binding of actual arguments to the formal parameters of a resolved method.

use crate::{
    error::CoercionError,
    metadata::{method::MethodHandle, value::Value},
    resolver::coercion::{coerce_value, CoercionPolicy},
};

/// Coerce `args` to the parameters of `method`.
///
/// Fixed-arity methods get each argument coerced to its formal type. For variadic methods
/// the leading arguments are coerced the same way, and the trailing ones become the variadic
/// array:
///
/// - no trailing arguments give an empty array
/// - a single trailing array is coerced to the variadic array type, reusing it when it already
///   is an instance of that type
/// - anything else is coerced element by element into a new array
///
/// # Errors
/// Returns the policy's [`CoercionError`] for the first argument it rejects.
pub fn bind_arguments(
    policy: &dyn CoercionPolicy,
    method: &MethodHandle,
    args: &[Value],
) -> Result<Vec<Value>, CoercionError> {
    let params = method.params();
    let variadic = if method.is_varargs() {
        params.len().checked_sub(1)
    } else {
        None
    };

    let Some(index) = variadic else {
        return params
            .iter()
            .zip(args)
            .map(|(formal, actual)| coerce_value(policy, actual, formal))
            .collect();
    };

    let mut bound = Vec::with_capacity(params.len());
    for (formal, actual) in params[..index].iter().zip(args) {
        bound.push(coerce_value(policy, actual, formal)?);
    }

    let array_type = &params[index];
    let element = array_type.element().unwrap_or(array_type);
    let trailing = args.get(index..).unwrap_or_default();
    let packed = match trailing {
        [single] if single.as_array().is_some() => coerce_value(policy, single, array_type)?,
        _ => {
            let items = trailing
                .iter()
                .map(|actual| coerce_value(policy, actual, element))
                .collect::<Result<Vec<_>, _>>()?;
            Value::typed_array(array_type.clone(), items)
        }
    };
    bound.push(packed);
    Ok(bound)
}
