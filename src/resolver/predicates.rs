//! Argument matchers and the arity filters built on top of them.
//!
//! Each dispatch phase pairs one [`ArgMatcher`] with one arity filter:
//!
//! | Matcher        | Compares                         | Used by       |
//! |----------------|----------------------------------|---------------|
//! | [`SubType`]    | runtime types, no conversion     | phase 1       |
//! | [`Conversion`] | runtime types, boxing/unboxing   | phases 2, 3   |
//! | [`PolicyCoerce`] | argument values, through a policy | phases 2*, 3* |
//!
//! A `null` argument matches every formal parameter under all three matchers; whether it can
//! actually be bound is decided later, when the argument is coerced.

use crate::{
    metadata::{method::MethodRc, typesystem::TypeRc, value::Value},
    resolver::coercion::CoercionPolicy,
};

/// Decides whether one actual argument fits one formal parameter type.
pub trait ArgMatcher {
    /// What the matcher looks at: a runtime type or the argument value itself
    type Arg;

    /// Returns `true` if `actual` can be passed where `formal` is declared
    fn matches(&self, formal: &TypeRc, actual: &Self::Arg) -> bool;

    /// Returns `true` if `actual` is an array, which lets a single trailing argument stand for
    /// the whole variadic array
    fn is_array(&self, actual: &Self::Arg) -> bool;
}

/// Matches when the runtime type is assignable to the formal type, or a primitive that widens
/// to it
#[derive(Debug, Clone, Copy, Default)]
pub struct SubType;

impl ArgMatcher for SubType {
    type Arg = Option<TypeRc>;

    fn matches(&self, formal: &TypeRc, actual: &Self::Arg) -> bool {
        actual
            .as_ref()
            .is_none_or(|actual| formal.is_subtype_compatible(actual))
    }

    fn is_array(&self, actual: &Self::Arg) -> bool {
        actual.as_ref().is_some_and(|actual| actual.is_array())
    }
}

/// Like [`SubType`], after boxing a primitive or unboxing a wrapper
#[derive(Debug, Clone, Copy, Default)]
pub struct Conversion;

impl ArgMatcher for Conversion {
    type Arg = Option<TypeRc>;

    fn matches(&self, formal: &TypeRc, actual: &Self::Arg) -> bool {
        actual
            .as_ref()
            .is_none_or(|actual| formal.is_convertible_from(actual))
    }

    fn is_array(&self, actual: &Self::Arg) -> bool {
        actual.as_ref().is_some_and(|actual| actual.is_array())
    }
}

/// Matches when a coercion policy accepts the value.
///
/// An array value given an array formal is matched element by element against the formal's
/// element type; the policy itself never sees arrays.
pub struct PolicyCoerce<'a> {
    policy: &'a dyn CoercionPolicy,
}

impl<'a> PolicyCoerce<'a> {
    /// Probe coercions with `policy`
    #[must_use]
    pub fn new(policy: &'a dyn CoercionPolicy) -> Self {
        PolicyCoerce { policy }
    }
}

impl ArgMatcher for PolicyCoerce<'_> {
    type Arg = Value;

    fn matches(&self, formal: &TypeRc, actual: &Value) -> bool {
        if actual.is_null() {
            return true;
        }

        if let (Some(element), Some(array)) = (formal.element(), actual.as_array()) {
            return array
                .to_vec()
                .iter()
                .all(|item| self.matches(element, item));
        }

        self.policy.coerce(actual, formal).is_ok()
    }

    fn is_array(&self, actual: &Value) -> bool {
        actual.as_array().is_some()
    }
}

/// Every argument matches the formal parameter at the same position.
///
/// Candidates reach this filter with exactly as many parameters as there are arguments.
pub fn fixed_arity<M: ArgMatcher>(matcher: &M, method: &MethodRc, args: &[M::Arg]) -> bool {
    method.params.len() == args.len()
        && method
            .params
            .iter()
            .zip(args)
            .all(|(formal, actual)| matcher.matches(formal, actual))
}

/// Leading arguments match their formal parameters; the trailing ones match the variadic
/// parameter.
///
/// The trailing segment matches when it is empty, when it is a single array accepted by the
/// variadic array type, or when every trailing argument is accepted by the element type.
pub fn var_arity<M: ArgMatcher>(matcher: &M, method: &MethodRc, args: &[M::Arg]) -> bool {
    let Some(index) = method.vararg_index() else {
        return false;
    };
    if args.len() < index {
        return false;
    }

    let (leading, trailing) = args.split_at(index);
    if !method.params[..index]
        .iter()
        .zip(leading)
        .all(|(formal, actual)| matcher.matches(formal, actual))
    {
        return false;
    }

    match trailing {
        [] => true,
        [single] if matcher.is_array(single) => matcher.matches(&method.params[index], single),
        _ => method
            .vararg_element()
            .is_some_and(|element| trailing.iter().all(|actual| matcher.matches(element, actual))),
    }
}

/// Keep the candidates accepted by `matcher`, in their original order
pub fn filter<M: ArgMatcher>(
    matcher: &M,
    candidates: &[MethodRc],
    args: &[M::Arg],
    variadic: bool,
) -> Vec<MethodRc> {
    candidates
        .iter()
        .filter(|method| {
            if variadic {
                var_arity(matcher, method, args)
            } else {
                fixed_arity(matcher, method, args)
            }
        })
        .cloned()
        .collect()
}
