//! Overload resolution.
//!
//! [`Dispatcher`] picks the method a call `receiver.name(args...)` runs. Resolution proceeds
//! through a fixed sequence of steps; the first step producing candidates decides the outcome.
//!
//! 1. **Cache**: a previous resolution of the same call shape (receiver type, name, runtime
//!    argument types, coercion policy)
//! 2. **Exact signature**: with no `null` argument, a method whose parameter types equal the
//!    runtime argument types
//! 3. The [`Phase`]s, in declaration order. Fixed-arity phases only consider methods with as
//!    many parameters as arguments, variadic phases only variadic methods accepting the
//!    argument count
//!
//! Within the producing phase the most specific candidate wins (see
//! [`crate::resolver::specificity`]). A tie fails the call as ambiguous instead of falling
//! through to later phases. Winners are cached.
//!
//! # Examples
//!
//! ```rust,no_run
//! use elresolve::prelude::*;
//! use elresolve::resolver::Dispatcher;
//!
//! let registry = TypeRegistry::new();
//! let string = registry.builtin(BuiltinType::String);
//! let cache = ResolutionCache::new();
//! let policy = default_policy();
//!
//! let dispatcher = Dispatcher::new(&registry, &cache, policy.as_ref());
//! let handle = dispatcher.resolve(&string, "concat", &[Value::Int(1)])?;
//! assert_eq!(handle.declaration().signature(), "concat(String)");
//! # Ok::<(), elresolve::Error>(())
//! ```

use strum::IntoEnumIterator;
use tracing::{debug, trace};

use crate::{
    error::NotFoundReason,
    metadata::{
        method::{MethodHandle, MethodRc},
        typesystem::{TypeRc, TypeRegistry},
        value::Value,
    },
    resolver::{
        cache::{ResolutionCache, ResolutionKey},
        coercion::CoercionPolicy,
        predicates::{self, Conversion, PolicyCoerce},
        specificity::{compare_fixed, compare_varargs, most_specific, Comparator},
    },
    Result,
};

/// Matching phases, tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Phase {
    /// Fixed arity, runtime types assignable or primitive-widening compatible
    SubType,
    /// Fixed arity, after boxing or unboxing
    Conversion,
    /// Fixed arity, the coercion policy accepts every argument value
    Coercion,
    /// Variable arity, after boxing or unboxing
    VarArgConversion,
    /// Variable arity, the coercion policy accepts every argument value
    VarArgCoercion,
}

impl Phase {
    /// Returns `true` for the phases considering variadic candidates
    #[must_use]
    pub fn is_variadic(self) -> bool {
        matches!(self, Phase::VarArgConversion | Phase::VarArgCoercion)
    }
}

/// Method resolution against one registry, cache and coercion policy
pub struct Dispatcher<'a> {
    registry: &'a TypeRegistry,
    cache: &'a ResolutionCache,
    policy: &'a dyn CoercionPolicy,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        registry: &'a TypeRegistry,
        cache: &'a ResolutionCache,
        policy: &'a dyn CoercionPolicy,
    ) -> Self {
        Dispatcher {
            registry,
            cache,
            policy,
        }
    }

    /// Resolve the method `name` of `receiver` for the given argument values.
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotFound`] with [`NotFoundReason::NoApplicableMethod`] if
    /// no phase matches, or with [`NotFoundReason::Ambiguous`] if the producing phase has no
    /// single most specific candidate.
    pub fn resolve(&self, receiver: &TypeRc, name: &str, args: &[Value]) -> Result<MethodHandle> {
        let types: Vec<Option<TypeRc>> = args
            .iter()
            .map(|arg| arg.runtime_type(self.registry))
            .collect();
        let key = ResolutionKey::new(receiver, name, &types, self.policy.policy_id());
        if let Some(handle) = self.cache.method(&key) {
            return Ok(handle);
        }

        if let Some(handle) = Self::exact_match(receiver, name, &types) {
            debug!(receiver = %receiver.name, method = %handle.declaration().signature(), "exact signature match");
            return Ok(self.cache.store_method(key, handle));
        }

        let (fixed, variadic) = Self::candidates(receiver, name, args.len());
        for phase in Phase::iter() {
            let pool = if phase.is_variadic() { &variadic } else { &fixed };
            if pool.is_empty() {
                continue;
            }

            let matched = self.run_phase(phase, pool, &types, args);
            if matched.is_empty() {
                trace!(%phase, method = name, "no candidates");
                continue;
            }

            let compare: Comparator = if phase.is_variadic() {
                compare_varargs
            } else {
                compare_fixed
            };
            let Some(winner) = most_specific(&matched, compare) else {
                debug!(
                    %phase,
                    receiver = %receiver.name,
                    method = name,
                    candidates = matched.len(),
                    "ambiguous method call"
                );
                return Err(Self::not_found(receiver, name, &types, NotFoundReason::Ambiguous));
            };
            let Some(handle) = MethodHandle::resolve(&winner) else {
                return Err(Self::not_found(
                    receiver,
                    name,
                    &types,
                    NotFoundReason::NoApplicableMethod,
                ));
            };

            debug!(%phase, receiver = %receiver.name, method = %winner.signature(), "resolved method");
            return Ok(self.cache.store_method(key, handle));
        }

        Err(Self::not_found(
            receiver,
            name,
            &types,
            NotFoundReason::NoApplicableMethod,
        ))
    }

    /// Resolve the method `name` of `receiver` declared with exactly `params`.
    ///
    /// Explicit signatures bypass the phases and the cache.
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotFound`] with [`NotFoundReason::NoSuchSignature`] if
    /// there is no such invocable method.
    pub fn resolve_signature(
        &self,
        receiver: &TypeRc,
        name: &str,
        params: &[TypeRc],
    ) -> Result<MethodHandle> {
        receiver
            .find_method(name, params)
            .filter(|method| method.has_body())
            .as_ref()
            .and_then(MethodHandle::resolve)
            .ok_or_else(|| {
                let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                method_not_found!(receiver.name, name, names, NotFoundReason::NoSuchSignature)
            })
    }

    fn exact_match(receiver: &TypeRc, name: &str, types: &[Option<TypeRc>]) -> Option<MethodHandle> {
        let exact: Vec<TypeRc> = types.iter().cloned().collect::<Option<_>>()?;
        receiver
            .find_method(name, &exact)
            .filter(|method| method.has_body())
            .as_ref()
            .and_then(MethodHandle::resolve)
    }

    /// Public methods named `name` able to take `count` arguments, split into fixed-arity
    /// and variadic candidates
    fn candidates(receiver: &TypeRc, name: &str, count: usize) -> (Vec<MethodRc>, Vec<MethodRc>) {
        let mut fixed = Vec::new();
        let mut variadic = Vec::new();
        for method in receiver.public_methods() {
            if method.name != name {
                continue;
            }
            let formal = method.params.len();
            if method.is_varargs() && count + 1 >= formal {
                variadic.push(method);
            } else if formal == count {
                fixed.push(method);
            }
        }
        (fixed, variadic)
    }

    fn run_phase(
        &self,
        phase: Phase,
        pool: &[MethodRc],
        types: &[Option<TypeRc>],
        args: &[Value],
    ) -> Vec<MethodRc> {
        let variadic = phase.is_variadic();
        match phase {
            Phase::SubType => predicates::filter(&predicates::SubType, pool, types, variadic),
            Phase::Conversion | Phase::VarArgConversion => {
                predicates::filter(&Conversion, pool, types, variadic)
            }
            Phase::Coercion | Phase::VarArgCoercion => {
                predicates::filter(&PolicyCoerce::new(self.policy), pool, args, variadic)
            }
        }
    }

    fn not_found(
        receiver: &TypeRc,
        name: &str,
        types: &[Option<TypeRc>],
        reason: NotFoundReason,
    ) -> crate::Error {
        let names: Vec<&str> = types
            .iter()
            .map(|ty| ty.as_ref().map_or("null", |ty| ty.name.as_str()))
            .collect();
        method_not_found!(receiver.name, name, names, reason)
    }
}
