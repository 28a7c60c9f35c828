//! Registered methods and invocable method handles.
//!
//! A [`MethodDef`] is the registry's record of a declared method: its formal parameter types,
//! attributes, declaring type and (unless abstract) the closure implementing it. Resolution
//! never invokes a `MethodDef` directly; it first turns the winner into a [`MethodHandle`],
//! which pairs the publicly reachable declaration with the implementation that actually runs.
//!
//! # Accessibility
//!
//! A method is invocable when it is public and declared on a public type. A public method of
//! a non-public type (for example a private class implementing a public interface) is reached
//! through the same-signature declaration of an interface or superclass instead; see
//! [`MethodHandle::resolve`].

use std::{fmt, sync::Arc};

use bitflags::bitflags;

use crate::{
    error::InvocationError,
    metadata::{
        token::Token,
        typesystem::{TypeRc, TypeRef, TypeRegistry},
        value::Value,
    },
    Error, Result,
};

/// Implementation of a method: receives the receiver and the bound arguments.
///
/// The arguments have already been coerced to the formal parameter types; a variable-arity
/// method receives its trailing arguments packed into one [`Value::Array`].
pub type MethodBody =
    Arc<dyn Fn(&Value, &[Value]) -> std::result::Result<Value, InvocationError> + Send + Sync>;

/// Reference to a `MethodDef`
pub type MethodRc = Arc<MethodDef>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Method attribute flags
    pub struct MethodAttributes: u32 {
        /// Method is visible to callers outside its declaring type
        const PUBLIC = 0x0006;
        /// Method has no body and must be implemented by a subtype
        const ABSTRACT = 0x0400;
        /// The last parameter is an array accepting zero or more trailing arguments
        const VARARGS = 0x0800;
    }
}

/// A method declared on a [`crate::metadata::typesystem::RuntimeType`].
pub struct MethodDef {
    /// Registry identity
    pub token: Token,
    /// Method name
    pub name: String,
    /// Formal parameter types; for variable-arity methods the last one is an array type
    pub params: Vec<TypeRc>,
    /// Declared return type, `None` for `void`
    pub returns: Option<TypeRc>,
    /// Attribute flags
    pub flags: MethodAttributes,
    declaring: TypeRef,
    body: Option<MethodBody>,
}

impl MethodDef {
    pub(crate) fn new(
        token: Token,
        name: String,
        params: Vec<TypeRc>,
        returns: Option<TypeRc>,
        flags: MethodAttributes,
        declaring: TypeRef,
        body: Option<MethodBody>,
    ) -> Self {
        MethodDef {
            token,
            name,
            params,
            returns,
            flags,
            declaring,
            body,
        }
    }

    /// Returns `true` if the method is public
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.contains(MethodAttributes::PUBLIC)
    }

    /// Returns `true` if the last parameter accepts zero or more trailing arguments
    #[must_use]
    pub fn is_varargs(&self) -> bool {
        self.flags.contains(MethodAttributes::VARARGS)
    }

    /// Returns `true` unless the method is an abstract declaration
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// The type declaring this method, if it is still registered
    #[must_use]
    pub fn declaring_type(&self) -> Option<TypeRc> {
        self.declaring.upgrade()
    }

    /// Index of the variadic parameter
    #[must_use]
    pub fn vararg_index(&self) -> Option<usize> {
        if self.is_varargs() {
            self.params.len().checked_sub(1)
        } else {
            None
        }
    }

    /// Element type of the variadic parameter
    #[must_use]
    pub fn vararg_element(&self) -> Option<&TypeRc> {
        self.vararg_index()
            .and_then(|idx| self.params[idx].element())
    }

    /// Returns `true` if the formal parameter types are exactly `params`
    #[must_use]
    pub fn has_params(&self, params: &[TypeRc]) -> bool {
        self.params.len() == params.len()
            && self
                .params
                .iter()
                .zip(params)
                .all(|(own, other)| own.token == other.token)
    }

    /// Returns `true` if `other` has the same name and parameter types
    #[must_use]
    pub fn same_signature(&self, other: &MethodDef) -> bool {
        self.name == other.name && self.has_params(&other.params)
    }

    /// Renders `name(int, String...)`
    #[must_use]
    pub fn signature(&self) -> String {
        let mut rendered: Vec<String> = self.params.iter().map(|p| p.name.clone()).collect();
        if let (true, Some(last)) = (self.is_varargs(), rendered.last_mut()) {
            if let Some(stripped) = last.strip_suffix("[]") {
                *last = format!("{stripped}...");
            }
        }
        format!("{}({})", self.name, rendered.join(", "))
    }

    fn call(&self, receiver: &Value, args: &[Value]) -> Result<Value> {
        let Some(body) = &self.body else {
            return Err(evaluation_error!("Method {} is abstract", self.signature()));
        };
        body(receiver, args).map_err(|cause| Error::invocation(self.signature(), cause))
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("token", &self.token)
            .field("signature", &self.signature())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// An invocable method: the publicly reachable declaration plus the implementation to run.
///
/// For methods declared on public types both halves are the same method.
#[derive(Clone, Debug)]
pub struct MethodHandle {
    declaration: MethodRc,
    implementation: MethodRc,
}

impl MethodHandle {
    /// Compute the most visible handle for `method`.
    ///
    /// A public method declared on a public type is its own handle. Otherwise the interfaces
    /// of the declaring type, then its superclass chain, are searched for a public method with
    /// the same name and parameter types that is itself invocable.
    ///
    /// # Returns
    /// `None` if the method cannot be reached publicly.
    #[must_use]
    pub fn resolve(method: &MethodRc) -> Option<MethodHandle> {
        Self::find_accessible(method).map(|declaration| MethodHandle {
            declaration,
            implementation: method.clone(),
        })
    }

    fn find_accessible(method: &MethodRc) -> Option<MethodRc> {
        if !method.is_public() {
            return None;
        }

        let declaring = method.declaring_type()?;
        if declaring.is_public() {
            return Some(method.clone());
        }

        for iface in declaring.interfaces() {
            if let Some(found) = iface
                .find_method(&method.name, &method.params)
                .and_then(|candidate| Self::find_accessible(&candidate))
            {
                return Some(found);
            }
        }

        declaring
            .base()
            .and_then(|base| base.find_method(&method.name, &method.params))
            .and_then(|candidate| Self::find_accessible(&candidate))
    }

    /// The public declaration through which the method is reached
    #[must_use]
    pub fn declaration(&self) -> &MethodRc {
        &self.declaration
    }

    /// The method whose body runs
    #[must_use]
    pub fn implementation(&self) -> &MethodRc {
        &self.implementation
    }

    /// Formal parameter types
    #[must_use]
    pub fn params(&self) -> &[TypeRc] {
        &self.declaration.params
    }

    /// Returns `true` for variable-arity methods
    #[must_use]
    pub fn is_varargs(&self) -> bool {
        self.declaration.is_varargs()
    }

    /// Invoke the method with already bound arguments.
    ///
    /// Arguments are checked the way a reflective call checks them: the count must match and
    /// each value must be convertible to its formal type, `null` being rejected for primitive
    /// formals. Values given for primitive formals are unboxed and widened to the formal kind
    /// before the body runs.
    ///
    /// # Errors
    /// Returns [`Error::Evaluation`] for argument mismatches and for failures raised by the
    /// method body, the latter keeping the original cause.
    pub fn invoke(&self, registry: &TypeRegistry, receiver: &Value, args: &[Value]) -> Result<Value> {
        let params = self.params();
        if params.len() != args.len() {
            return Err(evaluation_error!(
                "Wrong number of arguments for {}: expected {}, got {}",
                self.declaration.signature(),
                params.len(),
                args.len()
            ));
        }

        let mut converted = Vec::with_capacity(args.len());
        for (index, (formal, arg)) in params.iter().zip(args).enumerate() {
            let value = match arg.runtime_type(registry) {
                None if !formal.is_primitive() => Some(Value::Null),
                Some(actual) if formal.is_convertible_from(&actual) => match formal.primitive() {
                    Some(kind) => kind.widen(arg),
                    None => Some(arg.clone()),
                },
                _ => None,
            };
            let Some(value) = value else {
                return Err(evaluation_error!(
                    "Argument {} of {}: {} is not a {}",
                    index,
                    self.declaration.signature(),
                    arg.type_name(),
                    formal.name
                ));
            };
            converted.push(value);
        }

        self.implementation.call(receiver, &converted)
    }
}

impl PartialEq for MethodHandle {
    fn eq(&self, other: &Self) -> bool {
        self.declaration.token == other.declaration.token
            && self.implementation.token == other.implementation.token
    }
}

impl Eq for MethodHandle {}
