//! Declarative registration of classes, interfaces and their methods.
//!
//! [`ClassBuilder`] is the registration step that stands in for reflection: everything the
//! resolver can later find on a type (its supertypes, its methods and, through the bean
//! accessor naming convention, its properties) is declared here once.
//!
//! # Examples
//!
//! ```rust,no_run
//! use elresolve::prelude::*;
//!
//! let registry = TypeRegistry::new();
//! let int = registry.primitive(PrimitiveKind::Int);
//!
//! let counter = registry
//!     .class("Counter")
//!     .property("count", &int)
//!     .with(
//!         MethodSpec::new("add")
//!             .param(&registry.array_of(&int)?)
//!             .varargs()
//!             .returns(&int)
//!             .body(|_, args| {
//!                 let items = args[0].as_array().map(|a| a.to_vec()).unwrap_or_default();
//!                 Ok(Value::Int(items.iter().filter_map(Value::as_i64).sum::<i64>() as i32))
//!             }),
//!     )
//!     .build()?;
//! # Ok::<(), elresolve::Error>(())
//! ```

use std::sync::Arc;

use crate::{
    error::InvocationError,
    metadata::{
        method::{MethodAttributes, MethodBody, MethodDef, MethodRc},
        token::{Token, TokenTable},
        typesystem::{
            BuiltinType, RuntimeType, TypeAttributes, TypeFlavor, TypeRc, TypeRef, TypeRegistry,
            TypeScope,
        },
        value::Value,
    },
    Error, Result,
};

/// Declaration of one method, consumed by [`ClassBuilder::with`].
///
/// Methods are public unless [`MethodSpec::non_public`] is called, and abstract unless a
/// [`MethodSpec::body`] is supplied.
pub struct MethodSpec {
    name: String,
    params: Vec<TypeRc>,
    returns: Option<TypeRc>,
    flags: MethodAttributes,
    body: Option<MethodBody>,
}

impl MethodSpec {
    /// Start declaring a public method
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        MethodSpec {
            name: name.into(),
            params: Vec::new(),
            returns: None,
            flags: MethodAttributes::PUBLIC,
            body: None,
        }
    }

    /// Append a formal parameter
    #[must_use]
    pub fn param(mut self, ty: &TypeRc) -> Self {
        self.params.push(ty.clone());
        self
    }

    /// Append several formal parameters
    #[must_use]
    pub fn params(mut self, types: &[TypeRc]) -> Self {
        self.params.extend(types.iter().cloned());
        self
    }

    /// Set the return type; methods without one return `void`
    #[must_use]
    pub fn returns(mut self, ty: &TypeRc) -> Self {
        self.returns = Some(ty.clone());
        self
    }

    /// Mark the last parameter, which must be an array type, as variadic
    #[must_use]
    pub fn varargs(mut self) -> Self {
        self.flags |= MethodAttributes::VARARGS;
        self
    }

    /// Hide the method from callers outside its declaring type
    #[must_use]
    pub fn non_public(mut self) -> Self {
        self.flags.remove(MethodAttributes::PUBLIC);
        self
    }

    /// Supply the implementation
    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> std::result::Result<Value, InvocationError>
            + Send
            + Sync
            + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    fn validate(&self, owner: &str) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::TypeError(format!(
                "Method without a name on type '{owner}'"
            )));
        }
        if self.flags.contains(MethodAttributes::VARARGS)
            && !self.params.last().is_some_and(|last| last.is_array())
        {
            return Err(Error::TypeError(format!(
                "Variadic method '{}' on type '{owner}' must end with an array parameter",
                self.name
            )));
        }
        Ok(())
    }

    pub(crate) fn into_method(self, token: Token, declaring: &TypeRc) -> MethodRc {
        let mut flags = self.flags;
        if self.body.is_none() {
            flags |= MethodAttributes::ABSTRACT;
        }
        Arc::new(MethodDef::new(
            token,
            self.name,
            self.params,
            self.returns,
            flags,
            TypeRef::new(declaring),
            self.body,
        ))
    }
}

/// Builds `getFoo` / `setFoo` style accessor names
fn accessor_name(prefix: &str, property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("{prefix}{}{}", first.to_uppercase(), chars.as_str()),
        None => prefix.to_string(),
    }
}

/// Fluent builder registering a class or interface with a [`TypeRegistry`].
///
/// Created through [`TypeRegistry::class`] or [`TypeRegistry::interface`]. Classes extend
/// `Object` unless [`ClassBuilder::extends`] names another class. Nothing is registered until
/// [`ClassBuilder::build`] succeeds.
pub struct ClassBuilder<'a> {
    registry: &'a TypeRegistry,
    name: String,
    flavor: TypeFlavor,
    flags: TypeAttributes,
    scope: TypeScope,
    base: Option<TypeRc>,
    interfaces: Vec<TypeRc>,
    methods: Vec<MethodSpec>,
}

impl<'a> ClassBuilder<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry, name: &str, flavor: TypeFlavor) -> Self {
        let mut flags = TypeAttributes::PUBLIC;
        if matches!(flavor, TypeFlavor::Interface) {
            flags |= TypeAttributes::ABSTRACT;
        }
        ClassBuilder {
            registry,
            name: name.to_string(),
            flavor,
            flags,
            scope: TypeScope::APPLICATION,
            base: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Set the superclass
    #[must_use]
    pub fn extends(mut self, base: &TypeRc) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface
    #[must_use]
    pub fn implements(mut self, iface: &TypeRc) -> Self {
        self.interfaces.push(iface.clone());
        self
    }

    /// Make the type non-public; its methods are then only reachable through public
    /// declarations of its supertypes
    #[must_use]
    pub fn non_public(mut self) -> Self {
        self.flags.remove(TypeAttributes::PUBLIC);
        self
    }

    /// Add type attributes
    #[must_use]
    pub fn flags(mut self, flags: TypeAttributes) -> Self {
        self.flags |= flags;
        self
    }

    /// Register the type into `scope` instead of [`TypeScope::APPLICATION`]
    #[must_use]
    pub fn scope(mut self, scope: TypeScope) -> Self {
        self.scope = scope;
        self
    }

    /// Declare a method
    #[must_use]
    pub fn with(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare a public read accessor `getProperty()` returning `ty`
    #[must_use]
    pub fn getter<F>(self, property: &str, ty: &TypeRc, read: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Value, InvocationError> + Send + Sync + 'static,
    {
        let name = accessor_name("get", property);
        self.with(
            MethodSpec::new(name)
                .returns(ty)
                .body(move |receiver, _| read(receiver)),
        )
    }

    /// Declare a public write accessor `setProperty(ty)`
    #[must_use]
    pub fn setter<F>(self, property: &str, ty: &TypeRc, write: F) -> Self
    where
        F: Fn(&Value, Value) -> std::result::Result<(), InvocationError> + Send + Sync + 'static,
    {
        let name = accessor_name("set", property);
        self.with(MethodSpec::new(name).param(ty).body(move |receiver, args| {
            write(receiver, args.first().cloned().unwrap_or_default())?;
            Ok(Value::Null)
        }))
    }

    /// Declare a public read/write property stored in the instance field of the same name.
    ///
    /// An unset field reads as the zero value of a primitive `ty`, `null` otherwise.
    #[must_use]
    pub fn property(self, property: &str, ty: &TypeRc) -> Self {
        let default = ty.primitive().map_or(Value::Null, |kind| kind.zero());
        let field = property.to_string();
        let read_field = field.clone();

        self.getter(property, ty, move |receiver| {
            Ok(receiver
                .as_object()
                .and_then(|instance| instance.field(&read_field))
                .unwrap_or_else(|| default.clone()))
        })
        .setter(property, ty, move |receiver, value| match receiver.as_object() {
            Some(instance) => {
                instance.set_field(&field, value);
                Ok(())
            }
            None => Err(format!("{} has no fields", receiver.type_name()).into()),
        })
    }

    /// Validate and register the type.
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] if the name is empty or already taken, the superclass is
    /// not an extensible class, an implemented type is not an interface, or a variadic method
    /// does not end with an array parameter.
    pub fn build(self) -> Result<TypeRc> {
        if self.name.is_empty() {
            return Err(Error::TypeError("Types require a name".to_string()));
        }

        let is_interface = matches!(self.flavor, TypeFlavor::Interface);
        let base = match (is_interface, self.base) {
            (true, Some(_)) => {
                return Err(Error::TypeError(format!(
                    "Interface '{}' cannot extend a class",
                    self.name
                )))
            }
            (true, None) => None,
            (false, Some(base)) => {
                if !matches!(base.flavor, TypeFlavor::Class)
                    || base.flags.contains(TypeAttributes::FINAL)
                {
                    return Err(Error::TypeError(format!(
                        "Type '{}' cannot extend '{}'",
                        self.name, base.name
                    )));
                }
                Some(base)
            }
            (false, None) => Some(self.registry.builtin(BuiltinType::Object)),
        };

        if let Some(bad) = self.interfaces.iter().find(|iface| !iface.is_interface()) {
            return Err(Error::TypeError(format!(
                "Type '{}' cannot implement non-interface '{}'",
                self.name, bad.name
            )));
        }
        for method in &self.methods {
            method.validate(&self.name)?;
        }

        let new_type = Arc::new(RuntimeType::new(
            self.registry.next_token(TokenTable::Declared)?,
            self.name,
            self.flavor,
            self.flags,
            self.scope,
            base,
            self.interfaces,
        ));
        self.registry.define_methods(&new_type, self.methods)?;
        self.registry.insert(&new_type)?;
        Ok(new_type)
    }
}
