use std::{
    fmt,
    sync::{Arc, Weak},
};

use bitflags::bitflags;

use crate::metadata::typesystem::{PrimitiveKind, RuntimeType, TypeRc};

/// A weak back-reference to a [`RuntimeType`].
///
/// Methods point at their declaring type through this wrapper; the type owns its methods, so
/// a strong reference in the other direction would keep both alive forever.
#[derive(Clone)]
pub struct TypeRef {
    weak_ref: Weak<RuntimeType>,
}

impl TypeRef {
    /// Create a new `TypeRef` from a strong reference
    pub fn new(strong_ref: &TypeRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Get a strong reference to the type, returning None if the type has been dropped
    #[must_use]
    pub fn upgrade(&self) -> Option<TypeRc> {
        self.weak_ref.upgrade()
    }

    /// Check if the referenced type is still alive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.weak_ref.strong_count() > 0
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(ty) => write!(f, "TypeRef({})", ty.name),
            None => f.write_str("TypeRef(<dropped>)"),
        }
    }
}

/// The structural kind of a [`RuntimeType`]
#[derive(Clone)]
pub enum TypeFlavor {
    /// One of the eight primitives
    Primitive(PrimitiveKind),
    /// A class, possibly abstract
    Class,
    /// An interface
    Interface,
    /// An array with the given element type
    Array(TypeRc),
}

impl fmt::Debug for TypeFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFlavor::Primitive(kind) => write!(f, "Primitive({kind})"),
            TypeFlavor::Class => f.write_str("Class"),
            TypeFlavor::Interface => f.write_str("Interface"),
            TypeFlavor::Array(element) => write!(f, "Array({})", element.name),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Visibility and shape attributes of a type
    pub struct TypeAttributes: u32 {
        /// Type is visible outside of its scope; only members of public types are invocable
        const PUBLIC = 0x0001;
        /// Type cannot be instantiated
        const ABSTRACT = 0x0080;
        /// Type cannot be extended
        const FINAL = 0x0100;
    }
}

/// A type-loading boundary.
///
/// Every registered type belongs to exactly one scope. Unloading a scope removes its types
/// from the registry, and purging it from a resolver drops every cache entry keyed by one of
/// its types. [`TypeScope::SYSTEM`] holds the builtins and cannot be unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeScope(pub u32);

impl TypeScope {
    /// The scope of builtin types
    pub const SYSTEM: TypeScope = TypeScope(0);
    /// The scope types are registered into unless a builder names another one
    pub const APPLICATION: TypeScope = TypeScope(1);

    /// Returns `true` for [`TypeScope::SYSTEM`]
    #[must_use]
    pub fn is_system(&self) -> bool {
        *self == Self::SYSTEM
    }
}

impl fmt::Display for TypeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
