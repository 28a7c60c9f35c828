//! Runtime type model backing member resolution.
//!
//! This module replaces host-language reflection with an explicit registry. Every type the
//! engine can resolve against is a [`RuntimeType`]: its name, its structural [`TypeFlavor`],
//! its superclass and interfaces, and the methods declared on it. Bean properties are not
//! stored here; they are derived from the accessor methods when a property table is first
//! needed (see [`crate::resolver::PropertyTable`]).
//!
//! # Key Components
//!
//! - [`RuntimeType`]: A class, interface, primitive or array type
//! - [`TypeRegistry`]: Token- and name-indexed store of all types, including the builtins
//! - [`ClassBuilder`]: Declarative registration of classes, interfaces and their methods
//! - [`PrimitiveKind`] / [`BuiltinType`]: The primitives and the builtin reference types
//!
//! # Type Relations
//!
//! - **Assignability**: identity, superclass chain, transitive interfaces, `Object` accepting
//!   every reference type and covariant reference arrays
//! - **Widening**: `byte < short < int < long < float < double` between primitives
//! - **Conversion**: assignability or widening after boxing a primitive or unboxing a wrapper
//!
//! # Examples
//!
//! ```rust,no_run
//! use elresolve::metadata::typesystem::{BuiltinType, PrimitiveKind, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//! let number = registry.builtin(BuiltinType::Number);
//! let integer = registry.builtin(BuiltinType::Integer);
//! let int = registry.primitive(PrimitiveKind::Int);
//!
//! assert!(number.is_assignable_from(&integer));
//! assert!(!number.is_assignable_from(&int));
//! assert!(number.is_convertible_from(&int));
//! ```

mod base;
mod builder;
mod primitives;
mod registry;

use std::sync::Arc;

pub use base::{TypeAttributes, TypeFlavor, TypeRef, TypeScope};
pub use builder::{ClassBuilder, MethodSpec};
pub use primitives::{BuiltinType, PrimitiveKind};
pub use registry::TypeRegistry;

use crate::metadata::{method::MethodRc, token::Token};

/// Reference to a `RuntimeType`
pub type TypeRc = Arc<RuntimeType>;

/// A registered type.
///
/// Types are immutable after registration apart from their method list, which is appended to
/// exactly once while the owning [`ClassBuilder`] finishes (methods need the type's `Arc` to
/// point back at it).
pub struct RuntimeType {
    /// Registry identity
    pub token: Token,
    /// Type name, `Element[]` for arrays
    pub name: String,
    /// Structural kind
    pub flavor: TypeFlavor,
    /// Visibility and shape attributes
    pub flags: TypeAttributes,
    /// The loading scope this type belongs to
    pub scope: TypeScope,
    /// Superclass, `None` for `Object`, primitives and interfaces
    base: Option<TypeRc>,
    /// Directly implemented (or, for interfaces, extended) interfaces
    interfaces: Vec<TypeRc>,
    /// Methods declared on this type
    methods: boxcar::Vec<MethodRc>,
}

impl RuntimeType {
    /// Create a new instance of a `RuntimeType`
    pub(crate) fn new(
        token: Token,
        name: String,
        flavor: TypeFlavor,
        flags: TypeAttributes,
        scope: TypeScope,
        base: Option<TypeRc>,
        interfaces: Vec<TypeRc>,
    ) -> Self {
        RuntimeType {
            token,
            name,
            flavor,
            flags,
            scope,
            base,
            interfaces,
            methods: boxcar::Vec::new(),
        }
    }

    /// Access the base type of this type, if it exists
    #[must_use]
    pub fn base(&self) -> Option<&TypeRc> {
        self.base.as_ref()
    }

    /// Directly implemented interfaces
    #[must_use]
    pub fn interfaces(&self) -> &[TypeRc] {
        &self.interfaces
    }

    /// Methods declared on this type, in declaration order
    pub fn methods(&self) -> impl Iterator<Item = &MethodRc> {
        self.methods.iter().map(|(_, method)| method)
    }

    pub(crate) fn add_method(&self, method: MethodRc) {
        self.methods.push(method);
    }

    /// The primitive kind, if this is a primitive type
    #[must_use]
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self.flavor {
            TypeFlavor::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns `true` for the eight primitive types
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self.flavor, TypeFlavor::Primitive(_))
    }

    /// Returns `true` for array types
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.flavor, TypeFlavor::Array(_))
    }

    /// Returns `true` for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.flavor, TypeFlavor::Interface)
    }

    /// Returns `true` if the type is visible outside of its scope
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.contains(TypeAttributes::PUBLIC)
    }

    /// The element type of an array type
    #[must_use]
    pub fn element(&self) -> Option<&TypeRc> {
        match &self.flavor {
            TypeFlavor::Array(element) => Some(element),
            _ => None,
        }
    }

    /// The builtin reference type this is, if any
    #[must_use]
    pub fn builtin(&self) -> Option<BuiltinType> {
        BuiltinType::from_token(self.token)
    }

    /// Returns `true` if this is the given builtin reference type
    #[must_use]
    pub fn is_builtin(&self, builtin: BuiltinType) -> bool {
        self.token == builtin.token()
    }

    /// Returns `true` if `self` is a supertype of the builtin type `builtin`
    #[must_use]
    pub fn accepts_builtin(&self, builtin: BuiltinType) -> bool {
        self.builtin()
            .is_some_and(|own| own.is_supertype_of(builtin))
    }

    /// Returns `true` if `self` is `target` or inherits from it through its superclass chain
    /// or (transitively) its interfaces.
    fn inherits(&self, target: Token) -> bool {
        if self.token == target {
            return true;
        }
        if self.base.as_ref().is_some_and(|base| base.inherits(target)) {
            return true;
        }
        self.interfaces.iter().any(|iface| iface.inherits(target))
    }

    /// Reference assignability: can a value of type `actual` be stored where `self` is
    /// expected without any conversion?
    ///
    /// Primitive types are only assignable from themselves. Arrays are covariant in their
    /// reference element type; primitive arrays require identical element types.
    #[must_use]
    pub fn is_assignable_from(&self, actual: &RuntimeType) -> bool {
        if self.token == actual.token {
            return true;
        }

        match (&self.flavor, &actual.flavor) {
            (TypeFlavor::Primitive(_), _) | (_, TypeFlavor::Primitive(_)) => false,
            (TypeFlavor::Array(formal), TypeFlavor::Array(given)) => {
                !formal.is_primitive() && !given.is_primitive() && formal.is_assignable_from(given)
            }
            (TypeFlavor::Array(_), _) => false,
            (_, TypeFlavor::Array(_)) => self.is_builtin(BuiltinType::Object),
            _ => self.is_builtin(BuiltinType::Object) || actual.inherits(self.token),
        }
    }

    /// Primitive widening from `actual` to `self`
    #[must_use]
    pub fn is_widening_from(&self, actual: &RuntimeType) -> bool {
        match (self.primitive(), actual.primitive()) {
            (Some(formal), Some(given)) => given.widens_to(formal),
            _ => false,
        }
    }

    /// Assignability or primitive widening
    #[must_use]
    pub fn is_subtype_compatible(&self, actual: &RuntimeType) -> bool {
        self.is_assignable_from(actual) || self.is_widening_from(actual)
    }

    /// Assignability after an optional boxing or unboxing step.
    ///
    /// A wrapper `actual` is unboxed when `self` is primitive, a primitive `actual` is boxed
    /// when `self` is a reference type; the result is then checked with
    /// [`RuntimeType::is_subtype_compatible`].
    #[must_use]
    pub fn is_convertible_from(&self, actual: &RuntimeType) -> bool {
        if self.is_subtype_compatible(actual) {
            return true;
        }

        match (self.primitive(), actual.primitive()) {
            (Some(formal), None) => actual
                .builtin()
                .and_then(|wrapper| wrapper.unboxed())
                .is_some_and(|given| given.widens_to(formal)),
            (None, Some(given)) => self.accepts_builtin(given.wrapper()),
            _ => false,
        }
    }

    /// Find a public method by exact name and parameter types.
    ///
    /// Searches the methods declared here, then the superclass chain, then the interfaces.
    /// The result may be an abstract declaration.
    #[must_use]
    pub fn find_method(&self, name: &str, params: &[TypeRc]) -> Option<MethodRc> {
        if let Some(found) = self
            .methods()
            .find(|m| m.is_public() && m.name == name && m.has_params(params))
        {
            return Some(found.clone());
        }
        if let Some(found) = self.base.as_ref().and_then(|b| b.find_method(name, params)) {
            return Some(found);
        }
        self.interfaces
            .iter()
            .find_map(|iface| iface.find_method(name, params))
    }

    /// All public methods with a body that a receiver of this type can be called with.
    ///
    /// Methods declared here come first; inherited methods follow unless a method with the
    /// same name and parameter types was already collected.
    #[must_use]
    pub fn public_methods(&self) -> Vec<MethodRc> {
        let mut found = Vec::new();
        self.collect_public(&mut found);
        found
    }

    fn collect_public(&self, found: &mut Vec<MethodRc>) {
        for method in self.methods() {
            if method.is_public()
                && method.has_body()
                && !found.iter().any(|known| known.same_signature(method))
            {
                found.push(method.clone());
            }
        }
        if let Some(base) = &self.base {
            base.collect_public(found);
        }
        for iface in &self.interfaces {
            iface.collect_public(found);
        }
    }
}

impl std::fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeType")
            .field("token", &self.token)
            .field("name", &self.name)
            .field("flavor", &self.flavor)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::value::Value;

    #[test]
    fn test_reference_assignability() {
        let registry = TypeRegistry::new();
        let object = registry.builtin(BuiltinType::Object);
        let number = registry.builtin(BuiltinType::Number);
        let integer = registry.builtin(BuiltinType::Integer);
        let string = registry.builtin(BuiltinType::String);

        assert!(object.is_assignable_from(&integer));
        assert!(object.is_assignable_from(&string));
        assert!(number.is_assignable_from(&integer));
        assert!(!integer.is_assignable_from(&number));
        assert!(!number.is_assignable_from(&string));
    }

    #[test]
    fn test_array_covariance() -> crate::Result<()> {
        let registry = TypeRegistry::new();
        let object = registry.builtin(BuiltinType::Object);
        let integer = registry.builtin(BuiltinType::Integer);
        let int = registry.primitive(PrimitiveKind::Int);
        let long = registry.primitive(PrimitiveKind::Long);

        let object_array = registry.array_of(&object)?;
        let integer_array = registry.array_of(&integer)?;
        let int_array = registry.array_of(&int)?;
        let long_array = registry.array_of(&long)?;

        assert!(object_array.is_assignable_from(&integer_array));
        assert!(!integer_array.is_assignable_from(&object_array));
        assert!(!object_array.is_assignable_from(&int_array));
        assert!(!long_array.is_assignable_from(&int_array));
        assert!(object.is_assignable_from(&int_array));
        assert!(int_array.is_assignable_from(&*registry.array_of(&int)?));
        Ok(())
    }

    #[test]
    fn test_conversion() {
        let registry = TypeRegistry::new();
        let object = registry.builtin(BuiltinType::Object);
        let integer = registry.builtin(BuiltinType::Integer);
        let long_wrapper = registry.builtin(BuiltinType::Long);
        let int = registry.primitive(PrimitiveKind::Int);
        let long = registry.primitive(PrimitiveKind::Long);
        let double = registry.primitive(PrimitiveKind::Double);

        assert!(long.is_convertible_from(&integer));
        assert!(double.is_convertible_from(&integer));
        assert!(!int.is_convertible_from(&long_wrapper));
        assert!(object.is_convertible_from(&int));
        assert!(integer.is_convertible_from(&int));
        assert!(!long_wrapper.is_convertible_from(&int));
        assert!(!long.is_assignable_from(&int));
        assert!(long.is_subtype_compatible(&int));
    }

    #[test]
    fn test_interfaces_and_find_method() -> crate::Result<()> {
        let registry = TypeRegistry::new();
        let int = registry.primitive(PrimitiveKind::Int);

        let shape = registry
            .interface("Shape")
            .with(MethodSpec::new("area").returns(&int))
            .build()?;
        let square = registry
            .class("Square")
            .implements(&shape)
            .with(
                MethodSpec::new("area")
                    .returns(&int)
                    .body(|_, _| Ok(Value::Int(4))),
            )
            .build()?;

        assert!(shape.is_assignable_from(&square));
        assert!(registry
            .builtin(BuiltinType::Object)
            .is_assignable_from(&shape));

        let declared = square.find_method("area", &[]).expect("declared on Square");
        assert!(declared.has_body());
        assert_eq!(
            shape.find_method("area", &[]).map(|m| m.has_body()),
            Some(false)
        );

        let names: Vec<String> = square
            .public_methods()
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names.iter().filter(|n| *n == "area").count(), 1);
        assert!(names.iter().any(|n| n == "getClass"));
        Ok(())
    }
}
