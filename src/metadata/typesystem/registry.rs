//! Central type registry.
//!
//! The [`TypeRegistry`] owns every [`RuntimeType`] the engine can resolve against: the builtin
//! reference types and primitives (registered on construction under fixed tokens), classes
//! and interfaces declared through [`ClassBuilder`], and array types interned on demand.
//!
//! # Thread Safety
//!
//! - Lock-free primary storage (`SkipMap`) keyed by [`Token`]
//! - Concurrent hash maps for the name index and the array intern table (`DashMap`)
//! - Atomic counters for token and scope allocation
//!
//! Registration and lookup can run concurrently from any number of threads.
//!
//! # Examples
//!
//! ```rust,no_run
//! use elresolve::metadata::typesystem::{PrimitiveKind, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//! let ints = registry.array_of(&registry.primitive(PrimitiveKind::Int))?;
//! assert_eq!(ints.name, "int[]");
//! assert!(registry.get_by_name("int[][]").is_some());
//! # Ok::<(), elresolve::Error>(())
//! ```

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::{
    metadata::{
        token::{Token, TokenTable},
        typesystem::{
            BuiltinType, ClassBuilder, MethodSpec, PrimitiveKind, RuntimeType, TypeAttributes,
            TypeFlavor, TypeRc, TypeRef, TypeScope,
        },
        value::Value,
    },
    Error, Result,
};

/// Highest row a token table can hold
const MAX_ROW: u32 = 0x00FF_FFFF;

/// Registry of all types known to a resolver.
pub struct TypeRegistry {
    /// Primary type storage indexed by token
    types: SkipMap<Token, TypeRc>,
    /// Secondary index: type name to token
    types_by_name: DashMap<String, Token>,
    /// Interned array types, keyed by element token
    arrays: DashMap<Token, TypeRc>,
    /// Builtin reference types, indexed by `BuiltinType as usize`
    builtins: Vec<TypeRc>,
    /// Primitive types, indexed by `PrimitiveKind as usize`
    primitives: Vec<TypeRc>,
    next_declared: AtomicU32,
    next_array: AtomicU32,
    next_method: AtomicU32,
    next_scope: AtomicU32,
}

impl TypeRegistry {
    /// Create a new registry with all builtin types registered.
    ///
    /// The builtins are `Object`, `Number`, the eight wrapper types, `String` and `Class`
    /// plus the eight primitives. `Object` declares `getClass()` and `toString()`, `Number`
    /// declares `intValue()`, `longValue()` and `doubleValue()`, and `String` declares
    /// `length()`, `concat(String)` and `toUpperCase()`.
    #[must_use]
    pub fn new() -> Self {
        let mut builtins: Vec<TypeRc> = Vec::new();
        for builtin in BuiltinType::iter() {
            let base = builtin.base().map(|b| builtins[b as usize].clone());
            let flags = match builtin {
                BuiltinType::Object => TypeAttributes::PUBLIC,
                BuiltinType::Number => TypeAttributes::PUBLIC | TypeAttributes::ABSTRACT,
                _ => TypeAttributes::PUBLIC | TypeAttributes::FINAL,
            };
            builtins.push(Arc::new(RuntimeType::new(
                builtin.token(),
                builtin.name().to_string(),
                TypeFlavor::Class,
                flags,
                TypeScope::SYSTEM,
                base,
                Vec::new(),
            )));
        }

        let primitives: Vec<TypeRc> = PrimitiveKind::iter()
            .map(|kind| {
                Arc::new(RuntimeType::new(
                    kind.token(),
                    kind.name().to_string(),
                    TypeFlavor::Primitive(kind),
                    TypeAttributes::PUBLIC | TypeAttributes::FINAL,
                    TypeScope::SYSTEM,
                    None,
                    Vec::new(),
                ))
            })
            .collect();

        let registry = TypeRegistry {
            types: SkipMap::new(),
            types_by_name: DashMap::new(),
            arrays: DashMap::new(),
            builtins,
            primitives,
            next_declared: AtomicU32::new(1),
            next_array: AtomicU32::new(1),
            next_method: AtomicU32::new(1),
            next_scope: AtomicU32::new(TypeScope::APPLICATION.0 + 1),
        };

        for ty in registry.builtins.iter().chain(registry.primitives.iter()) {
            registry.types.insert(ty.token, ty.clone());
            registry.types_by_name.insert(ty.name.clone(), ty.token);
        }
        registry.define_builtin_methods();
        registry
    }

    fn define_builtin_methods(&self) {
        let object = self.builtin(BuiltinType::Object);
        let number = self.builtin(BuiltinType::Number);
        let string = self.builtin(BuiltinType::String);
        let class = self.builtin(BuiltinType::Class);
        let int = self.primitive(PrimitiveKind::Int);
        let long = self.primitive(PrimitiveKind::Long);
        let double = self.primitive(PrimitiveKind::Double);

        // Captured weakly: the closures are owned by `Object` itself.
        let builtin_refs: Vec<TypeRef> = self.builtins.iter().map(TypeRef::new).collect();
        let get_class = MethodSpec::new("getClass")
            .returns(&class)
            .body(move |receiver, _| {
                let ty = match receiver {
                    Value::Array(array) => Some(array.array_type().clone()),
                    Value::Object(instance) => Some(instance.class().clone()),
                    other => other
                        .builtin_type()
                        .and_then(|b| builtin_refs[b as usize].upgrade()),
                };
                Ok(ty.map_or(Value::Null, Value::Type))
            });
        let to_string = MethodSpec::new("toString")
            .returns(&string)
            .body(|receiver, _| Ok(Value::from(receiver.to_string())));

        let int_value = MethodSpec::new("intValue")
            .returns(&int)
            .body(|receiver, _| {
                receiver
                    .as_i64()
                    .or_else(|| receiver.as_f64().map(|v| v as i64))
                    .map(|v| Value::Int(v as i32))
                    .ok_or_else(|| "not a number".into())
            });
        let long_value = MethodSpec::new("longValue")
            .returns(&long)
            .body(|receiver, _| {
                receiver
                    .as_i64()
                    .or_else(|| receiver.as_f64().map(|v| v as i64))
                    .map(Value::Long)
                    .ok_or_else(|| "not a number".into())
            });
        let double_value = MethodSpec::new("doubleValue")
            .returns(&double)
            .body(|receiver, _| {
                receiver
                    .as_f64()
                    .map(Value::Double)
                    .ok_or_else(|| "not a number".into())
            });

        let length = MethodSpec::new("length").returns(&int).body(|receiver, _| {
            let s = receiver.as_str().unwrap_or_default();
            Ok(Value::Int(s.chars().count() as i32))
        });
        let concat = MethodSpec::new("concat")
            .param(&string)
            .returns(&string)
            .body(|receiver, args| {
                let head = receiver.as_str().unwrap_or_default();
                match args.first() {
                    Some(Value::String(tail)) => Ok(Value::from(format!("{head}{tail}"))),
                    _ => Err("concat requires a non-null String".into()),
                }
            });
        let to_upper = MethodSpec::new("toUpperCase")
            .returns(&string)
            .body(|receiver, _| {
                Ok(Value::from(receiver.as_str().unwrap_or_default().to_uppercase()))
            });

        // Builtin methods take the first method rows, in declaration order.
        let builtin_methods = [
            (object, vec![get_class, to_string]),
            (number, vec![int_value, long_value, double_value]),
            (string, vec![length, concat, to_upper]),
        ];
        let mut row = 0;
        for (declaring, specs) in builtin_methods {
            for spec in specs {
                row += 1;
                let token = Token::from_parts(TokenTable::Method, row);
                declaring.add_method(spec.into_method(token, &declaring));
            }
        }
        self.next_method.store(row + 1, Ordering::Relaxed);
    }

    /// Attach `specs` to `declaring`.
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] if the method rows are exhausted; no method is attached then.
    pub(crate) fn define_methods(&self, declaring: &TypeRc, specs: Vec<MethodSpec>) -> Result<()> {
        let tokens = specs
            .iter()
            .map(|_| self.next_token(TokenTable::Method))
            .collect::<Result<Vec<_>>>()?;
        for (spec, token) in specs.into_iter().zip(tokens) {
            declaring.add_method(spec.into_method(token, declaring));
        }
        Ok(())
    }

    /// Allocate the next row of `table`.
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] once all rows of the table are taken; rows are never reused.
    pub(crate) fn next_token(&self, table: TokenTable) -> Result<Token> {
        let counter = match table {
            TokenTable::Array => &self.next_array,
            TokenTable::Method => &self.next_method,
            TokenTable::Declared | TokenTable::Builtin => &self.next_declared,
        };
        let row = counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |row| {
                (row <= MAX_ROW).then_some(row + 1)
            })
            .map_err(|_| Error::TypeError(format!("Token rows exhausted for {table:?}")))?;
        Ok(Token::from_parts(table, row))
    }

    /// Allocate a fresh type-loading scope for a group of types that may be unloaded together
    pub fn new_scope(&self) -> TypeScope {
        TypeScope(self.next_scope.fetch_add(1, Ordering::Relaxed))
    }

    /// Start declaring a public class named `name`
    #[must_use]
    pub fn class(&self, name: &str) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name, TypeFlavor::Class)
    }

    /// Start declaring a public interface named `name`
    #[must_use]
    pub fn interface(&self, name: &str) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name, TypeFlavor::Interface)
    }

    /// Register a fully built type.
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] if a type with the same name is already registered.
    pub(crate) fn insert(&self, new_type: &TypeRc) -> Result<()> {
        match self.types_by_name.entry(new_type.name.clone()) {
            Entry::Occupied(_) => Err(Error::TypeError(format!(
                "Type '{}' is already registered",
                new_type.name
            ))),
            Entry::Vacant(slot) => {
                self.types.insert(new_type.token, new_type.clone());
                slot.insert(new_type.token);
                debug!(name = %new_type.name, token = %new_type.token, scope = %new_type.scope, "registered type");
                Ok(())
            }
        }
    }

    /// A builtin reference type
    #[must_use]
    pub fn builtin(&self, builtin: BuiltinType) -> TypeRc {
        self.builtins[builtin as usize].clone()
    }

    /// A primitive type
    #[must_use]
    pub fn primitive(&self, kind: PrimitiveKind) -> TypeRc {
        self.primitives[kind as usize].clone()
    }

    /// The interned array type with element type `element`, created on first use.
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] if a new array type is needed and the array rows are
    /// exhausted.
    pub fn array_of(&self, element: &TypeRc) -> Result<TypeRc> {
        if let Some(existing) = self.arrays.get(&element.token) {
            return Ok(existing.value().clone());
        }

        match self.arrays.entry(element.token) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                let array = Arc::new(RuntimeType::new(
                    self.next_token(TokenTable::Array)?,
                    format!("{}[]", element.name),
                    TypeFlavor::Array(element.clone()),
                    TypeAttributes::PUBLIC | TypeAttributes::FINAL,
                    element.scope,
                    Some(self.builtin(BuiltinType::Object)),
                    Vec::new(),
                ));
                self.types.insert(array.token, array.clone());
                self.types_by_name.insert(array.name.clone(), array.token);
                slot.insert(array.clone());
                Ok(array)
            }
        }
    }

    /// Look up a type by its token
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<TypeRc> {
        self.types.get(token).map(|entry| entry.value().clone())
    }

    /// Look up a type by name; `Element[]` names create the array type on demand
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<TypeRc> {
        let found = self
            .types_by_name
            .get(name)
            .and_then(|token| self.get(token.value()));
        if found.is_some() {
            return found;
        }

        name.strip_suffix("[]")
            .and_then(|element| self.get_by_name(element))
            .and_then(|element| self.array_of(&element).ok())
    }

    /// Look up a type by name.
    ///
    /// # Errors
    /// Returns [`Error::TypeNotFound`] if no such type is registered.
    pub fn resolve(&self, name: &str) -> Result<TypeRc> {
        self.get_by_name(name)
            .ok_or_else(|| Error::TypeNotFound(name.to_string()))
    }

    /// All types belonging to `scope`
    #[must_use]
    pub fn types_in_scope(&self, scope: TypeScope) -> Vec<TypeRc> {
        self.types
            .iter()
            .filter(|entry| entry.value().scope == scope)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Remove every type of `scope`, including array types over its types.
    ///
    /// Values and caches still holding these types keep working with them; resolvers should
    /// be purged with [`crate::BeanResolver::purge_scope`] so stale entries are dropped.
    ///
    /// # Returns
    /// The number of removed types.
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] for [`TypeScope::SYSTEM`].
    pub fn unload_scope(&self, scope: TypeScope) -> Result<usize> {
        if scope.is_system() {
            return Err(Error::TypeError(
                "The system scope cannot be unloaded".to_string(),
            ));
        }

        let doomed = self.types_in_scope(scope);
        for ty in &doomed {
            self.types.remove(&ty.token);
            self.types_by_name
                .remove_if(&ty.name, |_, token| *token == ty.token);
            if let Some(element) = ty.element() {
                self.arrays
                    .remove_if(&element.token, |_, array| array.token == ty.token);
            }
        }

        debug!(scope = %scope, removed = doomed.len(), "unloaded type scope");
        Ok(doomed.len())
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered (never the case after construction)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All registered types in token order
    #[must_use]
    pub fn all_types(&self) -> Vec<TypeRc> {
        self.types.iter().map(|entry| entry.value().clone()).collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = TypeRegistry::new();
        for builtin in BuiltinType::iter() {
            let ty = registry.get(&builtin.token()).expect("builtin registered");
            assert_eq!(ty.name, builtin.name());
            assert_eq!(ty.scope, TypeScope::SYSTEM);
        }
        for kind in PrimitiveKind::iter() {
            assert!(registry.get_by_name(kind.name()).is_some_and(|t| t.is_primitive()));
        }
        assert_eq!(
            registry
                .builtin(BuiltinType::Integer)
                .base()
                .map(|b| b.name.clone()),
            Some("Number".to_string())
        );
    }

    #[test]
    fn test_array_interning() -> Result<()> {
        let registry = TypeRegistry::new();
        let string = registry.builtin(BuiltinType::String);
        let first = registry.array_of(&string)?;
        let second = registry.array_of(&string)?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.token.kind(), Some(TokenTable::Array));

        let nested = registry.get_by_name("String[][]").expect("created on demand");
        assert_eq!(nested.element().map(|e| e.token), Some(first.token));
        Ok(())
    }

    #[test]
    fn test_token_rows_exhausted() -> Result<()> {
        let registry = TypeRegistry::new();
        let string = registry.builtin(BuiltinType::String);

        registry.next_declared.store(MAX_ROW, Ordering::Relaxed);
        let last = registry.class("Last").build()?;
        assert_eq!(last.token.row(), MAX_ROW);
        assert!(matches!(
            registry.class("Overflow").build(),
            Err(Error::TypeError(_))
        ));
        assert!(registry.get_by_name("Overflow").is_none());

        registry.next_declared.store(1, Ordering::Relaxed);
        registry.next_method.store(MAX_ROW + 1, Ordering::Relaxed);
        let with_method = registry
            .class("WithMethod")
            .with(MethodSpec::new("run").body(|_, _| Ok(Value::Null)))
            .build();
        assert!(matches!(with_method, Err(Error::TypeError(_))));
        assert!(registry.get_by_name("WithMethod").is_none());

        registry.next_array.store(MAX_ROW + 1, Ordering::Relaxed);
        assert!(matches!(
            registry.array_of(&string),
            Err(Error::TypeError(_))
        ));
        assert!(registry.get_by_name("String[]").is_none());
        Ok(())
    }

    #[test]
    fn test_duplicate_name_rejected() -> Result<()> {
        let registry = TypeRegistry::new();
        registry.class("Bean").build()?;
        assert!(matches!(
            registry.class("Bean").build(),
            Err(Error::TypeError(_))
        ));
        assert!(matches!(
            registry.resolve("Missing"),
            Err(Error::TypeNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unload_scope() -> Result<()> {
        let registry = TypeRegistry::new();
        let scope = registry.new_scope();
        let plugin = registry.class("Plugin").scope(scope).build()?;
        let plugin_array = registry.array_of(&plugin)?;
        registry.class("Host").build()?;

        assert_eq!(plugin_array.scope, scope);
        assert_eq!(registry.unload_scope(scope)?, 2);
        assert!(registry.get_by_name("Plugin").is_none());
        assert!(registry.get(&plugin_array.token).is_none());
        assert!(registry.get_by_name("Host").is_some());
        assert!(registry.unload_scope(TypeScope::SYSTEM).is_err());
        Ok(())
    }
}
