//! Runtime values passed through the resolver.
//!
//! [`Value`] is the dynamically typed value an expression evaluator hands to the engine:
//! receivers, property values and method arguments. Scalars report their *wrapper* type as
//! runtime type (`Value::Int` is an `Integer`), arrays and objects carry the registered type
//! they were created with.

use std::{
    fmt,
    sync::{Arc, RwLock},
};

use dashmap::DashMap;

use crate::{
    metadata::typesystem::{BuiltinType, RuntimeType, TypeRc, TypeRegistry},
    Result,
};

/// Reference to an `ArrayValue`
pub type ArrayRc = Arc<ArrayValue>;
/// Reference to an `Instance`
pub type InstanceRc = Arc<Instance>;

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// The null reference
    #[default]
    Null,
    /// A `boolean`
    Boolean(bool),
    /// A `char`
    Char(char),
    /// A `byte`
    Byte(i8),
    /// A `short`
    Short(i16),
    /// An `int`
    Int(i32),
    /// A `long`
    Long(i64),
    /// A `float`
    Float(f32),
    /// A `double`
    Double(f64),
    /// A `String`
    String(Arc<str>),
    /// A typed array, shared by reference
    Array(ArrayRc),
    /// An instance of a registered class, shared by reference
    Object(InstanceRc),
    /// A class literal
    Type(TypeRc),
}

impl Value {
    /// Create an empty instance of `class`
    #[must_use]
    pub fn object(class: &TypeRc) -> Value {
        Value::Object(Arc::new(Instance::new(class.clone())))
    }

    /// Create an array with element type `element`
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if the array type cannot be registered.
    pub fn array(registry: &TypeRegistry, element: &TypeRc, items: Vec<Value>) -> Result<Value> {
        Ok(Value::typed_array(registry.array_of(element)?, items))
    }

    /// Create an array of the already registered array type `array_type`
    #[must_use]
    pub fn typed_array(array_type: TypeRc, items: Vec<Value>) -> Value {
        Value::Array(Arc::new(ArrayValue::new(array_type, items)))
    }

    /// Returns `true` for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The builtin runtime type of scalars, strings and class literals
    #[must_use]
    pub fn builtin_type(&self) -> Option<BuiltinType> {
        match self {
            Value::Boolean(_) => Some(BuiltinType::Boolean),
            Value::Char(_) => Some(BuiltinType::Character),
            Value::Byte(_) => Some(BuiltinType::Byte),
            Value::Short(_) => Some(BuiltinType::Short),
            Value::Int(_) => Some(BuiltinType::Integer),
            Value::Long(_) => Some(BuiltinType::Long),
            Value::Float(_) => Some(BuiltinType::Float),
            Value::Double(_) => Some(BuiltinType::Double),
            Value::String(_) => Some(BuiltinType::String),
            Value::Type(_) => Some(BuiltinType::Class),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The runtime type of this value, `None` for null
    #[must_use]
    pub fn runtime_type(&self, registry: &TypeRegistry) -> Option<TypeRc> {
        match self {
            Value::Null => None,
            Value::Array(array) => Some(array.array_type().clone()),
            Value::Object(instance) => Some(instance.class().clone()),
            other => other.builtin_type().map(|builtin| registry.builtin(builtin)),
        }
    }

    /// Returns `true` if the value may be stored in a location of type `target` as is.
    ///
    /// `null` is never an instance of anything.
    #[must_use]
    pub fn is_instance_of(&self, target: &RuntimeType) -> bool {
        match self {
            Value::Null => false,
            Value::Array(array) => target.is_assignable_from(array.array_type()),
            Value::Object(instance) => target.is_assignable_from(instance.class()),
            other => other
                .builtin_type()
                .is_some_and(|builtin| target.accepts_builtin(builtin)),
        }
    }

    /// Name of the runtime type, `null` for null
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Array(array) => array.array_type().name.clone(),
            Value::Object(instance) => instance.class().name.clone(),
            other => other
                .builtin_type()
                .map_or_else(String::new, |builtin| builtin.name().to_string()),
        }
    }

    /// The array payload
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayRc> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The instance payload
    #[must_use]
    pub fn as_object(&self) -> Option<&InstanceRc> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// The string payload
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integral payloads widened to `i64`
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payloads widened to `f64`
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a.token == b.token,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::String(v) => f.write_str(v),
            Value::Array(array) => {
                let items = array.to_vec();
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(instance) => write!(f, "{instance}"),
            Value::Type(ty) => write!(f, "class {}", ty.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::String(v) => write!(f, "String({v:?})"),
            other => write!(f, "{}({other})", other.type_name()),
        }
    }
}

macro_rules! value_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Boolean,
    char => Char,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    &str => String,
    String => String,
}

/// A typed array whose elements can be replaced in place
pub struct ArrayValue {
    array_type: TypeRc,
    items: RwLock<Vec<Value>>,
}

impl ArrayValue {
    /// Create an array of type `array_type` (an array type, not the element type)
    #[must_use]
    pub fn new(array_type: TypeRc, items: Vec<Value>) -> Self {
        ArrayValue {
            array_type,
            items: RwLock::new(items),
        }
    }

    /// The array type
    #[must_use]
    pub fn array_type(&self) -> &TypeRc {
        &self.array_type
    }

    /// The element type
    #[must_use]
    pub fn element_type(&self) -> Option<&TypeRc> {
        self.array_type.element()
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        with_read!(self.items, |items: &Vec<Value>| items.len())
    }

    /// Returns `true` for a zero-length array
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        read_lock!(self.items).get(index).cloned()
    }

    /// Replace the element at `index`; out-of-range writes are ignored and return `false`
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut items = write_lock!(self.items);
        match items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Snapshot of all elements
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        read_lock!(self.items).clone()
    }
}

/// An instance of a registered class with named field slots.
///
/// Fields are not declared on the type; accessor bodies read and write them freely.
pub struct Instance {
    class: TypeRc,
    fields: DashMap<String, Value>,
}

impl Instance {
    /// Create an instance without any field set
    #[must_use]
    pub fn new(class: TypeRc) -> Self {
        Instance {
            class,
            fields: DashMap::new(),
        }
    }

    /// The class of this instance
    #[must_use]
    pub fn class(&self) -> &TypeRc {
        &self.class
    }

    /// Read a field, `None` if it was never written
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).map(|entry| entry.value().clone())
    }

    /// Write a field
    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<(String, Value)> = self
            .fields
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        write!(f, "{}{{", self.class.name)?;
        for (i, (name, value)) in fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::PrimitiveKind;

    #[test]
    fn test_scalar_runtime_types_are_wrappers() {
        let registry = TypeRegistry::new();
        assert_eq!(
            Value::Int(1).runtime_type(&registry).map(|t| t.name.clone()),
            Some("Integer".to_string())
        );
        assert_eq!(
            Value::from("x").runtime_type(&registry).map(|t| t.token),
            Some(BuiltinType::String.token())
        );
        assert!(Value::Null.runtime_type(&registry).is_none());
    }

    #[test]
    fn test_is_instance_of() -> Result<()> {
        let registry = TypeRegistry::new();
        let number = registry.builtin(BuiltinType::Number);
        let object = registry.builtin(BuiltinType::Object);
        let int = registry.primitive(PrimitiveKind::Int);

        assert!(Value::Long(3).is_instance_of(&number));
        assert!(!Value::from("3").is_instance_of(&number));
        assert!(!Value::Int(3).is_instance_of(&int));
        assert!(!Value::Null.is_instance_of(&object));

        let ints = Value::array(&registry, &int, vec![Value::Int(1)])?;
        assert!(ints.is_instance_of(&object));
        assert!(!ints.is_instance_of(&*registry.array_of(&object)?));
        Ok(())
    }

    #[test]
    fn test_array_in_place_update() -> Result<()> {
        let registry = TypeRegistry::new();
        let integer = registry.builtin(BuiltinType::Integer);
        let value = Value::array(&registry, &integer, vec![Value::Int(1), Value::Int(2)])?;
        let array = value.as_array().expect("array");

        assert_eq!(array.len(), 2);
        assert!(array.set(1, Value::Int(5)));
        assert!(!array.set(2, Value::Int(5)));
        assert_eq!(array.get(1), Some(Value::Int(5)));
        assert_eq!(value.to_string(), "[1, 5]");
        assert_eq!(array.array_type().name, "Integer[]");
        Ok(())
    }

    #[test]
    fn test_equality_and_display() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Long(3));
        assert_eq!(Value::from("abc"), Value::String("abc".into()));
        assert_eq!(Value::Double(2.0).to_string(), "2.0");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(format!("{:?}", Value::Int(7)), "Integer(7)");
    }

    #[test]
    fn test_instance_fields() {
        let registry = TypeRegistry::new();
        let object = registry.builtin(BuiltinType::Object);
        let value = Value::object(&object);
        let instance = value.as_object().expect("object");

        assert!(instance.field("name").is_none());
        instance.set_field("name", Value::from("duke"));
        instance.set_field("age", Value::Int(3));
        assert_eq!(instance.field("name"), Some(Value::from("duke")));
        assert_eq!(value.to_string(), "Object{age=3, name=duke}");
    }
}
