use std::fmt;

use strum::{EnumCount, EnumIter};

use crate::metadata::{
    token::{Token, TokenTable},
    value::Value,
};

/// First builtin row used by primitive types; rows below belong to [`BuiltinType`]
const PRIMITIVE_ROW_BASE: u32 = 0x20;

/// The eight primitive kinds.
///
/// Primitive values never appear as runtime argument types: a scalar [`Value`] always reports
/// its wrapper type, the same way a boxed argument would. Primitive types do appear as formal
/// parameter types and as array element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum PrimitiveKind {
    /// `boolean`
    Boolean,
    /// `char`, independent from the numeric widening order
    Char,
    /// `byte`, 8-bit signed
    Byte,
    /// `short`, 16-bit signed
    Short,
    /// `int`, 32-bit signed
    Int,
    /// `long`, 64-bit signed
    Long,
    /// `float`, 32-bit IEEE
    Float,
    /// `double`, 64-bit IEEE
    Double,
}

impl PrimitiveKind {
    /// The source-level name (`int`, `double`, ...)
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// The fixed registry token of this primitive
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(TokenTable::Builtin, PRIMITIVE_ROW_BASE + *self as u32)
    }

    /// The wrapper type a value of this kind is boxed into
    #[must_use]
    pub fn wrapper(&self) -> BuiltinType {
        match self {
            PrimitiveKind::Boolean => BuiltinType::Boolean,
            PrimitiveKind::Char => BuiltinType::Character,
            PrimitiveKind::Byte => BuiltinType::Byte,
            PrimitiveKind::Short => BuiltinType::Short,
            PrimitiveKind::Int => BuiltinType::Integer,
            PrimitiveKind::Long => BuiltinType::Long,
            PrimitiveKind::Float => BuiltinType::Float,
            PrimitiveKind::Double => BuiltinType::Double,
        }
    }

    /// Position in the widening order `byte < short < int < long < float < double`
    fn rank(&self) -> Option<u8> {
        match self {
            PrimitiveKind::Byte => Some(0),
            PrimitiveKind::Short => Some(1),
            PrimitiveKind::Int => Some(2),
            PrimitiveKind::Long => Some(3),
            PrimitiveKind::Float => Some(4),
            PrimitiveKind::Double => Some(5),
            PrimitiveKind::Boolean | PrimitiveKind::Char => None,
        }
    }

    /// Returns `true` if a value of this kind may be passed where `target` is expected
    /// without a coercion policy: the kinds are equal, or `target` is wider in the numeric order.
    #[must_use]
    pub fn widens_to(&self, target: PrimitiveKind) -> bool {
        if *self == target {
            return true;
        }
        match (self.rank(), target.rank()) {
            (Some(from), Some(to)) => from < to,
            _ => false,
        }
    }

    /// Returns `true` for the six numeric kinds
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.rank().is_some()
    }

    /// Rebuild a scalar as this kind, for values whose kind unboxes or widens to it.
    ///
    /// Returns `None` for values that do not fit, such as a `long` given where an `int` is
    /// expected.
    #[must_use]
    pub fn widen(&self, value: &Value) -> Option<Value> {
        match self {
            PrimitiveKind::Boolean => match value {
                Value::Boolean(b) => Some(Value::Boolean(*b)),
                _ => None,
            },
            PrimitiveKind::Char => match value {
                Value::Char(c) => Some(Value::Char(*c)),
                _ => None,
            },
            PrimitiveKind::Byte => i8::try_from(value.as_i64()?).ok().map(Value::Byte),
            PrimitiveKind::Short => i16::try_from(value.as_i64()?).ok().map(Value::Short),
            PrimitiveKind::Int => i32::try_from(value.as_i64()?).ok().map(Value::Int),
            PrimitiveKind::Long => value.as_i64().map(Value::Long),
            PrimitiveKind::Float => value.as_f64().map(|f| Value::Float(f as f32)),
            PrimitiveKind::Double => value.as_f64().map(Value::Double),
        }
    }

    /// The value a `null` coerces to for this kind
    #[must_use]
    pub fn zero(&self) -> Value {
        match self {
            PrimitiveKind::Boolean => Value::Boolean(false),
            PrimitiveKind::Char => Value::Char('\0'),
            PrimitiveKind::Byte => Value::Byte(0),
            PrimitiveKind::Short => Value::Short(0),
            PrimitiveKind::Int => Value::Int(0),
            PrimitiveKind::Long => Value::Long(0),
            PrimitiveKind::Float => Value::Float(0.0),
            PrimitiveKind::Double => Value::Double(0.0),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference types every registry provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum BuiltinType {
    /// Root of all reference types
    Object,
    /// Abstract base of the numeric wrappers
    Number,
    /// Wrapper of `boolean`
    Boolean,
    /// Wrapper of `char`
    Character,
    /// Wrapper of `byte`
    Byte,
    /// Wrapper of `short`
    Short,
    /// Wrapper of `int`
    Integer,
    /// Wrapper of `long`
    Long,
    /// Wrapper of `float`
    Float,
    /// Wrapper of `double`
    Double,
    /// Character strings
    String,
    /// Class literals, the runtime type of [`Value::Type`]
    Class,
}

impl BuiltinType {
    /// The type name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinType::Object => "Object",
            BuiltinType::Number => "Number",
            BuiltinType::Boolean => "Boolean",
            BuiltinType::Character => "Character",
            BuiltinType::Byte => "Byte",
            BuiltinType::Short => "Short",
            BuiltinType::Integer => "Integer",
            BuiltinType::Long => "Long",
            BuiltinType::Float => "Float",
            BuiltinType::Double => "Double",
            BuiltinType::String => "String",
            BuiltinType::Class => "Class",
        }
    }

    /// The fixed registry token of this type
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(TokenTable::Builtin, *self as u32 + 1)
    }

    /// The direct superclass, `None` for `Object`
    #[must_use]
    pub fn base(&self) -> Option<BuiltinType> {
        match self {
            BuiltinType::Object => None,
            BuiltinType::Byte
            | BuiltinType::Short
            | BuiltinType::Integer
            | BuiltinType::Long
            | BuiltinType::Float
            | BuiltinType::Double => Some(BuiltinType::Number),
            _ => Some(BuiltinType::Object),
        }
    }

    /// The primitive this wrapper unboxes to
    #[must_use]
    pub fn unboxed(&self) -> Option<PrimitiveKind> {
        match self {
            BuiltinType::Boolean => Some(PrimitiveKind::Boolean),
            BuiltinType::Character => Some(PrimitiveKind::Char),
            BuiltinType::Byte => Some(PrimitiveKind::Byte),
            BuiltinType::Short => Some(PrimitiveKind::Short),
            BuiltinType::Integer => Some(PrimitiveKind::Int),
            BuiltinType::Long => Some(PrimitiveKind::Long),
            BuiltinType::Float => Some(PrimitiveKind::Float),
            BuiltinType::Double => Some(PrimitiveKind::Double),
            _ => None,
        }
    }

    /// Find the builtin type owning `token`
    #[must_use]
    pub fn from_token(token: Token) -> Option<BuiltinType> {
        use strum::IntoEnumIterator;

        if token.kind() != Some(TokenTable::Builtin) {
            return None;
        }
        BuiltinType::iter().find(|b| b.token() == token)
    }

    /// Returns `true` if `self` is `other` or one of its superclasses
    #[must_use]
    pub fn is_supertype_of(&self, other: BuiltinType) -> bool {
        let mut current = Some(other);
        while let Some(ty) = current {
            if ty == *self {
                return true;
            }
            current = ty.base();
        }
        false
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
