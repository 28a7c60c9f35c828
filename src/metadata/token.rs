//! Registry identities for types and methods.
//!
//! Every registered type and method receives a [`Token`]: a 32-bit value whose high byte names
//! the table the entry lives in ([`TokenTable`]) and whose low 24 bits are the row inside that
//! table. Tokens are never reused within a registry, so a token held in a cache key stays
//! unambiguous even after its type has been unloaded.

use std::fmt;

/// The table part of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumCount)]
#[repr(u8)]
pub enum TokenTable {
    /// Builtin types (`Object`, wrappers, primitives, `String`, ...)
    Builtin = 0x01,
    /// Types registered through a `ClassBuilder`
    Declared = 0x02,
    /// Interned array types
    Array = 0x1B,
    /// Methods
    Method = 0x06,
}

impl TokenTable {
    /// Resolve the table for a raw high byte
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(TokenTable::Builtin),
            0x02 => Some(TokenTable::Declared),
            0x1B => Some(TokenTable::Array),
            0x06 => Some(TokenTable::Method),
            _ => None,
        }
    }
}

/// Identity of a registered type or method.
///
/// - The high byte (bits 24-31) indicates the [`TokenTable`]
/// - The low 24 bits (bits 0-23) indicate the row within that table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table and a row; the row is truncated to 24 bits
    #[must_use]
    pub fn from_parts(table: TokenTable, row: u32) -> Self {
        Token(((table as u32) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the raw table byte from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The table this token belongs to, if the high byte names a known one
    #[must_use]
    pub fn kind(&self) -> Option<TokenTable> {
        TokenTable::from_byte(self.table())
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if this token identifies a type (builtin, declared or array)
    #[must_use]
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind(),
            Some(TokenTable::Builtin | TokenTable::Declared | TokenTable::Array)
        )
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
