//! Metadata tokens identifying routines and signatures in debug records.
//!
//! Debug information never owns the metadata it describes; it refers to it by token. A
//! token packs the metadata table in its high byte and the 1-based row in the low 24 bits.
//! The emitter mostly deals with `MethodDef` tokens (which routine a record belongs to, which
//! routine an import forward points at) and `StandAloneSig` tokens (a routine's local
//! signature).
//!
//! # Examples
//!
//! ```rust
//! use symscope::debuginfo::token::Token;
//!
//! let token = Token::method_def(5);
//! assert_eq!(token.value(), 0x0600_0005);
//! assert_eq!(token.row(), 5);
//! assert!(token.is_method_def());
//! ```

use std::fmt;

/// Table index of `MethodDef` tokens.
pub const TABLE_METHOD_DEF: u8 = 0x06;

/// Table index of `StandAloneSig` tokens.
pub const TABLE_STANDALONE_SIG: u8 = 0x11;

/// A metadata token: table index in the high byte, row in the low 24 bits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Create a token from its raw value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create a `MethodDef` token for the given 1-based row.
    #[must_use]
    pub fn method_def(row: u32) -> Self {
        Token((u32::from(TABLE_METHOD_DEF) << 24) | (row & 0x00FF_FFFF))
    }

    /// Create a `StandAloneSig` token for the given 1-based row.
    #[must_use]
    pub fn standalone_sig(row: u32) -> Self {
        Token((u32::from(TABLE_STANDALONE_SIG) << 24) | (row & 0x00FF_FFFF))
    }

    /// The raw token value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table index.
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The row within the table.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns `true` for the null token.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this token refers to a `MethodDef` row.
    #[must_use]
    pub fn is_method_def(&self) -> bool {
        self.table() == TABLE_METHOD_DEF
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let method = Token::method_def(1);
        assert_eq!(method.value(), 0x0600_0001);
        assert!(method.is_method_def());

        let sig = Token::standalone_sig(3);
        assert_eq!(sig.value(), 0x1100_0003);
        assert_eq!(sig.table(), TABLE_STANDALONE_SIG);
        assert!(!sig.is_method_def());
    }

    #[test]
    fn row_masking() {
        let token = Token::method_def(0x0100_0002);
        assert_eq!(token.row(), 2);
        assert_eq!(token.table(), TABLE_METHOD_DEF);
    }

    #[test]
    fn null() {
        assert!(Token::default().is_null());
        assert!(!Token::method_def(1).is_null());
    }

    #[test]
    fn conversions() {
        let token: Token = 0x0600_0001u32.into();
        let back: u32 = token.into();
        assert_eq!(back, 0x0600_0001);
    }

    #[test]
    fn formatting() {
        let token = Token(0x0600_0001);
        assert_eq!(format!("{token}"), "0x06000001");

        let debug_str = format!("{token:?}");
        assert!(debug_str.contains("Token(0x06000001"));
        assert!(debug_str.contains("table: 0x06"));
        assert!(debug_str.contains("row: 1"));
    }
}
