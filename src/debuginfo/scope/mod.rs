//! Lexical scope trees and local variable bindings.
//!
//! Each routine has a tree of IL ranges describing which locals the debugger shows at a
//! given instruction. The root covers the whole body; nested blocks (`{ }`, loop bodies,
//! the desugared `using` and `foreach` statements) become child scopes, and variables
//! captured by a closure may live in a synthetic *locals bucket* scope.
//!
//! # Key Components
//!
//! - [`types::ScopeTree`] / [`types::Scope`] / [`types::LocalBinding`] /
//!   [`types::LocalConstant`] - The tree itself
//! - [`builder::ScopeTreeBuilder`] - Construction from enter/exit events or flat intervals
//! - [`encoder::encode_scopes`] / [`parser::parse_scopes`] - Blob codec
//!
//! # Invariants
//!
//! - The root spans `[0, code_size)`
//! - Every child interval lies within its parent
//! - Siblings are ordered by start offset and do not overlap
//! - Non-root scopes without locals, constants or children are dropped unless explicitly kept
//!
//! Violations detected during construction are reported as
//! [`crate::Error::OverlappingScope`].
//!
//! # Blob Format
//!
//! ```text
//! version:  u8 (currently 1)
//! header:   LocalSignature (uint, StandAloneSig row or 0)
//! scope:    δStart (uint, relative to the parent's start; absolute for the root)
//!           Length (uint)
//!           Kind (u8: 0 block, 1 locals bucket)
//!           LocalCount (uint), then per local: Slot (uint), Attributes (uint), Name (string)
//!           ConstantCount (uint), then per constant: Name (string), Type (string),
//!           ElementType (u8), Value (little-endian by element type, string, or nothing for null)
//!           ChildCount (uint), then each child as a scope
//! ```
//!
//! Import items are not part of this blob. They are stored once per chain by
//! [`crate::debuginfo::importscope`] and attach to the root scope.

pub mod builder;
pub mod encoder;
pub mod parser;
pub mod types;

pub use builder::{ScopeInterval, ScopeTreeBuilder};
pub use encoder::encode_scopes;
pub use parser::parse_scopes;
pub use types::{
    ConstantValue, LocalAttributes, LocalBinding, LocalConstant, Scope, ScopeKind, ScopeTree,
};

/// Format version written as the first byte of every scope blob.
pub const SCOPE_BLOB_VERSION: u8 = 1;
