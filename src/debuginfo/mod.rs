//! Debug information records and their binary encodings.
//!
//! Each submodule owns one kind of record: its in-memory model, a builder enforcing the
//! record's invariants, and an encoder/parser pair for its blob. The blobs are independent
//! of each other, so any one of them can be decoded without the rest.
//!
//! # Modules
//!
//! - [`sequencepoints`] - IL offset to source span mapping
//! - [`scope`] - Lexical scope trees and local bindings
//! - [`lambdamap`] - Closure and lambda origins
//! - [`slotmap`] - Local slot origins
//! - [`importscope`] - Import chains and their interning
//! - [`customdebuginformation`] - The per-routine record container
//! - [`document`] - Source documents and checksums
//! - [`span`], [`token`] - Positions and routine identities
//! - [`diagnostics`] - Non-fatal issues found during emission

pub mod customdebuginformation;
pub mod diagnostics;
pub mod document;
pub mod importscope;
pub mod lambdamap;
pub mod scope;
pub mod sequencepoints;
pub mod slotmap;
pub mod span;
pub mod token;

/// Longest name, in UTF-8 bytes, that is written to any blob.
pub const MAX_NAME_LENGTH: usize = 2046;
