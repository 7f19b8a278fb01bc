// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![deny(unsafe_code)]

//! # symscope
//!
//! [![Crates.io](https://img.shields.io/crates/v/symscope.svg)](https://crates.io/crates/symscope)
//! [![Documentation](https://docs.rs/symscope/badge.svg)](https://docs.rs/symscope)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/symscope/blob/main/LICENSE-APACHE)
//!
//! A deterministic debug-information emitter for compiled .NET routines. Given what a
//! compiler's lowering phase decided about a routine (where statements start, how blocks
//! nest, which closures and lambdas it created, which imports are in scope), `symscope`
//! produces the compact binary records debuggers consume, and decodes them back for
//! verification.
//!
//! ## Features
//!
//! - **Sequence points** - IL offset to source span mapping with hidden points and prologues
//! - **Lexical scopes** - Nested scope trees with local bindings and captured-variable buckets
//! - **Closure and lambda maps** - Edit-and-Continue origin records, including negative
//!   constructor offsets and forward parent references
//! - **Local slot maps** - Origin of every IL local slot
//! - **Import chains** - Per-level `using` records, interned and forwarded between routines
//! - **Deterministic output** - Parallel per-routine builds with ordered merging
//! - **Self-verification** - Every blob decodes on its own into a `<symbols>` XML dump
//!
//! ## Quick Start
//!
//! ```rust
//! use symscope::prelude::*;
//!
//! let mut emitter = Emitter::new(EmitOptions::default());
//! let doc = emitter.add_document("Program.cs");
//!
//! emitter.add_routine(
//!     RoutineBody::new(Token::method_def(1), "Program", "Main", 0x0C)
//!         .mark(0, SourceSpan::on_line(doc, 5, 5, 6))
//!         .enter(0)
//!         .declare(LocalBinding::new("x", 0))
//!         .exit(0x0C)
//!         .closure(0, None)
//!         .lambda(12, LambdaClosure::Closure(0)),
//! )?;
//!
//! let stream = emitter.emit(&NoSources)?;
//! let symbols = SymbolReader::new(&stream).read()?;
//! assert_eq!(symbols.methods[0].sequence_points.len(), 1);
//! # Ok::<(), symscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ### Records
//!
//! - [`debuginfo::sequencepoints`] - Sequence point tables
//! - [`debuginfo::scope`] - Scope trees
//! - [`debuginfo::lambdamap`] and [`debuginfo::slotmap`] - Edit-and-Continue maps
//! - [`debuginfo::importscope`] - Import chains
//! - [`debuginfo::customdebuginformation`] - Per-routine record container
//! - [`debuginfo::document`] - Documents and checksums
//!
//! Each record kind has a builder that enforces its invariants and an encoder/parser pair
//! built on the ECMA-335 compressed integers in [`utils::compressed`].
//!
//! ### Emission
//!
//! [`emit::Emitter`] drives the builders for every routine and merges the results into a
//! [`emit::DebugInfoStream`].
//!
//! ### Verification
//!
//! [`verify::SymbolReader`] decodes a stream and renders it as XML;
//! [`verify::assert_symbols_eq`] compares dumps structurally.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Problems in the input that only
//! degrade the output, like names above the length limit, are not errors; they are
//! collected as [`Diagnostics`] in the stream.
//!
//! ```rust
//! use symscope::{Error, debuginfo::scope::parse_scopes};
//!
//! match parse_scopes(&[9, 0]) {
//!     Ok(tree) => println!("{} scopes", tree.scope_count()),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed blob: {}", message),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ### Fuzzing
//!
//! ```bash
//! # Run the blob decoder fuzzer
//! cargo +nightly fuzz run blobs --release
//! ```
//!
//! ### Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! ```
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Low-level blob reading and writing
///
/// [`Parser`] walks a byte slice and reads the primitive encodings every blob is built
/// from: little-endian integers, compressed integers, length-prefixed strings and GUIDs.
pub mod file;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use symscope::prelude::*;
///
/// let emitter = Emitter::new(EmitOptions::minimal());
/// assert_eq!(emitter.routine_count(), 0);
/// ```
pub mod prelude;

/// Debug information records, their builders and their binary encodings
pub mod debuginfo;

/// Emission of a complete debug information stream from lowered routines
///
/// # Examples
///
/// ```rust
/// use symscope::emit::{EmitOptions, Emitter, NoSources};
///
/// let stream = Emitter::new(EmitOptions::default()).emit(&NoSources)?;
/// assert!(stream.methods.is_empty());
/// # Ok::<(), symscope::Error>(())
/// ```
pub mod emit;

/// Shared encoding helpers
pub mod utils;

/// Decoding, XML rendering and structural comparison of emitted debug information
pub mod verify;

/// `symscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `symscope` Error type
///
/// See [`error::Error`](crate::Error) for the variants and when they are raised.
pub use error::Error;

/// Non-fatal issues collected while emitting.
pub use debuginfo::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

/// Cursor over a byte slice with the primitive blob encodings.
pub use file::parser::Parser;
