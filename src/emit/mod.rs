//! Turning lowered routines into a debug information stream.
//!
//! The [`Emitter`] collects [`RoutineBody`] values in declaration order and produces a
//! [`DebugInfoStream`]: one [`MethodDebugRecord`] per routine plus the document table and
//! stream-wide blobs.
//!
//! # Process
//!
//! 1. Documents are checksummed with content from the [`SourceProvider`]
//! 2. Routines are built independently on the rayon pool: sequence points, scope tree,
//!    lambda map, slot map and canonical import chain
//! 3. In registration order, every import chain is interned in the shared
//!    [`crate::debuginfo::importscope::ImportChainTable`]; the first user owns it, later
//!    users forward to the owner
//! 4. Warnings of every routine are appended to the stream's diagnostics in routine order
//!
//! Only step 2 runs in parallel, so the output does not depend on scheduling. Method
//! ordinals are allocated while routines are registered.
//!
//! # Examples
//!
//! ```rust
//! use symscope::prelude::*;
//!
//! let mut emitter = Emitter::new(EmitOptions::default());
//! let doc = emitter.add_document("Program.cs");
//! let imports = ImportChain::new(vec![ImportLevel::new(vec![ImportItem::namespace("System")])]);
//!
//! for row in 1..=2 {
//!     emitter.add_routine(
//!         RoutineBody::new(Token::method_def(row), "Program", format!("M{row}"), 4)
//!             .mark(0, SourceSpan::on_line(doc, row * 10, 9, 20))
//!             .with_imports(imports.clone()),
//!     )?;
//! }
//!
//! let stream = emitter.emit(&NoSources)?;
//! assert_eq!(stream.methods[1].imports, ImportsRecord::Forward(Token::method_def(1)));
//! # Ok::<(), symscope::Error>(())
//! ```

mod emitter;
mod options;
mod ordinal;
mod routine;
mod stream;

pub use emitter::Emitter;
pub use options::EmitOptions;
pub use ordinal::OrdinalAllocator;
pub use routine::{BlockEvent, ClosureEvent, LambdaEvent, RoutineBody, SequenceMark};
pub use stream::{
    embedded_source_blob, DebugInfoStream, ImportsRecord, MethodDebugRecord, MemorySources,
    NoSources, SourceProvider, StreamBlob,
};
