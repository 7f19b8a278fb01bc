//! Source positions as seen by a debugger.
//!
//! A [`SourceSpan`] is a 1-based line/column range inside one document of the
//! [`crate::debuginfo::document::DocumentTable`]. Spans are produced by the front-end and
//! carried through lowering unchanged; the emitter only checks that they are well formed
//! and orders them.

use std::{cmp::Ordering, fmt};

/// A 1-based `(line, column)` range inside a document.
///
/// The end is exclusive in the column dimension, as with every debugger-facing span the
/// .NET tooling produces. A span is well formed when its end is lexically at or after its
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    /// Line the span starts on
    pub start_line: u32,
    /// Column the span starts at
    pub start_column: u32,
    /// Line the span ends on
    pub end_line: u32,
    /// Column the span ends at
    pub end_column: u32,
    /// 1-based id of the document inside the document table
    pub document: u32,
}

impl SourceSpan {
    /// Create a span in `document`.
    #[must_use]
    pub fn new(
        document: u32,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        SourceSpan {
            start_line,
            start_column,
            end_line,
            end_column,
            document,
        }
    }

    /// Create a span which starts and ends on `line`.
    #[must_use]
    pub fn on_line(document: u32, line: u32, start_column: u32, end_column: u32) -> Self {
        Self::new(document, line, start_column, line, end_column)
    }

    /// Returns `true` if the end is not lexically before the start.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.end_position().cmp(&self.start_position()) != Ordering::Less
    }

    /// Returns `true` if start and end coincide.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_position() == self.end_position()
    }

    /// The `(line, column)` pair the span starts at.
    #[must_use]
    pub fn start_position(&self) -> (u32, u32) {
        (self.start_line, self.start_column)
    }

    /// The `(line, column)` pair the span ends at.
    #[must_use]
    pub fn end_position(&self) -> (u32, u32) {
        (self.end_line, self.end_column)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})@{}",
            self.start_line, self.start_column, self.end_line, self.end_column, self.document
        )
    }
}
