//! Sequence point tables mapping IL offsets to source spans.
//!
//! A sequence point tells the debugger which source span is executing once the instruction
//! pointer reaches a given IL offset. Statement boundaries produce *visible* points;
//! compiler-synthesized code (prologues, state machine dispatch, the tail of a `foreach`)
//! produces *hidden* points the debugger steps through without stopping.
//!
//! # Architecture
//!
//! Lowering streams marks into a [`builder::SequencePointBuilder`] in the order it emits
//! IL. The builder enforces strictly increasing offsets, resolves duplicate marks at the
//! same offset and yields an immutable [`SequencePoints`] table. The table is then encoded
//! with [`encoder::encode_sequence_points`] and can be read back with
//! [`parser::parse_sequence_points`].
//!
//! # Key Components
//!
//! - [`SequencePoint`] - One mapping from an IL offset to a span or to "hidden"
//! - [`SequencePoints`] - The finished, ordered table for one routine
//! - [`builder::SequencePointBuilder`] - Incremental construction with ordering checks
//! - [`encoder::encode_sequence_points`] / [`parser::parse_sequence_points`] - Blob codec
//!
//! # Usage Examples
//!
//! ```rust
//! use symscope::debuginfo::{
//!     sequencepoints::{builder::SequencePointBuilder, encoder::encode_sequence_points,
//!                      parser::parse_sequence_points},
//!     span::SourceSpan,
//!     token::Token,
//! };
//!
//! let mut builder = SequencePointBuilder::new(Token::method_def(1), 1).with_prologue();
//! builder.mark_visible(0x01, SourceSpan::on_line(1, 5, 9, 10))?;
//! builder.mark_visible(0x07, SourceSpan::on_line(1, 6, 9, 19))?;
//! let points = builder.build();
//!
//! let blob = encode_sequence_points(&points)?;
//! let decoded = parse_sequence_points(&blob)?;
//! assert_eq!(decoded, points);
//! assert!(decoded.starts_hidden());
//! # Ok::<(), symscope::Error>(())
//! ```
//!
//! # Blob Format
//!
//! The blob follows the Portable PDB sequence point layout. All integers use the ECMA-335
//! compressed encodings.
//!
//! ```text
//! header:   LocalSignature (uint, StandAloneSig row or 0)
//!           InitialDocument (uint, 1-based document id)
//! record:   δIL (uint; absolute for the first record, > 0 afterwards)
//!           δLines (uint)              end_line - start_line
//!           δColumns (uint if δLines == 0, int otherwise)
//!           StartLine (uint for the first visible point, int delta afterwards)
//!           StartColumn (uint for the first visible point, int delta afterwards)
//! hidden:   δIL, 0, 0
//! document: 0, Document (uint)  switches the document of the following records
//! ```
//!
//! A routine without points encodes to an empty blob. Zero-width visible spans cannot be
//! told apart from hidden records and are rejected.
//!
//! # Thread Safety
//!
//! All types in this module are [`Send`] and [`Sync`] because they contain only owned data.

pub mod builder;
pub mod encoder;
pub mod parser;

pub use builder::SequencePointBuilder;
pub use encoder::encode_sequence_points;
pub use parser::parse_sequence_points;

use crate::debuginfo::span::SourceSpan;

/// Largest line number the blob format can carry
pub const MAX_LINE: u32 = 0x1FFF_FFFF;

/// Largest column number the blob format can carry
pub const MAX_COLUMN: u32 = 0xFFFF;

/// A single entry of a sequence point table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePoint {
    /// The debugger stops here and highlights `span`
    Visible {
        /// IL offset the point starts at
        il_offset: u32,
        /// Source span attributed to the code from this offset on
        span: SourceSpan,
    },
    /// Compiler-generated code the debugger steps over
    Hidden {
        /// IL offset the point starts at
        il_offset: u32,
        /// Document in effect, inherited from the preceding point
        document: u32,
    },
}

impl SequencePoint {
    /// IL offset of this point.
    #[must_use]
    pub fn il_offset(&self) -> u32 {
        match self {
            SequencePoint::Visible { il_offset, .. } | SequencePoint::Hidden { il_offset, .. } => {
                *il_offset
            }
        }
    }

    /// Document of this point.
    #[must_use]
    pub fn document(&self) -> u32 {
        match self {
            SequencePoint::Visible { span, .. } => span.document,
            SequencePoint::Hidden { document, .. } => *document,
        }
    }

    /// The source span, or `None` for hidden points.
    #[must_use]
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            SequencePoint::Visible { span, .. } => Some(span),
            SequencePoint::Hidden { .. } => None,
        }
    }

    /// Returns `true` for hidden points.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        matches!(self, SequencePoint::Hidden { .. })
    }
}

/// The sequence point table of one routine, ordered by strictly increasing IL offset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequencePoints {
    /// Row of the routine's local signature in the `StandAloneSig` table, 0 if it has none
    pub local_signature: u32,
    /// The points, ordered by IL offset
    pub points: Vec<SequencePoint>,
}

impl SequencePoints {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the routine has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate the points in offset order.
    pub fn iter(&self) -> std::slice::Iter<'_, SequencePoint> {
        self.points.iter()
    }

    /// The point that starts exactly at `il_offset`.
    #[must_use]
    pub fn find_by_il_offset(&self, il_offset: u32) -> Option<&SequencePoint> {
        self.points
            .binary_search_by_key(&il_offset, SequencePoint::il_offset)
            .ok()
            .map(|index| &self.points[index])
    }

    /// The point in effect at `il_offset`, i.e. the last one starting at or before it.
    #[must_use]
    pub fn covering(&self, il_offset: u32) -> Option<&SequencePoint> {
        let end = self.points.partition_point(|p| p.il_offset() <= il_offset);
        end.checked_sub(1).map(|index| &self.points[index])
    }

    /// Returns `true` if the first point is hidden, as it is for routines with a prologue.
    #[must_use]
    pub fn starts_hidden(&self) -> bool {
        self.points.first().is_some_and(SequencePoint::is_hidden)
    }
}

impl<'a> IntoIterator for &'a SequencePoints {
    type Item = &'a SequencePoint;
    type IntoIter = std::slice::Iter<'a, SequencePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
