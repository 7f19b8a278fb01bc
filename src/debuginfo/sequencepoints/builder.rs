//! Incremental construction of a [`SequencePoints`] table.

use crate::{
    debuginfo::{
        sequencepoints::{SequencePoint, SequencePoints, MAX_COLUMN, MAX_LINE},
        span::SourceSpan,
        token::Token,
    },
    Error, Result,
};

/// Collects sequence marks in IL order and produces the routine's point table.
///
/// Marks must arrive with non-decreasing offsets. Two marks at the same offset collapse into
/// one and the later mark wins, unless the routine has an implicit prologue: then offset 0
/// stays hidden no matter what is marked there afterwards.
///
/// # Examples
///
/// ```rust
/// use symscope::debuginfo::{sequencepoints::SequencePointBuilder, span::SourceSpan, token::Token};
///
/// let mut builder = SequencePointBuilder::new(Token::method_def(1), 1);
/// builder.mark_visible(0, SourceSpan::on_line(1, 3, 5, 6))?;
/// builder.mark_hidden(4)?;
/// builder.mark_visible(4, SourceSpan::on_line(1, 4, 9, 20))?;
///
/// let points = builder.build();
/// assert_eq!(points.len(), 2);
/// assert!(!points.points[1].is_hidden());
/// # Ok::<(), symscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SequencePointBuilder {
    token: Token,
    document: u32,
    local_signature: u32,
    prologue: bool,
    points: Vec<SequencePoint>,
}

impl SequencePointBuilder {
    /// Create a builder for the routine `token`, starting in `initial_document`.
    #[must_use]
    pub fn new(token: Token, initial_document: u32) -> Self {
        SequencePointBuilder {
            token,
            document: initial_document,
            local_signature: 0,
            prologue: false,
            points: Vec::new(),
        }
    }

    /// Mark offset 0 as a hidden prologue that later marks cannot replace.
    #[must_use]
    pub fn with_prologue(mut self) -> Self {
        if self.points.is_empty() {
            self.points.push(SequencePoint::Hidden {
                il_offset: 0,
                document: self.document,
            });
            self.prologue = true;
        }
        self
    }

    /// Set the `StandAloneSig` row of the routine's local signature.
    #[must_use]
    pub fn with_local_signature(mut self, row: u32) -> Self {
        self.local_signature = row;
        self
    }

    /// Add a visible point for `span` starting at `il_offset`.
    ///
    /// # Errors
    /// Returns [`Error::MalformedSequence`] if the offset is lower than the previous mark, if
    /// the span ends before it starts or has zero width, or if a line or column does not fit
    /// the blob format.
    pub fn mark_visible(&mut self, il_offset: u32, span: SourceSpan) -> Result<()> {
        if !span.is_well_formed() {
            return Err(self.malformed(format!("span {span} ends before it starts")));
        }
        if span.is_empty() {
            return Err(self.malformed(format!("span {span} at IL_{il_offset:04x} is empty")));
        }
        if span.end_line > MAX_LINE || span.end_column > MAX_COLUMN || span.start_line == 0 {
            return Err(self.malformed(format!("span {span} is out of range")));
        }

        self.push(SequencePoint::Visible { il_offset, span })?;
        self.document = span.document;
        Ok(())
    }

    /// Add a hidden point starting at `il_offset`.
    ///
    /// # Errors
    /// Returns [`Error::MalformedSequence`] if the offset is lower than the previous mark.
    pub fn mark_hidden(&mut self, il_offset: u32) -> Result<()> {
        self.push(SequencePoint::Hidden {
            il_offset,
            document: self.document,
        })
    }

    /// Number of points collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if nothing was marked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Seal the table.
    #[must_use]
    pub fn build(self) -> SequencePoints {
        SequencePoints {
            local_signature: self.local_signature,
            points: self.points,
        }
    }

    fn push(&mut self, point: SequencePoint) -> Result<()> {
        let offset = point.il_offset();
        match self.points.last() {
            Some(last) if offset < last.il_offset() => Err(self.malformed(format!(
                "mark at IL_{offset:04x} follows IL_{:04x}",
                last.il_offset()
            ))),
            Some(last) if offset == last.il_offset() => {
                if !(self.prologue && offset == 0) {
                    let index = self.points.len() - 1;
                    self.points[index] = point;
                }
                Ok(())
            }
            _ => {
                self.points.push(point);
                Ok(())
            }
        }
    }

    fn malformed(&self, message: String) -> Error {
        Error::MalformedSequence {
            token: self.token,
            message,
        }
    }
}
