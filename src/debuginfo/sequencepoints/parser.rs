//! Decoding of sequence point blobs.

use crate::{
    debuginfo::{
        sequencepoints::{SequencePoint, SequencePoints},
        span::SourceSpan,
    },
    file::parser::Parser,
    Result,
};

/// Parse a sequence point blob into a [`SequencePoints`] table.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] for truncated blobs and [`crate::Error::Malformed`]
/// when offset or line/column arithmetic leaves the valid range.
///
/// # Examples
///
/// ```rust
/// use symscope::debuginfo::sequencepoints::parse_sequence_points;
///
/// // no local signature, document 1, IL_0001 (10,2)-(10,7)
/// let blob: &[u8] = &[0, 1, 1, 0, 5, 10, 2];
/// let points = parse_sequence_points(blob)?;
/// assert_eq!(points.len(), 1);
/// assert_eq!(points.points[0].span().map(|s| s.end_column), Some(7));
/// # Ok::<(), symscope::Error>(())
/// ```
pub fn parse_sequence_points(blob: &[u8]) -> Result<SequencePoints> {
    if blob.is_empty() {
        return Ok(SequencePoints::default());
    }

    let mut parser = Parser::new(blob);
    let local_signature = parser.read_compressed_uint()?;
    let mut document = parser.read_compressed_uint()?;

    let mut points = Vec::new();
    let mut previous_offset: Option<u32> = None;
    let mut previous_start: Option<(i64, i64)> = None;

    while parser.has_more_data() {
        let delta_il = parser.read_compressed_uint()?;
        let il_offset = match previous_offset {
            None => delta_il,
            Some(_) if delta_il == 0 => {
                document = parser.read_compressed_uint()?;
                continue;
            }
            Some(previous) => previous
                .checked_add(delta_il)
                .ok_or_else(|| malformed_error!("IL offset overflow after IL_{:04x}", previous))?,
        };
        previous_offset = Some(il_offset);

        let delta_lines = parser.read_compressed_uint()?;
        let delta_columns = if delta_lines == 0 {
            i64::from(parser.read_compressed_uint()?)
        } else {
            i64::from(parser.read_compressed_int()?)
        };

        if delta_lines == 0 && delta_columns == 0 {
            points.push(SequencePoint::Hidden {
                il_offset,
                document,
            });
            continue;
        }

        let (start_line, start_column) = match previous_start {
            None => (
                i64::from(parser.read_compressed_uint()?),
                i64::from(parser.read_compressed_uint()?),
            ),
            Some((line, column)) => (
                line + i64::from(parser.read_compressed_int()?),
                column + i64::from(parser.read_compressed_int()?),
            ),
        };
        previous_start = Some((start_line, start_column));

        let span = SourceSpan::new(
            document,
            to_position(start_line)?,
            to_position(start_column)?,
            to_position(start_line + i64::from(delta_lines))?,
            to_position(start_column + delta_columns)?,
        );
        points.push(SequencePoint::Visible { il_offset, span });
    }

    Ok(SequencePoints {
        local_signature,
        points,
    })
}

fn to_position(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| malformed_error!("Sequence point position {} is out of range", value))
}
