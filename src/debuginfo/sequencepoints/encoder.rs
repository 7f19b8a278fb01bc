//! Encoding of [`SequencePoints`] into the sequence point blob.

use crate::{
    debuginfo::sequencepoints::{SequencePoint, SequencePoints, MAX_COLUMN, MAX_LINE},
    utils::compressed::{write_compressed_int, write_compressed_uint},
    Result,
};

/// Encode a sequence point table.
///
/// An empty table yields an empty blob. The first point's document becomes the header's
/// initial document; later document changes are written as document records.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if offsets are not strictly increasing, if a visible
/// span is inverted, empty or out of range, and [`crate::Error::ValueOutOfRange`] if a delta
/// does not fit a compressed integer.
pub fn encode_sequence_points(points: &SequencePoints) -> Result<Vec<u8>> {
    let mut blob = Vec::new();
    let Some(first) = points.points.first() else {
        return Ok(blob);
    };

    write_compressed_uint(points.local_signature, &mut blob)?;
    write_compressed_uint(first.document(), &mut blob)?;

    let mut document = first.document();
    let mut previous_offset: Option<u32> = None;
    let mut previous_start: Option<(u32, u32)> = None;

    for point in points {
        let offset = point.il_offset();

        if let Some(previous) = previous_offset {
            if offset <= previous {
                return Err(malformed_error!(
                    "Sequence point at IL_{:04x} does not follow IL_{:04x}",
                    offset,
                    previous
                ));
            }

            if point.document() != document {
                document = point.document();
                write_compressed_uint(0, &mut blob)?;
                write_compressed_uint(document, &mut blob)?;
            }
            write_compressed_uint(offset - previous, &mut blob)?;
        } else {
            write_compressed_uint(offset, &mut blob)?;
        }
        previous_offset = Some(offset);

        match point {
            SequencePoint::Hidden { .. } => {
                write_compressed_uint(0, &mut blob)?;
                write_compressed_uint(0, &mut blob)?;
            }
            SequencePoint::Visible { span, .. } => {
                if !span.is_well_formed() || span.is_empty() {
                    return Err(malformed_error!(
                        "Visible sequence point at IL_{:04x} has an unusable span {}",
                        offset,
                        span
                    ));
                }
                if span.end_line > MAX_LINE || span.end_column > MAX_COLUMN {
                    return Err(malformed_error!(
                        "Sequence point span {} is out of range",
                        span
                    ));
                }

                let delta_lines = span.end_line - span.start_line;
                write_compressed_uint(delta_lines, &mut blob)?;
                let delta_columns = signed(span.end_column) - signed(span.start_column);
                if delta_lines == 0 {
                    write_compressed_uint(delta_columns.unsigned_abs(), &mut blob)?;
                } else {
                    write_compressed_int(delta_columns, &mut blob)?;
                }

                match previous_start {
                    None => {
                        write_compressed_uint(span.start_line, &mut blob)?;
                        write_compressed_uint(span.start_column, &mut blob)?;
                    }
                    Some((line, column)) => {
                        write_compressed_int(signed(span.start_line) - signed(line), &mut blob)?;
                        write_compressed_int(
                            signed(span.start_column) - signed(column),
                            &mut blob,
                        )?;
                    }
                }
                previous_start = Some((span.start_line, span.start_column));
            }
        }
    }

    Ok(blob)
}

/// Lines and columns are bounded by [`MAX_LINE`], so they always fit an `i32`.
#[allow(clippy::cast_possible_wrap)]
fn signed(value: u32) -> i32 {
    value as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::span::SourceSpan;

    fn visible(il_offset: u32, span: SourceSpan) -> SequencePoint {
        SequencePoint::Visible { il_offset, span }
    }

    #[test]
    fn empty_table() {
        let blob = encode_sequence_points(&SequencePoints::default()).unwrap();
        assert!(blob.is_empty());
    }

    #[test]
    fn layout() {
        let points = SequencePoints {
            local_signature: 2,
            points: vec![
                SequencePoint::Hidden {
                    il_offset: 0,
                    document: 1,
                },
                visible(1, SourceSpan::on_line(1, 10, 2, 7)),
                visible(5, SourceSpan::new(1, 11, 3, 12, 1)),
            ],
        };

        let blob = encode_sequence_points(&points).unwrap();
        assert_eq!(
            blob,
            [
                2, 1, // header
                0, 0, 0, // hidden at 0
                1, 0, 5, 10, 2, // IL_0001 (10,2)-(10,7)
                4, 1, 0x7D, 2, 2, // IL_0005 (11,3)-(12,1)
            ]
        );
    }

    #[test]
    fn document_switch() {
        let points = SequencePoints {
            local_signature: 0,
            points: vec![
                visible(0, SourceSpan::on_line(1, 1, 1, 2)),
                visible(3, SourceSpan::on_line(2, 1, 1, 2)),
            ],
        };

        let blob = encode_sequence_points(&points).unwrap();
        assert_eq!(blob, [0, 1, 0, 0, 1, 1, 1, 0, 2, 3, 0, 1, 0, 0]);
    }

    #[test]
    fn duplicate_offset_rejected() {
        let points = SequencePoints {
            local_signature: 0,
            points: vec![
                visible(2, SourceSpan::on_line(1, 1, 1, 2)),
                visible(2, SourceSpan::on_line(1, 2, 1, 2)),
            ],
        };
        assert!(encode_sequence_points(&points).is_err());
    }

    #[test]
    fn empty_span_rejected() {
        let points = SequencePoints {
            local_signature: 0,
            points: vec![visible(0, SourceSpan::on_line(1, 1, 4, 4))],
        };
        assert!(encode_sequence_points(&points).is_err());
    }
}
