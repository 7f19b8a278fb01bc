//! Decoding of lambda map blobs.

use crate::{
    debuginfo::lambdamap::types::{ClosureInfo, LambdaClosure, LambdaInfo, LambdaMap},
    file::parser::Parser,
    Result,
};

/// Parse a lambda map blob.
///
/// Lambda records run until the end of the blob.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] for truncated blobs and [`crate::Error::Malformed`]
/// for a missing method ordinal, offsets outside the `i32` range or closure references past
/// the closure table.
pub fn parse_lambda_map(blob: &[u8]) -> Result<LambdaMap> {
    let mut parser = Parser::new(blob);

    let method_ordinal = parser
        .read_compressed_uint()?
        .checked_sub(1)
        .ok_or_else(|| malformed_error!("Lambda map without method ordinal"))?;
    let baseline = -i64::from(parser.read_compressed_uint()?);

    let closure_count = parser.read_compressed_uint()?;
    if closure_count as usize > parser.remaining() {
        return Err(malformed_error!(
            "Closure count {} exceeds blob size",
            closure_count
        ));
    }

    let mut closures = Vec::with_capacity(closure_count as usize);
    for _ in 0..closure_count {
        let syntax_offset = to_offset(baseline + i64::from(parser.read_compressed_uint()?))?;
        let parent = parser.read_compressed_uint()?.checked_sub(1);
        if let Some(index) = parent {
            if index >= closure_count {
                return Err(malformed_error!("Closure parent #{} is out of range", index));
            }
        }
        closures.push(ClosureInfo {
            syntax_offset,
            parent,
        });
    }

    let mut lambdas = Vec::new();
    while parser.has_more_data() {
        let syntax_offset = to_offset(baseline + i64::from(parser.read_compressed_uint()?))?;
        let ordinal = i64::from(parser.read_compressed_uint()?) + LambdaClosure::MIN_ORDINAL;
        let closure = LambdaClosure::from_ordinal(ordinal)
            .filter(|c| c.index().map_or(true, |index| index < closure_count))
            .ok_or_else(|| malformed_error!("Lambda closure ordinal {} is out of range", ordinal))?;

        lambdas.push(LambdaInfo {
            syntax_offset,
            closure,
        });
    }

    Ok(LambdaMap {
        method_ordinal,
        closures,
        lambdas,
    })
}

fn to_offset(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| malformed_error!("Syntax offset {} is out of range", value))
}
