//! Encoding of [`LambdaMap`]s.

use crate::{
    debuginfo::lambdamap::types::{LambdaClosure, LambdaMap},
    utils::compressed::write_compressed_uint,
    Error, Result,
};

/// Encode a closure/lambda map.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if a lambda names a closure index that is not in the
/// map, and [`crate::Error::ValueOutOfRange`] if an offset or count does not fit a compressed
/// integer.
///
/// # Examples
///
/// ```rust
/// use symscope::debuginfo::lambdamap::{
///     encoder::encode_lambda_map,
///     types::{ClosureInfo, LambdaClosure, LambdaInfo, LambdaMap},
/// };
///
/// let map = LambdaMap {
///     method_ordinal: 0,
///     closures: vec![ClosureInfo { syntax_offset: 0, parent: None }],
///     lambdas: vec![LambdaInfo { syntax_offset: 5, closure: LambdaClosure::Closure(0) }],
/// };
///
/// // ordinal + 1, -baseline, closure count, closure, lambda
/// assert_eq!(encode_lambda_map(&map)?, [1, 1, 1, 1, 0, 6, 2]);
/// # Ok::<(), symscope::Error>(())
/// ```
pub fn encode_lambda_map(map: &LambdaMap) -> Result<Vec<u8>> {
    let mut blob = Vec::new();
    let baseline = i64::from(map.syntax_offset_baseline());

    let ordinal = map
        .method_ordinal
        .checked_add(1)
        .ok_or(Error::ValueOutOfRange(i64::from(map.method_ordinal)))?;
    write_compressed_uint(ordinal, &mut blob)?;
    write_compressed_uint(to_uint(-baseline)?, &mut blob)?;

    write_compressed_uint(to_uint(map.closures.len() as i64)?, &mut blob)?;
    for closure in &map.closures {
        write_compressed_uint(
            to_uint(i64::from(closure.syntax_offset) - baseline)?,
            &mut blob,
        )?;
        let parent = closure.parent.map_or(0, |p| i64::from(p) + 1);
        write_compressed_uint(to_uint(parent)?, &mut blob)?;
    }

    for lambda in &map.lambdas {
        if let Some(index) = lambda.closure.index() {
            if index as usize >= map.closures.len() {
                return Err(malformed_error!(
                    "Lambda at syntax offset {} refers to missing closure #{}",
                    lambda.syntax_offset,
                    index
                ));
            }
        }

        write_compressed_uint(
            to_uint(i64::from(lambda.syntax_offset) - baseline)?,
            &mut blob,
        )?;
        write_compressed_uint(
            to_uint(lambda.closure.ordinal() - LambdaClosure::MIN_ORDINAL)?,
            &mut blob,
        )?;
    }

    Ok(blob)
}

fn to_uint(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ValueOutOfRange(value))
}
