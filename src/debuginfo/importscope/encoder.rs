//! Encoding of [`ImportChain`]s.

use crate::{
    debuginfo::importscope::{types::ImportChain, IMPORT_BLOB_VERSION},
    utils::compressed::{write_compressed_uint, write_prefixed_string_utf8},
    Error, Result,
};

/// Encode an import chain, levels and items in their current order.
///
/// # Errors
/// Returns [`Error::ValueOutOfRange`] if a count or string length does not fit a compressed
/// integer.
///
/// # Examples
///
/// ```rust
/// use symscope::debuginfo::importscope::{encode_import_chain, ImportChain, ImportItem, ImportLevel};
///
/// let chain = ImportChain::new(vec![ImportLevel::new(vec![ImportItem::namespace("System")])]);
/// assert_eq!(encode_import_chain(&chain)?, b"\x01\x01\x01\x07USystem");
/// # Ok::<(), symscope::Error>(())
/// ```
pub fn encode_import_chain(chain: &ImportChain) -> Result<Vec<u8>> {
    let mut blob = vec![IMPORT_BLOB_VERSION];

    write_compressed_uint(to_uint(chain.levels.len())?, &mut blob)?;
    for level in &chain.levels {
        write_compressed_uint(to_uint(level.len())?, &mut blob)?;
        for item in &level.items {
            write_prefixed_string_utf8(&item.to_import_string(), &mut blob)?;
        }
    }

    Ok(blob)
}

fn to_uint(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ValueOutOfRange(i64::MAX))
}
