//! Decoding of import chain blobs.

use crate::{
    debuginfo::importscope::{
        types::{ImportChain, ImportItem, ImportLevel},
        IMPORT_BLOB_VERSION,
    },
    file::parser::Parser,
    Result,
};

/// Parse an import chain blob.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] for truncated blobs and [`crate::Error::Malformed`]
/// for an unknown version, an invalid import string or trailing data.
pub fn parse_import_chain(blob: &[u8]) -> Result<ImportChain> {
    let mut parser = Parser::new(blob);

    let version = parser.read_le::<u8>()?;
    if version != IMPORT_BLOB_VERSION {
        return Err(malformed_error!("Unsupported import blob version {}", version));
    }

    let level_count = parser.read_compressed_uint()?;
    if level_count as usize > parser.remaining() {
        return Err(malformed_error!("Level count {} exceeds blob size", level_count));
    }

    let mut levels = Vec::with_capacity(level_count as usize);
    for _ in 0..level_count {
        let item_count = parser.read_compressed_uint()?;
        if item_count as usize > parser.remaining() {
            return Err(malformed_error!("Using count {} exceeds blob size", item_count));
        }

        let mut items = Vec::with_capacity(item_count as usize);
        for _ in 0..item_count {
            let import = parser.read_prefixed_string_utf8()?;
            items.push(ImportItem::parse_import_string(&import)?);
        }
        levels.push(ImportLevel::new(items));
    }

    if parser.has_more_data() {
        return Err(malformed_error!(
            "{} trailing bytes after import chain",
            parser.remaining()
        ));
    }

    Ok(ImportChain::new(levels))
}
