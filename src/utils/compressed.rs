//! Writers for the ECMA-335 II.23.2 compressed integer encodings.
//!
//! These are the inverse of [`crate::Parser::read_compressed_uint`] and
//! [`crate::Parser::read_compressed_int`]. Values that do not fit the encoding are
//! rejected instead of truncated, since a silently truncated delta would shift every
//! following sequence point.

use crate::{Error, Result};

/// Largest value a compressed unsigned integer can hold.
pub const MAX_COMPRESSED_UINT: u32 = 0x1FFF_FFFF;

/// Smallest value a compressed signed integer can hold.
pub const MIN_COMPRESSED_INT: i32 = -0x1000_0000;

/// Largest value a compressed signed integer can hold.
pub const MAX_COMPRESSED_INT: i32 = 0x0FFF_FFFF;

/// Number of bytes `value` occupies as a compressed unsigned integer.
///
/// # Errors
/// Returns [`Error::ValueOutOfRange`] if `value` exceeds [`MAX_COMPRESSED_UINT`].
pub fn compressed_uint_size(value: u32) -> Result<usize> {
    match value {
        0..=0x7F => Ok(1),
        0x80..=0x3FFF => Ok(2),
        0x4000..=MAX_COMPRESSED_UINT => Ok(4),
        _ => Err(Error::ValueOutOfRange(i64::from(value))),
    }
}

/// Appends `value` as a compressed unsigned integer.
///
/// # Errors
/// Returns [`Error::ValueOutOfRange`] if `value` exceeds [`MAX_COMPRESSED_UINT`].
///
/// # Examples
///
/// ```rust
/// use symscope::utils::compressed::write_compressed_uint;
///
/// let mut buffer = Vec::new();
/// write_compressed_uint(0x2E57, &mut buffer)?;
/// assert_eq!(buffer, [0xAE, 0x57]);
/// # Ok::<(), symscope::Error>(())
/// ```
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) -> Result<()> {
    match compressed_uint_size(value)? {
        1 => buffer.push(value as u8),
        2 => {
            buffer.push(0x80 | (value >> 8) as u8);
            buffer.push(value as u8);
        }
        _ => {
            buffer.push(0xC0 | (value >> 24) as u8);
            buffer.push((value >> 16) as u8);
            buffer.push((value >> 8) as u8);
            buffer.push(value as u8);
        }
    }
    Ok(())
}

/// Appends `value` as a compressed signed integer.
///
/// The magnitude is rotated left by one with the sign in bit 0, using the narrowest of the
/// 7, 14 and 29 bit widths that holds the value.
///
/// # Errors
/// Returns [`Error::ValueOutOfRange`] if `value` lies outside
/// [`MIN_COMPRESSED_INT`]`..=`[`MAX_COMPRESSED_INT`].
pub fn write_compressed_int(value: i32, buffer: &mut Vec<u8>) -> Result<()> {
    let sign = u32::from(value < 0);

    #[allow(clippy::cast_sign_loss)]
    let bits = value as u32;

    if (-0x40..=0x3F).contains(&value) {
        buffer.push((((bits & 0x3F) << 1) | sign) as u8);
        return Ok(());
    }

    if (-0x2000..=0x1FFF).contains(&value) {
        let encoded = ((bits & 0x1FFF) << 1) | sign;
        buffer.push(0x80 | (encoded >> 8) as u8);
        buffer.push(encoded as u8);
        return Ok(());
    }

    if (MIN_COMPRESSED_INT..=MAX_COMPRESSED_INT).contains(&value) {
        let encoded = ((bits & 0x0FFF_FFFF) << 1) | sign;
        buffer.push(0xC0 | (encoded >> 24) as u8);
        buffer.push((encoded >> 16) as u8);
        buffer.push((encoded >> 8) as u8);
        buffer.push(encoded as u8);
        return Ok(());
    }

    Err(Error::ValueOutOfRange(i64::from(value)))
}

/// Appends `value` as a compressed-length prefixed UTF-8 string.
///
/// # Errors
/// Returns [`Error::ValueOutOfRange`] if the string is longer than [`MAX_COMPRESSED_UINT`].
pub fn write_prefixed_string_utf8(value: &str, buffer: &mut Vec<u8>) -> Result<()> {
    let length =
        u32::try_from(value.len()).map_err(|_| Error::ValueOutOfRange(value.len() as i64))?;
    write_compressed_uint(length, buffer)?;
    buffer.extend_from_slice(value.as_bytes());
    Ok(())
}
