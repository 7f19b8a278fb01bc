//! Little-endian primitive reading and writing for debug-information blobs.
//!
//! Every fixed-width field in the blobs this crate produces (tokens, CDI record headers,
//! embedded-source format markers) is little-endian. The [`BlobIO`] trait gives the
//! primitive types a uniform byte conversion, [`read_le_at`] reads one bounds-checked
//! value at a moving offset and [`write_le`] appends one to a growing buffer.
//!
//! # Examples
//!
//! ```rust,ignore
//! use symscope::file::io::{read_le_at, write_le};
//!
//! let mut buffer = Vec::new();
//! write_le(&mut buffer, 0x0600_0001_u32);
//! write_le(&mut buffer, 4_u16);
//!
//! let mut offset = 0;
//! assert_eq!(read_le_at::<u32>(&buffer, &mut offset)?, 0x0600_0001);
//! assert_eq!(read_le_at::<u16>(&buffer, &mut offset)?, 4);
//! # Ok::<(), symscope::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Endian-aware conversion between a primitive and its byte representation.
pub trait BlobIO: Sized + Copy {
    /// Byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_blob_io {
    ($($ty:ty => $len:expr),* $(,)?) => {
        $(
            impl BlobIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_blob_io!(u8 => 1, i8 => 1, u16 => 2, i16 => 2, u32 => 4, i32 => 4, u64 => 8, i64 => 8);

/// Reads a `T` at `offset` and advances the offset past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: BlobIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..*offset + type_len].try_into() else {
        return Err(OutOfBounds);
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

/// Appends `value` to `buffer` in little-endian order.
pub fn write_le<T: BlobIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_le_bytes().as_ref());
}
