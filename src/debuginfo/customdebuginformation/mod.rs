//! Custom debug information.
//!
//! Information the core tables have no place for travels in a small record container
//! attached to each routine: the import using counts or a forward to the routine that
//! owns the chain, the state machine records of iterator and async routines, plus the
//! Edit-and-Continue slot and lambda maps. Stream-wide extras
//! (Source Link, embedded source) are identified by GUID instead, see
//! [`types::CustomDebugKind`].
//!
//! # Container Format
//!
//! ```text
//! Version (u8) = 4, RecordCount (u8), 2 x padding
//! per record:
//!   Version (u8) = 4, Kind (u8), reserved (u8), AlignmentPadding (u8)
//!   Size (u32 LE)            including this 8-byte header and the padding
//!   Payload, then AlignmentPadding zero bytes up to a 4-byte boundary
//! ```
//!
//! | Kind | Record                          | Payload                           |
//! |------|---------------------------------|-----------------------------------|
//! | 0    | `UsingInfo`                     | u16 level count, u16 per level    |
//! | 1    | `ForwardInfo`                   | u32 routine token                 |
//! | 2    | `ForwardToModuleInfo`           | u32 routine token                 |
//! | 3    | `StateMachineHoistedLocalScopes`| u32 count, u32 start + u32 end each |
//! | 4    | `ForwardIterator`               | nul-terminated UTF-16 type name   |
//! | 6    | `EditAndContinueLocalSlotMap`   | [`crate::debuginfo::slotmap`] blob |
//! | 7    | `EditAndContinueLambdaMap`      | [`crate::debuginfo::lambdamap`] blob |

pub mod encoder;
pub mod parser;
pub mod types;

pub use encoder::encode_custom_debug_info;
pub use parser::parse_custom_debug_info;
pub use types::{
    CustomDebugInfo, CustomDebugKind, CustomDebugRecord, CustomDebugRecordKind, HoistedLocalScope,
};

/// Version of the container and of every record.
pub const CDI_VERSION: u8 = 4;

/// Size of a record header in bytes.
pub(crate) const RECORD_HEADER_SIZE: usize = 8;
