//! Decoding of the custom debug information container.

use widestring::U16CStr;

use crate::{
    debuginfo::{
        customdebuginformation::{
            types::{
                CustomDebugInfo, CustomDebugRecord, CustomDebugRecordKind, HoistedLocalScope,
            },
            CDI_VERSION, RECORD_HEADER_SIZE,
        },
        lambdamap::parse_lambda_map,
        slotmap::parse_slot_map,
        token::Token,
    },
    file::parser::Parser,
    Result,
};

/// Parse the custom debug information of one routine.
///
/// An empty blob yields no records. Records of unknown kinds are kept as
/// [`CustomDebugRecord::Unknown`].
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] for truncated blobs and [`crate::Error::Malformed`]
/// for an unsupported version, an impossible record size or a damaged nested map.
pub fn parse_custom_debug_info(blob: &[u8]) -> Result<CustomDebugInfo> {
    if blob.is_empty() {
        return Ok(CustomDebugInfo::default());
    }

    let mut parser = Parser::new(blob);
    let version = parser.read_le::<u8>()?;
    if version != CDI_VERSION {
        return Err(malformed_error!(
            "Unsupported custom debug information version {}",
            version
        ));
    }
    let count = parser.read_le::<u8>()?;
    parser.advance_by(2)?;

    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let start = parser.pos();
        let record_version = parser.read_le::<u8>()?;
        let kind = parser.read_le::<u8>()?;
        parser.advance_by(1)?;
        let padding = parser.read_le::<u8>()? as usize;
        let size = parser.read_le::<u32>()? as usize;

        if record_version != CDI_VERSION {
            return Err(malformed_error!(
                "Record at offset {} has unsupported version {}",
                start,
                record_version
            ));
        }
        if size < RECORD_HEADER_SIZE + padding {
            return Err(malformed_error!(
                "Record at offset {} has invalid size {}",
                start,
                size
            ));
        }

        let payload = parser.read_bytes(size - RECORD_HEADER_SIZE - padding)?;
        parser.advance_by(padding)?;
        records.push(parse_payload(kind, payload)?);
    }

    Ok(CustomDebugInfo { records })
}

fn parse_payload(kind: u8, payload: &[u8]) -> Result<CustomDebugRecord> {
    let mut parser = Parser::new(payload);

    let record = match CustomDebugRecordKind::from_repr(kind) {
        Some(CustomDebugRecordKind::UsingInfo) => {
            let levels = parser.read_le::<u16>()?;
            let mut counts = Vec::with_capacity(usize::from(levels).min(payload.len()));
            for _ in 0..levels {
                counts.push(parser.read_le::<u16>()?);
            }
            CustomDebugRecord::UsingInfo(counts)
        }
        Some(CustomDebugRecordKind::ForwardInfo) => {
            CustomDebugRecord::Forward(Token::new(parser.read_le::<u32>()?))
        }
        Some(CustomDebugRecordKind::ForwardToModuleInfo) => {
            CustomDebugRecord::ForwardToModule(Token::new(parser.read_le::<u32>()?))
        }
        Some(CustomDebugRecordKind::StateMachineHoistedLocalScopes) => {
            let count = parser.read_le::<u32>()? as usize;
            let mut scopes = Vec::with_capacity(count.min(payload.len() / 8));
            for _ in 0..count {
                scopes.push(HoistedLocalScope {
                    start_offset: parser.read_le::<u32>()?,
                    end_offset: parser.read_le::<u32>()?,
                });
            }
            CustomDebugRecord::HoistedLocalScopes(scopes)
        }
        Some(CustomDebugRecordKind::ForwardIterator) => {
            return Ok(CustomDebugRecord::ForwardIterator(parse_utf16_name(payload)?));
        }
        Some(CustomDebugRecordKind::EditAndContinueLocalSlotMap) => {
            return Ok(CustomDebugRecord::LocalSlotMap(parse_slot_map(payload)?));
        }
        Some(CustomDebugRecordKind::EditAndContinueLambdaMap) => {
            return Ok(CustomDebugRecord::LambdaMap(parse_lambda_map(payload)?));
        }
        None => {
            return Ok(CustomDebugRecord::Unknown {
                kind,
                data: payload.to_vec(),
            })
        }
    };

    if parser.has_more_data() {
        return Err(malformed_error!(
            "{} trailing bytes in record of kind {}",
            parser.remaining(),
            kind
        ));
    }
    Ok(record)
}

fn parse_utf16_name(payload: &[u8]) -> Result<String> {
    if payload.len() % 2 != 0 {
        return Err(malformed_error!(
            "UTF-16 name has odd length {}",
            payload.len()
        ));
    }

    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let name = U16CStr::from_slice_truncate(&units)
        .map_err(|_| malformed_error!("UTF-16 name is not terminated"))?;
    name.to_string()
        .map_err(|_| malformed_error!("UTF-16 name is not valid UTF-16"))
}
