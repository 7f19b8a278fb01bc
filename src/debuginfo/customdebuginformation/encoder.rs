//! Encoding of the custom debug information container.

use widestring::U16CString;

use crate::{
    debuginfo::{
        customdebuginformation::{
            types::{CustomDebugInfo, CustomDebugRecord},
            CDI_VERSION, RECORD_HEADER_SIZE,
        },
        lambdamap::encode_lambda_map,
        slotmap::encode_slot_map,
    },
    file::io::write_le,
    Error, Result,
};

/// Encode the custom debug information of one routine.
///
/// A routine without records encodes to an empty blob.
///
/// # Errors
/// Returns [`Error::ValueOutOfRange`] for more than 255 records, more than 65535 levels or
/// a using count above 65535, and propagates errors of the embedded slot and lambda maps.
///
/// # Examples
///
/// ```rust
/// use symscope::debuginfo::customdebuginformation::{encode_custom_debug_info, CustomDebugInfo, CustomDebugRecord};
///
/// let info = CustomDebugInfo { records: vec![CustomDebugRecord::UsingInfo(vec![1])] };
/// assert_eq!(
///     encode_custom_debug_info(&info)?,
///     [4, 1, 0, 0, 4, 0, 0, 0, 12, 0, 0, 0, 1, 0, 1, 0]
/// );
/// # Ok::<(), symscope::Error>(())
/// ```
pub fn encode_custom_debug_info(info: &CustomDebugInfo) -> Result<Vec<u8>> {
    if info.is_empty() {
        return Ok(Vec::new());
    }

    let count = u8::try_from(info.records.len())
        .map_err(|_| Error::ValueOutOfRange(info.records.len() as i64))?;
    let mut blob = vec![CDI_VERSION, count, 0, 0];

    for record in &info.records {
        let payload = encode_payload(record)?;
        let padding = (4 - payload.len() % 4) % 4;
        let size = RECORD_HEADER_SIZE + payload.len() + padding;
        let size = u32::try_from(size).map_err(|_| Error::ValueOutOfRange(size as i64))?;

        blob.extend_from_slice(&[CDI_VERSION, record.kind(), 0, padding as u8]);
        write_le(&mut blob, size);
        blob.extend_from_slice(&payload);
        blob.resize(blob.len() + padding, 0);
    }

    Ok(blob)
}

fn encode_payload(record: &CustomDebugRecord) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    match record {
        CustomDebugRecord::UsingInfo(counts) => {
            let levels = u16::try_from(counts.len())
                .map_err(|_| Error::ValueOutOfRange(counts.len() as i64))?;
            write_le(&mut payload, levels);
            for count in counts {
                write_le(&mut payload, *count);
            }
        }
        CustomDebugRecord::Forward(token) | CustomDebugRecord::ForwardToModule(token) => {
            write_le(&mut payload, token.value());
        }
        CustomDebugRecord::HoistedLocalScopes(scopes) => {
            let count = u32::try_from(scopes.len())
                .map_err(|_| Error::ValueOutOfRange(scopes.len() as i64))?;
            write_le(&mut payload, count);
            for scope in scopes {
                write_le(&mut payload, scope.start_offset);
                write_le(&mut payload, scope.end_offset);
            }
        }
        CustomDebugRecord::ForwardIterator(name) => {
            let name = U16CString::from_str(name).map_err(|_| {
                malformed_error!("State machine name {:?} contains a nul character", name)
            })?;
            for unit in name.as_slice_with_nul() {
                write_le(&mut payload, *unit);
            }
        }
        CustomDebugRecord::LocalSlotMap(map) => payload = encode_slot_map(map)?,
        CustomDebugRecord::LambdaMap(map) => payload = encode_lambda_map(map)?,
        CustomDebugRecord::Unknown { data, .. } => payload.extend_from_slice(data),
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::{
        slotmap::{LocalSlot, LocalSlotMap, SynthesizedLocalKind},
        token::Token,
    };

    #[test]
    fn empty() {
        assert!(encode_custom_debug_info(&CustomDebugInfo::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn forward_and_slots() {
        let info = CustomDebugInfo {
            records: vec![
                CustomDebugRecord::Forward(Token::method_def(1)),
                CustomDebugRecord::LocalSlotMap(LocalSlotMap {
                    slots: vec![LocalSlot::new(SynthesizedLocalKind::UserDefined, 0)],
                }),
            ],
        };

        assert_eq!(
            encode_custom_debug_info(&info).unwrap(),
            [
                4, 2, 0, 0, // header
                4, 1, 0, 0, 12, 0, 0, 0, 0x01, 0, 0, 0x06, // forward
                4, 6, 0, 2, 12, 0, 0, 0, 1, 1, 0, 0, // slot map, 2 bytes padding
            ]
        );
    }

    #[test]
    fn forward_iterator_size() {
        let info = CustomDebugInfo {
            records: vec![CustomDebugRecord::ForwardIterator("<Foo>d__0".to_string())],
        };

        let blob = encode_custom_debug_info(&info).unwrap();
        // 10 UTF-16 units including the terminator
        assert_eq!(&blob[4..12], &[4, 4, 0, 0, 28, 0, 0, 0]);
        assert_eq!(&blob[12..16], &[b'<', 0, b'F', 0]);
        assert_eq!(&blob[30..32], &[0, 0]);
    }

    #[test]
    fn forward_iterator_with_nul_rejected() {
        let info = CustomDebugInfo {
            records: vec![CustomDebugRecord::ForwardIterator("a\0b".to_string())],
        };
        assert!(encode_custom_debug_info(&info).is_err());
    }

    #[test]
    fn using_counts_padded() {
        let info = CustomDebugInfo {
            records: vec![CustomDebugRecord::UsingInfo(vec![2, 0])],
        };

        let blob = encode_custom_debug_info(&info).unwrap();
        assert_eq!(&blob[4..12], &[4, 0, 0, 2, 16, 0, 0, 0]);
        assert_eq!(&blob[12..], &[2, 0, 2, 0, 0, 0, 0, 0]);
    }
}
