//! Local slot maps recording where each IL local slot came from.
//!
//! Every IL local of a routine is either a short-lived temporary or a long-lived variable
//! introduced by some syntax: a user-declared local, the enumerator of a `foreach`, the
//! display class instance of a closure. Edit-and-Continue needs that origin to map the
//! slots of an updated routine onto the ones in the running frame, so the emitter records
//! one [`LocalSlot`] per slot, in slot order.
//!
//! # Blob Format
//!
//! ```text
//! [0xFF, -Baseline (uint)]    only when some syntax offset is below -1
//! per slot:  0                                   short-lived temporary
//!            Kind + 1 | 0x80 if Ordinal > 0 (u8)
//!            SyntaxOffset - Baseline (uint)
//!            [Ordinal (uint)]
//! ```
//!
//! The baseline is `min(-1, every syntax offset)`, so offsets always encode as unsigned.

use strum::{Display, EnumIter, FromRepr};

use crate::{file::parser::Parser, utils::compressed::write_compressed_uint, Error, Result};

/// Marker byte introducing a syntax offset baseline.
const BASELINE_MARKER: u8 = 0xFF;

/// Flag on the kind byte signalling that an ordinal follows.
const ORDINAL_FLAG: u8 = 0x80;

/// Highest kind value whose tagged byte can not be mistaken for the baseline marker.
pub const MAX_SLOT_KIND: u8 = 0x7D;

/// Well-known kinds of long-lived local slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, EnumIter)]
#[repr(u8)]
pub enum SynthesizedLocalKind {
    /// Declared in source
    UserDefined = 0,
    /// Result of a condition stored across a branch
    ConditionalBranchDiscriminator = 1,
    /// The `lockTaken` flag of a `lock` statement
    LockTaken = 2,
    /// The monitor object of a `lock` statement
    Lock = 3,
    /// The resource of a `using` statement
    Using = 4,
    /// The enumerator of a `foreach` loop
    ForEachEnumerator = 5,
    /// The array of a `foreach` over an array
    ForEachArray = 6,
    /// The index of a `foreach` over an array
    ForEachArrayIndex = 7,
    /// The upper bound of a `foreach` over an array
    ForEachArrayLimit = 8,
    /// The pinned reference of a `fixed` statement
    FixedReference = 9,
    /// The value to return, stored before leaving protected regions
    FunctionReturnValue = 21,
    /// An awaiter kept across a suspension point
    AwaiterField = 28,
    /// A by-ref value spilled across an `await`
    AwaitByRefSpill = 29,
    /// The display class instance holding captured variables
    LambdaDisplayClass = 30,
}

/// Kind of one IL local slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// A short-lived temporary with no syntax origin
    Temp,
    /// A long-lived slot of the given kind
    LongLived(u8),
}

impl SlotKind {
    /// The well-known kind, if the raw value has a name.
    #[must_use]
    pub fn known(&self) -> Option<SynthesizedLocalKind> {
        match self {
            SlotKind::Temp => None,
            SlotKind::LongLived(raw) => SynthesizedLocalKind::from_repr(*raw),
        }
    }
}

impl From<SynthesizedLocalKind> for SlotKind {
    fn from(kind: SynthesizedLocalKind) -> Self {
        SlotKind::LongLived(kind as u8)
    }
}

/// Origin of one IL local slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSlot {
    /// Temporary or long-lived kind
    pub kind: SlotKind,
    /// Syntax offset of the declaring syntax (0 for temporaries)
    pub syntax_offset: i32,
    /// Distinguishes several slots of the same kind declared by the same syntax
    pub ordinal: u32,
}

impl LocalSlot {
    /// A short-lived temporary.
    #[must_use]
    pub fn temp() -> Self {
        LocalSlot {
            kind: SlotKind::Temp,
            syntax_offset: 0,
            ordinal: 0,
        }
    }

    /// A long-lived slot declared at `syntax_offset`.
    ///
    /// Temporaries carry no origin: passing [`SlotKind::Temp`] yields [`LocalSlot::temp`]
    /// and `syntax_offset` is ignored.
    pub fn new(kind: impl Into<SlotKind>, syntax_offset: i32) -> Self {
        match kind.into() {
            SlotKind::Temp => Self::temp(),
            kind => LocalSlot {
                kind,
                syntax_offset,
                ordinal: 0,
            },
        }
    }

    /// Set the ordinal. Ignored for temporaries.
    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        if !self.is_temp() {
            self.ordinal = ordinal;
        }
        self
    }

    /// Returns `true` for short-lived temporaries.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.kind == SlotKind::Temp
    }
}

/// The slot map of one routine, indexed by IL local slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalSlotMap {
    /// One entry per IL local, in slot order
    pub slots: Vec<LocalSlot>,
}

impl LocalSlotMap {
    /// Returns `true` if the routine has no locals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The lowest syntax offset of a long-lived slot, capped at -1.
    #[must_use]
    pub fn syntax_offset_baseline(&self) -> i32 {
        self.slots
            .iter()
            .filter(|slot| !slot.is_temp())
            .map(|slot| slot.syntax_offset)
            .fold(-1, i32::min)
    }
}

/// Encode a slot map.
///
/// # Errors
/// Returns [`Error::Malformed`] for a kind above [`MAX_SLOT_KIND`] or a temporary with a
/// syntax offset or ordinal, and [`Error::ValueOutOfRange`] if an offset does not fit a
/// compressed integer.
pub fn encode_slot_map(map: &LocalSlotMap) -> Result<Vec<u8>> {
    let mut blob = Vec::new();
    let baseline = i64::from(map.syntax_offset_baseline());

    if baseline != -1 {
        blob.push(BASELINE_MARKER);
        write_compressed_uint(to_uint(-baseline)?, &mut blob)?;
    }

    for slot in &map.slots {
        let SlotKind::LongLived(kind) = slot.kind else {
            if slot.syntax_offset != 0 || slot.ordinal != 0 {
                return Err(malformed_error!(
                    "Temporary slot can not carry syntax offset {} or ordinal {}",
                    slot.syntax_offset,
                    slot.ordinal
                ));
            }
            blob.push(0);
            continue;
        };
        if kind > MAX_SLOT_KIND {
            return Err(malformed_error!("Local slot kind {} can not be encoded", kind));
        }

        let mut tag = kind + 1;
        if slot.ordinal > 0 {
            tag |= ORDINAL_FLAG;
        }
        blob.push(tag);
        write_compressed_uint(to_uint(i64::from(slot.syntax_offset) - baseline)?, &mut blob)?;
        if slot.ordinal > 0 {
            write_compressed_uint(slot.ordinal, &mut blob)?;
        }
    }

    Ok(blob)
}

/// Parse a slot map blob.
///
/// # Errors
/// Returns [`Error::OutOfBounds`] for truncated blobs and [`Error::Malformed`] for offsets
/// outside the `i32` range.
pub fn parse_slot_map(blob: &[u8]) -> Result<LocalSlotMap> {
    let mut parser = Parser::new(blob);
    let mut baseline = -1_i64;

    if parser.has_more_data() && parser.peek_byte()? == BASELINE_MARKER {
        parser.advance_by(1)?;
        baseline = -i64::from(parser.read_compressed_uint()?);
    }

    let mut slots = Vec::new();
    while parser.has_more_data() {
        let tag = parser.read_le::<u8>()?;
        if tag == 0 {
            slots.push(LocalSlot::temp());
            continue;
        }

        let Some(kind) = (tag & !ORDINAL_FLAG).checked_sub(1) else {
            return Err(malformed_error!("Invalid local slot tag {:#x}", tag));
        };
        let offset = baseline + i64::from(parser.read_compressed_uint()?);
        let syntax_offset = i32::try_from(offset)
            .map_err(|_| malformed_error!("Slot syntax offset {} is out of range", offset))?;
        let ordinal = if tag & ORDINAL_FLAG != 0 {
            parser.read_compressed_uint()?
        } else {
            0
        };

        slots.push(LocalSlot {
            kind: SlotKind::LongLived(kind),
            syntax_offset,
            ordinal,
        });
    }

    Ok(LocalSlotMap { slots })
}

fn to_uint(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ValueOutOfRange(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn layout_without_baseline() {
        let map = LocalSlotMap {
            slots: vec![
                LocalSlot::new(SynthesizedLocalKind::LambdaDisplayClass, 0),
                LocalSlot::new(SynthesizedLocalKind::UserDefined, 26),
                LocalSlot::temp(),
                LocalSlot::new(SlotKind::LongLived(28), 21).with_ordinal(2),
            ],
        };

        assert_eq!(
            encode_slot_map(&map).unwrap(),
            [31, 1, 1, 27, 0, 29 | 0x80, 22, 2]
        );
    }

    #[test]
    fn layout_with_baseline() {
        let map = LocalSlotMap {
            slots: vec![LocalSlot::new(SynthesizedLocalKind::UserDefined, -20)],
        };

        assert_eq!(map.syntax_offset_baseline(), -20);
        assert_eq!(encode_slot_map(&map).unwrap(), [0xFF, 20, 1, 0]);
    }

    #[test]
    fn roundtrip() {
        let map = LocalSlotMap {
            slots: vec![
                LocalSlot::new(SynthesizedLocalKind::ForEachEnumerator, -5),
                LocalSlot::temp(),
                LocalSlot::new(SynthesizedLocalKind::AwaiterField, 70).with_ordinal(1),
                LocalSlot::new(SlotKind::LongLived(35), 86),
            ],
        };

        let blob = encode_slot_map(&map).unwrap();
        assert_eq!(parse_slot_map(&blob).unwrap(), map);
    }

    #[test]
    fn temporaries_have_no_origin() {
        let slot = LocalSlot::new(SlotKind::Temp, 42).with_ordinal(3);
        assert_eq!(slot, LocalSlot::temp());

        let map = LocalSlotMap { slots: vec![slot] };
        let blob = encode_slot_map(&map).unwrap();
        assert_eq!(blob, [0]);
        assert_eq!(parse_slot_map(&blob).unwrap(), map);

        let forged = LocalSlotMap {
            slots: vec![LocalSlot {
                kind: SlotKind::Temp,
                syntax_offset: 42,
                ordinal: 0,
            }],
        };
        assert!(matches!(
            encode_slot_map(&forged),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn kind_too_large() {
        let map = LocalSlotMap {
            slots: vec![LocalSlot::new(SlotKind::LongLived(0x7E), 0)],
        };
        assert!(encode_slot_map(&map).is_err());
    }

    #[test]
    fn known_kinds_fit() {
        for kind in SynthesizedLocalKind::iter() {
            assert!(kind as u8 <= MAX_SLOT_KIND);
            assert_eq!(SlotKind::from(kind).known(), Some(kind));
        }
        assert_eq!(SlotKind::LongLived(35).known(), None);
    }

    #[test]
    fn truncated() {
        assert!(matches!(parse_slot_map(&[0xFF]), Err(Error::OutOfBounds)));
        assert!(matches!(parse_slot_map(&[5]), Err(Error::OutOfBounds)));
    }
}
