//! Custom debug information types.
//!
//! Two families live here: the per-routine records of the custom debug information
//! container ([`CustomDebugRecord`]) and the GUID-identified container-level blobs
//! ([`CustomDebugKind`]) that carry Source Link and embedded source for the whole stream.

use strum::{Display, FromRepr};
use uguid::{guid, Guid};

use crate::debuginfo::{lambdamap::LambdaMap, slotmap::LocalSlotMap, token::Token};

/// Well-known container-level debug information kinds identified by GUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomDebugKind {
    /// Source Link JSON mapping documents to URLs
    /// GUID: CC110556-A091-4D38-9FEC-25AB9A351A6A
    SourceLink,

    /// Embedded source file content
    /// GUID: 0E8A571B-6926-466E-B4AD-8AB04611F5FE
    EmbeddedSource,

    /// Unknown or unsupported kind
    Unknown(Guid),
}

impl CustomDebugKind {
    const SOURCE_LINK: Guid = guid!("cc110556-a091-4d38-9fec-25ab9a351a6a");
    const EMBEDDED_SOURCE: Guid = guid!("0e8a571b-6926-466e-b4ad-8ab04611f5fe");

    /// Map a GUID to its kind.
    #[must_use]
    pub fn from_guid(guid: Guid) -> Self {
        match guid {
            Self::SOURCE_LINK => CustomDebugKind::SourceLink,
            Self::EMBEDDED_SOURCE => CustomDebugKind::EmbeddedSource,
            other => CustomDebugKind::Unknown(other),
        }
    }

    /// The GUID identifying this kind.
    #[must_use]
    pub fn guid(&self) -> Guid {
        match self {
            CustomDebugKind::SourceLink => Self::SOURCE_LINK,
            CustomDebugKind::EmbeddedSource => Self::EMBEDDED_SOURCE,
            CustomDebugKind::Unknown(guid) => *guid,
        }
    }
}

/// Kind byte of a record in the custom debug information container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(u8)]
pub enum CustomDebugRecordKind {
    /// Using counts per import level
    UsingInfo = 0,
    /// Forward to the routine owning the import chain
    ForwardInfo = 1,
    /// Forward to the routine owning the module-level imports
    ForwardToModuleInfo = 2,
    /// IL ranges in which hoisted state machine fields are in scope
    StateMachineHoistedLocalScopes = 3,
    /// Name of the state machine type implementing an iterator or async routine
    ForwardIterator = 4,
    /// Edit-and-Continue local slot map
    EditAndContinueLocalSlotMap = 6,
    /// Edit-and-Continue closure and lambda map
    EditAndContinueLambdaMap = 7,
}

/// The IL range in which one hoisted local of a state machine is in scope.
///
/// Both offsets are inclusive. A slot that holds no user variable is written as `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoistedLocalScope {
    /// First IL offset of the range
    pub start_offset: u32,
    /// Last IL offset of the range
    pub end_offset: u32,
}

impl HoistedLocalScope {
    /// Create a range.
    #[must_use]
    pub fn new(start_offset: u32, end_offset: u32) -> Self {
        HoistedLocalScope {
            start_offset,
            end_offset,
        }
    }
}

/// One record of the custom debug information container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomDebugRecord {
    /// Number of imports of every level, innermost first
    UsingInfo(Vec<u16>),
    /// The routine whose import chain applies
    Forward(Token),
    /// The routine whose module-level imports apply
    ForwardToModule(Token),
    /// Scopes of hoisted locals, one per state machine field
    HoistedLocalScopes(Vec<HoistedLocalScope>),
    /// The state machine type whose `MoveNext` carries the routine's debug information
    ForwardIterator(String),
    /// Local slot origins
    LocalSlotMap(LocalSlotMap),
    /// Closure and lambda origins
    LambdaMap(LambdaMap),
    /// A record of a kind this crate does not interpret
    Unknown {
        /// Raw kind byte
        kind: u8,
        /// Payload without alignment padding
        data: Vec<u8>,
    },
}

impl CustomDebugRecord {
    /// The kind byte written for this record.
    #[must_use]
    pub fn kind(&self) -> u8 {
        let kind = match self {
            CustomDebugRecord::UsingInfo(_) => CustomDebugRecordKind::UsingInfo,
            CustomDebugRecord::Forward(_) => CustomDebugRecordKind::ForwardInfo,
            CustomDebugRecord::ForwardToModule(_) => CustomDebugRecordKind::ForwardToModuleInfo,
            CustomDebugRecord::HoistedLocalScopes(_) => {
                CustomDebugRecordKind::StateMachineHoistedLocalScopes
            }
            CustomDebugRecord::ForwardIterator(_) => CustomDebugRecordKind::ForwardIterator,
            CustomDebugRecord::LocalSlotMap(_) => CustomDebugRecordKind::EditAndContinueLocalSlotMap,
            CustomDebugRecord::LambdaMap(_) => CustomDebugRecordKind::EditAndContinueLambdaMap,
            CustomDebugRecord::Unknown { kind, .. } => return *kind,
        };
        kind as u8
    }
}

/// The custom debug information of one routine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomDebugInfo {
    /// Records in emission order
    pub records: Vec<CustomDebugRecord>,
}

impl CustomDebugInfo {
    /// Returns `true` if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The using counts, if the routine owns its import chain.
    #[must_use]
    pub fn using_counts(&self) -> Option<&[u16]> {
        self.records.iter().find_map(|record| match record {
            CustomDebugRecord::UsingInfo(counts) => Some(counts.as_slice()),
            _ => None,
        })
    }

    /// The routine this one forwards its imports to.
    #[must_use]
    pub fn forward(&self) -> Option<Token> {
        self.records.iter().find_map(|record| match record {
            CustomDebugRecord::Forward(token) => Some(*token),
            _ => None,
        })
    }

    /// The routine this one takes its module-level imports from.
    #[must_use]
    pub fn forward_to_module(&self) -> Option<Token> {
        self.records.iter().find_map(|record| match record {
            CustomDebugRecord::ForwardToModule(token) => Some(*token),
            _ => None,
        })
    }

    /// The hoisted local scopes, if the routine is a state machine `MoveNext`.
    #[must_use]
    pub fn hoisted_local_scopes(&self) -> Option<&[HoistedLocalScope]> {
        self.records.iter().find_map(|record| match record {
            CustomDebugRecord::HoistedLocalScopes(scopes) => Some(scopes.as_slice()),
            _ => None,
        })
    }

    /// The state machine type the routine forwards to.
    #[must_use]
    pub fn forward_iterator(&self) -> Option<&str> {
        self.records.iter().find_map(|record| match record {
            CustomDebugRecord::ForwardIterator(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The local slot map, if present.
    #[must_use]
    pub fn slot_map(&self) -> Option<&LocalSlotMap> {
        self.records.iter().find_map(|record| match record {
            CustomDebugRecord::LocalSlotMap(map) => Some(map),
            _ => None,
        })
    }

    /// The lambda map, if present.
    #[must_use]
    pub fn lambda_map(&self) -> Option<&LambdaMap> {
        self.records.iter().find_map(|record| match record {
            CustomDebugRecord::LambdaMap(map) => Some(map),
            _ => None,
        })
    }
}
