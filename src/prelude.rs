//! # symscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the symscope library. Import this module to get quick access to the emitter, the
//! record builders and the verification helpers.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all symscope operations
pub use crate::Error;

/// The result type used throughout symscope
pub use crate::Result;

/// Non-fatal issues collected while emitting
pub use crate::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

/// Low-level blob cursor
pub use crate::Parser;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Debug information emission
pub use crate::emit::{
    BlockEvent, ClosureEvent, DebugInfoStream, EmitOptions, Emitter, ImportsRecord,
    LambdaEvent, MethodDebugRecord, OrdinalAllocator, RoutineBody, SequenceMark, StreamBlob,
};

/// Source content access during emission
pub use crate::emit::{MemorySources, NoSources, SourceProvider};

// ================================================================================================
// Shared Vocabulary
// ================================================================================================

/// Metadata tokens and source locations
pub use crate::debuginfo::{span::SourceSpan, token::Token, MAX_NAME_LENGTH};

/// Documents and checksums
pub use crate::debuginfo::document::{ChecksumAlgorithm, Document, DocumentTable};

// ================================================================================================
// Debug Records
// ================================================================================================

/// Sequence points
pub use crate::debuginfo::sequencepoints::{SequencePoint, SequencePointBuilder, SequencePoints};

/// Lexical scopes and locals
pub use crate::debuginfo::scope::{
    ConstantValue, LocalAttributes, LocalBinding, LocalConstant, Scope, ScopeKind, ScopeTree,
    ScopeTreeBuilder,
};

/// Closure and lambda maps
pub use crate::debuginfo::lambdamap::{
    ClosureInfo, LambdaClosure, LambdaInfo, LambdaMap, LambdaMapBuilder,
};

/// Local slot maps
pub use crate::debuginfo::slotmap::{LocalSlot, LocalSlotMap, SlotKind, SynthesizedLocalKind};

/// Import chains
pub use crate::debuginfo::importscope::{
    ChainOwnership, ImportChain, ImportChainTable, ImportItem, ImportKind, ImportLevel,
};

/// Custom debug information container
pub use crate::debuginfo::customdebuginformation::{
    CustomDebugInfo, CustomDebugKind, CustomDebugRecord, CustomDebugRecordKind, HoistedLocalScope,
};

// ================================================================================================
// Verification
// ================================================================================================

/// Decoding and XML rendering
pub use crate::verify::{MethodImports, MethodSymbols, SymbolReader, Symbols};

/// Structural comparison of symbol dumps
pub use crate::verify::{assert_symbols_eq, diff_xml, XmlDifference};
