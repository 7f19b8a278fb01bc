//! Emission options
//!
//! Controls what the [`crate::emit::Emitter`] writes and how it schedules the work. The
//! binary output never depends on [`EmitOptions::parallel`]; it only trades throughput
//! against a single-threaded, easier to trace build.

use crate::debuginfo::{document::ChecksumAlgorithm, MAX_NAME_LENGTH};

/// Configuration for debug information emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EmitOptions {
    /// Longest import string kept in an import chain; longer ones are dropped with a warning
    pub max_import_name_length: usize,

    /// Longest local name kept in a scope; longer ones are dropped with a warning
    pub max_local_name_length: usize,

    /// Drop non-root scopes that declare no locals and have no children
    pub prune_empty_scopes: bool,

    /// Write local slot maps and lambda maps for Edit-and-Continue
    pub emit_edit_and_continue: bool,

    /// Algorithm for document checksums
    pub checksum_algorithm: ChecksumAlgorithm,

    /// Ask the source provider for Source Link JSON
    pub emit_source_link: bool,

    /// Ask the source provider for document content to embed
    pub embed_sources: bool,

    /// Build routines on the rayon thread pool
    pub parallel: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            max_import_name_length: MAX_NAME_LENGTH,
            max_local_name_length: MAX_NAME_LENGTH,
            prune_empty_scopes: true,
            emit_edit_and_continue: true,
            checksum_algorithm: ChecksumAlgorithm::Sha1,
            emit_source_link: true,
            embed_sources: false,
            parallel: true,
        }
    }
}

impl EmitOptions {
    /// Creates a configuration writing only what a debugger needs to step and inspect
    ///
    /// No Edit-and-Continue maps, no Source Link, no embedded sources.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            emit_edit_and_continue: false,
            emit_source_link: false,
            embed_sources: false,
            ..Self::default()
        }
    }

    /// Creates a configuration building routines one after another on the calling thread
    ///
    /// Produces the same bytes as [`EmitOptions::default`], useful when tracing the
    /// emitter or when the caller already parallelizes across compilations.
    #[must_use]
    pub fn deterministic() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Creates a configuration that also embeds every document's content
    #[must_use]
    pub fn portable() -> Self {
        Self {
            embed_sources: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let default = EmitOptions::default();
        assert_eq!(default.max_import_name_length, 2046);
        assert_eq!(default.max_local_name_length, 2046);
        assert!(default.prune_empty_scopes);
        assert!(default.emit_edit_and_continue);
        assert!(default.parallel);
        assert!(!default.embed_sources);

        let minimal = EmitOptions::minimal();
        assert!(!minimal.emit_edit_and_continue);
        assert!(!minimal.emit_source_link);
        assert!(minimal.parallel);

        let deterministic = EmitOptions::deterministic();
        assert!(!deterministic.parallel);
        assert_eq!(
            EmitOptions {
                parallel: true,
                ..deterministic
            },
            default
        );

        assert!(EmitOptions::portable().embed_sources);
    }
}
