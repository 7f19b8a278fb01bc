//! Emitter output and the source content seam.

use std::collections::BTreeMap;

use crate::{
    debuginfo::{
        customdebuginformation::CustomDebugKind, diagnostics::Diagnostics, document::DocumentTable,
        token::Token,
    },
    Result,
};

/// Supplies document content and Source Link JSON while a stream is emitted.
///
/// Any error returned here aborts the whole emission with [`crate::Error::EmitFailure`].
pub trait SourceProvider: Sync {
    /// Content of the document at `path`, or `None` if it is not available.
    ///
    /// # Errors
    /// Returns an error if the content exists but could not be read.
    fn content(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Source Link JSON for the compilation, or `None` if there is none.
    ///
    /// # Errors
    /// Returns an error if the JSON exists but could not be produced.
    fn source_link(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// A provider with no content, producing documents without checksums.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSources;

impl SourceProvider for NoSources {
    fn content(&self, _path: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// A provider serving documents and Source Link from memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    files: BTreeMap<String, Vec<u8>>,
    source_link: Option<String>,
}

impl MemorySources {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Set the Source Link JSON.
    #[must_use]
    pub fn with_source_link(mut self, json: impl Into<String>) -> Self {
        self.source_link = Some(json.into());
        self
    }
}

impl SourceProvider for MemorySources {
    fn content(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.get(path).cloned())
    }

    fn source_link(&self) -> Result<Option<String>> {
        Ok(self.source_link.clone())
    }
}

/// Where a routine's import chain lives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImportsRecord {
    /// The routine has no imports
    #[default]
    None,
    /// The routine owns the chain; the encoded chain blob
    Chain(Vec<u8>),
    /// An identical chain is carried by this routine
    Forward(Token),
}

/// The encoded debug information of one routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDebugRecord {
    /// `MethodDef` token
    pub token: Token,
    /// Full name of the declaring type
    pub declaring_type: String,
    /// Routine name
    pub name: String,
    /// Parameter names in declaration order
    pub parameters: Vec<String>,
    /// Ordinal within the declaring type, for routines with lambdas
    pub method_ordinal: Option<u32>,
    /// `StandAloneSig` row of the local signature
    pub local_signature: u32,
    /// The first sequence point is hidden
    pub starts_hidden: bool,
    /// Sequence point blob, empty if the routine has no points
    pub sequence_points: Vec<u8>,
    /// Scope blob
    pub scopes: Vec<u8>,
    /// Import chain blob or forward
    pub imports: ImportsRecord,
    /// Custom debug information container, empty if there are no records
    pub custom_debug_info: Vec<u8>,
}

/// A stream-wide blob identified by its [`CustomDebugKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamBlob {
    /// What the blob holds
    pub kind: CustomDebugKind,
    /// Document the blob belongs to, `None` for the whole compilation
    pub document: Option<u32>,
    /// Raw content
    pub data: Vec<u8>,
}

/// The complete debug information of a compilation.
#[derive(Debug, Default)]
pub struct DebugInfoStream {
    /// Source documents
    pub documents: DocumentTable,
    /// One record per routine, in registration order
    pub methods: Vec<MethodDebugRecord>,
    /// Source Link and embedded sources
    pub blobs: Vec<StreamBlob>,
    /// Warnings raised while emitting, in routine order
    pub diagnostics: Diagnostics,
}

impl DebugInfoStream {
    /// The record of routine `token`.
    #[must_use]
    pub fn method(&self, token: Token) -> Option<&MethodDebugRecord> {
        self.methods.iter().find(|method| method.token == token)
    }

    /// The Source Link JSON, if one was emitted.
    #[must_use]
    pub fn source_link(&self) -> Option<&[u8]> {
        self.blobs
            .iter()
            .find(|blob| blob.kind == CustomDebugKind::SourceLink)
            .map(|blob| blob.data.as_slice())
    }

    /// The embedded content of `document`, without the format prefix.
    #[must_use]
    pub fn embedded_source(&self, document: u32) -> Option<&[u8]> {
        self.blobs
            .iter()
            .find(|blob| {
                blob.kind == CustomDebugKind::EmbeddedSource && blob.document == Some(document)
            })
            .and_then(|blob| blob.data.get(4..))
    }
}

/// Wrap document content in the embedded source format: an `i32` format of 0 meaning
/// uncompressed, followed by the content.
#[must_use]
pub fn embedded_source_blob(content: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(content.len() + 4);
    blob.extend_from_slice(&0_i32.to_le_bytes());
    blob.extend_from_slice(content);
    blob
}
