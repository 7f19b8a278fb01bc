//! Source documents referenced by sequence points.
//!
//! Every [`crate::debuginfo::span::SourceSpan`] names its document by a 1-based id into a
//! [`DocumentTable`]. Each document carries its path, the language GUID and a checksum
//! debuggers use to verify that the file on disk matches what was compiled.
//!
//! # Blob Format
//!
//! ```text
//! Version (u8) = 1
//! DocumentCount (uint)
//! per document: Path (uint length + UTF-8), Language (GUID), HashAlgorithm (GUID),
//!               ChecksumLength (uint), Checksum bytes
//! ```
//!
//! A document without checksum stores the nil GUID as hash algorithm and a zero length.

use std::collections::HashMap;

use md5::Md5;
use sha1::{Digest, Sha1};
use strum::{Display, EnumIter};
use uguid::{guid, Guid};

use crate::{
    file::parser::Parser,
    utils::compressed::{write_compressed_uint, write_prefixed_string_utf8},
    Error, Result,
};

/// Version byte leading a document table blob.
pub const DOCUMENT_BLOB_VERSION: u8 = 1;

/// Language GUID of C# documents.
pub const CSHARP_LANGUAGE: Guid = guid!("3f5162f8-07c6-11d3-9053-00c04fa302a1");

/// Algorithm used for document checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum ChecksumAlgorithm {
    /// SHA-1, 20 bytes
    #[default]
    Sha1,
    /// MD5, 16 bytes
    Md5,
}

impl ChecksumAlgorithm {
    const SHA1: Guid = guid!("ff1816ec-aa5e-4d10-87f7-6f4963833460");
    const MD5: Guid = guid!("406ea660-64cf-4c82-b6f0-42d48172a799");

    /// The GUID identifying this algorithm.
    #[must_use]
    pub fn guid(&self) -> Guid {
        match self {
            ChecksumAlgorithm::Sha1 => Self::SHA1,
            ChecksumAlgorithm::Md5 => Self::MD5,
        }
    }

    /// The algorithm a GUID identifies, if known.
    #[must_use]
    pub fn from_guid(guid: Guid) -> Option<Self> {
        match guid {
            Self::SHA1 => Some(ChecksumAlgorithm::Sha1),
            Self::MD5 => Some(ChecksumAlgorithm::Md5),
            _ => None,
        }
    }

    /// Hash `content` with this algorithm.
    #[must_use]
    pub fn compute(&self, content: &[u8]) -> Vec<u8> {
        match self {
            ChecksumAlgorithm::Sha1 => {
                let mut hasher = Sha1::new();
                hasher.update(content);
                hasher.finalize().to_vec()
            }
            ChecksumAlgorithm::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(content);
                hasher.finalize().to_vec()
            }
        }
    }
}

/// One source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// 1-based id used by sequence points
    pub id: u32,
    /// Path as passed to the compiler
    pub path: String,
    /// Source language
    pub language: Guid,
    /// Checksum algorithm, nil if there is no checksum
    pub hash_algorithm: Guid,
    /// Checksum of the content
    pub checksum: Vec<u8>,
}

impl Document {
    /// The checksum algorithm, if it is a known one.
    #[must_use]
    pub fn algorithm(&self) -> Option<ChecksumAlgorithm> {
        ChecksumAlgorithm::from_guid(self.hash_algorithm)
    }

    /// The checksum as lowercase hex.
    #[must_use]
    pub fn checksum_hex(&self) -> String {
        self.checksum.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Deduplicated, ordered table of source documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTable {
    documents: Vec<Document>,
    by_path: HashMap<String, u32>,
}

impl DocumentTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document and return its id.
    ///
    /// A path that is already registered keeps its id and original checksum. Without
    /// content the document gets no checksum.
    pub fn add(
        &mut self,
        path: impl Into<String>,
        content: Option<&[u8]>,
        algorithm: ChecksumAlgorithm,
    ) -> u32 {
        let path = path.into();
        if let Some(id) = self.by_path.get(&path) {
            return *id;
        }

        let (hash_algorithm, checksum) = match content {
            Some(content) => (algorithm.guid(), algorithm.compute(content)),
            None => (Guid::ZERO, Vec::new()),
        };
        self.push(Document {
            id: 0,
            path,
            language: CSHARP_LANGUAGE,
            hash_algorithm,
            checksum,
        })
    }

    fn push(&mut self, mut document: Document) -> u32 {
        let id = self.documents.len() as u32 + 1;
        document.id = id;
        self.by_path.insert(document.path.clone(), id);
        self.documents.push(document);
        id
    }

    /// Look up a document by id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Document> {
        id.checked_sub(1)
            .and_then(|index| self.documents.get(index as usize))
    }

    /// Look up a document by path.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Document> {
        self.by_path.get(path).and_then(|id| self.get(*id))
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no document is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    /// Encode the table.
    ///
    /// # Errors
    /// Returns [`Error::ValueOutOfRange`] if a length does not fit a compressed integer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut blob = vec![DOCUMENT_BLOB_VERSION];
        write_compressed_uint(to_uint(self.documents.len())?, &mut blob)?;

        for document in &self.documents {
            write_prefixed_string_utf8(&document.path, &mut blob)?;
            blob.extend_from_slice(&document.language.to_bytes());
            blob.extend_from_slice(&document.hash_algorithm.to_bytes());
            write_compressed_uint(to_uint(document.checksum.len())?, &mut blob)?;
            blob.extend_from_slice(&document.checksum);
        }

        Ok(blob)
    }

    /// Decode a table produced by [`DocumentTable::encode`].
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] for truncated blobs and [`Error::Malformed`] for an
    /// unknown version, duplicate paths or trailing data.
    pub fn parse(blob: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(blob);

        let version = parser.read_le::<u8>()?;
        if version != DOCUMENT_BLOB_VERSION {
            return Err(malformed_error!("Unsupported document blob version {}", version));
        }

        let count = parser.read_compressed_uint()?;
        let mut table = DocumentTable::new();
        for _ in 0..count {
            let path = parser.read_prefixed_string_utf8()?;
            let language = parser.read_guid()?;
            let hash_algorithm = parser.read_guid()?;
            let checksum_length = parser.read_compressed_uint()? as usize;
            let checksum = parser.read_bytes(checksum_length)?.to_vec();

            if table.by_path.contains_key(&path) {
                return Err(malformed_error!("Duplicate document {}", path));
            }
            table.push(Document {
                id: 0,
                path,
                language,
                hash_algorithm,
                checksum,
            });
        }

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after document table",
                parser.remaining()
            ));
        }

        Ok(table)
    }
}

impl<'a> IntoIterator for &'a DocumentTable {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

fn to_uint(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ValueOutOfRange(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn ids_are_dense_and_deduplicated() {
        let mut table = DocumentTable::new();

        assert_eq!(table.add("a.cs", Some(b"class A {}"), ChecksumAlgorithm::Sha1), 1);
        assert_eq!(table.add("b.cs", None, ChecksumAlgorithm::Sha1), 2);
        assert_eq!(table.add("a.cs", Some(b"changed"), ChecksumAlgorithm::Md5), 1);

        assert_eq!(table.len(), 2);
        assert_eq!(table.find("b.cs").map(|d| d.id), Some(2));
        assert!(table.get(0).is_none());
        assert!(table.get(3).is_none());
        assert_eq!(
            table.get(1).and_then(Document::algorithm),
            Some(ChecksumAlgorithm::Sha1)
        );
        assert_eq!(table.get(2).and_then(Document::algorithm), None);
    }

    #[test]
    fn known_checksums() {
        let sha1 = ChecksumAlgorithm::Sha1.compute(b"abc");
        assert_eq!(sha1.len(), 20);
        assert_eq!(sha1[..4], [0xa9, 0x99, 0x3e, 0x36]);

        let md5 = ChecksumAlgorithm::Md5.compute(b"abc");
        assert_eq!(md5.len(), 16);
        assert_eq!(md5[..4], [0x90, 0x01, 0x50, 0x98]);
    }

    #[test]
    fn algorithm_guids() {
        for algorithm in ChecksumAlgorithm::iter() {
            assert_eq!(ChecksumAlgorithm::from_guid(algorithm.guid()), Some(algorithm));
        }
        assert_eq!(ChecksumAlgorithm::from_guid(Guid::ZERO), None);
    }

    #[test]
    fn roundtrip() {
        let mut table = DocumentTable::new();
        table.add("src/Program.cs", Some(b"class P {}"), ChecksumAlgorithm::Sha1);
        table.add("src/Other.cs", Some(b"class O {}"), ChecksumAlgorithm::Md5);
        table.add("generated.cs", None, ChecksumAlgorithm::Sha1);

        let parsed = DocumentTable::parse(&table.encode().unwrap()).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(parsed.find("src/Other.cs").map(|d| d.checksum.len()), Some(16));
    }

    #[test]
    fn duplicate_path_rejected() {
        let mut table = DocumentTable::new();
        table.add("a.cs", None, ChecksumAlgorithm::Sha1);
        let mut blob = table.encode().unwrap();
        blob[1] = 2;
        blob.extend_from_slice(&blob.clone()[2..]);

        assert!(DocumentTable::parse(&blob).is_err());
    }
}
