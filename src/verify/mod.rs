//! Verification of emitted debug information.
//!
//! [`SymbolReader`] decodes every blob of a [`crate::emit::DebugInfoStream`] on its own and
//! renders the result as a `<symbols>` XML dump: documents, sequence points, scopes with
//! their locals and imports, and the custom debug information records. [`diff_xml`] and
//! [`assert_symbols_eq`] compare such dumps structurally, so tests can state the expected
//! output as readable XML.

pub mod diff;
pub mod reader;
pub mod xml;

pub use diff::{assert_symbols_eq, diff_xml, XmlDifference};
pub use reader::{DocumentSymbols, MethodImports, MethodSymbols, SymbolReader, Symbols};
pub use xml::XmlNode;
