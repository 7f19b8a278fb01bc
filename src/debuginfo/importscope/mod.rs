//! Import chains and their forwarding between routines.
//!
//! A routine sees the `using` directives and extern aliases of every namespace it is
//! nested in. The emitter records them as an [`ImportChain`]: one [`ImportLevel`] per
//! lexical nesting level, innermost first. Many routines share the same chain, so only the
//! first routine with a given chain carries it; the others forward to it.
//!
//! # Import Strings
//!
//! | Import                        | String                      |
//! |-------------------------------|-----------------------------|
//! | `using System;`               | `USystem`                   |
//! | `using IO = System.IO;`       | `AIO USystem.IO`            |
//! | `using Chr = System.Char;`    | `AChr TSystem.Char, ...`    |
//! | `using static System.Math;`   | `TSystem.Math`              |
//! | `extern alias P;`             | `XP`                        |
//! | assembly behind alias `P`     | `ZP <assembly display name>`|
//!
//! Within a level, extern aliases come first, then the other imports in declaration order,
//! then extern assembly information.
//!
//! # Blob Format
//!
//! ```text
//! Version (u8) = 1
//! LevelCount (uint)
//! per level: ItemCount (uint), ItemCount x import string (uint length + UTF-8)
//! ```

pub mod encoder;
pub mod parser;
pub mod table;
pub mod types;

pub use encoder::encode_import_chain;
pub use parser::parse_import_chain;
pub use table::{ChainOwnership, ImportChainTable};
pub use types::{ImportChain, ImportItem, ImportKind, ImportLevel};

/// Version byte leading every import chain blob.
pub const IMPORT_BLOB_VERSION: u8 = 1;
