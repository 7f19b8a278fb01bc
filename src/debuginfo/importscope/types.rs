//! Type definitions for import chains.
//!
//! See the parent module [`crate::debuginfo::importscope`] for the string and blob formats.

use std::fmt;

use strum::Display;

use crate::Result;

/// Discriminant of an [`ImportItem`], in the order items are emitted within a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum ImportKind {
    /// `extern alias P;`
    ExternAlias,
    /// `using System;`
    Namespace,
    /// `using IO = System.IO;`
    NamespaceAlias,
    /// `using Chr = System.Char;`
    TypeAlias,
    /// `using static System.Math;`
    Type,
    /// Identity of the assembly behind an extern alias
    ExternInfo,
}

impl ImportKind {
    /// Position of this kind within a level: extern aliases, then regular imports, then
    /// extern assembly information.
    #[must_use]
    pub fn level_rank(&self) -> u8 {
        match self {
            ImportKind::ExternAlias => 0,
            ImportKind::ExternInfo => 2,
            _ => 1,
        }
    }
}

/// One import visible to a routine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportItem {
    /// Imports all types of a namespace
    Namespace {
        /// Fully qualified namespace
        namespace: String,
    },
    /// Binds an alias to a namespace
    NamespaceAlias {
        /// The alias
        alias: String,
        /// Fully qualified namespace
        namespace: String,
    },
    /// Binds an alias to a type
    TypeAlias {
        /// The alias
        alias: String,
        /// Assembly-qualified type name
        type_name: String,
    },
    /// Imports the static members of a type
    Type {
        /// Assembly-qualified type name
        type_name: String,
    },
    /// Makes an extern alias available
    ExternAlias {
        /// The alias
        alias: String,
    },
    /// Names the assembly an extern alias refers to
    ExternInfo {
        /// The alias
        alias: String,
        /// Display name of the assembly
        assembly: String,
    },
}

impl ImportItem {
    /// Shorthand for [`ImportItem::Namespace`].
    pub fn namespace(namespace: impl Into<String>) -> Self {
        ImportItem::Namespace {
            namespace: namespace.into(),
        }
    }

    /// Shorthand for [`ImportItem::NamespaceAlias`].
    pub fn namespace_alias(alias: impl Into<String>, namespace: impl Into<String>) -> Self {
        ImportItem::NamespaceAlias {
            alias: alias.into(),
            namespace: namespace.into(),
        }
    }

    /// Shorthand for [`ImportItem::TypeAlias`].
    pub fn type_alias(alias: impl Into<String>, type_name: impl Into<String>) -> Self {
        ImportItem::TypeAlias {
            alias: alias.into(),
            type_name: type_name.into(),
        }
    }

    /// Shorthand for [`ImportItem::Type`].
    pub fn static_type(type_name: impl Into<String>) -> Self {
        ImportItem::Type {
            type_name: type_name.into(),
        }
    }

    /// Shorthand for [`ImportItem::ExternAlias`].
    pub fn extern_alias(alias: impl Into<String>) -> Self {
        ImportItem::ExternAlias {
            alias: alias.into(),
        }
    }

    /// Shorthand for [`ImportItem::ExternInfo`].
    pub fn extern_info(alias: impl Into<String>, assembly: impl Into<String>) -> Self {
        ImportItem::ExternInfo {
            alias: alias.into(),
            assembly: assembly.into(),
        }
    }

    /// The kind of this item.
    #[must_use]
    pub fn kind(&self) -> ImportKind {
        match self {
            ImportItem::Namespace { .. } => ImportKind::Namespace,
            ImportItem::NamespaceAlias { .. } => ImportKind::NamespaceAlias,
            ImportItem::TypeAlias { .. } => ImportKind::TypeAlias,
            ImportItem::Type { .. } => ImportKind::Type,
            ImportItem::ExternAlias { .. } => ImportKind::ExternAlias,
            ImportItem::ExternInfo { .. } => ImportKind::ExternInfo,
        }
    }

    /// The import string stored in the blob.
    #[must_use]
    pub fn to_import_string(&self) -> String {
        match self {
            ImportItem::Namespace { namespace } => format!("U{namespace}"),
            ImportItem::NamespaceAlias { alias, namespace } => format!("A{alias} U{namespace}"),
            ImportItem::TypeAlias { alias, type_name } => format!("A{alias} T{type_name}"),
            ImportItem::Type { type_name } => format!("T{type_name}"),
            ImportItem::ExternAlias { alias } => format!("X{alias}"),
            ImportItem::ExternInfo { alias, assembly } => format!("Z{alias} {assembly}"),
        }
    }

    /// Parse an import string.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an unknown prefix or a missing separator.
    pub fn parse_import_string(value: &str) -> Result<Self> {
        let mut chars = value.chars();
        let prefix = chars.next();
        let rest = chars.as_str();

        match prefix {
            Some('U') => Ok(ImportItem::namespace(rest)),
            Some('T') => Ok(ImportItem::static_type(rest)),
            Some('X') => Ok(ImportItem::extern_alias(rest)),
            Some('A') => {
                let (alias, target) = rest
                    .split_once(' ')
                    .ok_or_else(|| malformed_error!("Alias import without target: {}", value))?;
                match target.split_at_checked(1) {
                    Some(("U", namespace)) => Ok(ImportItem::namespace_alias(alias, namespace)),
                    Some(("T", type_name)) => Ok(ImportItem::type_alias(alias, type_name)),
                    _ => Err(malformed_error!("Unknown alias target: {}", value)),
                }
            }
            Some('Z') => {
                let (alias, assembly) = rest
                    .split_once(' ')
                    .ok_or_else(|| malformed_error!("Extern info without assembly: {}", value))?;
                Ok(ImportItem::extern_info(alias, assembly))
            }
            _ => Err(malformed_error!("Unknown import string: {}", value)),
        }
    }
}

impl fmt::Display for ImportItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_import_string())
    }
}

/// The imports of one lexical nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ImportLevel {
    /// Items of this level
    pub items: Vec<ImportItem>,
}

impl ImportLevel {
    /// Create a level from items in declaration order.
    #[must_use]
    pub fn new(items: Vec<ImportItem>) -> Self {
        ImportLevel { items }
    }

    /// Number of items, the level's using count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the level imports nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reorder items into emission order, keeping declaration order within each group.
    pub fn canonicalize(&mut self) {
        self.items.sort_by_key(|item| item.kind().level_rank());
    }
}

/// The import chain of a routine, innermost level first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ImportChain {
    /// Levels from the innermost namespace outwards
    pub levels: Vec<ImportLevel>,
}

impl ImportChain {
    /// Create a chain from levels, innermost first.
    #[must_use]
    pub fn new(levels: Vec<ImportLevel>) -> Self {
        ImportChain { levels }
    }

    /// Returns `true` if the chain has no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The using count of every level, innermost first.
    #[must_use]
    pub fn using_counts(&self) -> Vec<usize> {
        self.levels.iter().map(ImportLevel::len).collect()
    }

    /// All items, innermost level first.
    pub fn items(&self) -> impl Iterator<Item = &ImportItem> {
        self.levels.iter().flat_map(|level| level.items.iter())
    }

    /// Bring every level into emission order.
    pub fn canonicalize(&mut self) {
        for level in &mut self.levels {
            level.canonicalize();
        }
    }

    /// Remove items whose import string is longer than `limit` UTF-8 bytes.
    ///
    /// Returns the removed import strings; the levels stay in place even when emptied.
    pub fn drop_long_imports(&mut self, limit: usize) -> Vec<String> {
        let mut dropped = Vec::new();
        for level in &mut self.levels {
            level.items.retain(|item| {
                let import = item.to_import_string();
                if import.len() > limit {
                    dropped.push(import);
                    false
                } else {
                    true
                }
            });
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_strings() {
        let cases = [
            (ImportItem::namespace("System"), "USystem"),
            (ImportItem::namespace_alias("IO", "System.IO"), "AIO USystem.IO"),
            (ImportItem::type_alias("Chr", "System.Char, mscorlib"), "AChr TSystem.Char, mscorlib"),
            (ImportItem::static_type("System.Math"), "TSystem.Math"),
            (ImportItem::extern_alias("P"), "XP"),
            (
                ImportItem::extern_info("P", "a, Version=0.0.0.0, Culture=neutral"),
                "ZP a, Version=0.0.0.0, Culture=neutral",
            ),
        ];

        for (item, string) in cases {
            assert_eq!(item.to_import_string(), string);
            assert_eq!(ImportItem::parse_import_string(string).unwrap(), item);
        }
    }

    #[test]
    fn invalid_import_strings() {
        assert!(ImportItem::parse_import_string("").is_err());
        assert!(ImportItem::parse_import_string("QSystem").is_err());
        assert!(ImportItem::parse_import_string("AIO").is_err());
        assert!(ImportItem::parse_import_string("AIO XSystem").is_err());
        assert!(ImportItem::parse_import_string("ZP").is_err());
    }

    #[test]
    fn level_order() {
        let mut level = ImportLevel::new(vec![
            ImportItem::extern_info("Q", "b"),
            ImportItem::namespace("System"),
            ImportItem::extern_alias("Q"),
            ImportItem::namespace_alias("AU1", "System"),
            ImportItem::extern_info("P", "a"),
            ImportItem::extern_alias("P"),
        ]);
        level.canonicalize();

        let strings: Vec<_> = level.items.iter().map(ImportItem::to_import_string).collect();
        assert_eq!(strings, ["XQ", "XP", "USystem", "AAU1 USystem", "ZQ b", "ZP a"]);
    }

    #[test]
    fn drop_long() {
        let mut chain = ImportChain::new(vec![
            ImportLevel::new(vec![ImportItem::namespace("N".repeat(10))]),
            ImportLevel::new(vec![ImportItem::namespace("System")]),
        ]);

        let dropped = chain.drop_long_imports(8);
        assert_eq!(dropped.len(), 1);
        assert_eq!(chain.using_counts(), [0, 1]);
    }
}
