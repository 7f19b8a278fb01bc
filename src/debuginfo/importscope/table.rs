//! Interning of structurally identical import chains.

use dashmap::{mapref::entry::Entry, DashMap};

use crate::debuginfo::{importscope::types::ImportChain, token::Token};

/// How a routine refers to its import chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOwnership {
    /// The routine is the first to use the chain and carries it
    Owner,
    /// The routine forwards to the routine that carries an identical chain
    Forward(Token),
}

/// Maps every distinct import chain to the first routine that used it.
///
/// Chains are compared structurally, levels and items in emission order. The first
/// routine to [`intern`](ImportChainTable::intern) a chain becomes its owner, so callers
/// intern in routine order to keep ownership deterministic.
#[derive(Debug, Default)]
pub struct ImportChainTable {
    owners: DashMap<ImportChain, Token>,
}

impl ImportChainTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        ImportChainTable {
            owners: DashMap::new(),
        }
    }

    /// Register `token` as a user of `chain`.
    pub fn intern(&self, chain: &ImportChain, token: Token) -> ChainOwnership {
        match self.owners.entry(chain.clone()) {
            Entry::Occupied(entry) if *entry.get() != token => {
                ChainOwnership::Forward(*entry.get())
            }
            Entry::Occupied(_) => ChainOwnership::Owner,
            Entry::Vacant(entry) => {
                entry.insert(token);
                ChainOwnership::Owner
            }
        }
    }

    /// The routine that owns `chain`, if any routine interned it.
    #[must_use]
    pub fn owner_of(&self, chain: &ImportChain) -> Option<Token> {
        self.owners.get(chain).map(|owner| *owner)
    }

    /// Number of distinct chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns `true` if nothing was interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::importscope::types::{ImportItem, ImportLevel};

    fn chain(namespace: &str) -> ImportChain {
        ImportChain::new(vec![ImportLevel::new(vec![ImportItem::namespace(namespace)])])
    }

    #[test]
    fn first_user_owns() {
        let table = ImportChainTable::new();

        assert_eq!(table.intern(&chain("System"), Token::method_def(1)), ChainOwnership::Owner);
        assert_eq!(
            table.intern(&chain("System"), Token::method_def(2)),
            ChainOwnership::Forward(Token::method_def(1))
        );
        assert_eq!(table.intern(&chain("System.IO"), Token::method_def(3)), ChainOwnership::Owner);
        assert_eq!(table.len(), 2);
        assert_eq!(table.owner_of(&chain("System")), Some(Token::method_def(1)));
    }

    #[test]
    fn reinterning_owner() {
        let table = ImportChainTable::new();
        table.intern(&chain("System"), Token::method_def(1));
        assert_eq!(table.intern(&chain("System"), Token::method_def(1)), ChainOwnership::Owner);
    }

    #[test]
    fn level_boundaries_matter() {
        let table = ImportChainTable::new();
        let flat = ImportChain::new(vec![ImportLevel::new(vec![
            ImportItem::namespace("A"),
            ImportItem::namespace("B"),
        ])]);
        let nested = ImportChain::new(vec![
            ImportLevel::new(vec![ImportItem::namespace("A")]),
            ImportLevel::new(vec![ImportItem::namespace("B")]),
        ]);

        table.intern(&flat, Token::method_def(1));
        assert_eq!(table.intern(&nested, Token::method_def(2)), ChainOwnership::Owner);
    }
}
