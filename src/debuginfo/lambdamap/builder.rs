//! Construction of [`LambdaMap`]s with capture resolution.

use crate::{
    debuginfo::{
        lambdamap::types::{ClosureInfo, LambdaClosure, LambdaInfo, LambdaMap},
        token::Token,
    },
    Error, Result,
};

/// Records closures and lambdas in the order lowering discovers them.
///
/// Closure indices are handed out in registration order. A closure may name a parent that
/// is only registered later, and a lambda may name a closure not registered yet; all
/// references are resolved when [`build`](LambdaMapBuilder::build) is called. Lambdas are
/// never merged, even when two share a syntax offset.
///
/// # Examples
///
/// ```rust
/// use symscope::debuginfo::{
///     lambdamap::{builder::LambdaMapBuilder, types::LambdaClosure},
///     token::Token,
/// };
///
/// let mut builder = LambdaMapBuilder::new(Token::method_def(2), 1);
/// let outer = builder.add_closure(0, None);
/// let inner = builder.add_closure(56, Some(outer));
/// builder.add_lambda(56, LambdaClosure::Closure(outer));
/// builder.add_lambda(122, LambdaClosure::Closure(inner));
///
/// let map = builder.build()?;
/// assert_eq!(map.closures.len(), 2);
/// assert_eq!(map.lambdas[1].closure, LambdaClosure::Closure(1));
/// # Ok::<(), symscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct LambdaMapBuilder {
    token: Token,
    method_ordinal: u32,
    closures: Vec<ClosureInfo>,
    lambdas: Vec<LambdaInfo>,
}

impl LambdaMapBuilder {
    /// Create a builder for routine `token` with the given per-type ordinal.
    #[must_use]
    pub fn new(token: Token, method_ordinal: u32) -> Self {
        LambdaMapBuilder {
            token,
            method_ordinal,
            closures: Vec::new(),
            lambdas: Vec::new(),
        }
    }

    /// Register a closure and return its index.
    pub fn add_closure(&mut self, syntax_offset: i32, parent: Option<u32>) -> u32 {
        self.closures.push(ClosureInfo {
            syntax_offset,
            parent,
        });
        index_of(self.closures.len())
    }

    /// Register a lambda and return its index.
    pub fn add_lambda(&mut self, syntax_offset: i32, closure: LambdaClosure) -> u32 {
        self.lambdas.push(LambdaInfo {
            syntax_offset,
            closure,
        });
        index_of(self.lambdas.len())
    }

    /// Resolve all closure references and return the map.
    ///
    /// # Errors
    /// Returns [`Error::UnresolvedCapture`] if a lambda or a closure parent names a closure
    /// index that was never registered, and [`Error::Malformed`] if closure parents form a
    /// cycle.
    pub fn build(self) -> Result<LambdaMap> {
        let count = self.closures.len();
        let resolve = |index: u32| -> Result<()> {
            if (index as usize) < count {
                Ok(())
            } else {
                Err(Error::UnresolvedCapture {
                    token: self.token,
                    closure: index,
                })
            }
        };

        for closure in &self.closures {
            if let Some(parent) = closure.parent {
                resolve(parent)?;
            }
        }
        for lambda in &self.lambdas {
            if let Some(index) = lambda.closure.index() {
                resolve(index)?;
            }
        }

        for start in 0..count {
            let mut current = self.closures[start].parent;
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if steps > count {
                    return Err(malformed_error!(
                        "Closure #{} of {} has a cyclic parent chain",
                        start,
                        self.token
                    ));
                }
                current = self.closures[parent as usize].parent;
            }
        }

        Ok(LambdaMap {
            method_ordinal: self.method_ordinal,
            closures: self.closures,
            lambdas: self.lambdas,
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn index_of(len: usize) -> u32 {
    (len - 1) as u32
}
