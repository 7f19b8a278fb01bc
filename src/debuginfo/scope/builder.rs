//! Construction of [`ScopeTree`]s from block events or flat intervals.

use std::cmp::Reverse;

use crate::{
    debuginfo::{
        scope::types::{LocalBinding, LocalConstant, Scope, ScopeKind, ScopeTree},
        token::Token,
    },
    Error, Result,
};

/// A flat scope interval, the input of [`ScopeTreeBuilder::from_intervals`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeInterval {
    /// First IL offset inside the scope
    pub start_offset: u32,
    /// First IL offset after the scope
    pub end_offset: u32,
    /// Block or locals bucket
    pub kind: ScopeKind,
    /// Locals declared directly in this scope
    pub locals: Vec<LocalBinding>,
}

impl ScopeInterval {
    /// Create a block interval without locals.
    #[must_use]
    pub fn block(start_offset: u32, end_offset: u32) -> Self {
        ScopeInterval {
            start_offset,
            end_offset,
            kind: ScopeKind::Block,
            locals: Vec::new(),
        }
    }

    /// Add a local to the interval.
    #[must_use]
    pub fn local(mut self, binding: LocalBinding) -> Self {
        self.locals.push(binding);
        self
    }
}

/// Builds the scope tree of one routine from block enter/exit events.
///
/// The root scope is opened implicitly at offset 0 and sealed at the routine's code size.
/// Events must arrive in IL order; every scope opened must be closed before [`build`] is
/// called. Locals attach to the innermost open scope.
///
/// [`build`]: ScopeTreeBuilder::build
///
/// # Examples
///
/// ```rust
/// use symscope::debuginfo::{
///     scope::{builder::ScopeTreeBuilder, types::LocalBinding},
///     token::Token,
/// };
///
/// let mut builder = ScopeTreeBuilder::new(Token::method_def(1), 0x20);
/// builder.declare_local(LocalBinding::new("a", 0));
/// builder.open_scope(0x04)?;
/// builder.declare_local(LocalBinding::new("x", 1));
/// builder.close_scope(0x10)?;
///
/// let tree = builder.build()?;
/// assert_eq!(tree.root.children.len(), 1);
/// assert_eq!(tree.root.children[0].end_offset, 0x10);
/// # Ok::<(), symscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ScopeTreeBuilder {
    token: Token,
    code_size: u32,
    local_signature: u32,
    prune: bool,
    last_offset: u32,
    stack: Vec<Scope>,
}

impl ScopeTreeBuilder {
    /// Create a builder for the routine `token` with an IL body of `code_size` bytes.
    #[must_use]
    pub fn new(token: Token, code_size: u32) -> Self {
        ScopeTreeBuilder {
            token,
            code_size,
            local_signature: 0,
            prune: true,
            last_offset: 0,
            stack: vec![Scope::new(0, code_size, ScopeKind::Block)],
        }
    }

    /// Set the `StandAloneSig` row of the routine's local signature.
    #[must_use]
    pub fn with_local_signature(mut self, row: u32) -> Self {
        self.local_signature = row;
        self
    }

    /// Keep scopes that end up without locals or children.
    #[must_use]
    pub fn keep_empty_scopes(mut self) -> Self {
        self.prune = false;
        self
    }

    /// Open a lexical block at `offset`.
    ///
    /// # Errors
    /// Returns [`Error::OverlappingScope`] if `offset` precedes an earlier event or lies
    /// beyond the code size.
    pub fn open_scope(&mut self, offset: u32) -> Result<()> {
        self.open(offset, ScopeKind::Block)
    }

    /// Open a synthetic captured-variable container at `offset`.
    ///
    /// # Errors
    /// Returns [`Error::OverlappingScope`] if `offset` precedes an earlier event or lies
    /// beyond the code size.
    pub fn open_locals_bucket(&mut self, offset: u32) -> Result<()> {
        self.open(offset, ScopeKind::LocalsBucket)
    }

    /// Close the innermost open scope at `offset`.
    ///
    /// # Errors
    /// Returns [`Error::OverlappingScope`] if no scope is open, if `offset` precedes an
    /// earlier event or lies beyond the code size.
    pub fn close_scope(&mut self, offset: u32) -> Result<()> {
        self.check_offset(offset)?;
        if self.stack.len() < 2 {
            return Err(self.overlap(format!("close at IL_{offset:04x} without open scope")));
        }

        let Some(mut scope) = self.stack.pop() else {
            return Err(self.overlap("scope stack is empty".to_string()));
        };
        scope.end_offset = offset;
        self.attach(scope)
    }

    /// Declare a local in the innermost open scope.
    pub fn declare_local(&mut self, binding: LocalBinding) {
        if let Some(scope) = self.stack.last_mut() {
            scope.locals.push(binding);
        }
    }

    /// Declare a constant in the innermost open scope.
    pub fn declare_constant(&mut self, constant: LocalConstant) {
        if let Some(scope) = self.stack.last_mut() {
            scope.constants.push(constant);
        }
    }

    /// Number of scopes currently open, including the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Seal the root and return the finished tree.
    ///
    /// # Errors
    /// Returns [`Error::OverlappingScope`] if scopes are still open.
    pub fn build(mut self) -> Result<ScopeTree> {
        if self.stack.len() != 1 {
            return Err(self.overlap(format!(
                "{} scope(s) still open at end of routine",
                self.stack.len() - 1
            )));
        }

        let Some(mut root) = self.stack.pop() else {
            return Err(self.overlap("scope stack is empty".to_string()));
        };
        root.start_offset = 0;
        root.end_offset = self.code_size;

        let mut tree = ScopeTree {
            local_signature: self.local_signature,
            root,
        };
        if self.prune {
            tree.prune_empty();
        }
        Ok(tree)
    }

    /// Build a tree from flat intervals.
    ///
    /// Intervals are ordered by start offset ascending and end offset descending, then
    /// nested by containment under an implicit root `[0, code_size)`.
    ///
    /// # Errors
    /// Returns [`Error::OverlappingScope`] if two intervals overlap without one enclosing
    /// the other, or if an interval is inverted or extends beyond the code size.
    pub fn from_intervals(
        token: Token,
        code_size: u32,
        intervals: impl IntoIterator<Item = ScopeInterval>,
    ) -> Result<ScopeTree> {
        let mut builder = ScopeTreeBuilder::new(token, code_size);
        let mut intervals: Vec<ScopeInterval> = intervals.into_iter().collect();
        intervals.sort_by_key(|interval| (interval.start_offset, Reverse(interval.end_offset)));

        for interval in intervals {
            if interval.start_offset > interval.end_offset || interval.end_offset > code_size {
                return Err(builder.overlap(format!(
                    "interval [{:#x}, {:#x}) is outside [0, {:#x})",
                    interval.start_offset, interval.end_offset, code_size
                )));
            }

            while builder.stack.len() > 1
                && builder
                    .stack
                    .last()
                    .is_some_and(|top| top.end_offset <= interval.start_offset)
            {
                if let Some(done) = builder.stack.pop() {
                    builder.attach(done)?;
                }
            }

            if let Some(top) = builder.stack.last() {
                if interval.end_offset > top.end_offset {
                    return Err(builder.overlap(format!(
                        "interval [{:#x}, {:#x}) overlaps [{:#x}, {:#x})",
                        interval.start_offset,
                        interval.end_offset,
                        top.start_offset,
                        top.end_offset
                    )));
                }
            }

            let mut scope = Scope::new(interval.start_offset, interval.end_offset, interval.kind);
            scope.locals = interval.locals;
            builder.stack.push(scope);
        }

        while builder.stack.len() > 1 {
            if let Some(done) = builder.stack.pop() {
                builder.attach(done)?;
            }
        }
        builder.build()
    }

    fn open(&mut self, offset: u32, kind: ScopeKind) -> Result<()> {
        self.check_offset(offset)?;
        self.stack.push(Scope::new(offset, self.code_size, kind));
        Ok(())
    }

    fn attach(&mut self, scope: Scope) -> Result<()> {
        let token = self.token;
        let Some(parent) = self.stack.last_mut() else {
            return Err(Error::OverlappingScope {
                token,
                message: "scope has no parent".to_string(),
            });
        };

        if !parent.encloses(&scope) {
            return Err(Error::OverlappingScope {
                token,
                message: format!(
                    "scope [{:#x}, {:#x}) escapes its parent [{:#x}, {:#x})",
                    scope.start_offset, scope.end_offset, parent.start_offset, parent.end_offset
                ),
            });
        }
        if let Some(sibling) = parent.children.last() {
            if sibling.end_offset > scope.start_offset {
                return Err(Error::OverlappingScope {
                    token,
                    message: format!(
                        "scope [{:#x}, {:#x}) overlaps sibling [{:#x}, {:#x})",
                        scope.start_offset,
                        scope.end_offset,
                        sibling.start_offset,
                        sibling.end_offset
                    ),
                });
            }
        }

        parent.children.push(scope);
        Ok(())
    }

    fn check_offset(&mut self, offset: u32) -> Result<()> {
        if offset < self.last_offset {
            return Err(self.overlap(format!(
                "block event at IL_{offset:04x} follows IL_{:04x}",
                self.last_offset
            )));
        }
        if offset > self.code_size {
            return Err(self.overlap(format!(
                "block event at IL_{offset:04x} is beyond code size {:#x}",
                self.code_size
            )));
        }

        self.last_offset = offset;
        Ok(())
    }

    fn overlap(&self, message: String) -> Error {
        Error::OverlappingScope {
            token: self.token,
            message,
        }
    }
}
