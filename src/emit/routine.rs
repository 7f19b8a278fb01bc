//! The lowered routine handed to the emitter.
//!
//! A [`RoutineBody`] is a plain record of what lowering decided: where statements start,
//! where blocks open and close, which closures and lambdas were created, what each local
//! slot holds, and which imports are in effect. The emitter only validates and encodes it.

use crate::debuginfo::{
    customdebuginformation::HoistedLocalScope,
    importscope::ImportChain,
    lambdamap::LambdaClosure,
    scope::{LocalBinding, LocalConstant},
    slotmap::LocalSlot,
    span::SourceSpan,
    token::Token,
};

/// One entry of the ordered statement walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMark {
    /// A statement starts at `il_offset`
    Visible {
        /// First instruction of the statement
        il_offset: u32,
        /// Source of the statement
        span: SourceSpan,
    },
    /// Compiler-generated code starts at `il_offset`
    Hidden {
        /// First hidden instruction
        il_offset: u32,
    },
}

/// One block event, in IL order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEvent {
    /// A lexical block opens
    Enter(u32),
    /// A captured-variable container opens
    LocalsBucket(u32),
    /// The innermost open block closes
    Exit(u32),
    /// A local is declared in the innermost open block
    Declare(LocalBinding),
    /// A constant is declared in the innermost open block
    Constant(LocalConstant),
}

/// A closure created by lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureEvent {
    /// Syntax offset of the scope whose variables the closure holds
    pub syntax_offset: i32,
    /// Index of the enclosing closure, which may be registered later
    pub parent: Option<u32>,
}

/// A lambda or local function created by lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LambdaEvent {
    /// Syntax offset of the lambda
    pub syntax_offset: i32,
    /// What the lambda captures
    pub closure: LambdaClosure,
}

/// Everything the emitter needs to know about one routine.
///
/// # Examples
///
/// ```rust
/// use symscope::{
///     debuginfo::{scope::LocalBinding, span::SourceSpan, token::Token},
///     emit::RoutineBody,
/// };
///
/// let body = RoutineBody::new(Token::method_def(1), "C", "M", 0x10)
///     .mark(0, SourceSpan::on_line(1, 5, 5, 6))
///     .enter(0)
///     .declare(LocalBinding::new("x", 0))
///     .exit(0x10);
///
/// assert_eq!(body.marks.len(), 1);
/// assert_eq!(body.blocks.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoutineBody {
    /// `MethodDef` token of the routine
    pub token: Token,
    /// Full name of the declaring type
    pub declaring_type: String,
    /// Routine name
    pub name: String,
    /// Parameter names in declaration order
    pub parameters: Vec<String>,
    /// Size of the IL body in bytes
    pub code_size: u32,
    /// `StandAloneSig` row of the local signature, 0 if there are no locals
    pub local_signature: u32,
    /// Offset 0 is an implicit, always hidden prologue
    pub has_prologue: bool,
    /// Document of the first point; defaults to the first visible mark's document
    pub document: Option<u32>,
    /// Ordinal within the declaring type; allocated on registration when absent
    pub method_ordinal: Option<u32>,
    /// Statement walk in IL order
    pub marks: Vec<SequenceMark>,
    /// Block events in IL order
    pub blocks: Vec<BlockEvent>,
    /// Closures in discovery order
    pub closures: Vec<ClosureEvent>,
    /// Lambdas in discovery order
    pub lambdas: Vec<LambdaEvent>,
    /// Origin of every IL local slot, in slot order
    pub slots: Vec<LocalSlot>,
    /// Imports in effect, innermost level first
    pub imports: ImportChain,
    /// State machine type generated for an iterator or async routine
    pub state_machine: Option<String>,
    /// Scopes of the hoisted locals when this routine is a state machine `MoveNext`
    pub hoisted_scopes: Vec<HoistedLocalScope>,
}

impl RoutineBody {
    /// Create an empty body.
    pub fn new(
        token: Token,
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        code_size: u32,
    ) -> Self {
        RoutineBody {
            token,
            declaring_type: declaring_type.into(),
            name: name.into(),
            code_size,
            ..Self::default()
        }
    }

    /// Set the parameter names.
    #[must_use]
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Set the local signature row.
    #[must_use]
    pub fn with_local_signature(mut self, row: u32) -> Self {
        self.local_signature = row;
        self
    }

    /// Mark offset 0 as a hidden prologue.
    #[must_use]
    pub fn with_prologue(mut self) -> Self {
        self.has_prologue = true;
        self
    }

    /// Set the initial document.
    #[must_use]
    pub fn with_document(mut self, document: u32) -> Self {
        self.document = Some(document);
        self
    }

    /// Use a fixed method ordinal instead of allocating one.
    #[must_use]
    pub fn with_method_ordinal(mut self, ordinal: u32) -> Self {
        self.method_ordinal = Some(ordinal);
        self
    }

    /// Set the import chain.
    #[must_use]
    pub fn with_imports(mut self, imports: ImportChain) -> Self {
        self.imports = imports;
        self
    }

    /// Append a visible sequence mark.
    #[must_use]
    pub fn mark(mut self, il_offset: u32, span: SourceSpan) -> Self {
        self.marks.push(SequenceMark::Visible { il_offset, span });
        self
    }

    /// Append a hidden sequence mark.
    #[must_use]
    pub fn mark_hidden(mut self, il_offset: u32) -> Self {
        self.marks.push(SequenceMark::Hidden { il_offset });
        self
    }

    /// Open a block.
    #[must_use]
    pub fn enter(mut self, offset: u32) -> Self {
        self.blocks.push(BlockEvent::Enter(offset));
        self
    }

    /// Open a captured-variable container.
    #[must_use]
    pub fn locals_bucket(mut self, offset: u32) -> Self {
        self.blocks.push(BlockEvent::LocalsBucket(offset));
        self
    }

    /// Close the innermost block.
    #[must_use]
    pub fn exit(mut self, offset: u32) -> Self {
        self.blocks.push(BlockEvent::Exit(offset));
        self
    }

    /// Declare a local in the innermost block.
    #[must_use]
    pub fn declare(mut self, binding: LocalBinding) -> Self {
        self.blocks.push(BlockEvent::Declare(binding));
        self
    }

    /// Declare a constant in the innermost block.
    #[must_use]
    pub fn constant(mut self, constant: LocalConstant) -> Self {
        self.blocks.push(BlockEvent::Constant(constant));
        self
    }

    /// Name the state machine type whose `MoveNext` holds this routine's code.
    #[must_use]
    pub fn with_state_machine(mut self, type_name: impl Into<String>) -> Self {
        self.state_machine = Some(type_name.into());
        self
    }

    /// Append the scope of the next hoisted state machine field.
    #[must_use]
    pub fn hoisted_scope(mut self, scope: HoistedLocalScope) -> Self {
        self.hoisted_scopes.push(scope);
        self
    }

    /// Register a closure.
    #[must_use]
    pub fn closure(mut self, syntax_offset: i32, parent: Option<u32>) -> Self {
        self.closures.push(ClosureEvent {
            syntax_offset,
            parent,
        });
        self
    }

    /// Register a lambda.
    #[must_use]
    pub fn lambda(mut self, syntax_offset: i32, closure: LambdaClosure) -> Self {
        self.lambdas.push(LambdaEvent {
            syntax_offset,
            closure,
        });
        self
    }

    /// Append a local slot.
    #[must_use]
    pub fn slot(mut self, slot: LocalSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Returns `true` if lowering created closures or lambdas in this routine.
    #[must_use]
    pub fn has_lambdas(&self) -> bool {
        !self.closures.is_empty() || !self.lambdas.is_empty()
    }

    /// The document the sequence point table starts in.
    #[must_use]
    pub fn initial_document(&self) -> u32 {
        self.document
            .or_else(|| {
                self.marks.iter().find_map(|mark| match mark {
                    SequenceMark::Visible { span, .. } => Some(span.document),
                    SequenceMark::Hidden { .. } => None,
                })
            })
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_document() {
        let body = RoutineBody::new(Token::method_def(1), "C", "M", 4);
        assert_eq!(body.initial_document(), 1);

        let body = body
            .mark_hidden(0)
            .mark(2, SourceSpan::on_line(3, 1, 1, 2));
        assert_eq!(body.initial_document(), 3);
        assert_eq!(body.with_document(2).initial_document(), 2);
    }

    #[test]
    fn lambdas_detected() {
        let body = RoutineBody::new(Token::method_def(1), "C", "M", 4);
        assert!(!body.has_lambdas());
        assert!(body.lambda(0, LambdaClosure::Static).has_lambdas());
    }
}
