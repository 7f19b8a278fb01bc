//! Scope tree data types.

use std::fmt;

use bitflags::bitflags;
use strum::{Display, FromRepr};

bitflags! {
    /// Attributes of a local variable as seen by the debugger.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LocalAttributes: u16 {
        /// The local is compiler-generated and hidden from the locals window
        const DEBUGGER_HIDDEN = 0x0001;
    }
}

/// What kind of region a scope represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, FromRepr)]
#[repr(u8)]
pub enum ScopeKind {
    /// A lexical block of the source: method body, `{ }`, loop body, `using`, `foreach`
    #[default]
    Block = 0,
    /// A synthetic container for variables captured by a closure
    LocalsBucket = 1,
}

/// A named local variable bound to an IL slot.
///
/// The live range of a binding is the interval of the scope that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalBinding {
    /// Source name of the variable
    pub name: String,
    /// Index of the IL local slot holding the value
    pub slot_index: u32,
    /// Debugger attributes
    pub attributes: LocalAttributes,
}

impl LocalBinding {
    /// Create a visible binding.
    pub fn new(name: impl Into<String>, slot_index: u32) -> Self {
        LocalBinding {
            name: name.into(),
            slot_index,
            attributes: LocalAttributes::empty(),
        }
    }

    /// Create a binding hidden from the debugger.
    pub fn hidden(name: impl Into<String>, slot_index: u32) -> Self {
        LocalBinding {
            name: name.into(),
            slot_index,
            attributes: LocalAttributes::DEBUGGER_HIDDEN,
        }
    }
}

/// The value of a local constant.
///
/// Floating point values are kept as their IEEE 754 bit pattern so that constants compare
/// and hash exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    /// `null` of a reference type
    Null,
    /// Boolean value
    Boolean(bool),
    /// UTF-16 code unit
    Char(u16),
    /// 8-bit signed integer
    I1(i8),
    /// 8-bit unsigned integer
    U1(u8),
    /// 16-bit signed integer
    I2(i16),
    /// 16-bit unsigned integer
    U2(u16),
    /// 32-bit signed integer
    I4(i32),
    /// 32-bit unsigned integer
    U4(u32),
    /// 64-bit signed integer
    I8(i64),
    /// 64-bit unsigned integer
    U8(u64),
    /// 32-bit floating point, as bits
    R4(u32),
    /// 64-bit floating point, as bits
    R8(u64),
    /// String value
    String(String),
}

/// Element type byte preceding a constant's value in the scope blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub(crate) enum ConstantTag {
    Boolean = 0x02,
    Char = 0x03,
    I1 = 0x04,
    U1 = 0x05,
    I2 = 0x06,
    U2 = 0x07,
    I4 = 0x08,
    U4 = 0x09,
    I8 = 0x0A,
    U8 = 0x0B,
    R4 = 0x0C,
    R8 = 0x0D,
    String = 0x0E,
    Null = 0x12,
}

impl ConstantValue {
    pub(crate) fn tag(&self) -> ConstantTag {
        match self {
            ConstantValue::Null => ConstantTag::Null,
            ConstantValue::Boolean(_) => ConstantTag::Boolean,
            ConstantValue::Char(_) => ConstantTag::Char,
            ConstantValue::I1(_) => ConstantTag::I1,
            ConstantValue::U1(_) => ConstantTag::U1,
            ConstantValue::I2(_) => ConstantTag::I2,
            ConstantValue::U2(_) => ConstantTag::U2,
            ConstantValue::I4(_) => ConstantTag::I4,
            ConstantValue::U4(_) => ConstantTag::U4,
            ConstantValue::I8(_) => ConstantTag::I8,
            ConstantValue::U8(_) => ConstantTag::U8,
            ConstantValue::R4(_) => ConstantTag::R4,
            ConstantValue::R8(_) => ConstantTag::R8,
            ConstantValue::String(_) => ConstantTag::String,
        }
    }

    /// A 32-bit floating point constant.
    #[must_use]
    pub fn single(value: f32) -> Self {
        ConstantValue::R4(value.to_bits())
    }

    /// A 64-bit floating point constant.
    #[must_use]
    pub fn double(value: f64) -> Self {
        ConstantValue::R8(value.to_bits())
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Boolean(value) => write!(f, "{}", u8::from(*value)),
            ConstantValue::Char(value) => write!(f, "{value}"),
            ConstantValue::I1(value) => write!(f, "{value}"),
            ConstantValue::U1(value) => write!(f, "{value}"),
            ConstantValue::I2(value) => write!(f, "{value}"),
            ConstantValue::U2(value) => write!(f, "{value}"),
            ConstantValue::I4(value) => write!(f, "{value}"),
            ConstantValue::U4(value) => write!(f, "{value}"),
            ConstantValue::I8(value) => write!(f, "{value}"),
            ConstantValue::U8(value) => write!(f, "{value}"),
            ConstantValue::R4(bits) => write!(f, "{}", f32::from_bits(*bits)),
            ConstantValue::R8(bits) => write!(f, "{}", f64::from_bits(*bits)),
            ConstantValue::String(value) => write!(f, "{value}"),
        }
    }
}

/// A named compile-time constant visible in a scope.
///
/// Constants occupy no IL slot; the debugger shows `value` under `name` while the scope
/// is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalConstant {
    /// Source name of the constant
    pub name: String,
    /// The constant's value
    pub value: ConstantValue,
    /// Declared type: a primitive name such as `Int32` or a type signature such as
    /// `System.Action`
    pub type_name: String,
}

impl LocalConstant {
    /// Create a constant.
    pub fn new(
        name: impl Into<String>,
        value: ConstantValue,
        type_name: impl Into<String>,
    ) -> Self {
        LocalConstant {
            name: name.into(),
            value,
            type_name: type_name.into(),
        }
    }

    /// Returns `true` if `type_name` names a built-in type rather than a signature.
    #[must_use]
    pub fn has_primitive_type(&self) -> bool {
        matches!(
            self.type_name.as_str(),
            "Boolean"
                | "Char"
                | "SByte"
                | "Byte"
                | "Int16"
                | "UInt16"
                | "Int32"
                | "UInt32"
                | "Int64"
                | "UInt64"
                | "Single"
                | "Double"
                | "Decimal"
                | "String"
                | "Object"
        )
    }
}

/// A node of the lexical scope tree covering the IL range `[start_offset, end_offset)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    /// First IL offset inside the scope
    pub start_offset: u32,
    /// First IL offset after the scope
    pub end_offset: u32,
    /// Block or locals bucket
    pub kind: ScopeKind,
    /// Locals declared directly in this scope, in declaration order
    pub locals: Vec<LocalBinding>,
    /// Constants declared directly in this scope, in declaration order
    pub constants: Vec<LocalConstant>,
    /// Nested scopes, ordered by start offset
    pub children: Vec<Scope>,
}

impl Scope {
    /// Create an empty scope.
    #[must_use]
    pub fn new(start_offset: u32, end_offset: u32, kind: ScopeKind) -> Self {
        Scope {
            start_offset,
            end_offset,
            kind,
            locals: Vec::new(),
            constants: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Length of the covered range.
    #[must_use]
    pub fn length(&self) -> u32 {
        self.end_offset.saturating_sub(self.start_offset)
    }

    /// Returns `true` if `offset` lies within the scope.
    #[must_use]
    pub fn contains(&self, offset: u32) -> bool {
        self.start_offset <= offset && offset < self.end_offset
    }

    /// Returns `true` if `other` lies entirely within this scope.
    #[must_use]
    pub fn encloses(&self, other: &Scope) -> bool {
        self.start_offset <= other.start_offset && other.end_offset <= self.end_offset
    }

    /// Returns `true` if the scope has no locals, constants or children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty() && self.constants.is_empty() && self.children.is_empty()
    }
}

/// The scope tree of one routine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeTree {
    /// Row of the routine's local signature in the `StandAloneSig` table, 0 if it has none
    pub local_signature: u32,
    /// The routine-level scope covering `[0, code_size)`
    pub root: Scope,
}

impl ScopeTree {
    /// Size of the routine's IL body.
    #[must_use]
    pub fn code_size(&self) -> u32 {
        self.root.end_offset
    }

    /// Iterate all scopes in pre-order together with their depth (root is 0).
    #[must_use]
    pub fn iter(&self) -> ScopeIter<'_> {
        ScopeIter {
            stack: vec![(0, &self.root)],
        }
    }

    /// Number of scopes including the root.
    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.iter().count()
    }

    /// The innermost scope containing `offset`.
    #[must_use]
    pub fn innermost_at(&self, offset: u32) -> Option<&Scope> {
        if !self.root.contains(offset) {
            return None;
        }

        let mut current = &self.root;
        while let Some(child) = current.children.iter().find(|c| c.contains(offset)) {
            current = child;
        }
        Some(current)
    }

    /// All locals visible at `offset`, outermost first.
    #[must_use]
    pub fn locals_at(&self, offset: u32) -> Vec<&LocalBinding> {
        let mut locals = Vec::new();
        if !self.root.contains(offset) {
            return locals;
        }

        let mut current = Some(&self.root);
        while let Some(scope) = current {
            locals.extend(scope.locals.iter());
            current = scope.children.iter().find(|c| c.contains(offset));
        }
        locals
    }

    /// Remove every local whose UTF-8 name is longer than `limit` bytes.
    ///
    /// Returns the removed bindings in pre-order.
    pub fn drop_long_local_names(&mut self, limit: usize) -> Vec<LocalBinding> {
        fn visit(scope: &mut Scope, limit: usize, dropped: &mut Vec<LocalBinding>) {
            let (keep, drop): (Vec<_>, Vec<_>) = std::mem::take(&mut scope.locals)
                .into_iter()
                .partition(|local| local.name.len() <= limit);
            scope.locals = keep;
            dropped.extend(drop);

            for child in &mut scope.children {
                visit(child, limit, dropped);
            }
        }

        let mut dropped = Vec::new();
        visit(&mut self.root, limit, &mut dropped);
        dropped
    }

    /// Remove every constant whose UTF-8 name is longer than `limit` bytes.
    ///
    /// Returns the removed constants in pre-order.
    pub fn drop_long_constant_names(&mut self, limit: usize) -> Vec<LocalConstant> {
        fn visit(scope: &mut Scope, limit: usize, dropped: &mut Vec<LocalConstant>) {
            let (keep, drop): (Vec<_>, Vec<_>) = std::mem::take(&mut scope.constants)
                .into_iter()
                .partition(|constant| constant.name.len() <= limit);
            scope.constants = keep;
            dropped.extend(drop);

            for child in &mut scope.children {
                visit(child, limit, dropped);
            }
        }

        let mut dropped = Vec::new();
        visit(&mut self.root, limit, &mut dropped);
        dropped
    }

    /// Drop non-root scopes that end up with no locals, constants or children.
    pub fn prune_empty(&mut self) {
        fn prune(scope: &mut Scope) {
            for child in &mut scope.children {
                prune(child);
            }
            scope.children.retain(|child| !child.is_empty());
        }

        prune(&mut self.root);
    }
}

/// Pre-order iterator over a [`ScopeTree`], yielding `(depth, scope)`.
pub struct ScopeIter<'a> {
    stack: Vec<(usize, &'a Scope)>,
}

impl<'a> Iterator for ScopeIter<'a> {
    type Item = (usize, &'a Scope);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, scope) = self.stack.pop()?;
        self.stack
            .extend(scope.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, scope))
    }
}
