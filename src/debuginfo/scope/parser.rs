//! Decoding of scope blobs.

use crate::{
    debuginfo::scope::{
        types::{
            ConstantTag, ConstantValue, LocalAttributes, LocalBinding, LocalConstant, Scope,
            ScopeKind, ScopeTree,
        },
        SCOPE_BLOB_VERSION,
    },
    file::parser::Parser,
    Result,
};

/// Deepest scope nesting accepted when decoding.
pub const MAX_SCOPE_DEPTH: usize = 512;

/// Parse a scope blob into a [`ScopeTree`].
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] for truncated blobs and [`crate::Error::Malformed`]
/// for an unknown version or scope kind, a child outside its parent, nesting deeper than
/// [`MAX_SCOPE_DEPTH`] or trailing data.
pub fn parse_scopes(blob: &[u8]) -> Result<ScopeTree> {
    let mut parser = Parser::new(blob);

    let version = parser.read_le::<u8>()?;
    if version != SCOPE_BLOB_VERSION {
        return Err(malformed_error!("Unsupported scope blob version {}", version));
    }

    let local_signature = parser.read_compressed_uint()?;
    let root = parse_scope(&mut parser, 0, 0)?;

    if parser.has_more_data() {
        return Err(malformed_error!(
            "{} trailing bytes after scope tree",
            parser.remaining()
        ));
    }

    Ok(ScopeTree {
        local_signature,
        root,
    })
}

fn parse_scope(parser: &mut Parser<'_>, parent_start: u32, depth: usize) -> Result<Scope> {
    if depth > MAX_SCOPE_DEPTH {
        return Err(malformed_error!("Scope nesting exceeds {}", MAX_SCOPE_DEPTH));
    }

    let start_offset = parent_start
        .checked_add(parser.read_compressed_uint()?)
        .ok_or_else(|| malformed_error!("Scope start overflows"))?;
    let end_offset = start_offset
        .checked_add(parser.read_compressed_uint()?)
        .ok_or_else(|| malformed_error!("Scope end overflows"))?;
    let raw_kind = parser.read_le::<u8>()?;
    let kind = ScopeKind::from_repr(raw_kind)
        .ok_or_else(|| malformed_error!("Unknown scope kind {}", raw_kind))?;

    let mut scope = Scope::new(start_offset, end_offset, kind);

    let local_count = parser.read_compressed_uint()?;
    for _ in 0..local_count {
        let slot_index = parser.read_compressed_uint()?;
        let raw_attributes = parser.read_compressed_uint()?;
        let attributes = u16::try_from(raw_attributes)
            .ok()
            .and_then(LocalAttributes::from_bits)
            .ok_or_else(|| malformed_error!("Invalid local attributes {:#x}", raw_attributes))?;
        let name = parser.read_prefixed_string_utf8()?;

        scope.locals.push(LocalBinding {
            name,
            slot_index,
            attributes,
        });
    }

    let constant_count = parser.read_compressed_uint()?;
    for _ in 0..constant_count {
        scope.constants.push(parse_constant(parser)?);
    }

    let child_count = parser.read_compressed_uint()?;
    for _ in 0..child_count {
        let child = parse_scope(parser, start_offset, depth + 1)?;
        if !scope.encloses(&child) {
            return Err(malformed_error!(
                "Scope [{:#x}, {:#x}) escapes its parent [{:#x}, {:#x})",
                child.start_offset,
                child.end_offset,
                start_offset,
                end_offset
            ));
        }
        if let Some(previous) = scope.children.last() {
            if previous.end_offset > child.start_offset {
                return Err(malformed_error!(
                    "Sibling scopes overlap at {:#x}",
                    child.start_offset
                ));
            }
        }
        scope.children.push(child);
    }

    Ok(scope)
}

fn parse_constant(parser: &mut Parser<'_>) -> Result<LocalConstant> {
    let name = parser.read_prefixed_string_utf8()?;
    let type_name = parser.read_prefixed_string_utf8()?;
    let raw_tag = parser.read_le::<u8>()?;
    let tag = ConstantTag::from_repr(raw_tag)
        .ok_or_else(|| malformed_error!("Unknown constant type {:#x}", raw_tag))?;

    let value = match tag {
        ConstantTag::Null => ConstantValue::Null,
        ConstantTag::Boolean => match parser.read_le::<u8>()? {
            0 => ConstantValue::Boolean(false),
            1 => ConstantValue::Boolean(true),
            other => return Err(malformed_error!("Invalid boolean constant {}", other)),
        },
        ConstantTag::Char => ConstantValue::Char(parser.read_le()?),
        ConstantTag::I1 => ConstantValue::I1(parser.read_le()?),
        ConstantTag::U1 => ConstantValue::U1(parser.read_le()?),
        ConstantTag::I2 => ConstantValue::I2(parser.read_le()?),
        ConstantTag::U2 => ConstantValue::U2(parser.read_le()?),
        ConstantTag::I4 => ConstantValue::I4(parser.read_le()?),
        ConstantTag::U4 => ConstantValue::U4(parser.read_le()?),
        ConstantTag::I8 => ConstantValue::I8(parser.read_le()?),
        ConstantTag::U8 => ConstantValue::U8(parser.read_le()?),
        ConstantTag::R4 => ConstantValue::R4(parser.read_le()?),
        ConstantTag::R8 => ConstantValue::R8(parser.read_le()?),
        ConstantTag::String => ConstantValue::String(parser.read_prefixed_string_utf8()?),
    };

    Ok(LocalConstant {
        name,
        value,
        type_name,
    })
}
