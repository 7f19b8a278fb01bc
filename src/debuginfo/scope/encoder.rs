//! Encoding of [`ScopeTree`]s into the scope blob.

use crate::{
    debuginfo::scope::{
        types::{ConstantValue, LocalConstant, Scope, ScopeTree},
        SCOPE_BLOB_VERSION,
    },
    file::io::write_le,
    utils::compressed::{write_compressed_uint, write_prefixed_string_utf8},
    Result,
};

/// Encode a scope tree, root first, children in offset order.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if a child does not lie inside its parent and
/// [`crate::Error::ValueOutOfRange`] if a count or offset does not fit a compressed integer.
pub fn encode_scopes(tree: &ScopeTree) -> Result<Vec<u8>> {
    let mut blob = vec![SCOPE_BLOB_VERSION];
    write_compressed_uint(tree.local_signature, &mut blob)?;
    encode_scope(&tree.root, 0, &mut blob)?;
    Ok(blob)
}

fn encode_scope(scope: &Scope, parent_start: u32, blob: &mut Vec<u8>) -> Result<()> {
    if scope.start_offset < parent_start || scope.end_offset < scope.start_offset {
        return Err(malformed_error!(
            "Scope [{:#x}, {:#x}) can not be encoded under a parent starting at {:#x}",
            scope.start_offset,
            scope.end_offset,
            parent_start
        ));
    }

    write_compressed_uint(scope.start_offset - parent_start, blob)?;
    write_compressed_uint(scope.length(), blob)?;
    blob.push(scope.kind as u8);

    write_compressed_uint(count(scope.locals.len())?, blob)?;
    for local in &scope.locals {
        write_compressed_uint(local.slot_index, blob)?;
        write_compressed_uint(u32::from(local.attributes.bits()), blob)?;
        write_prefixed_string_utf8(&local.name, blob)?;
    }

    write_compressed_uint(count(scope.constants.len())?, blob)?;
    for constant in &scope.constants {
        encode_constant(constant, blob)?;
    }

    write_compressed_uint(count(scope.children.len())?, blob)?;
    for child in &scope.children {
        if !scope.encloses(child) {
            return Err(malformed_error!(
                "Scope [{:#x}, {:#x}) escapes its parent [{:#x}, {:#x})",
                child.start_offset,
                child.end_offset,
                scope.start_offset,
                scope.end_offset
            ));
        }
        encode_scope(child, scope.start_offset, blob)?;
    }

    Ok(())
}

fn encode_constant(constant: &LocalConstant, blob: &mut Vec<u8>) -> Result<()> {
    write_prefixed_string_utf8(&constant.name, blob)?;
    write_prefixed_string_utf8(&constant.type_name, blob)?;
    blob.push(constant.value.tag() as u8);

    match &constant.value {
        ConstantValue::Null => {}
        ConstantValue::Boolean(value) => blob.push(u8::from(*value)),
        ConstantValue::Char(value) | ConstantValue::U2(value) => write_le(blob, *value),
        ConstantValue::I1(value) => write_le(blob, *value),
        ConstantValue::U1(value) => blob.push(*value),
        ConstantValue::I2(value) => write_le(blob, *value),
        ConstantValue::I4(value) => write_le(blob, *value),
        ConstantValue::U4(value) | ConstantValue::R4(value) => write_le(blob, *value),
        ConstantValue::I8(value) => write_le(blob, *value),
        ConstantValue::U8(value) | ConstantValue::R8(value) => write_le(blob, *value),
        ConstantValue::String(value) => write_prefixed_string_utf8(value, blob)?,
    }
    Ok(())
}

fn count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| malformed_error!("Too many entries: {}", len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::scope::types::{LocalBinding, ScopeKind};

    #[test]
    fn layout() {
        let mut child = Scope::new(0x04, 0x0A, ScopeKind::LocalsBucket);
        child.locals.push(LocalBinding::hidden("c", 1));
        let mut root = Scope::new(0, 0x10, ScopeKind::Block);
        root.locals.push(LocalBinding::new("ab", 0));
        root.children.push(child);

        let blob = encode_scopes(&ScopeTree {
            local_signature: 3,
            root,
        })
        .unwrap();

        assert_eq!(
            blob,
            [
                SCOPE_BLOB_VERSION,
                3, // local signature
                0, 0x10, 0, // root: start, length, kind
                1, 0, 0, 2, b'a', b'b', // one local
                0, // no constants
                1, // one child
                4, 6, 1, // child: delta start, length, kind
                1, 1, 1, 1, b'c', // one hidden local
                0, // no constants
                0, // no children
            ]
        );
    }

    #[test]
    fn constants_layout() {
        let mut root = Scope::new(0, 8, ScopeKind::Block);
        root.constants
            .push(LocalConstant::new("N", ConstantValue::I4(-2), "Int32"));
        root.constants
            .push(LocalConstant::new("s", ConstantValue::Null, "String"));

        let blob = encode_scopes(&ScopeTree {
            local_signature: 0,
            root,
        })
        .unwrap();

        assert_eq!(
            blob,
            [
                SCOPE_BLOB_VERSION,
                0,
                0, 8, 0, // root
                0, // no locals
                2, // two constants
                1, b'N', 5, b'I', b'n', b't', b'3', b'2', 0x08, 0xFE, 0xFF, 0xFF, 0xFF,
                1, b's', 6, b'S', b't', b'r', b'i', b'n', b'g', 0x12,
                0, // no children
            ]
        );
    }

    #[test]
    fn escaping_child_rejected() {
        let mut root = Scope::new(0, 0x10, ScopeKind::Block);
        root.children.push(Scope::new(0x08, 0x20, ScopeKind::Block));

        assert!(encode_scopes(&ScopeTree {
            local_signature: 0,
            root
        })
        .is_err());
    }
}
