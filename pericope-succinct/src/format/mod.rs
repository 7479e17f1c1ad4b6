//! Succinct item record codec.
//!
//! Every item is a self-describing record:
//!
//! ```text
//! byte 0:  item_type (2 bits, high) | record_len (6 bits, total bytes)
//! byte 1:  subtype (token category | scope label-kind | graft type index)
//! bytes 2..: payload varints
//! ```
//!
//! | Item        | Subtype byte              | Payload varints              |
//! |-------------|---------------------------|------------------------------|
//! | Token       | `TokenType` discriminant  | interned word/non-word index |
//! | Scope       | `ScopeKind` discriminant  | `arity - 1` scope-bit indices|
//! | Graft       | interned graft-type index | interned target-sequence id  |
//!
//! The scope decoder learns the varint count from the kind's arity table,
//! so records need no terminator. Sequential scans advance by the header's
//! length field; random access comes from the chapter/verse index.

pub mod cv_record;

use crate::error::{Result, SuccinctError};
use crate::item::{ItemType, ScopeKind, ScopeSubType, TokenType};
use pericope_core::ByteArray;
use smallvec::SmallVec;

/// Maximum total record length representable in the 6-bit header field.
pub const MAX_RECORD_LEN: usize = 63;

/// Parse a record header, returning `(record_len, item_type, subtype)`.
pub fn header(ba: &ByteArray, pos: usize) -> Result<(usize, ItemType, u8)> {
    let header_byte = ba.byte(pos)?;
    let item_type = ItemType::from_u8(header_byte >> 6);
    let record_len = (header_byte & 0x3F) as usize;
    if record_len < 2 {
        return Err(SuccinctError::BadRecordHeader {
            offset: pos,
            length: record_len,
        });
    }
    let subtype = ba.byte(pos + 1)?;
    Ok((record_len, item_type, subtype))
}

fn push_header(ba: &mut ByteArray, item_type: ItemType, subtype: u8, record_len: usize) -> Result<()> {
    if record_len > MAX_RECORD_LEN {
        return Err(SuccinctError::RecordTooLong(record_len));
    }
    ba.push_byte((item_type.as_u8() << 6) | record_len as u8);
    ba.push_byte(subtype);
    Ok(())
}

/// Append a token record.
pub fn push_token(ba: &mut ByteArray, subtype: TokenType, index: u32) -> Result<()> {
    let record_len = 2 + ByteArray::varint_width(index);
    push_header(ba, ItemType::Token, subtype.as_u8(), record_len)?;
    ba.push_varint(index);
    Ok(())
}

/// Append a graft record. The graft-type index rides in the subtype byte.
pub fn push_graft(ba: &mut ByteArray, graft_type_index: u32, seq_id_index: u32) -> Result<()> {
    let subtype: u8 = graft_type_index
        .try_into()
        .map_err(|_| SuccinctError::GraftTypeOverflow(graft_type_index))?;
    let record_len = 2 + ByteArray::varint_width(seq_id_index);
    push_header(ba, ItemType::Graft, subtype, record_len)?;
    ba.push_varint(seq_id_index);
    Ok(())
}

/// Append a scope record with its interned scope-bit indices.
pub fn push_scope(
    ba: &mut ByteArray,
    subtype: ScopeSubType,
    kind: ScopeKind,
    bit_indices: &[u32],
) -> Result<()> {
    let record_len = 2 + bit_indices
        .iter()
        .map(|i| ByteArray::varint_width(*i))
        .sum::<usize>();
    push_header(ba, subtype.item_type(), kind.as_u8(), record_len)?;
    for index in bit_indices {
        ba.push_varint(*index);
    }
    Ok(())
}

/// Read a token record's interned payload index.
pub fn token_index(ba: &ByteArray, pos: usize) -> Result<u32> {
    Ok(ba.varint_at(pos + 2)?)
}

/// Read a graft record's `(graft_type_index, seq_id_index)`.
pub fn graft_indices(ba: &ByteArray, pos: usize) -> Result<(u32, u32)> {
    let subtype = ba.byte(pos + 1)?;
    let seq_id_index = ba.varint_at(pos + 2)?;
    Ok((subtype as u32, seq_id_index))
}

/// Read a scope record's interned bit indices (`arity - 1` of them).
pub fn scope_bit_indices(
    ba: &ByteArray,
    pos: usize,
    kind: ScopeKind,
) -> Result<SmallVec<[u32; 5]>> {
    let mut indices = SmallVec::new();
    let mut offset = pos + 2;
    for _ in 1..kind.n_components() {
        let (index, width) = ba.varint_with_width(offset)?;
        indices.push(index);
        offset += width;
    }
    Ok(indices)
}

/// Decode a scope record's subtype byte into its kind.
pub fn scope_kind(subtype: u8, pos: usize) -> Result<ScopeKind> {
    ScopeKind::from_u8(subtype).ok_or(SuccinctError::BadSubtype {
        offset: pos,
        subtype,
    })
}

/// Decode a token record's subtype byte into its type.
pub fn token_type(subtype: u8, pos: usize) -> Result<TokenType> {
    TokenType::from_u8(subtype).ok_or(SuccinctError::BadSubtype {
        offset: pos,
        subtype,
    })
}

/// Splice the record at `pos` out of the stream.
pub fn delete_record(ba: &mut ByteArray, pos: usize) -> Result<()> {
    let (record_len, _, _) = header(ba, pos)?;
    ba.delete_range(pos, record_len)?;
    Ok(())
}

/// Copy the raw bytes of the record at `pos` onto another stream.
pub fn copy_record(src: &ByteArray, pos: usize, dst: &mut ByteArray) -> Result<()> {
    let (record_len, _, _) = header(src, pos)?;
    dst.push_bytes(src.bytes(pos, record_len)?);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
