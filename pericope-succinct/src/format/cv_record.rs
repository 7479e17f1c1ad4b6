//! Chapter/verse index record codec.
//!
//! One variable-length record per chapter, and per verse occurrence, with a
//! one-byte header:
//!
//! ```text
//! bits 7-6:  record type (0 = empty slot, 2 = short form, 3 = long form)
//! bit  5:    "is last occurrence of this verse" flag
//! bits 4-0:  total record byte length, including the header byte
//! ```
//!
//! Short form spans a single block: varints
//! `{block, start_item, end_item, next_token}` plus, for verse records, a
//! trailing verses-range enum index. Long form separates start and end
//! blocks. An unused verse slot is a single empty-type header byte.

use crate::error::{Result, SuccinctError};
use pericope_core::ByteArray;

/// Record type for an unused verse slot.
pub const EMPTY_TYPE: u8 = 0;
/// Record type for a same-block span.
pub const SHORT_TYPE: u8 = 2;
/// Record type for a cross-block span.
pub const LONG_TYPE: u8 = 3;

/// Maximum record length representable in the 5-bit length field.
pub const MAX_CV_RECORD_LEN: usize = 31;

/// A decoded chapter or verse-occurrence index record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvRecord {
    pub start_block: u32,
    pub end_block: u32,
    pub start_item: u32,
    pub end_item: u32,
    pub next_token: u32,
    /// Interned verses-range index; `None` on chapter records.
    pub verses_index: Option<u32>,
}

/// Pack a record header byte.
pub fn pack_header(record_type: u8, is_last: bool, record_len: usize) -> Result<u8> {
    if record_len > MAX_CV_RECORD_LEN {
        return Err(SuccinctError::RecordTooLong(record_len));
    }
    Ok((record_type << 6) | ((is_last as u8) << 5) | record_len as u8)
}

/// Unpack a record header byte into `(record_type, is_last, record_len)`.
pub fn unpack_header(header_byte: u8) -> (u8, bool, usize) {
    (
        header_byte >> 6,
        (header_byte >> 5) & 1 == 1,
        (header_byte & 0x1F) as usize,
    )
}

/// Append a chapter or verse record.
///
/// The record type is chosen from the span: short when the record starts
/// and ends in the same block, long otherwise. The header byte is written
/// last, once the varint widths are known.
pub fn push_record(ba: &mut ByteArray, record: &CvRecord, is_last: bool) -> Result<()> {
    let record_type = if record.start_block == record.end_block {
        SHORT_TYPE
    } else {
        LONG_TYPE
    };
    let start = ba.len();
    ba.push_byte(0);
    ba.push_varint(record.start_block);
    if record_type == LONG_TYPE {
        ba.push_varint(record.end_block);
    }
    ba.push_varint(record.start_item);
    ba.push_varint(record.end_item);
    ba.push_varint(record.next_token);
    if let Some(verses_index) = record.verses_index {
        ba.push_varint(verses_index);
    }
    let header = pack_header(record_type, is_last, ba.len() - start)?;
    ba.set_byte(start, header)?;
    Ok(())
}

/// Append an empty-slot record (single header byte).
pub fn push_empty(ba: &mut ByteArray) -> Result<()> {
    let header = pack_header(EMPTY_TYPE, true, 1)?;
    ba.push_byte(header);
    Ok(())
}

/// Decode the record at `pos`.
///
/// Returns `(record, is_last, record_len)`; the record is `None` for an
/// empty slot. `has_verses` tells the decoder whether a trailing
/// verses-range index is present (verse records) or not (chapter records).
pub fn read_record(
    ba: &ByteArray,
    pos: usize,
    has_verses: bool,
) -> Result<(Option<CvRecord>, bool, usize)> {
    let (record_type, is_last, record_len) = unpack_header(ba.byte(pos)?);
    if record_type == EMPTY_TYPE {
        return Ok((None, is_last, record_len));
    }

    let mut offset = pos + 1;
    let mut next = |ba: &ByteArray| -> Result<u32> {
        let (value, width) = ba.varint_with_width(offset)?;
        offset += width;
        Ok(value)
    };

    let start_block = next(ba)?;
    let end_block = if record_type == LONG_TYPE {
        next(ba)?
    } else {
        start_block
    };
    let start_item = next(ba)?;
    let end_item = next(ba)?;
    let next_token = next(ba)?;
    let verses_index = if has_verses { Some(next(ba)?) } else { None };

    Ok((
        Some(CvRecord {
            start_block,
            end_block,
            start_item,
            end_item,
            next_token,
            verses_index,
        }),
        is_last,
        record_len,
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(start_block: u32, end_block: u32, verses: Option<u32>) -> CvRecord {
        CvRecord {
            start_block,
            end_block,
            start_item: 4,
            end_item: 9,
            next_token: 120,
            verses_index: verses,
        }
    }

    #[test]
    fn test_header_round_trip() {
        for record_type in [EMPTY_TYPE, SHORT_TYPE, LONG_TYPE] {
            for is_last in [false, true] {
                let byte = pack_header(record_type, is_last, 17).unwrap();
                assert_eq!(unpack_header(byte), (record_type, is_last, 17));
            }
        }
    }

    #[test]
    fn test_header_length_cap() {
        assert!(pack_header(SHORT_TYPE, true, 32).is_err());
    }

    #[test]
    fn test_short_verse_record_round_trip() {
        let mut ba = ByteArray::new();
        let record = sample(3, 3, Some(5));
        push_record(&mut ba, &record, true).unwrap();

        let (decoded, is_last, len) = read_record(&ba, 0, true).unwrap();
        assert_eq!(decoded.unwrap(), record);
        assert!(is_last);
        assert_eq!(len, ba.len());
        assert_eq!(unpack_header(ba.byte(0).unwrap()).0, SHORT_TYPE);
    }

    #[test]
    fn test_long_verse_record_round_trip() {
        let mut ba = ByteArray::new();
        let record = sample(3, 7, Some(5));
        push_record(&mut ba, &record, false).unwrap();

        let (decoded, is_last, _) = read_record(&ba, 0, true).unwrap();
        assert_eq!(decoded.unwrap(), record);
        assert!(!is_last);
        assert_eq!(unpack_header(ba.byte(0).unwrap()).0, LONG_TYPE);
    }

    #[test]
    fn test_chapter_record_has_no_verses_field() {
        let mut ba = ByteArray::new();
        let record = sample(0, 2, None);
        push_record(&mut ba, &record, true).unwrap();

        let (decoded, _, len) = read_record(&ba, 0, false).unwrap();
        assert_eq!(decoded.unwrap(), record);
        assert_eq!(len, ba.len());
    }

    #[test]
    fn test_empty_slot_is_one_byte() {
        let mut ba = ByteArray::new();
        push_empty(&mut ba).unwrap();
        assert_eq!(ba.len(), 1);

        let (decoded, is_last, len) = read_record(&ba, 0, true).unwrap();
        assert!(decoded.is_none());
        assert!(is_last);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_record_stream_scan() {
        let mut ba = ByteArray::new();
        push_record(&mut ba, &sample(0, 0, Some(1)), false).unwrap();
        push_record(&mut ba, &sample(1, 2, Some(1)), true).unwrap();
        push_empty(&mut ba).unwrap();
        push_record(&mut ba, &sample(2, 2, Some(2)), true).unwrap();

        let mut pos = 0;
        let mut groups = 0;
        while pos < ba.len() {
            let (_, is_last, len) = read_record(&ba, pos, true).unwrap();
            if is_last {
                groups += 1;
            }
            pos += len;
        }
        assert_eq!(pos, ba.len());
        assert_eq!(groups, 3);
    }
}
