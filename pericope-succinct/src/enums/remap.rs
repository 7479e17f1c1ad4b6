//! Old-index → new-index remapping after an enum table rebuild.
//!
//! Regenerating a DocSet's enum tables (re-collect, re-sort, rebuild) can
//! give every string a different index. [`EnumRemap::between`] derives the
//! per-category mapping — which must cover every previously used index —
//! and the rewrite functions below walk succinct streams record by record,
//! re-encoding each interned index against the new tables. The rewrites
//! build fresh buffers; callers install them only once every stream of
//! every document has been rewritten (transactional merge discipline).

use crate::enums::{EnumCategory, EnumSet};
use crate::error::{Result, SuccinctError};
use crate::format;
use crate::item::{ItemType, TokenCategory};
use pericope_core::ByteArray;
use smallvec::SmallVec;

/// Per-category old-index → new-index arrays.
#[derive(Debug, Default)]
pub struct EnumRemap {
    word_like: Vec<u32>,
    not_word_like: Vec<u32>,
    scope_bits: Vec<u32>,
    graft_types: Vec<u32>,
    ids: Vec<u32>,
}

impl EnumRemap {
    /// Derive the mapping from an old set to its rebuilt successor.
    ///
    /// Every value of every old table must exist in the new one; a miss
    /// means the rebuild lost a string and the merge must abort.
    pub fn between(old: &EnumSet, new: &EnumSet) -> Result<Self> {
        let mut remap = Self::default();
        for category in EnumCategory::ALL {
            let table = remap.table_mut(category);
            for (_, value) in old.table(category).iter() {
                let new_index = new.table(category).get(value).ok_or_else(|| {
                    SuccinctError::MissingEnumValue {
                        category: category.as_str(),
                        value: value.to_string(),
                    }
                })?;
                table.push(new_index);
            }
        }
        Ok(remap)
    }

    fn table_mut(&mut self, category: EnumCategory) -> &mut Vec<u32> {
        match category {
            EnumCategory::WordLike => &mut self.word_like,
            EnumCategory::NotWordLike => &mut self.not_word_like,
            EnumCategory::ScopeBits => &mut self.scope_bits,
            EnumCategory::GraftTypes => &mut self.graft_types,
            EnumCategory::Ids => &mut self.ids,
        }
    }

    fn table(&self, category: EnumCategory) -> &[u32] {
        match category {
            EnumCategory::WordLike => &self.word_like,
            EnumCategory::NotWordLike => &self.not_word_like,
            EnumCategory::ScopeBits => &self.scope_bits,
            EnumCategory::GraftTypes => &self.graft_types,
            EnumCategory::Ids => &self.ids,
        }
    }

    /// Map one old index through a category's table.
    pub fn map(&self, category: EnumCategory, old_index: u32) -> Result<u32> {
        self.table(category)
            .get(old_index as usize)
            .copied()
            .ok_or(SuccinctError::MissingEnumIndex {
                category: category.as_str(),
                index: old_index,
            })
    }
}

/// Rewrite one succinct item stream against a remap, returning the new
/// buffer. Record lengths may change where varint widths change.
pub fn rewrite_item_stream(old: &ByteArray, remap: &EnumRemap) -> Result<ByteArray> {
    let mut new = ByteArray::with_capacity(old.len());
    let mut pos = 0;
    while pos < old.len() {
        let (record_len, item_type, subtype) = format::header(old, pos)?;
        match item_type {
            ItemType::Token => {
                let token_type = format::token_type(subtype, pos)?;
                let category = match token_type.category() {
                    TokenCategory::WordLike => EnumCategory::WordLike,
                    TokenCategory::NotWordLike => EnumCategory::NotWordLike,
                };
                let index = remap.map(category, format::token_index(old, pos)?)?;
                format::push_token(&mut new, token_type, index)?;
            }
            ItemType::Graft => {
                let (graft_type, seq_id) = format::graft_indices(old, pos)?;
                format::push_graft(
                    &mut new,
                    remap.map(EnumCategory::GraftTypes, graft_type)?,
                    remap.map(EnumCategory::Ids, seq_id)?,
                )?;
            }
            ItemType::StartScope | ItemType::EndScope => {
                let kind = format::scope_kind(subtype, pos)?;
                let old_bits = format::scope_bit_indices(old, pos, kind)?;
                let mut bits: SmallVec<[u32; 5]> = SmallVec::new();
                for bit in old_bits {
                    bits.push(remap.map(EnumCategory::ScopeBits, bit)?);
                }
                let subtype = if item_type == ItemType::StartScope {
                    crate::item::ScopeSubType::Start
                } else {
                    crate::item::ScopeSubType::End
                };
                format::push_scope(&mut new, subtype, kind, &bits)?;
            }
        }
        pos += record_len;
    }
    new.trim();
    Ok(new)
}

/// Rewrite a chapter-verses index stream, remapping each verse record's
/// verses-range enum index. Block/item offsets and token counters are
/// enum-independent and pass through unchanged.
pub fn rewrite_verse_index(old: &ByteArray, remap: &EnumRemap) -> Result<ByteArray> {
    use crate::format::cv_record;

    let mut new = ByteArray::with_capacity(old.len());
    let mut pos = 0;
    while pos < old.len() {
        let (record, is_last, record_len) = cv_record::read_record(old, pos, true)?;
        match record {
            Some(mut record) => {
                if let Some(verses_index) = record.verses_index {
                    record.verses_index =
                        Some(remap.map(EnumCategory::ScopeBits, verses_index)?);
                }
                cv_record::push_record(&mut new, &record, is_last)?;
            }
            None => cv_record::push_empty(&mut new)?,
        }
        pos += record_len;
    }
    new.trim();
    Ok(new)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ScopeKind, ScopeSubType, TokenType};

    fn built_set(words: &[&str], bits: &[&str], grafts: &[&str], ids: &[&str]) -> EnumSet {
        let mut enums = EnumSet::new();
        for w in words {
            enums.record_pre_enum(EnumCategory::WordLike, w);
        }
        for b in bits {
            enums.record_pre_enum(EnumCategory::ScopeBits, b);
        }
        for g in grafts {
            enums.record_pre_enum(EnumCategory::GraftTypes, g);
        }
        for i in ids {
            enums.record_pre_enum(EnumCategory::Ids, i);
        }
        enums.sort_pre_enums();
        enums.build_enums();
        enums
    }

    #[test]
    fn test_remap_is_a_covering_bijection() {
        let old = built_set(&["b", "d"], &["1"], &["note"], &["s1"]);
        let new = built_set(&["a", "b", "c", "d"], &["1"], &["note"], &["s1"]);

        let remap = EnumRemap::between(&old, &new).unwrap();
        // "b" moves 0 -> 1, "d" moves 1 -> 3
        assert_eq!(remap.map(EnumCategory::WordLike, 0).unwrap(), 1);
        assert_eq!(remap.map(EnumCategory::WordLike, 1).unwrap(), 3);
        assert!(remap.map(EnumCategory::WordLike, 2).is_err());
    }

    #[test]
    fn test_remap_missing_value_aborts() {
        let old = built_set(&["gone"], &[], &[], &[]);
        let new = built_set(&["kept"], &[], &[], &[]);
        assert!(matches!(
            EnumRemap::between(&old, &new),
            Err(SuccinctError::MissingEnumValue { .. })
        ));
    }

    #[test]
    fn test_rewrite_item_stream() {
        let old_enums = built_set(&["grace", "word"], &["1"], &["note"], &["s1"]);
        let new_enums = built_set(&["alpha", "grace", "word"], &["1", "2"], &["fig", "note"], &["s0", "s1"]);
        let remap = EnumRemap::between(&old_enums, &new_enums).unwrap();

        let mut ba = ByteArray::new();
        format::push_scope(&mut ba, ScopeSubType::Start, ScopeKind::Chapter, &[0]).unwrap();
        format::push_token(&mut ba, TokenType::WordLike, 0).unwrap(); // "grace"
        format::push_graft(&mut ba, 0, 0).unwrap(); // note -> s1
        format::push_scope(&mut ba, ScopeSubType::End, ScopeKind::Chapter, &[0]).unwrap();

        let new = rewrite_item_stream(&ba, &remap).unwrap();

        let (_, item_type, subtype) = format::header(&new, 0).unwrap();
        assert_eq!(item_type, ItemType::StartScope);
        assert_eq!(
            format::scope_bit_indices(&new, 0, format::scope_kind(subtype, 0).unwrap())
                .unwrap()
                .as_slice(),
            &[0] // "1" stays at 0 in the new scopeBits table
        );

        let (len0, _, _) = format::header(&new, 0).unwrap();
        let token_pos = len0;
        assert_eq!(format::token_index(&new, token_pos).unwrap(), 1); // "grace" now 1

        let (len1, _, _) = format::header(&new, token_pos).unwrap();
        let graft_pos = token_pos + len1;
        assert_eq!(format::graft_indices(&new, graft_pos).unwrap(), (1, 1));
    }

    #[test]
    fn test_rewrite_verse_index() {
        use crate::format::cv_record::{push_empty, push_record, read_record, CvRecord};

        let old_enums = built_set(&[], &["3-4"], &[], &[]);
        let new_enums = built_set(&[], &["1", "3-4"], &[], &[]);
        let remap = EnumRemap::between(&old_enums, &new_enums).unwrap();

        let mut ba = ByteArray::new();
        push_record(
            &mut ba,
            &CvRecord {
                start_block: 0,
                end_block: 0,
                start_item: 1,
                end_item: 5,
                next_token: 0,
                verses_index: Some(0),
            },
            true,
        )
        .unwrap();
        push_empty(&mut ba).unwrap();

        let new = rewrite_verse_index(&ba, &remap).unwrap();
        let (record, _, len) = read_record(&new, 0, true).unwrap();
        assert_eq!(record.unwrap().verses_index, Some(1));
        let (empty, _, _) = read_record(&new, len, true).unwrap();
        assert!(empty.is_none());
    }
}
