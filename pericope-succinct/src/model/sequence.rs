//! Sequence: an ordered list of succinct blocks, plus the succinctifier
//! that builds them from a parsed item stream.

use crate::enums::{EnumCategory, EnumSet};
use crate::error::Result;
use crate::format;
use crate::item::{parse_scope_label, Item, ItemType, ScopeSubType, TokenCategory, TokenType};
use crate::model::block::Block;
use crate::model::parsed::{ParsedSequence, BASE_SEQUENCE_TYPES, MAIN_TYPE};
use pericope_core::{ByteArray, WordBitSet};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// An ordered list of blocks with a type and tags. The main sequence
/// additionally carries the chapter/verse index byte arrays and the
/// token-presence bitset.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    pub id: String,
    pub seq_type: String,
    pub tags: FxHashSet<String>,
    pub is_base_type: bool,
    pub blocks: Vec<Block>,
    /// Chapter index byte arrays, keyed by chapter number. Main only.
    pub chapters: FxHashMap<String, ByteArray>,
    /// Per-chapter verse index byte arrays. Main only.
    pub chapter_verses: FxHashMap<String, ByteArray>,
    /// One bit per word-like enum index occurring in the document. Main only.
    pub tokens_present: Option<WordBitSet>,
}

impl Sequence {
    /// New empty sequence.
    pub fn new(id: impl Into<String>, seq_type: impl Into<String>) -> Self {
        let seq_type = seq_type.into();
        Self {
            id: id.into(),
            is_base_type: BASE_SEQUENCE_TYPES.contains(&seq_type.as_str()),
            seq_type,
            ..Default::default()
        }
    }

    pub fn is_main(&self) -> bool {
        self.seq_type == MAIN_TYPE
    }

    pub fn add_tag(&mut self, tag: &str) -> Result<()> {
        Ok(pericope_core::add_tag(&mut self.tags, tag)?)
    }

    pub fn remove_tag(&mut self, tag: &str) {
        pericope_core::remove_tag(&mut self.tags, tag);
    }

    /// Succinctify a parsed sequence: encode every block's item list into
    /// the six byte streams, carrying the open-scope set and the word-like
    /// token counter across blocks.
    pub fn from_parsed(parsed: &ParsedSequence, enums: &EnumSet) -> Result<Self> {
        let mut sequence = Sequence::new(parsed.id.clone(), parsed.seq_type.clone());
        sequence.tags = parsed.tags.iter().cloned().collect();

        let mut open_scopes: Vec<String> = Vec::new();
        let mut next_token: u32 = 0;

        for parsed_block in &parsed.blocks {
            let mut block = Block::new();
            block.next_token.push_varint(next_token);

            for graft in &parsed_block.block_grafts {
                push_item(&mut block.block_grafts, enums, graft)?;
            }
            for label in &open_scopes {
                push_scope_label(&mut block.open_scopes, enums, ScopeSubType::Start, label)?;
            }

            let mut included: Vec<String> = Vec::new();
            for item in &parsed_block.items {
                push_item(&mut block.content, enums, item)?;
                match item {
                    Item::Token { subtype, .. } => {
                        if *subtype == TokenType::WordLike {
                            next_token += 1;
                        }
                    }
                    Item::Scope { subtype, label } => match subtype {
                        ScopeSubType::Start => {
                            if !open_scopes.iter().any(|l| l == label) {
                                open_scopes.push(label.clone());
                            }
                            included.push(label.clone());
                        }
                        ScopeSubType::End => {
                            open_scopes.retain(|l| l != label);
                        }
                    },
                    Item::Graft { .. } => {}
                }
            }

            push_item(&mut block.block_scope, enums, &parsed_block.block_scope)?;
            for label in &included {
                push_scope_label(&mut block.included_scopes, enums, ScopeSubType::Start, label)?;
            }

            block.trim();
            sequence.blocks.push(block);
        }

        tracing::debug!(
            sequence = %sequence.id,
            seq_type = %sequence.seq_type,
            blocks = sequence.blocks.len(),
            word_tokens = next_token,
            "sequence succinctified"
        );
        Ok(sequence)
    }

    /// Recompute the derived `os`/`is`/`nt` streams of every block from the
    /// content streams alone.
    ///
    /// Used after item-level filtering, which can drop scope boundaries.
    /// Works at the byte level: open start-scope records are keyed by their
    /// post-header bytes (kind + bit indices), which an end scope of the
    /// same label shares.
    pub fn update_block_indexes(&mut self) -> Result<()> {
        let mut open: Vec<(Vec<u8>, Vec<u8>)> = Vec::new(); // (key, start record)
        let mut next_token: u32 = 0;

        for block in &mut self.blocks {
            let mut os = ByteArray::new();
            for (_, record) in &open {
                os.push_bytes(record);
            }
            let mut is = ByteArray::new();
            let mut nt = ByteArray::new();
            nt.push_varint(next_token);

            let content = &block.content;
            let mut pos = 0;
            while pos < content.len() {
                let (record_len, item_type, subtype) = format::header(content, pos)?;
                match item_type {
                    ItemType::Token => {
                        if format::token_type(subtype, pos)? == TokenType::WordLike {
                            next_token += 1;
                        }
                    }
                    ItemType::StartScope => {
                        let key = content.bytes(pos + 1, record_len - 1)?.to_vec();
                        let record = content.bytes(pos, record_len)?.to_vec();
                        is.push_bytes(&record);
                        if !open.iter().any(|(k, _)| *k == key) {
                            open.push((key, record));
                        }
                    }
                    ItemType::EndScope => {
                        let key = content.bytes(pos + 1, record_len - 1)?.to_vec();
                        open.retain(|(k, _)| *k != key);
                    }
                    ItemType::Graft => {}
                }
                pos += record_len;
            }

            block.open_scopes = os;
            block.included_scopes = is;
            block.next_token = nt;
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Item encoding
// ----------------------------------------------------------------------------

/// Encode one item onto a stream, interning payloads via strict lookups
/// (pre-enumeration has already recorded every value).
pub fn push_item(ba: &mut ByteArray, enums: &EnumSet, item: &Item) -> Result<()> {
    match item {
        Item::Token { subtype, payload } => {
            let category = match subtype.category() {
                TokenCategory::WordLike => EnumCategory::WordLike,
                TokenCategory::NotWordLike => EnumCategory::NotWordLike,
            };
            let index = enums.index_of(category, payload)?;
            format::push_token(ba, *subtype, index)
        }
        Item::Scope { subtype, label } => push_scope_label(ba, enums, *subtype, label),
        Item::Graft { subtype, seq_id } => {
            let graft_type = enums.index_of(EnumCategory::GraftTypes, subtype)?;
            let seq_index = enums.index_of(EnumCategory::Ids, seq_id)?;
            format::push_graft(ba, graft_type, seq_index)
        }
    }
}

/// Encode a scope record from its label, validating against the arity table.
pub fn push_scope_label(
    ba: &mut ByteArray,
    enums: &EnumSet,
    subtype: ScopeSubType,
    label: &str,
) -> Result<()> {
    let (kind, components) = parse_scope_label(label)?;
    let mut indices: SmallVec<[u32; 5]> = SmallVec::new();
    for component in components {
        indices.push(enums.index_of(EnumCategory::ScopeBits, component)?);
    }
    format::push_scope(ba, subtype, kind, &indices)
}

/// Pre-enumerate one item's interned strings into the pending sets.
///
/// Scope labels are validated against the arity table here — a bad label
/// aborts the whole import before anything is encoded.
pub fn record_item_pre_enums(enums: &mut EnumSet, item: &Item) -> Result<()> {
    match item {
        Item::Token { subtype, payload } => {
            let category = match subtype.category() {
                TokenCategory::WordLike => EnumCategory::WordLike,
                TokenCategory::NotWordLike => EnumCategory::NotWordLike,
            };
            enums.record_pre_enum(category, payload);
        }
        Item::Graft { subtype, seq_id } => {
            enums.record_pre_enum(EnumCategory::GraftTypes, subtype);
            enums.record_pre_enum(EnumCategory::Ids, seq_id);
        }
        Item::Scope { subtype, label } => {
            let (_, components) = parse_scope_label(label)?;
            if *subtype == ScopeSubType::Start {
                for component in components {
                    enums.record_pre_enum(EnumCategory::ScopeBits, component);
                }
            }
        }
    }
    Ok(())
}

/// Pre-enumerate a whole parsed sequence (block scopes, block grafts and
/// content items), plus its own id.
pub fn record_sequence_pre_enums(enums: &mut EnumSet, parsed: &ParsedSequence) -> Result<()> {
    enums.record_pre_enum(EnumCategory::Ids, &parsed.id);
    enums.record_pre_enum(EnumCategory::ScopeBits, "0");

    for block in &parsed.blocks {
        record_item_pre_enums(enums, &block.block_scope)?;
        for graft in &block.block_grafts {
            record_item_pre_enums(enums, graft)?;
        }
        for item in &block.items {
            record_item_pre_enums(enums, item)?;
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SuccinctError;
    use crate::model::parsed::ParsedBlock;
    use crate::read::{unsuccinctify_items, UnsuccinctifyOptions};

    fn parsed_two_blocks() -> ParsedSequence {
        let mut seq = ParsedSequence::new(MAIN_TYPE);
        let mut b1 = ParsedBlock::new("blockTag/p");
        b1.items = vec![
            Item::start_scope("chapter/1"),
            Item::start_scope("verse/1"),
            Item::token(TokenType::WordLike, "grace"),
            Item::token(TokenType::LineSpace, " "),
            Item::token(TokenType::WordLike, "and"),
        ];
        let mut b2 = ParsedBlock::new("blockTag/p");
        b2.items = vec![
            Item::token(TokenType::WordLike, "peace"),
            Item::end_scope("verse/1"),
            Item::end_scope("chapter/1"),
        ];
        seq.blocks = vec![b1, b2];
        seq
    }

    fn build_enums(parsed: &ParsedSequence) -> EnumSet {
        let mut enums = EnumSet::new();
        record_sequence_pre_enums(&mut enums, parsed).unwrap();
        enums.sort_pre_enums();
        enums.build_enums();
        enums
    }

    #[test]
    fn test_succinctify_carries_open_scopes() {
        let parsed = parsed_two_blocks();
        let enums = build_enums(&parsed);
        let seq = Sequence::from_parsed(&parsed, &enums).unwrap();

        assert_eq!(seq.blocks.len(), 2);
        // First block enters with nothing open.
        assert!(seq.blocks[0].open_scopes.is_empty());
        // Second block carries chapter/1 and verse/1 in.
        let carried = unsuccinctify_items(
            &enums,
            &seq.blocks[1].open_scopes,
            &UnsuccinctifyOptions::all(),
            &[],
        )
        .unwrap();
        assert_eq!(
            carried,
            vec![Item::start_scope("chapter/1"), Item::start_scope("verse/1")]
        );
    }

    #[test]
    fn test_succinctify_tracks_next_token() {
        let parsed = parsed_two_blocks();
        let enums = build_enums(&parsed);
        let seq = Sequence::from_parsed(&parsed, &enums).unwrap();

        assert_eq!(seq.blocks[0].next_token_count().unwrap(), 0);
        assert_eq!(seq.blocks[1].next_token_count().unwrap(), 2);
    }

    #[test]
    fn test_succinctify_included_scopes() {
        let parsed = parsed_two_blocks();
        let enums = build_enums(&parsed);
        let seq = Sequence::from_parsed(&parsed, &enums).unwrap();

        let included = unsuccinctify_items(
            &enums,
            &seq.blocks[0].included_scopes,
            &UnsuccinctifyOptions::all(),
            &[],
        )
        .unwrap();
        assert_eq!(included.len(), 2);
        assert!(seq.blocks[1].included_scopes.is_empty());
    }

    #[test]
    fn test_round_trip_content() {
        let parsed = parsed_two_blocks();
        let enums = build_enums(&parsed);
        let seq = Sequence::from_parsed(&parsed, &enums).unwrap();

        for (block, parsed_block) in seq.blocks.iter().zip(&parsed.blocks) {
            let items = unsuccinctify_items(
                &enums,
                &block.content,
                &UnsuccinctifyOptions::all(),
                &[],
            )
            .unwrap();
            assert_eq!(items, parsed_block.items);
        }
    }

    #[test]
    fn test_bad_arity_fails_pre_enum() {
        let mut seq = ParsedSequence::new(MAIN_TYPE);
        let mut block = ParsedBlock::new("blockTag/p");
        block.items = vec![Item::start_scope("chapter/1/extra")];
        seq.blocks = vec![block];

        let mut enums = EnumSet::new();
        assert!(matches!(
            record_sequence_pre_enums(&mut enums, &seq),
            Err(SuccinctError::ScopeArity { .. })
        ));
    }
}
