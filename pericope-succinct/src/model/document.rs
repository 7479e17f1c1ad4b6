//! Document: a set of named sequences, one designated main, with the
//! structural mutation and garbage-collection operations that keep the
//! succinct encoding consistent after edits.
//!
//! Every operation that can affect chapter/verse boundaries triggers a
//! full re-index of the main sequence; nothing is re-indexed
//! incrementally. Expected caller-side misses (unknown sequence id,
//! out-of-range block position) return `Ok(false)` without mutating
//! state; malformed labels and invalid operations are fatal errors.

use crate::cv_index;
use crate::enums::{EnumCategory, EnumSet};
use crate::error::{Result, SuccinctError};
use crate::format;
use crate::item::{parse_scope_label, ItemType, ScopeSubType};
use crate::model::block::Block;
use crate::model::parsed::ParsedDocument;
use crate::model::rewrite::{FilterOptions, ItemContext, RewriteRules};
use crate::model::sequence::Sequence;
use crate::read;
use pericope_core::generate_id;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Where graft references to a sequence live, depending on the target's
/// sequence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraftContext {
    /// Base-type targets are referenced from block-graft streams.
    Block,
    /// Auxiliary targets are referenced inline from content streams.
    Inline,
}

/// One logical text unit: headers, tags and a map of sequences.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub doc_set_id: String,
    pub headers: FxHashMap<String, String>,
    pub main_id: String,
    pub tags: FxHashSet<String>,
    pub sequences: FxHashMap<String, Sequence>,
    /// Enum-set generation this document's bytes were encoded against.
    pub(crate) enum_generation: u32,
}

impl Document {
    /// Succinct pass 2: encode every parsed sequence against already-built
    /// enum tables. Pass 1 (pre-enumeration and the enum build) is the
    /// DocSet's responsibility.
    pub(crate) fn from_parsed(
        doc_set_id: &str,
        parsed: &ParsedDocument,
        enums: &EnumSet,
    ) -> Result<Self> {
        let mut main_id: Option<String> = None;
        for sequence in &parsed.sequences {
            if sequence.is_main() {
                if main_id.is_some() {
                    return Err(SuccinctError::MultipleMainSequences);
                }
                main_id = Some(sequence.id.clone());
            }
        }
        let main_id = main_id.ok_or(SuccinctError::NoMainSequence)?;

        let mut sequences = FxHashMap::default();
        for parsed_seq in &parsed.sequences {
            let sequence = Sequence::from_parsed(parsed_seq, enums)?;
            sequences.insert(sequence.id.clone(), sequence);
        }

        let mut tags = FxHashSet::default();
        for tag in &parsed.tags {
            pericope_core::add_tag(&mut tags, tag)?;
        }

        Ok(Self {
            id: generate_id(),
            doc_set_id: doc_set_id.to_string(),
            headers: parsed.headers.clone(),
            main_id,
            tags,
            sequences,
            enum_generation: enums.generation(),
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn main_sequence(&self) -> Option<&Sequence> {
        self.sequences.get(&self.main_id)
    }

    /// The enum-set generation this document's bytes were encoded
    /// against. A mismatch with the owning set's current generation means
    /// the document was not remapped after a rebuild.
    pub fn enum_generation(&self) -> u32 {
        self.enum_generation
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    pub fn add_tag(&mut self, tag: &str) -> Result<()> {
        Ok(pericope_core::add_tag(&mut self.tags, tag)?)
    }

    pub fn remove_tag(&mut self, tag: &str) {
        pericope_core::remove_tag(&mut self.tags, tag);
    }

    /// Fast word-presence probe against the main sequence's bitset,
    /// without decoding any content.
    pub fn word_present(&self, enums: &EnumSet, word: &str) -> bool {
        let Some(index) = enums.table(EnumCategory::WordLike).get(word) else {
            return false;
        };
        self.main_sequence()
            .and_then(|seq| seq.tokens_present.as_ref())
            .is_some_and(|bits| bits.get(index as usize))
    }

    // ------------------------------------------------------------------
    // Generic rewrite
    // ------------------------------------------------------------------

    /// Produce a new version of a sequence by filtering/rewriting its
    /// blocks and items. Returns `Ok(false)` for an unknown sequence id.
    ///
    /// The output is always a well-formed item stream, even when items
    /// are dropped; callers requiring scope balance must filter
    /// consistently.
    pub fn modify_sequence(
        &mut self,
        enums: &EnumSet,
        seq_id: &str,
        rules: &RewriteRules<'_>,
    ) -> Result<bool> {
        let Some(mut sequence) = self.sequences.remove(seq_id) else {
            return Ok(false);
        };
        if let Some(rewrite) = rules.sequence_rewrite {
            rewrite(&mut sequence);
        }

        let old_blocks = std::mem::take(&mut sequence.blocks);
        let mut new_blocks = Vec::with_capacity(old_blocks.len());

        for (block_n, old_block) in old_blocks.iter().enumerate() {
            if let Some(filter) = rules.block_filter {
                if !filter(block_n, old_block) {
                    continue;
                }
            }
            let mut block = old_block.clone();
            if let Some(rewrite) = rules.block_rewrite {
                rewrite(block_n, &mut block);
            }
            block.content.clear();

            let mut pos = 0;
            let mut item_n = 0;
            while pos < old_block.content.len() {
                let (record_len, item_type, subtype) = format::header(&old_block.content, pos)?;
                let context = ItemContext {
                    block_n,
                    item_n,
                    item_type,
                    subtype,
                    pos,
                    record_len,
                };
                let keep = match rules.item_filter {
                    Some(filter) => filter(old_block, &context)?,
                    None => true,
                };
                if keep {
                    match rules.item_rewrite {
                        Some(rewrite) => rewrite(old_block, &context, &mut block.content)?,
                        None => format::copy_record(&old_block.content, pos, &mut block.content)?,
                    }
                }
                pos += record_len;
                item_n += 1;
            }

            block.trim();
            new_blocks.push(block);
        }

        sequence.blocks = new_blocks;
        let is_main = sequence.is_main();
        self.sequences.insert(seq_id.to_string(), sequence);

        if is_main {
            self.build_chapter_verse_index(enums)?;
        }
        Ok(true)
    }

    /// Apply include/exclude prefix filters over scope labels and graft
    /// types to every sequence, recompute the derived block streams, and
    /// collect sequences orphaned by removed grafts.
    pub fn succinct_filter(&mut self, enums: &EnumSet, options: &FilterOptions) -> Result<()> {
        if options.is_empty() {
            return Ok(());
        }
        options.validate()?;

        let item_filter = |old_block: &Block, context: &ItemContext| -> Result<bool> {
            match context.item_type {
                ItemType::Token => Ok(options.token_allowed()),
                ItemType::StartScope | ItemType::EndScope => {
                    let label = read::decode_scope_label(
                        enums,
                        &old_block.content,
                        context.pos,
                        context.subtype,
                    )?;
                    Ok(options.scope_allowed(&label))
                }
                ItemType::Graft => {
                    let (graft_type, _) =
                        read::decode_graft_parts(enums, &old_block.content, context.pos)?;
                    Ok(options.graft_allowed(&graft_type))
                }
            }
        };
        let rules = RewriteRules {
            item_filter: Some(&item_filter),
            ..RewriteRules::identity()
        };

        let seq_ids: Vec<String> = self.sequences.keys().cloned().collect();
        for seq_id in &seq_ids {
            self.modify_sequence(enums, seq_id, &rules)?;
        }
        for sequence in self.sequences.values_mut() {
            sequence.update_block_indexes()?;
        }
        self.gc_sequences(enums)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Create an empty sequence of the given type, returning its fresh id.
    pub fn new_sequence(&mut self, seq_type: &str) -> String {
        let seq_id = generate_id();
        self.sequences
            .insert(seq_id.clone(), Sequence::new(seq_id.clone(), seq_type));
        seq_id
    }

    /// Delete a sequence and every graft reference to it, then re-index
    /// and collect. Deleting the main sequence is fatal; an unknown id is
    /// `Ok(false)`.
    pub fn delete_sequence(&mut self, enums: &EnumSet, seq_id: &str) -> Result<bool> {
        let Some(sequence) = self.sequences.get(seq_id) else {
            return Ok(false);
        };
        if sequence.is_main() {
            return Err(SuccinctError::DeleteMainSequence);
        }
        let context = if sequence.is_base_type {
            GraftContext::Block
        } else {
            GraftContext::Inline
        };
        self.gc_sequence_references(enums, context, seq_id)?;
        self.sequences.remove(seq_id);
        self.build_chapter_verse_index(enums)?;
        self.gc_sequences(enums)?;
        Ok(true)
    }

    /// Splice every graft record targeting `seq_id` out of the relevant
    /// stream of every block.
    fn gc_sequence_references(
        &mut self,
        enums: &EnumSet,
        context: GraftContext,
        seq_id: &str,
    ) -> Result<()> {
        for sequence in self.sequences.values_mut() {
            for block in &mut sequence.blocks {
                let stream = match context {
                    GraftContext::Block => &mut block.block_grafts,
                    GraftContext::Inline => &mut block.content,
                };
                let mut pos = 0;
                while pos < stream.len() {
                    let (record_len, item_type, _) = format::header(stream, pos)?;
                    if item_type == ItemType::Graft {
                        let (_, target) = format::graft_indices(stream, pos)?;
                        if enums.value_of(EnumCategory::Ids, target)? == seq_id {
                            format::delete_record(stream, pos)?;
                            continue;
                        }
                    }
                    pos += record_len;
                }
            }
        }
        Ok(())
    }

    /// Insert an empty block at `position`, opened by `scope_label`.
    /// Unknown id or out-of-range position is `Ok(false)`; a malformed
    /// label is fatal.
    pub fn new_block(
        &mut self,
        enums: &mut EnumSet,
        seq_id: &str,
        position: usize,
        scope_label: &str,
    ) -> Result<bool> {
        let Some(sequence) = self.sequences.get_mut(seq_id) else {
            return Ok(false);
        };
        if position > sequence.blocks.len() {
            return Ok(false);
        }

        let (kind, components) = parse_scope_label(scope_label)?;
        let mut indices: SmallVec<[u32; 5]> = SmallVec::new();
        for component in components {
            indices.push(
                enums
                    .table_mut(EnumCategory::ScopeBits)
                    .get_or_insert(component),
            );
        }

        let mut block = Block::new();
        format::push_scope(&mut block.block_scope, ScopeSubType::Start, kind, &indices)?;
        sequence.blocks.insert(position, block);

        self.build_chapter_verse_index(enums)?;
        Ok(true)
    }

    /// Remove the block at `position`. Unknown id or out-of-range
    /// position is `Ok(false)`.
    pub fn delete_block(
        &mut self,
        enums: &EnumSet,
        seq_id: &str,
        position: usize,
    ) -> Result<bool> {
        let Some(sequence) = self.sequences.get_mut(seq_id) else {
            return Ok(false);
        };
        if position >= sequence.blocks.len() {
            return Ok(false);
        }
        sequence.blocks.remove(position);
        self.build_chapter_verse_index(enums)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Garbage collection
    // ------------------------------------------------------------------

    /// Mark-and-sweep over the graft reference graph, starting from the
    /// main sequence. Cycle-tolerant via the visited set. Returns whether
    /// any sequence was deleted.
    pub fn gc_sequences(&mut self, enums: &EnumSet) -> Result<bool> {
        let mut used: FxHashSet<String> = FxHashSet::default();
        let mut stack = vec![self.main_id.clone()];

        while let Some(seq_id) = stack.pop() {
            if !used.insert(seq_id.clone()) {
                continue;
            }
            let Some(sequence) = self.sequences.get(&seq_id) else {
                continue;
            };
            for block in &sequence.blocks {
                for stream in [&block.block_grafts, &block.content] {
                    let mut pos = 0;
                    while pos < stream.len() {
                        let (record_len, item_type, _) = format::header(stream, pos)?;
                        if item_type == ItemType::Graft {
                            let (_, target) = format::graft_indices(stream, pos)?;
                            let target_id = enums.value_of(EnumCategory::Ids, target)?;
                            if !used.contains(target_id) {
                                stack.push(target_id.to_string());
                            }
                        }
                        pos += record_len;
                    }
                }
            }
        }

        let before = self.sequences.len();
        self.sequences.retain(|seq_id, _| used.contains(seq_id));
        let removed = before - self.sequences.len();
        if removed > 0 {
            tracing::debug!(document = %self.id, removed, "unreachable sequences collected");
        }
        Ok(removed > 0)
    }

    // ------------------------------------------------------------------
    // Chapter/verse index
    // ------------------------------------------------------------------

    /// Full re-index of the main sequence. Never incremental.
    pub fn build_chapter_verse_index(&mut self, enums: &EnumSet) -> Result<()> {
        let main = self
            .sequences
            .get_mut(&self.main_id)
            .ok_or(SuccinctError::NoMainSequence)?;
        cv_index::build_chapter_verse_index(main, enums)
    }
}
