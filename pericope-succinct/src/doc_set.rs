//! DocSet: the owner of the enum tables shared by a group of documents,
//! and of the documents themselves.
//!
//! All mutation entry points that need both enum context and a document
//! destructure the DocSet, so the enum tables reach `Document` methods as
//! an explicit context argument rather than ambient state.
//!
//! ## Adding documents
//!
//! The first document of a set drives the plain two-pass build. Every
//! later document triggers the rebuild-on-merge path: pre-enumeration is
//! re-run over all sequences of all documents (old and new), the union is
//! re-sorted and rebuilt to the side, an old-index → new-index mapping is
//! derived, and every existing document's streams are rewritten against
//! it. Nothing is installed until every rewrite has succeeded — a failure
//! partway leaves the pre-merge state intact.

use crate::enums::remap::{rewrite_item_stream, rewrite_verse_index, EnumRemap};
use crate::enums::{EnumCategory, EnumSet};
use crate::error::{Result, SuccinctError};
use crate::format;
use crate::item::{ItemType, TokenCategory};
use crate::model::sequence::record_sequence_pre_enums;
use crate::model::{Document, FilterOptions, ParsedDocument, RewriteRules};
use pericope_core::{ByteArray, WordBitSet};
use rustc_hash::FxHashMap;

/// A selector group's enum tables and documents.
#[derive(Debug, Clone, Default)]
pub struct DocSet {
    id: String,
    enums: EnumSet,
    documents: FxHashMap<String, Document>,
}

impl DocSet {
    /// New empty DocSet for a selector group.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enums: EnumSet::new(),
            documents: FxHashMap::default(),
        }
    }

    pub(crate) fn with_enums(id: &str, enums: EnumSet) -> Self {
        Self {
            id: id.to_string(),
            enums,
            documents: FxHashMap::default(),
        }
    }

    pub(crate) fn install_document(&mut self, document: Document) {
        self.documents.insert(document.id.clone(), document);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The shared enum tables (read-only; mutation goes through the
    /// document-adding and editing entry points).
    pub fn enums(&self) -> &EnumSet {
        &self.enums
    }

    pub fn document(&self, doc_id: &str) -> Option<&Document> {
        self.documents.get(doc_id)
    }

    pub fn document_mut(&mut self, doc_id: &str) -> Option<&mut Document> {
        self.documents.get_mut(doc_id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    // ------------------------------------------------------------------
    // Import
    // ------------------------------------------------------------------

    /// Import a parsed document: the two succinct passes, the optional
    /// import-time filter, and the chapter/verse index. Returns the new
    /// document's id.
    pub fn add_document(
        &mut self,
        parsed: ParsedDocument,
        filter: Option<&FilterOptions>,
    ) -> Result<String> {
        if let Some(options) = filter {
            options.validate()?;
        }
        match parsed.sequences.iter().filter(|s| s.is_main()).count() {
            0 => return Err(SuccinctError::NoMainSequence),
            1 => {}
            _ => return Err(SuccinctError::MultipleMainSequences),
        }

        // Succinct pass 1: collect the complete string corpus to the side.
        // For a populated set this carries every already-interned value
        // (indices are never dropped, only remapped) and re-records every
        // existing document on top.
        let fresh = EnumCategory::ALL
            .iter()
            .all(|category| self.enums.table(*category).is_empty());
        let mut staged = EnumSet::new();
        if !fresh {
            for category in EnumCategory::ALL {
                for (_, value) in self.enums.table(category).iter() {
                    staged.record_pre_enum(category, value);
                }
            }
        }
        for document in self.documents.values() {
            rerecord_document_pre_enums(document, &self.enums, &mut staged)?;
        }
        for sequence in &parsed.sequences {
            record_sequence_pre_enums(&mut staged, sequence)?;
        }
        staged.sort_pre_enums();
        staged.build_enums();

        if fresh {
            staged.set_generation(self.enums.generation());
            self.enums = staged;
        } else {
            self.merge_rebuilt_enums(staged)?;
        }

        // Succinct pass 2 against the (possibly regenerated) tables.
        let mut document = Document::from_parsed(&self.id, &parsed, &self.enums)?;
        if let Some(options) = filter {
            document.succinct_filter(&self.enums, options)?;
        }
        document.build_chapter_verse_index(&self.enums)?;

        let doc_id = document.id.clone();
        tracing::debug!(
            doc_set = %self.id,
            document = %doc_id,
            sequences = document.sequences.len(),
            generation = self.enums.generation(),
            "document imported"
        );
        self.documents.insert(doc_id.clone(), document);
        Ok(doc_id)
    }

    /// Swap rebuilt enum tables in, remapping every existing document's
    /// streams. All rewrites happen to the side; the swap is the last step.
    fn merge_rebuilt_enums(&mut self, mut staged: EnumSet) -> Result<()> {
        let remap = EnumRemap::between(&self.enums, &staged)?;
        let old_word_count = self.enums.table(EnumCategory::WordLike).len();

        struct RewrittenSeq {
            doc_id: String,
            seq_id: String,
            blocks: Vec<crate::model::Block>,
            chapter_verses: FxHashMap<String, ByteArray>,
            tokens_present: Option<WordBitSet>,
        }

        let mut rewritten: Vec<RewrittenSeq> = Vec::new();
        for document in self.documents.values() {
            for sequence in document.sequences.values() {
                let mut blocks = Vec::with_capacity(sequence.blocks.len());
                for block in &sequence.blocks {
                    blocks.push(crate::model::Block {
                        block_scope: rewrite_item_stream(&block.block_scope, &remap)?,
                        block_grafts: rewrite_item_stream(&block.block_grafts, &remap)?,
                        content: rewrite_item_stream(&block.content, &remap)?,
                        open_scopes: rewrite_item_stream(&block.open_scopes, &remap)?,
                        included_scopes: rewrite_item_stream(&block.included_scopes, &remap)?,
                        next_token: block.next_token.clone(),
                    });
                }
                let mut chapter_verses = FxHashMap::default();
                for (chapter, ba) in &sequence.chapter_verses {
                    chapter_verses.insert(chapter.clone(), rewrite_verse_index(ba, &remap)?);
                }
                let tokens_present = match &sequence.tokens_present {
                    Some(bits) => {
                        let mut remapped =
                            WordBitSet::new(staged.table(EnumCategory::WordLike).len());
                        for old_index in 0..old_word_count {
                            if bits.get(old_index) {
                                let new_index =
                                    remap.map(EnumCategory::WordLike, old_index as u32)?;
                                remapped.set(new_index as usize);
                            }
                        }
                        Some(remapped)
                    }
                    None => None,
                };
                rewritten.push(RewrittenSeq {
                    doc_id: document.id.clone(),
                    seq_id: sequence.id.clone(),
                    blocks,
                    chapter_verses,
                    tokens_present,
                });
            }
        }

        // Every stream of every document rewrote cleanly: commit.
        staged.set_generation(self.enums.generation() + 1);
        self.enums = staged;
        let mut remapped_sequences = 0usize;
        for entry in rewritten {
            if let Some(document) = self.documents.get_mut(&entry.doc_id) {
                document.enum_generation = self.enums.generation();
                if let Some(sequence) = document.sequences.get_mut(&entry.seq_id) {
                    sequence.blocks = entry.blocks;
                    sequence.chapter_verses = entry.chapter_verses;
                    if entry.tokens_present.is_some() {
                        sequence.tokens_present = entry.tokens_present;
                    }
                    remapped_sequences += 1;
                }
            }
        }
        tracing::debug!(
            doc_set = %self.id,
            remapped_sequences,
            generation = self.enums.generation(),
            "enum tables regenerated and documents remapped"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Editing entry points (enum context + document, destructured)
    // ------------------------------------------------------------------

    /// Rewrite one sequence of one document via the generic contract.
    /// `Ok(false)` when either id is unknown.
    pub fn modify_sequence(
        &mut self,
        doc_id: &str,
        seq_id: &str,
        rules: &RewriteRules<'_>,
    ) -> Result<bool> {
        let Self {
            enums, documents, ..
        } = self;
        match documents.get_mut(doc_id) {
            Some(document) => document.modify_sequence(enums, seq_id, rules),
            None => Ok(false),
        }
    }

    /// Apply scope/graft prefix filters to every sequence of a document.
    /// `Ok(false)` when the document is unknown.
    pub fn succinct_filter(&mut self, doc_id: &str, options: &FilterOptions) -> Result<bool> {
        let Self {
            enums, documents, ..
        } = self;
        match documents.get_mut(doc_id) {
            Some(document) => {
                document.succinct_filter(enums, options)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Create an empty sequence. `None` when the document is unknown.
    pub fn new_sequence(&mut self, doc_id: &str, seq_type: &str) -> Option<String> {
        self.documents
            .get_mut(doc_id)
            .map(|document| document.new_sequence(seq_type))
    }

    /// Delete a sequence (never the main one). `Ok(false)` when either id
    /// is unknown.
    pub fn delete_sequence(&mut self, doc_id: &str, seq_id: &str) -> Result<bool> {
        let Self {
            enums, documents, ..
        } = self;
        match documents.get_mut(doc_id) {
            Some(document) => document.delete_sequence(enums, seq_id),
            None => Ok(false),
        }
    }

    /// Insert an empty block. `Ok(false)` on unknown ids or positions.
    pub fn new_block(
        &mut self,
        doc_id: &str,
        seq_id: &str,
        position: usize,
        scope_label: &str,
    ) -> Result<bool> {
        let Self {
            enums, documents, ..
        } = self;
        match documents.get_mut(doc_id) {
            Some(document) => document.new_block(enums, seq_id, position, scope_label),
            None => Ok(false),
        }
    }

    /// Remove a block. `Ok(false)` on unknown ids or positions.
    pub fn delete_block(&mut self, doc_id: &str, seq_id: &str, position: usize) -> Result<bool> {
        let Self {
            enums, documents, ..
        } = self;
        match documents.get_mut(doc_id) {
            Some(document) => document.delete_block(enums, seq_id, position),
            None => Ok(false),
        }
    }

    /// Collect unreachable sequences of a document. `Ok(false)` when the
    /// document is unknown or nothing was removed.
    pub fn gc_sequences(&mut self, doc_id: &str) -> Result<bool> {
        let Self {
            enums, documents, ..
        } = self;
        match documents.get_mut(doc_id) {
            Some(document) => document.gc_sequences(enums),
            None => Ok(false),
        }
    }

    /// Word-presence probe against a document's main-sequence bitset.
    pub fn word_present(&self, doc_id: &str, word: &str) -> bool {
        self.documents
            .get(doc_id)
            .is_some_and(|document| document.word_present(&self.enums, word))
    }
}

/// Re-record one document's interned strings into a staged enum set,
/// decoding its succinct streams via the current tables.
fn rerecord_document_pre_enums(
    document: &Document,
    enums: &EnumSet,
    staged: &mut EnumSet,
) -> Result<()> {
    for sequence in document.sequences.values() {
        staged.record_pre_enum(EnumCategory::Ids, &sequence.id);
        staged.record_pre_enum(EnumCategory::ScopeBits, "0");
        for block in &sequence.blocks {
            for stream in [
                &block.block_scope,
                &block.block_grafts,
                &block.content,
                &block.included_scopes,
                &block.open_scopes,
            ] {
                rerecord_stream_pre_enums(stream, enums, staged)?;
            }
        }
    }
    Ok(())
}

fn rerecord_stream_pre_enums(
    stream: &ByteArray,
    enums: &EnumSet,
    staged: &mut EnumSet,
) -> Result<()> {
    let mut pos = 0;
    while pos < stream.len() {
        let (record_len, item_type, subtype) = format::header(stream, pos)?;
        match item_type {
            ItemType::Token => {
                let token_type = format::token_type(subtype, pos)?;
                let category = match token_type.category() {
                    TokenCategory::WordLike => EnumCategory::WordLike,
                    TokenCategory::NotWordLike => EnumCategory::NotWordLike,
                };
                let value = enums.value_of(category, format::token_index(stream, pos)?)?;
                let value = value.to_string();
                staged.record_pre_enum(category, &value);
            }
            ItemType::Graft => {
                let (graft_type, _) = format::graft_indices(stream, pos)?;
                let value = enums
                    .value_of(EnumCategory::GraftTypes, graft_type)?
                    .to_string();
                staged.record_pre_enum(EnumCategory::GraftTypes, &value);
            }
            ItemType::StartScope => {
                let kind = format::scope_kind(subtype, pos)?;
                for index in format::scope_bit_indices(stream, pos, kind)? {
                    let value = enums.value_of(EnumCategory::ScopeBits, index)?.to_string();
                    staged.record_pre_enum(EnumCategory::ScopeBits, &value);
                }
            }
            ItemType::EndScope => {}
        }
        pos += record_len;
    }
    Ok(())
}
