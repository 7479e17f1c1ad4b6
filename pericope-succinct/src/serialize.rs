//! Portable serialized form.
//!
//! One record per document: headers, mainId, tags and, per sequence, its
//! type/tags and six base64 byte strings per block, plus — for the main
//! sequence — the chapter and chapter-verse index byte strings and the
//! hex-encoded token-presence bitset. The DocSet record additionally
//! carries the frozen enum tables as ordered string lists per category,
//! so a round trip reproduces identical enum-relative encodings.

use crate::doc_set::DocSet;
use crate::enums::{EnumCategory, EnumSet, EnumTable};
use crate::error::Result;
use crate::model::{Block, Document, Sequence};
use pericope_core::{ByteArray, WordBitSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ----------------------------------------------------------------------------
// Wire shapes
// ----------------------------------------------------------------------------

/// Six base64 streams of one block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedBlock {
    pub bs: String,
    pub bg: String,
    pub c: String,
    pub is: String,
    pub os: String,
    pub nt: String,
}

/// One sequence: type, tags, blocks, and (main only) index state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedSequence {
    #[serde(rename = "type")]
    pub seq_type: String,
    pub blocks: Vec<SerializedBlock>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<BTreeMap<String, String>>,
    #[serde(
        rename = "chapterVerses",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub chapter_verses: Option<BTreeMap<String, String>>,
    #[serde(
        rename = "tokensPresent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tokens_present: Option<String>,
}

/// One document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedDocument {
    pub headers: BTreeMap<String, String>,
    #[serde(rename = "mainId")]
    pub main_id: String,
    pub tags: Vec<String>,
    pub sequences: BTreeMap<String, SerializedSequence>,
}

/// Frozen enum tables as ordered value lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedEnums {
    #[serde(rename = "wordLike")]
    pub word_like: Vec<String>,
    #[serde(rename = "notWordLike")]
    pub not_word_like: Vec<String>,
    #[serde(rename = "scopeBits")]
    pub scope_bits: Vec<String>,
    #[serde(rename = "graftTypes")]
    pub graft_types: Vec<String>,
    pub ids: Vec<String>,
}

/// A whole DocSet: enum tables plus its documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedDocSet {
    pub id: String,
    pub enums: SerializedEnums,
    pub documents: BTreeMap<String, SerializedDocument>,
}

// ----------------------------------------------------------------------------
// Document <-> wire
// ----------------------------------------------------------------------------

fn serialize_block(block: &Block) -> SerializedBlock {
    SerializedBlock {
        bs: block.block_scope.to_base64(),
        bg: block.block_grafts.to_base64(),
        c: block.content.to_base64(),
        is: block.included_scopes.to_base64(),
        os: block.open_scopes.to_base64(),
        nt: block.next_token.to_base64(),
    }
}

fn deserialize_block(serialized: &SerializedBlock) -> Result<Block> {
    Ok(Block {
        block_scope: ByteArray::from_base64(&serialized.bs)?,
        block_grafts: ByteArray::from_base64(&serialized.bg)?,
        content: ByteArray::from_base64(&serialized.c)?,
        included_scopes: ByteArray::from_base64(&serialized.is)?,
        open_scopes: ByteArray::from_base64(&serialized.os)?,
        next_token: ByteArray::from_base64(&serialized.nt)?,
    })
}

fn sorted(tags: &rustc_hash::FxHashSet<String>) -> Vec<String> {
    let mut tags: Vec<String> = tags.iter().cloned().collect();
    tags.sort_unstable();
    tags
}

fn serialize_sequence(sequence: &Sequence) -> SerializedSequence {
    let mut serialized = SerializedSequence {
        seq_type: sequence.seq_type.clone(),
        blocks: sequence.blocks.iter().map(serialize_block).collect(),
        tags: sorted(&sequence.tags),
        chapters: None,
        chapter_verses: None,
        tokens_present: None,
    };
    if sequence.is_main() {
        serialized.chapters = Some(
            sequence
                .chapters
                .iter()
                .map(|(n, ba)| (n.clone(), ba.to_base64()))
                .collect(),
        );
        serialized.chapter_verses = Some(
            sequence
                .chapter_verses
                .iter()
                .map(|(n, ba)| (n.clone(), ba.to_base64()))
                .collect(),
        );
        serialized.tokens_present = sequence.tokens_present.as_ref().map(WordBitSet::to_hex);
    }
    serialized
}

fn deserialize_sequence(
    seq_id: &str,
    serialized: &SerializedSequence,
    n_words: usize,
) -> Result<Sequence> {
    let mut sequence = Sequence::new(seq_id, serialized.seq_type.clone());
    sequence.tags = serialized.tags.iter().cloned().collect();
    for block in &serialized.blocks {
        sequence.blocks.push(deserialize_block(block)?);
    }
    if let Some(chapters) = &serialized.chapters {
        for (n, encoded) in chapters {
            sequence
                .chapters
                .insert(n.clone(), ByteArray::from_base64(encoded)?);
        }
    }
    if let Some(chapter_verses) = &serialized.chapter_verses {
        for (n, encoded) in chapter_verses {
            sequence
                .chapter_verses
                .insert(n.clone(), ByteArray::from_base64(encoded)?);
        }
    }
    if let Some(tokens_present) = &serialized.tokens_present {
        sequence.tokens_present = Some(WordBitSet::from_hex(tokens_present, n_words)?);
    }
    Ok(sequence)
}

impl Document {
    /// Export this document's portable record.
    pub fn to_serialized(&self) -> SerializedDocument {
        SerializedDocument {
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            main_id: self.main_id.clone(),
            tags: sorted(&self.tags),
            sequences: self
                .sequences
                .iter()
                .map(|(seq_id, seq)| (seq_id.clone(), serialize_sequence(seq)))
                .collect(),
        }
    }

    /// Rebuild a document from its portable record. The enum context must
    /// be the same set (same order) the record was encoded against.
    pub fn from_serialized(
        doc_id: &str,
        doc_set_id: &str,
        serialized: &SerializedDocument,
        enums: &EnumSet,
    ) -> Result<Self> {
        let n_words = enums.table(EnumCategory::WordLike).len();
        let mut sequences = rustc_hash::FxHashMap::default();
        for (seq_id, seq) in &serialized.sequences {
            sequences.insert(seq_id.clone(), deserialize_sequence(seq_id, seq, n_words)?);
        }
        Ok(Document {
            id: doc_id.to_string(),
            doc_set_id: doc_set_id.to_string(),
            headers: serialized
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            main_id: serialized.main_id.clone(),
            tags: serialized.tags.iter().cloned().collect(),
            sequences,
            enum_generation: enums.generation(),
        })
    }
}

// ----------------------------------------------------------------------------
// DocSet <-> wire
// ----------------------------------------------------------------------------

fn table_values(enums: &EnumSet, category: EnumCategory) -> Vec<String> {
    enums
        .table(category)
        .iter()
        .map(|(_, value)| value.to_string())
        .collect()
}

impl DocSet {
    /// Export the whole DocSet: ordered enum lists plus every document.
    pub fn to_serialized(&self) -> SerializedDocSet {
        SerializedDocSet {
            id: self.id().to_string(),
            enums: SerializedEnums {
                word_like: table_values(self.enums(), EnumCategory::WordLike),
                not_word_like: table_values(self.enums(), EnumCategory::NotWordLike),
                scope_bits: table_values(self.enums(), EnumCategory::ScopeBits),
                graft_types: table_values(self.enums(), EnumCategory::GraftTypes),
                ids: table_values(self.enums(), EnumCategory::Ids),
            },
            documents: self
                .documents()
                .map(|doc| (doc.id.clone(), doc.to_serialized()))
                .collect(),
        }
    }

    /// Rebuild a DocSet from its portable record. Enum indices are seeded
    /// from the ordered lists, so every document's bytes decode
    /// identically to the exporting session.
    pub fn from_serialized(serialized: &SerializedDocSet) -> Result<Self> {
        let mut enums = EnumSet::new();
        *enums.table_mut(EnumCategory::WordLike) =
            EnumTable::from_ordered(serialized.enums.word_like.clone());
        *enums.table_mut(EnumCategory::NotWordLike) =
            EnumTable::from_ordered(serialized.enums.not_word_like.clone());
        *enums.table_mut(EnumCategory::ScopeBits) =
            EnumTable::from_ordered(serialized.enums.scope_bits.clone());
        *enums.table_mut(EnumCategory::GraftTypes) =
            EnumTable::from_ordered(serialized.enums.graft_types.clone());
        *enums.table_mut(EnumCategory::Ids) =
            EnumTable::from_ordered(serialized.enums.ids.clone());

        let mut doc_set = DocSet::with_enums(&serialized.id, enums);
        for (doc_id, doc) in &serialized.documents {
            let document =
                Document::from_serialized(doc_id, &serialized.id, doc, doc_set.enums())?;
            doc_set.install_document(document);
        }
        Ok(doc_set)
    }
}
