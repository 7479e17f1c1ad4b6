//! Producer contract: the parsed item stream handed to the build passes.
//!
//! Lexers/parsers are external collaborators; they deliver documents in
//! this shape. The build passes validate scope labels against the arity
//! table and reject documents without exactly one main sequence.

use crate::item::Item;
use pericope_core::generate_id;
use rustc_hash::FxHashMap;

/// Sequence type of the one designated main sequence.
pub const MAIN_TYPE: &str = "main";

/// Structural base sequence types (vs. auxiliary ones).
pub const BASE_SEQUENCE_TYPES: &[&str] = &[
    "main",
    "introduction",
    "introTitle",
    "introEndTitle",
    "title",
    "endTitle",
    "heading",
    "header",
    "remark",
    "sidebar",
];

/// A parsed document ready for succinctification.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub headers: FxHashMap<String, String>,
    pub tags: Vec<String>,
    pub sequences: Vec<ParsedSequence>,
}

/// One parsed sequence: an ordered list of blocks.
#[derive(Debug, Clone)]
pub struct ParsedSequence {
    pub id: String,
    pub seq_type: String,
    pub tags: Vec<String>,
    pub blocks: Vec<ParsedBlock>,
}

impl ParsedSequence {
    /// New empty sequence with a fresh id.
    pub fn new(seq_type: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            seq_type: seq_type.into(),
            tags: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn is_main(&self) -> bool {
        self.seq_type == MAIN_TYPE
    }
}

/// One parsed block: a block scope, block-level grafts, and content items.
#[derive(Debug, Clone)]
pub struct ParsedBlock {
    /// The block's own opening scope (a start-scope item).
    pub block_scope: Item,
    /// Grafts attached before the block.
    pub block_grafts: Vec<Item>,
    /// The interleaved token/scope/graft content.
    pub items: Vec<Item>,
}

impl ParsedBlock {
    /// New block opened by the given block-scope label.
    pub fn new(scope_label: impl Into<String>) -> Self {
        Self {
            block_scope: Item::start_scope(scope_label),
            block_grafts: Vec::new(),
            items: Vec::new(),
        }
    }
}
