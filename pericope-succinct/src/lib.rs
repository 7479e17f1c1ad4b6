//! # Pericope Succinct
//!
//! The succinct document model for structured (scripture-shaped) text.
//!
//! Documents are stored as compact, random-accessible byte encodings —
//! per-block streams of self-describing records over string-interning
//! enum tables — rather than as parsed trees. This crate owns:
//!
//! - the item record codec and the chapter/verse index record codec
//! - the per-category enum tables with their two-phase build and the
//!   transactional rebuild/remap used when documents are merged into a
//!   populated [`DocSet`]
//! - the two-pass build pipeline from a parsed item stream to packed
//!   blocks
//! - structural edits (sequence/block creation and deletion, the generic
//!   sequence-rewrite contract, scope/graft filtering) and
//!   graft-reachability garbage collection
//! - the chapter/verse secondary index and the word-presence bitset
//! - the portable serialized form
//!
//! Parsers producing the item stream and the query layer consuming the
//! model are external collaborators; see [`model::parsed`] for the
//! producer contract and [`read`] for the consumer-facing decoders.
//!
//! Everything is single-threaded and synchronous: operations run to
//! completion, and `&mut` receivers enforce exclusive mutation.

pub mod cv_index;
pub mod doc_set;
pub mod enums;
pub mod error;
pub mod format;
pub mod item;
pub mod model;
pub mod read;
pub mod serialize;

// ── Core model ───────────────────────────────────────────────────────────────
pub use doc_set::DocSet;
pub use model::{
    Block, Document, FilterOptions, ItemContext, ParsedBlock, ParsedDocument, ParsedSequence,
    RewriteRules, Sequence, BASE_SEQUENCE_TYPES, MAIN_TYPE,
};

// ── Items and enums ──────────────────────────────────────────────────────────
pub use enums::{EnumCategory, EnumSet, EnumTable};
pub use item::{Item, ItemType, ScopeKind, ScopeSubType, TokenCategory, TokenType};

// ── Read side ────────────────────────────────────────────────────────────────
pub use cv_index::{
    chapter_index, chapter_indexes, chapter_verse_index, chapter_verse_indexes, CvIndexEntry,
};
pub use read::{
    block_scope_labels, unsuccinctify_block_items, unsuccinctify_items, UnsuccinctifyOptions,
};

// ── Errors and wire forms ────────────────────────────────────────────────────
pub use error::{Result, SuccinctError};
pub use serialize::{SerializedDocSet, SerializedDocument};
