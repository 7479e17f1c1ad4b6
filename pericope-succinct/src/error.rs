//! Error types for the succinct document model.
//!
//! The taxonomy follows three severities: malformed input and invalid
//! operations are fatal errors; expected caller-side misses (unknown
//! sequence id, out-of-range block position) are `Ok(false)` returns on the
//! operations themselves, never errors; tolerated markup imbalance during
//! scans is logged and skipped, not surfaced here.

use pericope_core::CoreError;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, SuccinctError>;

#[derive(Error, Debug)]
pub enum SuccinctError {
    /// Byte-level failure from the underlying buffer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Scope label whose first component is not a known label-kind.
    #[error("unknown scope kind in label '{0}'")]
    UnknownScopeKind(String),

    /// Scope label with the wrong number of `/`-separated components.
    #[error("scope '{label}' has {found} component(s), expected {expected}")]
    ScopeArity {
        label: String,
        expected: usize,
        found: usize,
    },

    /// Record header with an impossible length field.
    #[error("bad record header at offset {offset}: length {length}")]
    BadRecordHeader { offset: usize, length: usize },

    /// Subtype byte that does not decode for the record's item kind.
    #[error("bad record subtype {subtype} at offset {offset}")]
    BadSubtype { offset: usize, subtype: u8 },

    /// Encoded record would exceed the 6-bit length field.
    #[error("record of {0} bytes exceeds the maximum record length")]
    RecordTooLong(usize),

    /// Graft-type index too large for the subtype byte.
    #[error("graft type index {0} does not fit a subtype byte")]
    GraftTypeOverflow(u32),

    /// A string expected to be interned was not found in its enum table.
    #[error("value '{value}' not interned in {category} enum")]
    MissingEnumValue {
        category: &'static str,
        value: String,
    },

    /// An interned index with no entry in its enum table.
    #[error("index {index} not present in {category} enum")]
    MissingEnumIndex { category: &'static str, index: u32 },

    /// Parsed document without exactly one main sequence.
    #[error("parsed document has no main sequence")]
    NoMainSequence,

    /// Parsed document with more than one main sequence.
    #[error("parsed document has more than one main sequence")]
    MultipleMainSequences,

    /// Attempt to delete the main sequence.
    #[error("cannot delete main sequence")]
    DeleteMainSequence,

    /// The same prefix listed as both included and excluded.
    #[error("contradictory filter: '{0}' is both included and excluded")]
    ContradictoryFilter(String),
}
