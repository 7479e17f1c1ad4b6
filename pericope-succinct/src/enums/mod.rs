//! Per-category string-interning tables with the two-phase build.
//!
//! A category's final integer index for a string depends on the complete,
//! sorted corpus of strings in that category, so interning is split into a
//! collection phase ([`EnumSet::record_pre_enum`]), a one-time sort
//! ([`EnumSet::sort_pre_enums`]) and a freeze ([`EnumSet::build_enums`]).
//! After the freeze, indices are stable for the lifetime of the set:
//! [`EnumTable::get_or_insert`] appends, it never renumbers.
//!
//! Adding a document to a DocSet that already holds documents regenerates
//! the whole set (re-collect, re-sort, rebuild) and remaps every encoded
//! index — see [`remap`].

pub mod remap;

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Interning categories. Each is an independent index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCategory {
    WordLike,
    NotWordLike,
    ScopeBits,
    GraftTypes,
    Ids,
}

impl EnumCategory {
    pub const ALL: [EnumCategory; 5] = [
        EnumCategory::WordLike,
        EnumCategory::NotWordLike,
        EnumCategory::ScopeBits,
        EnumCategory::GraftTypes,
        EnumCategory::Ids,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnumCategory::WordLike => "wordLike",
            EnumCategory::NotWordLike => "notWordLike",
            EnumCategory::ScopeBits => "scopeBits",
            EnumCategory::GraftTypes => "graftTypes",
            EnumCategory::Ids => "ids",
        }
    }
}

/// One category's interning table.
///
/// Forward (index → string): O(1) Vec index. Reverse (string → index):
/// hash lookup. `Arc<str>` shared between both, no string duplication.
#[derive(Debug, Clone, Default)]
pub struct EnumTable {
    pending: FxHashSet<String>,
    staged: Vec<String>,
    values: Vec<Arc<str>>,
    reverse: FxHashMap<Arc<str>, u32>,
}

impl EnumTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate string to the pending set (idempotent).
    pub fn record_pre(&mut self, value: &str) {
        if !self.pending.contains(value) {
            self.pending.insert(value.to_string());
        }
    }

    /// Sort the pending set into the staged, index-ordered list.
    pub fn sort_pending(&mut self) {
        let mut staged: Vec<String> = self.pending.drain().collect();
        staged.sort_unstable();
        self.staged = staged;
    }

    /// Freeze the staged list into the queryable table and reverse index.
    pub fn build(&mut self) {
        for value in self.staged.drain(..) {
            let shared: Arc<str> = value.into();
            self.reverse.insert(shared.clone(), self.values.len() as u32);
            self.values.push(shared);
        }
        self.pending.clear();
    }

    /// Look up a string without inserting.
    pub fn get(&self, value: &str) -> Option<u32> {
        self.reverse.get(value).copied()
    }

    /// Look up a string, appending it with a fresh index if absent.
    ///
    /// Post-freeze mutation path: new strings always take the next index,
    /// existing indices are never reused or renumbered.
    pub fn get_or_insert(&mut self, value: &str) -> u32 {
        if let Some(index) = self.reverse.get(value) {
            return *index;
        }
        let shared: Arc<str> = value.into();
        let index = self.values.len() as u32;
        self.reverse.insert(shared.clone(), index);
        self.values.push(shared);
        index
    }

    /// Resolve an index to its string.
    pub fn resolve(&self, index: u32) -> Option<&str> {
        self.values.get(index as usize).map(|v| v.as_ref())
    }

    /// Number of frozen entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterator over `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32, v.as_ref()))
    }

    /// Reconstruct from an ordered list of values (deserialization path).
    ///
    /// Entry at position `i` gets index `i`, guaranteeing index stability
    /// for data encoded against the same list.
    pub fn from_ordered(values: Vec<String>) -> Self {
        let mut table = Self::new();
        for value in values {
            table.get_or_insert(&value);
        }
        table
    }
}

/// The five interning tables shared by all documents of a DocSet, plus a
/// rebuild generation counter.
#[derive(Debug, Clone, Default)]
pub struct EnumSet {
    word_like: EnumTable,
    not_word_like: EnumTable,
    scope_bits: EnumTable,
    graft_types: EnumTable,
    ids: EnumTable,
    generation: u32,
}

impl EnumSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, category: EnumCategory) -> &EnumTable {
        match category {
            EnumCategory::WordLike => &self.word_like,
            EnumCategory::NotWordLike => &self.not_word_like,
            EnumCategory::ScopeBits => &self.scope_bits,
            EnumCategory::GraftTypes => &self.graft_types,
            EnumCategory::Ids => &self.ids,
        }
    }

    pub fn table_mut(&mut self, category: EnumCategory) -> &mut EnumTable {
        match category {
            EnumCategory::WordLike => &mut self.word_like,
            EnumCategory::NotWordLike => &mut self.not_word_like,
            EnumCategory::ScopeBits => &mut self.scope_bits,
            EnumCategory::GraftTypes => &mut self.graft_types,
            EnumCategory::Ids => &mut self.ids,
        }
    }

    /// Add a candidate string to a category's pending set (idempotent).
    pub fn record_pre_enum(&mut self, category: EnumCategory, value: &str) {
        self.table_mut(category).record_pre(value);
    }

    /// Whether the one-time sort has not yet happened.
    ///
    /// The sort runs the first time a set's wordLike table is still empty;
    /// afterwards the set is only regenerated wholesale by the merge path.
    pub fn needs_sort(&self) -> bool {
        self.word_like.is_empty()
    }

    /// Sort every category's pending values lexicographically, assigning
    /// staged indices 0..n-1 in sorted order.
    pub fn sort_pre_enums(&mut self) {
        for category in EnumCategory::ALL {
            self.table_mut(category).sort_pending();
        }
    }

    /// Freeze staged values into the queryable tables.
    pub fn build_enums(&mut self) {
        for category in EnumCategory::ALL {
            self.table_mut(category).build();
        }
        tracing::debug!(
            word_like = self.word_like.len(),
            not_word_like = self.not_word_like.len(),
            scope_bits = self.scope_bits.len(),
            graft_types = self.graft_types.len(),
            ids = self.ids.len(),
            "enum tables built"
        );
    }

    /// Rebuild generation, bumped every time the set is regenerated.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u32) {
        self.generation = generation;
    }

    /// Strict lookup: error when the value was never interned.
    pub fn index_of(
        &self,
        category: EnumCategory,
        value: &str,
    ) -> crate::error::Result<u32> {
        self.table(category)
            .get(value)
            .ok_or_else(|| crate::error::SuccinctError::MissingEnumValue {
                category: category.as_str(),
                value: value.to_string(),
            })
    }

    /// Strict reverse lookup: error when the index has no entry.
    pub fn value_of(
        &self,
        category: EnumCategory,
        index: u32,
    ) -> crate::error::Result<&str> {
        self.table(category).resolve(index).ok_or(
            crate::error::SuccinctError::MissingEnumIndex {
                category: category.as_str(),
                index,
            },
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_phase_build_sorts() {
        let mut table = EnumTable::new();
        table.record_pre("zebra");
        table.record_pre("apple");
        table.record_pre("mango");
        table.record_pre("apple"); // idempotent
        table.sort_pending();
        table.build();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("apple"), Some(0));
        assert_eq!(table.get("mango"), Some(1));
        assert_eq!(table.get("zebra"), Some(2));
        assert_eq!(table.resolve(2), Some("zebra"));
        assert_eq!(table.resolve(3), None);
    }

    #[test]
    fn test_get_or_insert_appends_never_renumbers() {
        let mut table = EnumTable::new();
        table.record_pre("b");
        table.record_pre("a");
        table.sort_pending();
        table.build();

        assert_eq!(table.get_or_insert("a"), 0);
        assert_eq!(table.get_or_insert("c"), 2);
        assert_eq!(table.get_or_insert("aa"), 3); // appended, not sorted in
        assert_eq!(table.get("b"), Some(1));
    }

    #[test]
    fn test_from_ordered_preserves_indices() {
        let table = EnumTable::from_ordered(vec!["x".into(), "m".into(), "a".into()]);
        assert_eq!(table.get("x"), Some(0));
        assert_eq!(table.get("m"), Some(1));
        assert_eq!(table.get("a"), Some(2));
    }

    #[test]
    fn test_enum_set_categories_are_independent() {
        let mut enums = EnumSet::new();
        enums.record_pre_enum(EnumCategory::WordLike, "grace");
        enums.record_pre_enum(EnumCategory::ScopeBits, "grace");
        enums.sort_pre_enums();
        enums.build_enums();

        assert_eq!(enums.table(EnumCategory::WordLike).get("grace"), Some(0));
        assert_eq!(enums.table(EnumCategory::ScopeBits).get("grace"), Some(0));
        assert_eq!(enums.table(EnumCategory::GraftTypes).get("grace"), None);
    }

    #[test]
    fn test_needs_sort_only_before_first_build() {
        let mut enums = EnumSet::new();
        assert!(enums.needs_sort());
        enums.record_pre_enum(EnumCategory::WordLike, "word");
        enums.sort_pre_enums();
        enums.build_enums();
        assert!(!enums.needs_sort());
    }

    #[test]
    fn test_strict_lookups() {
        let mut enums = EnumSet::new();
        enums.record_pre_enum(EnumCategory::Ids, "seq1");
        enums.sort_pre_enums();
        enums.build_enums();

        assert_eq!(enums.index_of(EnumCategory::Ids, "seq1").unwrap(), 0);
        assert!(enums.index_of(EnumCategory::Ids, "seq2").is_err());
        assert_eq!(enums.value_of(EnumCategory::Ids, 0).unwrap(), "seq1");
        assert!(enums.value_of(EnumCategory::Ids, 1).is_err());
    }
}
