//! The generic sequence-rewrite contract and filter options.
//!
//! `modify_sequence` is the single mechanism underlying scope/graft
//! filtering, block deletion and any future structural transform. Its
//! pluggable behaviors are grouped in [`RewriteRules`]; every hook is
//! optional, and an absent hook means the named identity behavior (keep
//! the block, keep the item, copy its raw bytes).

use crate::error::{Result, SuccinctError};
use crate::item::ItemType;
use crate::model::block::Block;
use crate::model::sequence::Sequence;
use pericope_core::ByteArray;

/// Position and header of one item during a rewrite walk.
#[derive(Debug, Clone, Copy)]
pub struct ItemContext {
    pub block_n: usize,
    pub item_n: usize,
    pub item_type: ItemType,
    pub subtype: u8,
    /// Byte offset of the record in the old content stream.
    pub pos: usize,
    /// Total record length in bytes.
    pub record_len: usize,
}

/// Pluggable behaviors for one `modify_sequence` call.
///
/// Defaults (`RewriteRules::identity()`): keep every block, keep every
/// item, copy surviving items' raw bytes unchanged.
#[derive(Default)]
pub struct RewriteRules<'a> {
    /// Adjust the surviving sequence's metadata (type, tags).
    pub sequence_rewrite: Option<&'a dyn Fn(&mut Sequence)>,
    /// Keep a block? Absent = keep all.
    pub block_filter: Option<&'a dyn Fn(usize, &Block) -> bool>,
    /// Adjust a surviving block before its items are rewritten.
    pub block_rewrite: Option<&'a dyn Fn(usize, &mut Block)>,
    /// Keep an item? Absent = keep all.
    pub item_filter: Option<&'a dyn Fn(&Block, &ItemContext) -> Result<bool>>,
    /// Write a surviving item onto the new content stream.
    /// Absent = raw byte copy.
    pub item_rewrite: Option<&'a dyn Fn(&Block, &ItemContext, &mut ByteArray) -> Result<()>>,
}

impl RewriteRules<'_> {
    /// The identity rewrite: nothing filtered, nothing changed.
    pub fn identity() -> Self {
        Self::default()
    }
}

/// Include/exclude prefix filters over scope labels and graft types.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub include_scopes: Option<Vec<String>>,
    pub exclude_scopes: Option<Vec<String>>,
    pub include_grafts: Option<Vec<String>>,
    pub exclude_grafts: Option<Vec<String>>,
}

impl FilterOptions {
    /// No filters configured at all.
    pub fn is_empty(&self) -> bool {
        self.include_scopes.is_none()
            && self.exclude_scopes.is_none()
            && self.include_grafts.is_none()
            && self.exclude_grafts.is_none()
    }

    /// Reject contradictory combinations: the same prefix both included
    /// and excluded in one category.
    pub fn validate(&self) -> Result<()> {
        for (include, exclude) in [
            (&self.include_scopes, &self.exclude_scopes),
            (&self.include_grafts, &self.exclude_grafts),
        ] {
            if let (Some(include), Some(exclude)) = (include, exclude) {
                if let Some(clash) = include.iter().find(|p| exclude.contains(p)) {
                    return Err(SuccinctError::ContradictoryFilter(clash.clone()));
                }
            }
        }
        Ok(())
    }

    /// Whether any include list is configured. Include lists are
    /// whitelists: once one is present, only items matching an include
    /// list of their own kind survive — tokens match nothing, so a
    /// whitelist filter drops every token.
    pub fn has_includes(&self) -> bool {
        self.include_scopes.is_some() || self.include_grafts.is_some()
    }

    /// Whether token items survive the filters.
    pub fn token_allowed(&self) -> bool {
        !self.has_includes()
    }

    /// Whether a scope label survives the filters.
    pub fn scope_allowed(&self, label: &str) -> bool {
        if self.has_includes() && !matches_any(label, &self.include_scopes) {
            return false;
        }
        !matches_any(label, &self.exclude_scopes)
    }

    /// Whether a graft type survives the filters.
    pub fn graft_allowed(&self, graft_type: &str) -> bool {
        if self.has_includes() && !matches_any(graft_type, &self.include_grafts) {
            return false;
        }
        !matches_any(graft_type, &self.exclude_grafts)
    }
}

fn matches_any(value: &str, prefixes: &Option<Vec<String>>) -> bool {
    prefixes
        .as_ref()
        .is_some_and(|prefixes| prefixes.iter().any(|p| value.starts_with(p.as_str())))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_options() {
        let options = FilterOptions::default();
        assert!(options.is_empty());
        assert!(options.token_allowed());
        assert!(options.scope_allowed("anything"));
        assert!(options.graft_allowed("anything"));
    }

    #[test]
    fn test_include_prefixes_are_a_whitelist() {
        let options = FilterOptions {
            include_scopes: Some(vec!["chapter/".into(), "verse/".into()]),
            ..Default::default()
        };
        assert!(options.scope_allowed("chapter/3"));
        assert!(options.scope_allowed("verse/1"));
        assert!(!options.scope_allowed("span/nd"));
        // A whitelist filter drops every token, and grafts with no
        // include list of their own.
        assert!(!options.token_allowed());
        assert!(!options.graft_allowed("footnote"));
    }

    #[test]
    fn test_exclude_prefixes_keep_the_rest() {
        let options = FilterOptions {
            exclude_grafts: Some(vec!["footnote".into()]),
            ..Default::default()
        };
        assert!(!options.graft_allowed("footnote"));
        assert!(options.graft_allowed("heading"));
        assert!(options.token_allowed());
        assert!(options.scope_allowed("chapter/1"));
    }

    #[test]
    fn test_include_and_exclude_combine() {
        let options = FilterOptions {
            include_scopes: Some(vec!["span/".into()]),
            exclude_scopes: Some(vec!["span/nd".into()]),
            ..Default::default()
        };
        assert!(options.scope_allowed("span/it"));
        assert!(!options.scope_allowed("span/nd"));
        assert!(!options.scope_allowed("chapter/1"));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_contradictory_filter() {
        let options = FilterOptions {
            include_scopes: Some(vec!["verse/".into()]),
            exclude_scopes: Some(vec!["verse/".into()]),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(SuccinctError::ContradictoryFilter(_))
        ));
    }
}
