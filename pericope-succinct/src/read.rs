//! Read-side decoding: succinct streams back into items.
//!
//! "Unsuccinctify" is the consumer-facing inverse of the build pass: any
//! block stream decodes back into an item list, optionally filtered by
//! item kind and pruned to spans where a set of required scope prefixes
//! is open.

use crate::enums::{EnumCategory, EnumSet};
use crate::error::Result;
use crate::format;
use crate::item::{Item, ItemType, ScopeSubType};
use crate::model::Block;
use pericope_core::ByteArray;

/// Which item kinds to materialize, and scope pruning.
#[derive(Debug, Clone)]
pub struct UnsuccinctifyOptions {
    pub tokens: bool,
    pub scopes: bool,
    pub grafts: bool,
    /// Prefixes that must all match some open scope for an item to be
    /// emitted. Empty = no pruning.
    pub required_scopes: Vec<String>,
}

impl Default for UnsuccinctifyOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl UnsuccinctifyOptions {
    /// Materialize everything.
    pub fn all() -> Self {
        Self {
            tokens: true,
            scopes: true,
            grafts: true,
            required_scopes: Vec::new(),
        }
    }

    /// Grafts only (e.g. reference scans).
    pub fn only_grafts() -> Self {
        Self {
            tokens: false,
            scopes: false,
            grafts: true,
            required_scopes: Vec::new(),
        }
    }

    /// Scopes only.
    pub fn only_scopes() -> Self {
        Self {
            tokens: false,
            scopes: true,
            grafts: false,
            required_scopes: Vec::new(),
        }
    }

    pub fn with_required_scopes(mut self, prefixes: Vec<String>) -> Self {
        self.required_scopes = prefixes;
        self
    }
}

/// Decode a scope record's full label, given its subtype byte.
pub fn decode_scope_label(
    enums: &EnumSet,
    ba: &ByteArray,
    pos: usize,
    subtype: u8,
) -> Result<String> {
    let kind = format::scope_kind(subtype, pos)?;
    let indices = format::scope_bit_indices(ba, pos, kind)?;
    let mut label = String::from(kind.label());
    for index in indices {
        label.push('/');
        label.push_str(enums.value_of(EnumCategory::ScopeBits, index)?);
    }
    Ok(label)
}

/// Decode a graft record's `(graft_type, target_sequence_id)` strings.
pub fn decode_graft_parts(
    enums: &EnumSet,
    ba: &ByteArray,
    pos: usize,
) -> Result<(String, String)> {
    let (graft_type, seq_id) = format::graft_indices(ba, pos)?;
    Ok((
        enums.value_of(EnumCategory::GraftTypes, graft_type)?.to_string(),
        enums.value_of(EnumCategory::Ids, seq_id)?.to_string(),
    ))
}

/// Decode the single item at `pos`, returning it and its record length.
pub fn decode_item(enums: &EnumSet, ba: &ByteArray, pos: usize) -> Result<(Item, usize)> {
    let (record_len, item_type, subtype) = format::header(ba, pos)?;
    let item = match item_type {
        ItemType::Token => {
            let token_type = format::token_type(subtype, pos)?;
            let category = match token_type.category() {
                crate::item::TokenCategory::WordLike => EnumCategory::WordLike,
                crate::item::TokenCategory::NotWordLike => EnumCategory::NotWordLike,
            };
            let index = format::token_index(ba, pos)?;
            Item::Token {
                subtype: token_type,
                payload: enums.value_of(category, index)?.to_string(),
            }
        }
        ItemType::Graft => {
            let (graft_type, seq_id) = decode_graft_parts(enums, ba, pos)?;
            Item::Graft {
                subtype: graft_type,
                seq_id,
            }
        }
        ItemType::StartScope => Item::Scope {
            subtype: ScopeSubType::Start,
            label: decode_scope_label(enums, ba, pos, subtype)?,
        },
        ItemType::EndScope => Item::Scope {
            subtype: ScopeSubType::End,
            label: decode_scope_label(enums, ba, pos, subtype)?,
        },
    };
    Ok((item, record_len))
}

fn prefixes_satisfied(required: &[String], open: &[String]) -> bool {
    required
        .iter()
        .all(|prefix| open.iter().any(|label| label.starts_with(prefix.as_str())))
}

/// Decode a stream into items, honoring the options.
///
/// `seed_open` is the ambient open-scope context at the start of the
/// stream (a block's carried-in scopes); pass `&[]` for standalone
/// streams.
pub fn unsuccinctify_items(
    enums: &EnumSet,
    ba: &ByteArray,
    options: &UnsuccinctifyOptions,
    seed_open: &[String],
) -> Result<Vec<Item>> {
    let mut open: Vec<String> = seed_open.to_vec();
    let mut items = Vec::new();
    let mut pos = 0;

    while pos < ba.len() {
        let (item, record_len) = decode_item(enums, ba, pos)?;
        match &item {
            Item::Token { .. } => {
                if options.tokens && prefixes_satisfied(&options.required_scopes, &open) {
                    items.push(item);
                }
            }
            Item::Graft { .. } => {
                if options.grafts && prefixes_satisfied(&options.required_scopes, &open) {
                    items.push(item);
                }
            }
            Item::Scope { subtype, label } => match subtype {
                ScopeSubType::Start => {
                    if !open.iter().any(|l| l == label) {
                        open.push(label.clone());
                    }
                    if options.scopes && prefixes_satisfied(&options.required_scopes, &open) {
                        items.push(item);
                    }
                }
                ScopeSubType::End => {
                    if options.scopes && prefixes_satisfied(&options.required_scopes, &open) {
                        items.push(item.clone());
                    }
                    open.retain(|l| l != label);
                }
            },
        }
        pos += record_len;
    }
    Ok(items)
}

/// Decode a block's content, seeding the open-scope context from its
/// carried-in `os` stream.
pub fn unsuccinctify_block_items(
    enums: &EnumSet,
    block: &Block,
    options: &UnsuccinctifyOptions,
) -> Result<Vec<Item>> {
    let mut seed = Vec::new();
    for item in unsuccinctify_items(enums, &block.open_scopes, &UnsuccinctifyOptions::only_scopes(), &[])? {
        if let Item::Scope { label, .. } = item {
            seed.push(label);
        }
    }
    unsuccinctify_items(enums, &block.content, options, &seed)
}

/// All scope labels attached to a block: its block scope, carried-in open
/// scopes and included scopes, deduplicated in that order.
pub fn block_scope_labels(enums: &EnumSet, block: &Block) -> Result<Vec<String>> {
    let mut labels: Vec<String> = Vec::new();
    for stream in [&block.block_scope, &block.open_scopes, &block.included_scopes] {
        for item in unsuccinctify_items(enums, stream, &UnsuccinctifyOptions::only_scopes(), &[])? {
            if let Item::Scope { label, .. } = item {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }
    }
    Ok(labels)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ScopeKind, TokenType};

    fn test_enums() -> EnumSet {
        let mut enums = EnumSet::new();
        for w in ["grace", "peace"] {
            enums.record_pre_enum(EnumCategory::WordLike, w);
        }
        enums.record_pre_enum(EnumCategory::NotWordLike, " ");
        for b in ["1", "2"] {
            enums.record_pre_enum(EnumCategory::ScopeBits, b);
        }
        enums.record_pre_enum(EnumCategory::GraftTypes, "footnote");
        enums.record_pre_enum(EnumCategory::Ids, "seqA");
        enums.sort_pre_enums();
        enums.build_enums();
        enums
    }

    fn sample_stream(enums: &EnumSet) -> ByteArray {
        let mut ba = ByteArray::new();
        let one = enums.table(EnumCategory::ScopeBits).get("1").unwrap();
        let grace = enums.table(EnumCategory::WordLike).get("grace").unwrap();
        let space = enums.table(EnumCategory::NotWordLike).get(" ").unwrap();
        format::push_scope(&mut ba, ScopeSubType::Start, ScopeKind::Verse, &[one]).unwrap();
        format::push_token(&mut ba, TokenType::WordLike, grace).unwrap();
        format::push_token(&mut ba, TokenType::LineSpace, space).unwrap();
        format::push_graft(&mut ba, 0, 0).unwrap();
        format::push_scope(&mut ba, ScopeSubType::End, ScopeKind::Verse, &[one]).unwrap();
        ba
    }

    #[test]
    fn test_unsuccinctify_all() {
        let enums = test_enums();
        let ba = sample_stream(&enums);
        let items = unsuccinctify_items(&enums, &ba, &UnsuccinctifyOptions::all(), &[]).unwrap();
        assert_eq!(
            items,
            vec![
                Item::start_scope("verse/1"),
                Item::token(TokenType::WordLike, "grace"),
                Item::token(TokenType::LineSpace, " "),
                Item::graft("footnote", "seqA"),
                Item::end_scope("verse/1"),
            ]
        );
    }

    #[test]
    fn test_unsuccinctify_kind_filters() {
        let enums = test_enums();
        let ba = sample_stream(&enums);

        let grafts =
            unsuccinctify_items(&enums, &ba, &UnsuccinctifyOptions::only_grafts(), &[]).unwrap();
        assert_eq!(grafts, vec![Item::graft("footnote", "seqA")]);

        let scopes =
            unsuccinctify_items(&enums, &ba, &UnsuccinctifyOptions::only_scopes(), &[]).unwrap();
        assert_eq!(scopes.len(), 2);
    }

    #[test]
    fn test_required_scopes_prune() {
        let enums = test_enums();
        let ba = sample_stream(&enums);

        let options = UnsuccinctifyOptions {
            tokens: true,
            scopes: false,
            grafts: false,
            required_scopes: vec!["verse/".to_string()],
        };
        let items = unsuccinctify_items(&enums, &ba, &options, &[]).unwrap();
        assert_eq!(items.len(), 2); // both tokens are inside verse/1

        let options = options.with_required_scopes(vec!["chapter/".to_string()]);
        let items = unsuccinctify_items(&enums, &ba, &options, &[]).unwrap();
        assert!(items.is_empty());

        // Ambient context satisfies the requirement.
        let options = UnsuccinctifyOptions {
            tokens: true,
            scopes: false,
            grafts: false,
            required_scopes: vec!["chapter/".to_string()],
        };
        let items =
            unsuccinctify_items(&enums, &ba, &options, &["chapter/1".to_string()]).unwrap();
        assert_eq!(items.len(), 2);
    }
}
