//! Item kinds, token categories and the scope label-kind arity table.
//!
//! Every record in a succinct stream is one of three item kinds: a token,
//! a scope boundary (start or end) or a graft. The discriminants here are
//! the wire values used by the codec in [`crate::format`].

use crate::error::{Result, SuccinctError};
use smallvec::SmallVec;

/// Record-level item kind, stored in the top two bits of the header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ItemType {
    Token = 0,
    Graft = 1,
    StartScope = 2,
    EndScope = 3,
}

impl ItemType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode from the two-bit header field. Total: all four values are valid.
    pub fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            0 => ItemType::Token,
            1 => ItemType::Graft,
            2 => ItemType::StartScope,
            _ => ItemType::EndScope,
        }
    }
}

/// Start/end side of a scope item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeSubType {
    Start,
    End,
}

impl ScopeSubType {
    pub fn item_type(self) -> ItemType {
        match self {
            ScopeSubType::Start => ItemType::StartScope,
            ScopeSubType::End => ItemType::EndScope,
        }
    }
}

/// Interning category of a token subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    WordLike,
    NotWordLike,
}

/// Token subtype, stored in the record's subtype byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenType {
    WordLike = 0,
    Punctuation = 1,
    LineSpace = 2,
    Eol = 3,
    SoftLineBreak = 4,
    NoBreakSpace = 5,
    BareSlash = 6,
    Unknown = 7,
}

impl TokenType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TokenType::WordLike),
            1 => Some(TokenType::Punctuation),
            2 => Some(TokenType::LineSpace),
            3 => Some(TokenType::Eol),
            4 => Some(TokenType::SoftLineBreak),
            5 => Some(TokenType::NoBreakSpace),
            6 => Some(TokenType::BareSlash),
            7 => Some(TokenType::Unknown),
            _ => None,
        }
    }

    /// Which enum table the token's payload interns in.
    pub fn category(self) -> TokenCategory {
        match self {
            TokenType::WordLike => TokenCategory::WordLike,
            _ => TokenCategory::NotWordLike,
        }
    }
}

/// Scope label-kind: the first `/`-component of a scope label.
///
/// Each kind has a fixed total component count (`n_components`), which is
/// how the decoder knows how many interned scope-bit indices follow the
/// subtype byte without a terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScopeKind {
    BlockTag = 0,
    Inline = 1,
    Chapter = 2,
    Verses = 3,
    Verse = 4,
    Span = 5,
    SpanWithAtts = 6,
    Attribute = 7,
    Milestone = 8,
    EsbCat = 9,
    Table = 10,
    Cell = 11,
    OrphanTokens = 12,
    HangingGraft = 13,
    AltChapter = 14,
    AltVerse = 15,
    ChapterLabel = 16,
    PubChapter = 17,
    PubVerse = 18,
}

/// All scope kinds, indexable by discriminant.
const SCOPE_KINDS: [(ScopeKind, &str, usize); 19] = [
    (ScopeKind::BlockTag, "blockTag", 2),
    (ScopeKind::Inline, "inline", 2),
    (ScopeKind::Chapter, "chapter", 2),
    (ScopeKind::Verses, "verses", 2),
    (ScopeKind::Verse, "verse", 2),
    (ScopeKind::Span, "span", 2),
    (ScopeKind::SpanWithAtts, "spanWithAtts", 2),
    (ScopeKind::Attribute, "attribute", 6),
    (ScopeKind::Milestone, "milestone", 2),
    (ScopeKind::EsbCat, "esbCat", 2),
    (ScopeKind::Table, "table", 1),
    (ScopeKind::Cell, "cell", 4),
    (ScopeKind::OrphanTokens, "orphanTokens", 1),
    (ScopeKind::HangingGraft, "hangingGraft", 1),
    (ScopeKind::AltChapter, "altChapter", 2),
    (ScopeKind::AltVerse, "altVerse", 2),
    (ScopeKind::ChapterLabel, "chapterLabel", 2),
    (ScopeKind::PubChapter, "pubChapter", 2),
    (ScopeKind::PubVerse, "pubVerse", 2),
];

impl ScopeKind {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        SCOPE_KINDS.get(value as usize).map(|(kind, _, _)| *kind)
    }

    /// The label string of this kind (first `/`-component).
    pub fn label(self) -> &'static str {
        SCOPE_KINDS[self as usize].1
    }

    /// Look up a kind by its label string.
    pub fn from_label(label: &str) -> Option<Self> {
        SCOPE_KINDS
            .iter()
            .find(|(_, name, _)| *name == label)
            .map(|(kind, _, _)| *kind)
    }

    /// Fixed total `/`-component count for labels of this kind,
    /// including the kind itself.
    pub fn n_components(self) -> usize {
        SCOPE_KINDS[self as usize].2
    }
}

/// One decoded (or to-be-encoded) item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Token {
        subtype: TokenType,
        payload: String,
    },
    Scope {
        subtype: ScopeSubType,
        label: String,
    },
    Graft {
        /// Graft type, e.g. "footnote", "heading".
        subtype: String,
        /// Id of the target sequence.
        seq_id: String,
    },
}

impl Item {
    /// Convenience constructor for a start scope.
    pub fn start_scope(label: impl Into<String>) -> Self {
        Item::Scope {
            subtype: ScopeSubType::Start,
            label: label.into(),
        }
    }

    /// Convenience constructor for an end scope.
    pub fn end_scope(label: impl Into<String>) -> Self {
        Item::Scope {
            subtype: ScopeSubType::End,
            label: label.into(),
        }
    }

    pub fn token(subtype: TokenType, payload: impl Into<String>) -> Self {
        Item::Token {
            subtype,
            payload: payload.into(),
        }
    }

    pub fn graft(subtype: impl Into<String>, seq_id: impl Into<String>) -> Self {
        Item::Graft {
            subtype: subtype.into(),
            seq_id: seq_id.into(),
        }
    }
}

/// Split a scope label and validate it against the arity table.
///
/// Returns the label-kind and the trailing components (everything after
/// the kind). Fatal on an unknown kind or a wrong component count.
pub fn parse_scope_label(label: &str) -> Result<(ScopeKind, SmallVec<[&str; 4]>)> {
    let mut parts = label.split('/');
    let head = parts.next().unwrap_or("");
    let kind =
        ScopeKind::from_label(head).ok_or_else(|| SuccinctError::UnknownScopeKind(label.into()))?;
    let rest: SmallVec<[&str; 4]> = parts.collect();
    let found = rest.len() + 1;
    if found != kind.n_components() {
        return Err(SuccinctError::ScopeArity {
            label: label.into(),
            expected: kind.n_components(),
            found,
        });
    }
    Ok((kind, rest))
}

/// Rebuild a label string from a kind and its trailing components.
pub fn scope_label(kind: ScopeKind, bits: &[&str]) -> String {
    if bits.is_empty() {
        kind.label().to_string()
    } else {
        let mut label = String::from(kind.label());
        for bit in bits {
            label.push('/');
            label.push_str(bit);
        }
        label
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_two_bit_round_trip() {
        for t in [
            ItemType::Token,
            ItemType::Graft,
            ItemType::StartScope,
            ItemType::EndScope,
        ] {
            assert_eq!(ItemType::from_u8(t.as_u8()), t);
        }
    }

    #[test]
    fn test_token_type_round_trip() {
        for raw in 0..8u8 {
            let t = TokenType::from_u8(raw).unwrap();
            assert_eq!(t.as_u8(), raw);
        }
        assert!(TokenType::from_u8(8).is_none());
    }

    #[test]
    fn test_every_non_word_subtype_is_not_word_like() {
        for raw in 1..8u8 {
            let t = TokenType::from_u8(raw).unwrap();
            assert_eq!(t.category(), TokenCategory::NotWordLike, "{t:?}");
        }
        assert_eq!(TokenType::WordLike.category(), TokenCategory::WordLike);
    }

    #[test]
    fn test_scope_kind_table_is_consistent() {
        for (i, (kind, label, n)) in SCOPE_KINDS.iter().enumerate() {
            assert_eq!(kind.as_u8() as usize, i);
            assert_eq!(ScopeKind::from_u8(i as u8), Some(*kind));
            assert_eq!(ScopeKind::from_label(label), Some(*kind));
            assert_eq!(kind.n_components(), *n);
        }
        assert!(ScopeKind::from_u8(SCOPE_KINDS.len() as u8).is_none());
    }

    #[test]
    fn test_parse_scope_label() {
        let (kind, bits) = parse_scope_label("chapter/3").unwrap();
        assert_eq!(kind, ScopeKind::Chapter);
        assert_eq!(bits.as_slice(), ["3"]);

        let (kind, bits) = parse_scope_label("table").unwrap();
        assert_eq!(kind, ScopeKind::Table);
        assert!(bits.is_empty());

        let (kind, bits) = parse_scope_label("attribute/milestone/zaln/x-strong/0/G2532").unwrap();
        assert_eq!(kind, ScopeKind::Attribute);
        assert_eq!(bits.len(), 5);
    }

    #[test]
    fn test_parse_scope_label_arity_mismatch() {
        assert!(matches!(
            parse_scope_label("chapter"),
            Err(SuccinctError::ScopeArity { expected: 2, .. })
        ));
        assert!(matches!(
            parse_scope_label("table/extra"),
            Err(SuccinctError::ScopeArity { expected: 1, .. })
        ));
    }

    #[test]
    fn test_parse_scope_label_unknown_kind() {
        assert!(matches!(
            parse_scope_label("nonsense/1"),
            Err(SuccinctError::UnknownScopeKind(_))
        ));
    }

    #[test]
    fn test_scope_label_rebuild() {
        assert_eq!(scope_label(ScopeKind::Chapter, &["3"]), "chapter/3");
        assert_eq!(scope_label(ScopeKind::Table, &[]), "table");
    }
}
