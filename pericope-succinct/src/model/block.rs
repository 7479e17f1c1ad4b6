//! Block: the unit of sequence storage.

use crate::error::Result;
use pericope_core::ByteArray;

/// One structural unit (roughly a paragraph), holding six independently
/// encoded byte streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// The block's own opening scope (`bs`), e.g. "blockTag/p".
    pub block_scope: ByteArray,
    /// Block-level grafts attached before the block (`bg`).
    pub block_grafts: ByteArray,
    /// Content: the interleaved tokens/scopes/grafts (`c`).
    pub content: ByteArray,
    /// Scopes open on entry, carried from previous blocks (`os`).
    pub open_scopes: ByteArray,
    /// Scopes whose start marker occurs inside this block (`is`).
    pub included_scopes: ByteArray,
    /// Count of word-like tokens preceding this block (`nt`), one varint.
    pub next_token: ByteArray,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the preceding word-like token count. An empty stream (a
    /// freshly inserted block) counts as zero.
    pub fn next_token_count(&self) -> Result<u32> {
        if self.next_token.is_empty() {
            return Ok(0);
        }
        Ok(self.next_token.varint_at(0)?)
    }

    /// Release unused capacity on every stream.
    pub fn trim(&mut self) {
        self.block_scope.trim();
        self.block_grafts.trim();
        self.content.trim();
        self.open_scopes.trim();
        self.included_scopes.trim();
        self.next_token.trim();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_token_count_empty_is_zero() {
        assert_eq!(Block::new().next_token_count().unwrap(), 0);
    }

    #[test]
    fn test_next_token_count_decodes() {
        let mut block = Block::new();
        block.next_token.push_varint(420);
        assert_eq!(block.next_token_count().unwrap(), 420);
    }
}
