//! The succinct document model: parsed-input contract, blocks, sequences
//! and the document with its structural operations.

pub mod block;
pub mod document;
pub mod parsed;
pub mod rewrite;
pub mod sequence;

pub use block::Block;
pub use document::Document;
pub use parsed::{ParsedBlock, ParsedDocument, ParsedSequence, BASE_SEQUENCE_TYPES, MAIN_TYPE};
pub use rewrite::{FilterOptions, ItemContext, RewriteRules};
pub use sequence::Sequence;
