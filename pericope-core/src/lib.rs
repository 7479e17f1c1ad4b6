//! # Pericope Core
//!
//! Byte-level primitives for the Pericope succinct document engine.
//!
//! This crate provides:
//! - [`ByteArray`]: growable byte buffer with LEB128 varints, byte-level
//!   random access, range deletion and base64 import/export
//! - [`WordBitSet`]: word-presence bitset with hex import/export
//! - Unique id generation and tag validation helpers
//!
//! Everything here is synchronous and allocation-conscious; the document
//! model in `pericope-succinct` builds on these types.

pub mod bitset;
pub mod byte_array;
pub mod error;
pub mod ids;
pub mod tags;

pub use bitset::WordBitSet;
pub use byte_array::{ByteArray, MAX_VARINT_WIDTH};
pub use error::{CoreError, Result};
pub use ids::generate_id;
pub use tags::{add_tag, remove_tag, validate_tag};
