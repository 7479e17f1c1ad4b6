//! Unique id generation for documents and sequences.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Generate a 12-character URL-safe id from 9 random bytes.
pub fn generate_id() -> String {
    let bytes: [u8; 9] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_length_and_charset() {
        let id = generate_id();
        assert_eq!(id.len(), 12);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_ids_are_distinct() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }
}
