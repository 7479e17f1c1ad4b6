//! Tag validation and set helpers.
//!
//! A tag is `name` or `name:value`, where `name` starts with a lowercase
//! ASCII letter followed by ASCII alphanumerics, and `value` is any
//! non-empty string.

use crate::error::{CoreError, Result};

/// Check a tag against the required shape.
pub fn validate_tag(tag: &str) -> Result<()> {
    let name = match tag.split_once(':') {
        Some((name, value)) => {
            if value.is_empty() {
                return Err(CoreError::InvalidTag(tag.to_string()));
            }
            name
        }
        None => tag,
    };
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTag(tag.to_string()))
    }
}

/// Validate then insert a tag into a set.
pub fn add_tag<S: std::hash::BuildHasher>(
    tags: &mut std::collections::HashSet<String, S>,
    tag: &str,
) -> Result<()> {
    validate_tag(tag)?;
    tags.insert(tag.to_string());
    Ok(())
}

/// Remove a tag from a set. Unknown tags are a no-op.
pub fn remove_tag<S: std::hash::BuildHasher>(
    tags: &mut std::collections::HashSet<String, S>,
    tag: &str,
) {
    tags.remove(tag);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_valid_tags() {
        for tag in ["frag", "canon27", "source:ubs", "note:some long value"] {
            assert!(validate_tag(tag).is_ok(), "{tag}");
        }
    }

    #[test]
    fn test_invalid_tags() {
        for tag in ["", "Frag", "9lives", "with space", "trailing:", "_x"] {
            assert!(validate_tag(tag).is_err(), "{tag}");
        }
    }

    #[test]
    fn test_add_remove() {
        let mut tags: HashSet<String> = HashSet::new();
        add_tag(&mut tags, "canon").unwrap();
        assert!(tags.contains("canon"));
        assert!(add_tag(&mut tags, "Bad Tag").is_err());
        remove_tag(&mut tags, "canon");
        assert!(tags.is_empty());
    }
}
