//! SHA-256 content hashing
//!
//! Note files record the hash of their rendered body, and the scanner hashes
//! index documents so unchanged ones are not rewritten.

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 digest of string content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash("test"), content_hash("test"));
        assert_ne!(content_hash("aaa"), content_hash("bbb"));
    }

    #[test]
    fn content_hash_known_value() {
        assert_eq!(
            content_hash("hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
