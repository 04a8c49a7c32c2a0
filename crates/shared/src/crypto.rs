//! Hashing utilities for admin API key verification.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns true when the SHA-256 of `key` matches one of the configured hashes.
///
/// Hashes are compared case-insensitively so operators can paste either form.
pub fn key_matches_any(key: &str, allowed_hashes: &[String]) -> bool {
    if key.is_empty() {
        return false;
    }
    let hash = sha256_hex(key);
    allowed_hashes
        .iter()
        .any(|allowed| constant_time_eq(allowed.to_ascii_lowercase().as_bytes(), hash.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
