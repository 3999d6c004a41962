//! Salted one-way hashing of the document reference
//!
//! The hash is the only identity-lookup key the system keeps; the
//! plaintext reference is discarded once hashed. The salt is a
//! process-wide secret handed in at construction; rotating it
//! invalidates every stored lookup, so treat it as immutable in
//! production.

use sha2::{Digest, Sha256};

/// Hashes document references with a fixed salt.
#[derive(Clone)]
pub struct ReferenceHasher {
    salt: String,
}

impl ReferenceHasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// `hex(SHA-256(salt ‖ reference))`
    pub fn hash(&self, reference: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(reference.as_bytes());
        hex_encode(&hasher.finalize())
    }

    /// UI-safe mask showing only the last 4 characters.
    ///
    /// Distinct from the secure hash: this is for display, never lookup.
    pub fn preview(reference: &str) -> String {
        let len = reference.chars().count();
        if len == 0 {
            return "****".to_string();
        }
        if len <= 4 {
            return "*".repeat(len);
        }
        let last_four: String = reference
            .chars()
            .skip(len - 4)
            .collect();
        format!("{}{}", "*".repeat(len - 4), last_four)
    }
}

impl std::fmt::Debug for ReferenceHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never leak the salt through Debug output
        f.debug_struct("ReferenceHasher").finish_non_exhaustive()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
