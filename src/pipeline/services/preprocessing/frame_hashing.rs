use sha2::{Digest, Sha256};
use std::fmt;

/// Cache key derived from a frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Hashes a bounded prefix of each payload.
///
/// Payloads that share their first `prefix_chars` characters share a
/// fingerprint. `None` hashes whole payloads.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintHasher {
    prefix_chars: Option<usize>,
}

impl FingerprintHasher {
    pub fn new(prefix_chars: Option<usize>) -> Self {
        Self { prefix_chars }
    }

    pub fn full_payload() -> Self {
        Self::new(None)
    }

    pub fn fingerprint(&self, payload: &str) -> Fingerprint {
        let sampled = match self.prefix_chars {
            Some(limit) => match payload.char_indices().nth(limit) {
                Some((end, _)) => &payload[..end],
                None => payload,
            },
            None => payload,
        };
        Fingerprint(Sha256::digest(sampled.as_bytes()).into())
    }
}

impl Default for FingerprintHasher {
    fn default() -> Self {
        Self::new(Some(1000))
    }
}
