use chained_types::Digest;
use sha2::{Digest as _, Sha256};

/// SHA-256 hasher used to seal and verify blocks.
///
/// Sealing hashes the concatenated text of a block's fields, so the only
/// input is a byte string and the output is a plain 256-bit digest with no
/// key or domain tag.
pub struct SealHasher;

impl SealHasher {
    /// Hash raw bytes.
    pub fn hash(data: &[u8]) -> Digest {
        let out: [u8; 32] = Sha256::digest(data).into();
        Digest::from_bytes(out)
    }

    /// Hash a UTF-8 string.
    pub fn hash_str(text: &str) -> Digest {
        Self::hash(text.as_bytes())
    }

    /// Pre-absorb a fixed prefix so that many suffixes can be hashed cheaply.
    pub fn prefixed(prefix: &[u8]) -> PrefixedSeal {
        let mut state = Sha256::new();
        state.update(prefix);
        PrefixedSeal { state }
    }
}

/// Hasher state that has already absorbed everything but the nonce.
///
/// `digest(n)` equals `SealHasher::hash(prefix ++ decimal(n))`.
#[derive(Clone)]
pub struct PrefixedSeal {
    state: Sha256,
}

impl PrefixedSeal {
    /// Finish the seal with the decimal text of `nonce`.
    pub fn digest(&self, nonce: u64) -> Digest {
        let mut state = self.state.clone();
        state.update(nonce.to_string().as_bytes());
        let out: [u8; 32] = state.finalize().into();
        Digest::from_bytes(out)
    }
}

/// Domain-separated BLAKE3 content hasher.
///
/// Used for fingerprints that never enter a seal, such as the digest of a
/// materialized state shown to operators. The domain tag keeps fingerprints
/// of different kinds of content from colliding.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for materialized documents.
    pub const STATE: Self = Self {
        domain: "chained-state-v1",
    };
    /// Hasher for patches.
    pub const PATCH: Self = Self {
        domain: "chained-patch-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Hash the canonical JSON encoding of a value.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<Digest, HasherError> {
        let text = crate::canonical::canonical_json(value)?;
        Ok(self.hash(text.as_bytes()))
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
