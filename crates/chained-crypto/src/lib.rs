//! Cryptographic primitives for the chained snapshot ledger.
//!
//! Provides the SHA-256 seal hasher, domain-separated BLAKE3 fingerprints,
//! the canonical JSON encoding fed into seals, and the bounded proof-of-work
//! search used to seal blocks.
//!
//! All primitives come from established libraries; nothing here implements a hash function.

pub mod canonical;
pub mod hasher;
pub mod pow;

pub use canonical::canonical_json;
pub use hasher::{ContentHasher, HasherError, PrefixedSeal, SealHasher};
pub use pow::{meets_target, CancelToken, Miner, MiningBudget, MiningError, Solution};
