use chained_crypto::{canonical_json, meets_target, ContentHasher, Miner, SealHasher, Solution};
use chained_patch::Patch;
use chained_store::BlockRecord;
use chained_types::{BlockTimestamp, Digest};

use crate::error::LedgerError;

/// Outcome of re-deriving a block's seal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SealStatus {
    /// The stored nonce reproduces the stored digest, which meets the difficulty.
    Valid,
    /// No nonce or digest has been recorded.
    Unsealed,
    /// The stored nonce hashes to something other than the stored digest.
    Mismatch,
    /// The digest is reproducible but does not meet the stored difficulty.
    TargetMissed,
}

/// One ledger entry: a patch against the previous cumulative snapshot,
/// sealed by proof-of-work.
///
/// The seal covers `index`, `timestamp`, the canonical patch, `previous_hash`
/// and the nonce. None of those may change once the block is sealed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    index: u64,
    patch: Patch,
    timestamp: BlockTimestamp,
    previous_hash: Option<Digest>,
    difficulty: u32,
    nonce: Option<u64>,
    hashresult: Option<Digest>,
}

impl Block {
    /// An unsealed block stamped with the current time.
    pub fn new(index: u64, patch: Patch, previous_hash: Option<Digest>, difficulty: u32) -> Self {
        Self::with_timestamp(index, patch, previous_hash, difficulty, BlockTimestamp::now())
    }

    /// An unsealed block with an explicit timestamp.
    pub fn with_timestamp(
        index: u64,
        patch: Patch,
        previous_hash: Option<Digest>,
        difficulty: u32,
        timestamp: BlockTimestamp,
    ) -> Self {
        Self {
            index,
            patch,
            timestamp,
            previous_hash,
            difficulty,
            nonce: None,
            hashresult: None,
        }
    }

    /// The unsealed first block of a chain: index 0, empty patch, no predecessor.
    pub fn genesis(difficulty: u32) -> Self {
        Self::new(0, Patch::new(), None, difficulty)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    pub fn timestamp(&self) -> BlockTimestamp {
        self.timestamp
    }

    pub fn previous_hash(&self) -> Option<Digest> {
        self.previous_hash
    }

    /// Hex text of the previous seal, `""` for genesis.
    pub fn previous_hash_hex(&self) -> String {
        self.previous_hash.map(|d| d.to_hex()).unwrap_or_default()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn nonce(&self) -> Option<u64> {
        self.nonce
    }

    pub fn hashresult(&self) -> Option<Digest> {
        self.hashresult
    }

    pub fn is_sealed(&self) -> bool {
        self.nonce.is_some() && self.hashresult.is_some()
    }

    /// BLAKE3 fingerprint of the canonical patch, independent of the seal.
    pub fn patch_fingerprint(&self) -> Result<Digest, LedgerError> {
        ContentHasher::PATCH
            .hash_json(&self.patch)
            .map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Everything that goes into the seal except the nonce.
    fn seal_prefix(&self) -> Result<String, LedgerError> {
        let patch =
            canonical_json(&self.patch).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(format!(
            "{}{}{}{}",
            self.index,
            self.timestamp.seal_text(),
            patch,
            self.previous_hash_hex()
        ))
    }

    /// The exact bytes hashed for a given nonce.
    pub fn compute_seal_input(&self, nonce: u64) -> Result<Vec<u8>, LedgerError> {
        let mut input = self.seal_prefix()?;
        input.push_str(&nonce.to_string());
        Ok(input.into_bytes())
    }

    /// The digest this block would carry with the given nonce.
    pub fn compute_hash(&self, nonce: u64) -> Result<Digest, LedgerError> {
        Ok(SealHasher::hash(&self.compute_seal_input(nonce)?))
    }

    /// Search for a seal from a random starting nonce and record it.
    ///
    /// Sealing again overwrites the previous seal, which breaks the link from
    /// any successor; only seal blocks that are not yet part of a chain.
    pub fn seal(&mut self, miner: &Miner) -> Result<Solution, LedgerError> {
        self.seal_from(miner, Miner::random_start())
    }

    /// Search for a seal probing upward from `start` and record it.
    pub fn seal_from(&mut self, miner: &Miner, start: u64) -> Result<Solution, LedgerError> {
        let prefix = self.seal_prefix()?;
        let solution = miner
            .search(prefix.as_bytes(), self.difficulty, start)
            .map_err(|source| LedgerError::Mining {
                index: self.index,
                source,
            })?;
        self.nonce = Some(solution.nonce);
        self.hashresult = Some(solution.digest);
        Ok(solution)
    }

    /// Seal with an unbounded single-threaded search.
    pub fn do_work(&mut self) -> Result<(u64, Digest), LedgerError> {
        let solution = self.seal(&Miner::default())?;
        Ok((solution.nonce, solution.digest))
    }

    /// Re-derive the seal from the stored nonce and classify the result.
    pub fn seal_status(&self) -> SealStatus {
        let (Some(nonce), Some(stored)) = (self.nonce, self.hashresult) else {
            return SealStatus::Unsealed;
        };
        match self.compute_hash(nonce) {
            Ok(digest) if digest != stored => SealStatus::Mismatch,
            Ok(digest) if !meets_target(&digest, self.difficulty) => SealStatus::TargetMissed,
            Ok(_) => SealStatus::Valid,
            Err(_) => SealStatus::Mismatch,
        }
    }

    /// Returns `true` iff the block is sealed and its seal re-derives correctly.
    pub fn verify(&self) -> bool {
        self.seal_status() == SealStatus::Valid
    }

    /// Convert to the persisted form. Only sealed blocks can be persisted.
    pub fn to_record(&self) -> Result<BlockRecord, LedgerError> {
        let (Some(nonce), Some(hash)) = (self.nonce, self.hashresult) else {
            return Err(LedgerError::Unsealed { index: self.index });
        };
        Ok(BlockRecord {
            index: self.index,
            timestamp: self.timestamp,
            previous_hash: self.previous_hash_hex(),
            block_hash: hash.to_hex(),
            patch: self.patch.clone(),
            workvalue: nonce,
            difficulty: self.difficulty,
        })
    }

    /// Rebuild a block from its persisted form.
    ///
    /// `position` is the record's place in the stored list and only feeds
    /// error messages. Hashes must be 64 lowercase hex digits; the previous
    /// hash may also be empty.
    pub fn from_record(position: usize, record: BlockRecord) -> Result<Self, LedgerError> {
        let malformed = |reason: String| LedgerError::MalformedRecord { position, reason };

        let hashresult = parse_hex(&record.block_hash)
            .map_err(|reason| malformed(format!("block_hash: {reason}")))?;
        let previous_hash = if record.previous_hash.is_empty() {
            None
        } else {
            Some(
                parse_hex(&record.previous_hash)
                    .map_err(|reason| malformed(format!("previous_hash: {reason}")))?,
            )
        };

        Ok(Self {
            index: record.index,
            patch: record.patch,
            timestamp: record.timestamp,
            previous_hash,
            difficulty: record.difficulty,
            nonce: Some(record.workvalue),
            hashresult: Some(hashresult),
        })
    }
}

fn parse_hex(text: &str) -> Result<Digest, String> {
    let digest = Digest::from_hex(text).map_err(|e| e.to_string())?;
    if digest.to_hex() != text {
        return Err("expected lowercase hex".into());
    }
    Ok(digest)
}
