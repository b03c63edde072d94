use chained_crypto::{ContentHasher, Miner};
use chained_patch::diff;
use chained_store::ChainStore;
use chained_types::{empty_document, Digest, Document};
use tracing::{debug, info, warn};

use crate::block::Block;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::replay::ReplayEngine;
use crate::validation::{ChainValidator, ValidationReport};

/// Chain manager: owns the blocks, the materialized document they replay to,
/// and the store they are persisted in.
///
/// The chain always holds at least the genesis block. `state` always equals
/// the replay of every block's patch from `{}`.
pub struct Ledger<S: ChainStore> {
    store: S,
    config: LedgerConfig,
    chain: Vec<Block>,
    state: Document,
}

impl<S: ChainStore> Ledger<S> {
    /// Open the chain held by `store`, or start a new one.
    ///
    /// Persisted records are converted back into blocks and replayed; any
    /// malformed record or unappliable patch fails the whole load. An empty
    /// store gets a freshly sealed genesis block, which is not written until
    /// the first [`append`](Self::append) or [`persist`](Self::persist).
    pub fn load_or_init(store: S, config: LedgerConfig) -> Result<Self, LedgerError> {
        let records = store.load()?;

        if records.is_empty() {
            let mut genesis = Block::genesis(config.genesis_difficulty);
            let solution = genesis.seal(&config.mining.miner())?;
            info!(
                store = %store.location(),
                difficulty = config.genesis_difficulty,
                attempts = solution.attempts,
                "created genesis block"
            );
            return Ok(Self {
                store,
                config,
                chain: vec![genesis],
                state: empty_document(),
            });
        }

        let chain = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| Block::from_record(position, record))
            .collect::<Result<Vec<_>, _>>()?;
        let replay = ReplayEngine::replay_from_genesis(&chain)?;
        debug!(
            store = %store.location(),
            blocks = replay.applied_blocks,
            "loaded chain"
        );

        Ok(Self {
            store,
            config,
            chain,
            state: replay.state,
        })
    }

    /// Record `new_state` as the next snapshot, sealed at `difficulty` with
    /// the configured miner.
    pub fn append(&mut self, new_state: Document, difficulty: u32) -> Result<&Block, LedgerError> {
        let miner = self.config.mining.miner();
        self.append_with(new_state, difficulty, &miner)
    }

    /// Like [`append`](Self::append), sealing with an explicit miner.
    ///
    /// The patch is the diff from the current state to `new_state`. The whole
    /// chain is persisted afterwards. If sealing or persisting fails the
    /// ledger is left exactly as it was.
    pub fn append_with(
        &mut self,
        new_state: Document,
        difficulty: u32,
        miner: &Miner,
    ) -> Result<&Block, LedgerError> {
        let head = self.head().ok_or(LedgerError::EmptyChain)?;
        let index = head.index() + 1;
        let patch = diff(&self.state, &new_state);
        let mut block = Block::new(index, patch, head.hashresult(), difficulty);

        let solution = block.seal(miner).inspect_err(|e| {
            warn!(index, difficulty, error = %e, "sealing failed");
        })?;
        debug!(index, nonce = solution.nonce, attempts = solution.attempts, "block sealed");

        self.chain.push(block);
        if let Err(e) = self.persist() {
            self.chain.pop();
            return Err(e);
        }
        self.state = new_state;

        let block = &self.chain[self.chain.len() - 1];
        info!(
            index,
            operations = block.patch().len(),
            hash = %block.hashresult().map(|d| d.short_hex()).unwrap_or_default(),
            "appended block"
        );
        Ok(block)
    }

    /// Write the whole chain to the store.
    pub fn persist(&self) -> Result<(), LedgerError> {
        let records = self
            .chain
            .iter()
            .map(Block::to_record)
            .collect::<Result<Vec<_>, _>>()?;
        self.store.save(&records)?;
        info!(store = %self.store.location(), blocks = records.len(), "persisted chain");
        Ok(())
    }

    /// Check seals, index continuity, linkage and the genesis block.
    pub fn validate(&self) -> ValidationReport {
        let report = ChainValidator::validate(&self.chain);
        for violation in &report.violations {
            warn!(
                position = violation.position,
                index = violation.index,
                kind = %violation.kind,
                "{}",
                violation.description
            );
        }
        report
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    /// Visit every block in index order.
    pub fn iterate<F: FnMut(&Block)>(&self, visitor: F) {
        self.chain.iter().for_each(visitor);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn head(&self) -> Option<&Block> {
        self.chain.last()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// The materialized document after the last block.
    pub fn state(&self) -> &Document {
        &self.state
    }

    /// The document as of the block at `index`.
    pub fn state_at(&self, index: u64) -> Result<Document, LedgerError> {
        Ok(ReplayEngine::replay_through(&self.chain, index)?.state)
    }

    /// BLAKE3 fingerprint of the canonical encoding of the current state.
    pub fn state_fingerprint(&self) -> Result<Digest, LedgerError> {
        ContentHasher::STATE
            .hash_json(&self.state)
            .map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: ChainStore> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("store", &self.store.location())
            .field("blocks", &self.chain.len())
            .finish()
    }
}
