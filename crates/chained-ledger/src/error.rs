use chained_crypto::MiningError;
use chained_patch::PatchError;
use chained_store::StoreError;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("malformed block record at position {position}: {reason}")]
    MalformedRecord { position: usize, reason: String },

    #[error("patch of block {index} could not be applied: {source}")]
    Patch {
        index: u64,
        #[source]
        source: PatchError,
    },

    #[error("sealing block {index} failed: {source}")]
    Mining {
        index: u64,
        #[source]
        source: MiningError,
    },

    #[error("block {index} is not sealed")]
    Unsealed { index: u64 },

    #[error("block {index} does not exist (chain has {len} blocks)")]
    BlockNotFound { index: u64, len: usize },

    #[error("ledger has no blocks")]
    EmptyChain,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
