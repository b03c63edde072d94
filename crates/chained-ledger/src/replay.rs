use chained_patch::apply;
use chained_types::{empty_document, Document};

use crate::block::Block;
use crate::error::LedgerError;

/// Result of folding block patches into a materialized document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub applied_blocks: u64,
    pub state: Document,
}

/// Deterministic replay of a chain's patches.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Apply every block's patch in order, starting from `{}`.
    pub fn replay_from_genesis(blocks: &[Block]) -> Result<ReplayResult, LedgerError> {
        apply_blocks(empty_document(), blocks)
    }

    /// The state as of (and including) the block at position `index`.
    pub fn replay_through(blocks: &[Block], index: u64) -> Result<ReplayResult, LedgerError> {
        let end = usize::try_from(index)
            .ok()
            .filter(|&i| i < blocks.len())
            .ok_or(LedgerError::BlockNotFound {
                index,
                len: blocks.len(),
            })?;
        apply_blocks(empty_document(), &blocks[..=end])
    }
}

fn apply_blocks(mut state: Document, blocks: &[Block]) -> Result<ReplayResult, LedgerError> {
    let mut applied_blocks = 0u64;
    for block in blocks {
        state = apply(block.patch(), &state).map_err(|source| LedgerError::Patch {
            index: block.index(),
            source,
        })?;
        applied_blocks += 1;
    }
    Ok(ReplayResult {
        applied_blocks,
        state,
    })
}
