use crate::error::StoreResult;
use crate::record::BlockRecord;

/// Whole-collection persistence for a chain of block records.
///
/// Implementations must satisfy these invariants:
/// - Records come back in the order they were saved.
/// - `load` returns `Ok(vec![])` when nothing has been saved yet.
/// - `save` replaces all previously saved records.
/// - All I/O errors are propagated, never silently ignored.
pub trait ChainStore: Send + Sync {
    /// Read every persisted record.
    fn load(&self) -> StoreResult<Vec<BlockRecord>>;

    /// Replace the persisted chain with `records`.
    fn save(&self, records: &[BlockRecord]) -> StoreResult<()>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;
}
