use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::record::BlockRecord;
use crate::traits::ChainStore;

/// In-memory chain store.
///
/// Clones share the same underlying list, so a test can hand one clone to a
/// ledger and inspect or tamper with the saved records through another.
#[derive(Clone, Default)]
pub struct InMemoryChainStore {
    records: Arc<RwLock<Vec<BlockRecord>>>,
    saves: Arc<AtomicUsize>,
    read_only: Arc<AtomicBool>,
}

impl InMemoryChainStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    pub fn with_records(records: Vec<BlockRecord>) -> Self {
        let store = Self::new();
        *store.records.write().expect("lock poisoned") = records;
        store
    }

    /// A copy of the currently saved records.
    pub fn records(&self) -> Vec<BlockRecord> {
        self.records.read().expect("lock poisoned").clone()
    }

    /// Mutate the saved records in place, bypassing the ledger.
    pub fn update(&self, f: impl FnOnce(&mut Vec<BlockRecord>)) {
        let mut records = self.records.write().expect("lock poisoned");
        f(&mut *records);
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl ChainStore for InMemoryChainStore {
    fn load(&self) -> StoreResult<Vec<BlockRecord>> {
        Ok(self.records())
    }

    fn save(&self, records: &[BlockRecord]) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        *self.records.write().expect("lock poisoned") = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".into()
    }
}

impl std::fmt::Debug for InMemoryChainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChainStore")
            .field("blocks", &self.records().len())
            .field("saves", &self.save_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chained_patch::Patch;
    use chained_types::BlockTimestamp;

    use super::*;

    fn record(index: u64) -> BlockRecord {
        BlockRecord {
            index,
            timestamp: BlockTimestamp::now(),
            previous_hash: String::new(),
            block_hash: "00".repeat(32),
            patch: Patch::new(),
            workvalue: index,
            difficulty: 0,
        }
    }

    #[test]
    fn empty_store_loads_nothing() {
        assert!(InMemoryChainStore::new().load().unwrap().is_empty());
    }

    #[test]
    fn clones_share_records() {
        let store = InMemoryChainStore::new();
        let handle = store.clone();
        store.save(&[record(0), record(1)]).unwrap();
        assert_eq!(handle.records().len(), 2);
        assert_eq!(handle.save_count(), 1);
    }

    #[test]
    fn update_bypasses_save_count() {
        let store = InMemoryChainStore::with_records(vec![record(0)]);
        store.update(|records| records[0].workvalue += 1);
        assert_eq!(store.load().unwrap()[0].workvalue, 1);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn read_only_rejects_saves() {
        let store = InMemoryChainStore::new();
        store.set_read_only(true);
        assert!(matches!(store.save(&[record(0)]), Err(StoreError::ReadOnly)));
        assert!(store.records().is_empty());
    }
}
