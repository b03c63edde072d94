//! Chain storage for the chained snapshot ledger.
//!
//! The ledger persists its chain as an ordered list of [`BlockRecord`]s and
//! always reads and writes the whole list at once.
//!
//! # Storage Backends
//!
//! All backends implement the [`ChainStore`] trait:
//!
//! - [`JsonFileStore`] -- pretty-printed JSON array on disk, replaced atomically
//! - [`InMemoryChainStore`] -- shared in-memory list for tests and embedding
//!
//! # Design Rules
//!
//! 1. `load` on a store that was never written returns an empty list.
//! 2. A record with a missing or ill-typed field fails the whole load.
//! 3. `save` replaces the previous contents entirely; a crash mid-save leaves
//!    either the old or the new chain, never a torn file.
//! 4. Concurrent writers from different processes are not coordinated.

pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::InMemoryChainStore;
pub use record::BlockRecord;
pub use traits::ChainStore;
