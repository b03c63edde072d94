//! Append-only snapshot ledger.
//!
//! This crate is the heart of the workspace. It provides:
//! - [`Block`]: one ledger entry holding a patch, sealed by proof-of-work
//! - [`Ledger`]: the chain manager (load or create, append, validate, persist)
//! - Deterministic replay of block patches into the materialized state
//! - Chain validation (seals, index continuity, previous-hash linkage)

pub mod block;
pub mod config;
pub mod error;
pub mod ledger;
pub mod replay;
pub mod validation;

pub use block::{Block, SealStatus};
pub use config::{LedgerConfig, MiningConfig, DEFAULT_GENESIS_DIFFICULTY};
pub use error::LedgerError;
pub use ledger::Ledger;
pub use replay::{ReplayEngine, ReplayResult};
pub use validation::{ChainValidator, ValidationReport, Violation, ViolationKind};
