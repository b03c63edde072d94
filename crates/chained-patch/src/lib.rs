//! Patch engine for the chained snapshot ledger.
//!
//! Each block stores only the structural difference between the previous
//! cumulative snapshot and the new one. This crate computes that difference
//! and replays it.
//!
//! # Key Types
//!
//! - [`Pointer`] -- path into a document (`/a/0/b`, with `~0`/`~1` escapes)
//! - [`PatchOperation`] -- one of add, remove, replace, move, copy, test
//! - [`Patch`] -- ordered operations; [`diff`] produces one, [`apply`] replays one
//!
//! The round-trip law `apply(&diff(a, b), a) == Ok(b)` holds for every pair
//! of documents.

pub mod apply;
pub mod diff;
pub mod error;
pub mod operation;
pub mod pointer;

pub use apply::apply;
pub use diff::diff;
pub use error::{PatchError, PatchResult};
pub use operation::{Patch, PatchOperation};
pub use pointer::Pointer;
