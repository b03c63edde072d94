//! Foundation types for the chained snapshot ledger.
//!
//! Every other crate in the workspace depends on `chained-types`.
//!
//! # Key Types
//!
//! - [`Digest`] -- 256-bit digest with a lowercase hex text form
//! - [`BlockTimestamp`] -- microsecond-precision wall-clock time fixed at block construction
//! - [`Document`] -- nested key/value snapshot (a JSON value)

pub mod digest;
pub mod document;
pub mod error;
pub mod timestamp;

pub use digest::Digest;
pub use document::{empty_document, Document};
pub use error::TypeError;
pub use timestamp::BlockTimestamp;
