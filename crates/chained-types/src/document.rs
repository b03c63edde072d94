use serde_json::{Map, Value};

/// A snapshot of the external dataset: an arbitrary nested mapping.
///
/// The ledger never interprets the contents; it only diffs, patches and
/// hashes them.
pub type Document = Value;

/// The document every ledger starts from before the genesis block.
pub fn empty_document() -> Document {
    Value::Object(Map::new())
}
