use chained_patch::Patch;
use chained_types::BlockTimestamp;
use serde::{Deserialize, Serialize};

/// On-disk form of a sealed block.
///
/// Hashes are kept as the exact strings that were written so that a record
/// survives a load/save cycle byte for byte; the ledger parses and checks
/// them when it turns records back into blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: BlockTimestamp,
    /// Hex seal of the preceding block, `""` for genesis.
    pub previous_hash: String,
    /// Hex seal of this block.
    pub block_hash: String,
    pub patch: Patch,
    /// The proof-of-work nonce.
    pub workvalue: u64,
    pub difficulty: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_json() -> serde_json::Value {
        json!({
            "index": 1,
            "timestamp": "2024-03-09T14:05:07.000042",
            "previous_hash": "00".repeat(32),
            "block_hash": "0f".repeat(32),
            "patch": [{"op": "add", "path": "/a", "value": 1}],
            "workvalue": 4_294_967_300u64,
            "difficulty": 4
        })
    }

    #[test]
    fn parses_persisted_shape() {
        let record: BlockRecord = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(record.index, 1);
        assert_eq!(record.workvalue, 4_294_967_300);
        assert_eq!(record.patch.len(), 1);
        assert_eq!(record.timestamp.to_iso8601(), "2024-03-09T14:05:07.000042");
    }

    #[test]
    fn serializes_back_to_same_shape() {
        let record: BlockRecord = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), sample_json());
    }

    #[test]
    fn missing_field_rejected() {
        let mut value = sample_json();
        value.as_object_mut().unwrap().remove("workvalue");
        assert!(serde_json::from_value::<BlockRecord>(value).is_err());
    }

    #[test]
    fn null_nonce_rejected() {
        let mut value = sample_json();
        value["workvalue"] = json!(null);
        assert!(serde_json::from_value::<BlockRecord>(value).is_err());
    }

    #[test]
    fn bad_timestamp_rejected() {
        let mut value = sample_json();
        value["timestamp"] = json!("not a time");
        assert!(serde_json::from_value::<BlockRecord>(value).is_err());
    }

    #[test]
    fn negative_difficulty_rejected() {
        let mut value = sample_json();
        value["difficulty"] = json!(-1);
        assert!(serde_json::from_value::<BlockRecord>(value).is_err());
    }
}
