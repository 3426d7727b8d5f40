//! The hash entry: one immutable, chain-bound audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::{canonical_payload, chain_preimage};
use crate::error::EncodingError;
use crate::hash::{ChainHash, PayloadHash};
use crate::record::{truncate_to_micros, Record, ValidationSummary};

/// The immutable entry produced for each accepted record.
///
/// Entries are constructed exactly once, at append time, and never mutated.
/// `chain_hash` commits to the timestamp, message id, payload hash, and the
/// predecessor's chain hash. The payload itself travels on the entry so any
/// holder of the stored entries can recompute both hashes from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashEntry {
    /// Position in the chain, starting at 1. Not a hash input; position is
    /// fixed by the prev-hash link.
    pub sequence: u64,

    /// Event time, truncated to microsecond precision.
    pub timestamp: DateTime<Utc>,

    pub message_id: String,
    pub channel_id: String,
    pub message_type: String,

    /// The submitted payload, recorded for re-verification.
    pub payload: Value,

    /// SHA-256 over the canonical payload bytes.
    pub payload_hash: PayloadHash,

    /// Chain hash of the predecessor; genesis for the first entry.
    pub prev_hash: ChainHash,

    /// SHA-256 over the versioned chain preimage.
    pub chain_hash: ChainHash,

    /// Carried but not hashed; see [`ValidationSummary`].
    pub validation: ValidationSummary,
}

impl HashEntry {
    /// Build the entry for `record` at `sequence`, chained onto `prev`.
    ///
    /// Pure: no clock reads, no shared state, no I/O. Prev-hash selection
    /// and sequencing belong to the caller holding the append lock.
    pub fn build(record: &Record, prev: ChainHash, sequence: u64) -> Result<Self, EncodingError> {
        let canonical = canonical_payload(&record.payload)?;
        let payload_hash = PayloadHash::digest(&canonical);

        let timestamp = truncate_to_micros(record.timestamp);
        let preimage = chain_preimage(
            timestamp.timestamp_micros(),
            &record.message_id,
            &payload_hash,
            &prev,
        );
        let chain_hash = ChainHash::digest(&preimage);

        Ok(Self {
            sequence,
            timestamp,
            message_id: record.message_id.clone(),
            channel_id: record.channel_id.clone(),
            message_type: record.message_type.clone(),
            payload: record.payload.clone(),
            payload_hash,
            prev_hash: prev,
            chain_hash,
            validation: record.validation_summary(),
        })
    }

    /// Whether this entry is anchored directly at genesis.
    pub fn is_first(&self) -> bool {
        self.prev_hash.is_genesis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Severity;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(message_id: &str, payload: Value) -> Record {
        Record {
            message_id: message_id.to_string(),
            channel_id: "channel-1".to_string(),
            message_type: "ADT.A01".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            payload,
            validation_results: Vec::new(),
            overall_status: Severity::Ok,
        }
    }

    #[test]
    fn test_build_hashes_canonical_payload() {
        let entry = HashEntry::build(&record("m1", json!({"x": 1})), ChainHash::GENESIS, 1)
            .unwrap();

        assert_eq!(entry.payload_hash, PayloadHash::digest(br#"{"x":1}"#));
        assert_eq!(entry.prev_hash, ChainHash::GENESIS);
        assert!(entry.is_first());

        let expected = ChainHash::digest(&chain_preimage(
            entry.timestamp.timestamp_micros(),
            "m1",
            &entry.payload_hash,
            &ChainHash::GENESIS,
        ));
        assert_eq!(entry.chain_hash, expected);
    }

    #[test]
    fn test_build_is_deterministic() {
        let r = record("m1", json!({"a": [1, 2, 3], "b": null}));
        let e1 = HashEntry::build(&r, ChainHash::GENESIS, 1).unwrap();
        let e2 = HashEntry::build(&r, ChainHash::GENESIS, 1).unwrap();
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_build_chains_onto_prev() {
        let a = HashEntry::build(&record("m1", json!({"x": 1})), ChainHash::GENESIS, 1).unwrap();
        let b = HashEntry::build(&record("m2", json!({"y": 2})), a.chain_hash, 2).unwrap();

        assert_eq!(b.prev_hash, a.chain_hash);
        assert_ne!(b.chain_hash, a.chain_hash);
        assert!(!b.is_first());
    }

    #[test]
    fn test_build_truncates_to_micros() {
        let mut r = record("m1", json!({}));
        r.timestamp = Utc.timestamp_opt(1_705_315_800, 123_456_789).unwrap();

        let entry = HashEntry::build(&r, ChainHash::GENESIS, 1).unwrap();
        assert_eq!(entry.timestamp.timestamp_subsec_nanos(), 123_456_000);

        // A record differing only below microsecond precision produces the
        // same entry hash.
        let mut finer = r.clone();
        finer.timestamp = Utc.timestamp_opt(1_705_315_800, 123_456_001).unwrap();
        let other = HashEntry::build(&finer, ChainHash::GENESIS, 1).unwrap();
        assert_eq!(entry.chain_hash, other.chain_hash);
        assert_eq!(entry.timestamp, other.timestamp);
    }

    #[test]
    fn test_build_rejects_overdeep_payload() {
        let mut v = json!(1);
        for _ in 0..200 {
            v = Value::Array(vec![v]);
        }
        let err = HashEntry::build(&record("m1", v), ChainHash::GENESIS, 1).unwrap_err();
        assert!(matches!(err, EncodingError::DepthExceeded { .. }));
    }

    #[test]
    fn test_entry_json_uses_hex_hashes() {
        let entry = HashEntry::build(&record("m1", json!({"x": 1})), ChainHash::GENESIS, 1)
            .unwrap();
        let doc = serde_json::to_value(&entry).unwrap();

        assert_eq!(doc["sequence"], json!(1));
        assert_eq!(doc["prev_hash"], json!("0".repeat(64)));
        assert_eq!(
            doc["chain_hash"].as_str().unwrap(),
            entry.chain_hash.to_hex()
        );
        assert_eq!(doc["payload"], json!({"x": 1}));
        assert_eq!(doc["validation"]["status"], json!("OK"));

        let back: HashEntry = serde_json::from_value(doc).unwrap();
        assert_eq!(back, entry);
    }
}
