//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical payload form and the chain preimage so
//! hashes stay identical across releases and implementations.

use chainseal_core::{ChainHash, HashEntry, Record, Severity};
use chrono::DateTime;
use serde_json::Value;

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Message identifier fed into the chain preimage.
    pub message_id: &'static str,
    /// Source channel recorded on the entry.
    pub channel_id: &'static str,
    /// Message type label recorded on the entry.
    pub message_type: &'static str,
    /// Event time in microseconds since the Unix epoch.
    pub timestamp_micros: i64,
    /// Payload document as JSON text.
    pub payload_json: &'static str,
    /// Previous chain hash in hex; empty means genesis.
    pub prev_hash_hex: &'static str,
    /// Sequence number assigned at append time.
    pub sequence: u64,
    /// Expected chain hash (hex).
    pub expected_chain_hash: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "Genesis payment entry",
            message_id: "pacs008-20240115-0001",
            channel_id: "swift-inbound",
            message_type: "pacs.008",
            timestamp_micros: 1_705_312_200_000_000, // 2024-01-15T09:50:00Z
            payload_json: r#"{"amount": "250.00", "currency": "EUR"}"#,
            prev_hash_hex: "",
            sequence: 1,
            // This will be filled in when a release pins it
            expected_chain_hash: "",
        },
        GoldenVector {
            name: "Second entry linked to a fixed predecessor",
            message_id: "pacs008-20240115-0002",
            channel_id: "swift-inbound",
            message_type: "pacs.008",
            timestamp_micros: 1_705_312_201_000_000,
            payload_json: r#"{"amount": "1780.50", "currency": "USD"}"#,
            prev_hash_hex: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            sequence: 2,
            expected_chain_hash: "",
        },
        GoldenVector {
            name: "Unicode payload",
            message_id: "camt053-20240115-0001",
            channel_id: "swift-inbound",
            message_type: "camt.053",
            timestamp_micros: 1_705_312_202_000_000,
            payload_json: r#"{"beneficiary": "Müller & Søn", "note": "über café"}"#,
            prev_hash_hex: "",
            sequence: 1,
            expected_chain_hash: "",
        },
        GoldenVector {
            name: "Empty object payload at the epoch",
            message_id: "heartbeat-0001",
            channel_id: "ops",
            message_type: "HEARTBEAT",
            timestamp_micros: 0,
            payload_json: "{}",
            prev_hash_hex: "",
            sequence: 1,
            expected_chain_hash: "",
        },
        GoldenVector {
            name: "Nested payload with unsorted keys",
            message_id: "pain001-20240115-0007",
            channel_id: "corporate-batch",
            message_type: "pain.001",
            timestamp_micros: 1_705_312_203_000_000,
            payload_json: r#"{"z": 1, "a": {"y": [2, 3], "b": null}}"#,
            prev_hash_hex: "",
            sequence: 1,
            expected_chain_hash: "",
        },
        GoldenVector {
            name: "Microsecond-precision timestamp",
            message_id: "pacs008-20240115-0099",
            channel_id: "swift-inbound",
            message_type: "pacs.008",
            timestamp_micros: 1_705_312_200_123_456,
            payload_json: r#"{"amount": "0.01", "currency": "GBP"}"#,
            prev_hash_hex: "",
            sequence: 1,
            expected_chain_hash: "",
        },
    ]
}

/// Build the entry described by a golden vector.
pub fn generate_entry_from_vector(vector: &GoldenVector) -> HashEntry {
    let payload: Value =
        serde_json::from_str(vector.payload_json).expect("vector payload is valid JSON");
    let record = Record {
        message_id: vector.message_id.to_string(),
        channel_id: vector.channel_id.to_string(),
        message_type: vector.message_type.to_string(),
        timestamp: DateTime::from_timestamp_micros(vector.timestamp_micros)
            .expect("vector timestamp within range"),
        payload,
        validation_results: vec![],
        overall_status: Severity::Ok,
    };

    let prev = if vector.prev_hash_hex.is_empty() {
        ChainHash::GENESIS
    } else {
        ChainHash::from_hex(vector.prev_hash_hex).expect("vector prev hash is valid hex")
    };

    HashEntry::build(&record, prev, vector.sequence).expect("vector builds a valid entry")
}

/// Verify all golden vectors produce their pinned chain hashes.
///
/// Call this to verify an implementation matches the reference.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let entry = generate_entry_from_vector(v);
            let hex = entry.chain_hash.to_hex();

            // If expected is empty, just report what we got
            let matches = v.expected_chain_hash.is_empty() || hex == v.expected_chain_hash;

            (v.name.to_string(), matches, hex)
        })
        .collect()
}
