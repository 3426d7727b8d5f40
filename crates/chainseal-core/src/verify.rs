//! Chain verification: pure recomputation over stored entries.
//!
//! Verification trusts nothing but the entry contents. For every entry it
//! recomputes the payload hash from the recorded payload and the chain hash
//! from the recorded fields, and checks the prev-hash link against the
//! predecessor. The first divergence wins; later entries are not inspected.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_payload, chain_preimage};
use crate::entry::HashEntry;
use crate::hash::{ChainHash, PayloadHash};

/// Why verification stopped trusting the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakReason {
    /// The entry's recorded hashes do not match its recorded content.
    HashMismatch,
    /// The entry's prev hash does not match its predecessor's chain hash.
    LinkMismatch,
    /// The first entry is not anchored at the genesis sentinel.
    MissingGenesis,
}

/// Outcome of verifying an ordered sequence of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum VerificationResult {
    Valid,
    Broken {
        /// Index into the verified slice, not the stored sequence number.
        at_index: usize,
        reason: BreakReason,
    },
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid)
    }
}

/// Verify a full chain from its beginning.
///
/// The first entry must be anchored at genesis. An empty slice is valid:
/// a ledger with no entries has nothing to contradict.
pub fn verify_chain(entries: &[HashEntry]) -> VerificationResult {
    walk(entries, ChainHash::GENESIS, true)
}

/// Verify a slice that starts mid-chain, anchored at a known chain hash.
///
/// `prev` is the chain hash of the entry immediately before the slice.
pub fn verify_linked(prev: ChainHash, entries: &[HashEntry]) -> VerificationResult {
    walk(entries, prev, false)
}

fn walk(entries: &[HashEntry], anchor: ChainHash, from_genesis: bool) -> VerificationResult {
    let mut expected_prev = anchor;

    for (index, entry) in entries.iter().enumerate() {
        if entry.prev_hash != expected_prev {
            let reason = if from_genesis && index == 0 {
                BreakReason::MissingGenesis
            } else {
                BreakReason::LinkMismatch
            };
            return VerificationResult::Broken { at_index: index, reason };
        }

        if !hashes_consistent(entry) {
            return VerificationResult::Broken {
                at_index: index,
                reason: BreakReason::HashMismatch,
            };
        }

        expected_prev = entry.chain_hash;
    }

    VerificationResult::Valid
}

/// Recompute both hashes of one entry and compare against the recorded
/// values. A payload that no longer canonicalizes counts as a mismatch.
fn hashes_consistent(entry: &HashEntry) -> bool {
    let Ok(canonical) = canonical_payload(&entry.payload) else {
        return false;
    };
    if PayloadHash::digest(&canonical) != entry.payload_hash {
        return false;
    }

    let preimage = chain_preimage(
        entry.timestamp.timestamp_micros(),
        &entry.message_id,
        &entry.payload_hash,
        &entry.prev_hash,
    );
    ChainHash::digest(&preimage) == entry.chain_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, Severity};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Value};

    fn chain(n: usize) -> Vec<HashEntry> {
        let mut entries = Vec::with_capacity(n);
        let mut prev = ChainHash::GENESIS;
        for i in 0..n {
            let record = Record {
                message_id: format!("msg-{i:04}"),
                channel_id: "channel-1".to_string(),
                message_type: "ADT.A01".to_string(),
                timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, i as u32).unwrap(),
                payload: json!({"n": i}),
                validation_results: Vec::new(),
                overall_status: Severity::Ok,
            };
            let entry = HashEntry::build(&record, prev, (i + 1) as u64).unwrap();
            prev = entry.chain_hash;
            entries.push(entry);
        }
        entries
    }

    #[test]
    fn test_empty_chain_is_valid() {
        assert_eq!(verify_chain(&[]), VerificationResult::Valid);
    }

    #[test]
    fn test_intact_chain_is_valid() {
        let entries = chain(5);
        assert_eq!(verify_chain(&entries), VerificationResult::Valid);
    }

    #[test]
    fn test_tampered_payload_detected_at_index() {
        let mut entries = chain(5);
        entries[2].payload = json!({"n": 999});

        assert_eq!(
            verify_chain(&entries),
            VerificationResult::Broken {
                at_index: 2,
                reason: BreakReason::HashMismatch
            }
        );
    }

    #[test]
    fn test_tampered_timestamp_detected_at_index() {
        let mut entries = chain(5);
        entries[3].timestamp += Duration::seconds(1);

        assert_eq!(
            verify_chain(&entries),
            VerificationResult::Broken {
                at_index: 3,
                reason: BreakReason::HashMismatch
            }
        );
    }

    #[test]
    fn test_tampered_prev_hash_detected_at_index() {
        let mut entries = chain(5);
        entries[2].prev_hash = ChainHash::from_bytes([0xaa; 32]);

        assert_eq!(
            verify_chain(&entries),
            VerificationResult::Broken {
                at_index: 2,
                reason: BreakReason::LinkMismatch
            }
        );
    }

    #[test]
    fn test_tampered_chain_hash_detected_at_index() {
        let mut entries = chain(5);
        entries[4].chain_hash = ChainHash::from_bytes([0xbb; 32]);

        assert_eq!(
            verify_chain(&entries),
            VerificationResult::Broken {
                at_index: 4,
                reason: BreakReason::HashMismatch
            }
        );
    }

    #[test]
    fn test_reordered_entries_detected() {
        let mut entries = chain(4);
        entries.swap(1, 2);

        assert_eq!(
            verify_chain(&entries),
            VerificationResult::Broken {
                at_index: 1,
                reason: BreakReason::LinkMismatch
            }
        );
    }

    #[test]
    fn test_missing_genesis_anchor() {
        let entries = chain(3);
        // Drop the first entry: the slice now starts mid-chain.
        assert_eq!(
            verify_chain(&entries[1..]),
            VerificationResult::Broken {
                at_index: 0,
                reason: BreakReason::MissingGenesis
            }
        );
    }

    #[test]
    fn test_verify_linked_mid_chain_slice() {
        let entries = chain(5);
        let anchor = entries[1].chain_hash;

        assert_eq!(
            verify_linked(anchor, &entries[2..]),
            VerificationResult::Valid
        );
        assert_eq!(
            verify_linked(ChainHash::from_bytes([0x01; 32]), &entries[2..]),
            VerificationResult::Broken {
                at_index: 0,
                reason: BreakReason::LinkMismatch
            }
        );
    }

    #[test]
    fn test_first_break_wins() {
        let mut entries = chain(6);
        entries[1].payload = json!("tampered");
        entries[4].prev_hash = ChainHash::from_bytes([0xcc; 32]);

        assert_eq!(
            verify_chain(&entries),
            VerificationResult::Broken {
                at_index: 1,
                reason: BreakReason::HashMismatch
            }
        );
    }

    #[test]
    fn test_validation_summary_is_not_hash_protected() {
        // The summary is re-derivable from the payload, so the chain does
        // not commit to it. Edits to it are invisible to verification.
        let mut entries = chain(3);
        entries[1].validation.status = Severity::Error;

        assert_eq!(verify_chain(&entries), VerificationResult::Valid);
    }

    #[test]
    fn test_unrepresentable_payload_counts_as_mismatch() {
        let mut entries = chain(2);
        let mut v: Value = json!(1);
        for _ in 0..200 {
            v = Value::Array(vec![v]);
        }
        entries[1].payload = v;

        assert_eq!(
            verify_chain(&entries),
            VerificationResult::Broken {
                at_index: 1,
                reason: BreakReason::HashMismatch
            }
        );
    }
}
