//! Proptest generators for property-based testing.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use serde_json::Value;

use chainseal_core::{ChainHash, Record, RuleResult, Severity};

/// Generate a storage-safe identifier.
pub fn identifier() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9._:@-]{0,47}".prop_map(String::from)
}

/// Generate a channel id.
pub fn channel_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,31}".prop_map(String::from)
}

/// Generate a message type label.
pub fn message_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("pacs.008".to_string()),
        Just("pacs.009".to_string()),
        Just("pain.001".to_string()),
        Just("camt.053".to_string()),
        "[A-Z]{2,4}\\.[A-Z0-9]{3}".prop_map(String::from),
    ]
}

/// Generate an event time between 2000-01-01 and 2100-01-01, at
/// microsecond precision.
pub fn event_time() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800_000_000i64..4_102_444_800_000_000i64)
        .prop_map(|micros| DateTime::from_timestamp_micros(micros).expect("event time in range"))
}

/// Generate a validation severity.
pub fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Ok),
        Just(Severity::Warn),
        Just(Severity::Error),
    ]
}

/// Generate a single rule result.
pub fn rule_result() -> impl Strategy<Value = RuleResult> {
    ("[a-z][a-z-]{0,15}", any::<bool>(), severity(), "[ -~]{0,40}").prop_map(
        |(rule_id, passed, severity, message)| RuleResult {
            rule_id,
            passed,
            severity,
            message,
        },
    )
}

/// Generate a JSON payload bounded in depth and width.
pub fn payload() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..8)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate a random chain hash.
pub fn chain_hash() -> impl Strategy<Value = ChainHash> {
    any::<[u8; 32]>().prop_map(ChainHash::from_bytes)
}

/// Generate a sequence number.
pub fn sequence() -> impl Strategy<Value = u64> {
    1u64..=1_000_000u64
}

/// Parameters for generating a record.
#[derive(Debug, Clone)]
pub struct RecordParams {
    pub message_id: String,
    pub channel_id: String,
    pub message_type: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
    pub rule_results: Vec<RuleResult>,
    pub status: Severity,
}

impl Arbitrary for RecordParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            identifier(),
            channel_id(),
            message_type(),
            event_time(),
            payload(),
            prop::collection::vec(rule_result(), 0..4),
            severity(),
        )
            .prop_map(
                |(message_id, channel_id, message_type, timestamp, payload, rule_results, status)| {
                    RecordParams {
                        message_id,
                        channel_id,
                        message_type,
                        timestamp,
                        payload,
                        rule_results,
                        status,
                    }
                },
            )
            .boxed()
    }
}

/// Build a record from parameters.
pub fn record_from_params(params: &RecordParams) -> Record {
    Record {
        message_id: params.message_id.clone(),
        channel_id: params.channel_id.clone(),
        message_type: params.message_type.clone(),
        timestamp: params.timestamp,
        payload: params.payload.clone(),
        validation_results: params.rule_results.clone(),
        overall_status: params.status,
    }
}
