//! Submitted records and their validation summaries.
//!
//! A [`Record`] is the unit of intake: one validated compliance message,
//! exactly as the upstream validation pipeline hands it over. Records are
//! turned into chain entries at append time and never stored as-is.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome severity of validation, in the pipeline's wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Warn,
    Error,
}

impl Severity {
    /// Wire form, as stored in entries and returned by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

/// Result of a single validation rule applied upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_id: String,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
}

/// Structured validation outcome carried alongside an entry.
///
/// Deliberately outside every hash input: the summary is re-derivable by
/// re-running the rules over the payload, so the chain does not commit to
/// it and rule upgrades cannot break verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub results: Vec<RuleResult>,
    pub status: Severity,
}

/// One validated compliance record, as submitted for sealing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier of the message. Doubles as the idempotency key.
    pub message_id: String,

    /// Source channel the message arrived on.
    pub channel_id: String,

    /// Message type tag, e.g. `ADT.A01`.
    pub message_type: String,

    /// Caller-supplied event time. Part of the hash input; never replaced
    /// with the processing wall clock.
    pub timestamp: DateTime<Utc>,

    /// Arbitrary structured payload.
    #[serde(rename = "parsed_data")]
    pub payload: Value,

    /// Per-rule outcomes from the upstream validator.
    #[serde(default)]
    pub validation_results: Vec<RuleResult>,

    /// Aggregate severity across all rules.
    pub overall_status: Severity,
}

impl Record {
    /// The validation summary as it will be carried on the entry.
    pub fn validation_summary(&self) -> ValidationSummary {
        ValidationSummary {
            results: self.validation_results.clone(),
            status: self.overall_status,
        }
    }
}

/// Truncate a timestamp to microsecond precision.
///
/// Entries hash and store microseconds; anything finer is dropped on
/// intake so the stored timestamp always matches the hashed one.
pub fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let sub_micro = i64::from(ts.timestamp_subsec_nanos() % 1_000);
    ts - Duration::nanoseconds(sub_micro)
}
