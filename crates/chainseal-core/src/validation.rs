//! Input validation for submitted records.
//!
//! The transport layer owns schema checks; these are the defensive line in
//! front of the hash path. Identifier checks are strict on purpose: message
//! and channel ids become storage keys and archive path segments, so
//! anything that could alter a path or an index name is rejected here.

use serde_json::Value;

use crate::canonical::MAX_PAYLOAD_DEPTH;
use crate::error::ValidationError;
use crate::record::Record;

/// Maximum byte length for message, channel, and type identifiers.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// Validate a record before entry construction.
///
/// A record that fails here never reaches the chain: no hashing, no head
/// movement, no storage writes.
pub fn validate_record(record: &Record) -> Result<(), ValidationError> {
    identifier("message_id", &record.message_id)?;
    identifier("channel_id", &record.channel_id)?;
    bounded("message_type", &record.message_type)?;

    if deeper_than(&record.payload, MAX_PAYLOAD_DEPTH) {
        return Err(ValidationError::PayloadTooDeep {
            limit: MAX_PAYLOAD_DEPTH,
        });
    }

    Ok(())
}

fn bounded(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            limit: MAX_IDENTIFIER_LEN,
        });
    }
    Ok(())
}

fn identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    bounded(field, value)?;

    let charset_ok = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@'));
    if !charset_ok || value == "." || value == ".." {
        return Err(ValidationError::InvalidIdentifier { field });
    }

    Ok(())
}

/// Whether the payload nests deeper than `limit` container levels.
///
/// Mirrors the canonicalizer's depth accounting exactly, but short-circuits
/// so hostile inputs cannot drive unbounded recursion.
fn deeper_than(value: &Value, limit: usize) -> bool {
    match value {
        Value::Array(items) => limit == 0 || items.iter().any(|v| deeper_than(v, limit - 1)),
        Value::Object(map) => limit == 0 || map.values().any(|v| deeper_than(v, limit - 1)),
        _ => false,
    }
}
