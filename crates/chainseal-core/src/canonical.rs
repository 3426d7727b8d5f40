//! Canonical byte forms for hashing.
//!
//! Two deterministic encodings live here:
//! - the canonical JSON form of a record payload, which feeds the payload
//!   hash, and
//! - the versioned chain preimage, a canonical CBOR map binding an entry
//!   to its predecessor, which feeds the chain hash.
//!
//! The canonical forms are critical: the same logical content must produce
//! identical bytes (and thus identical hashes) across processes, restarts,
//! and platforms.

use ciborium::value::Value as Cbor;
use serde_json::Value;

use crate::error::EncodingError;
use crate::hash::{ChainHash, PayloadHash};

/// The current chain preimage format version.
pub const PREIMAGE_VERSION: u8 = 1;

/// Maximum nesting depth accepted by the payload canonicalizer.
pub const MAX_PAYLOAD_DEPTH: usize = 128;

/// Preimage field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const VERSION: u64 = 0;
    pub const TIMESTAMP: u64 = 1;
    pub const MESSAGE_ID: u64 = 2;
    pub const PAYLOAD_HASH: u64 = 3;
    pub const PREV_HASH: u64 = 4;
}

/// Encode a payload to its canonical JSON byte form.
///
/// Object keys are emitted in ascending byte order with no insignificant
/// whitespace. serde_json's default map is a `BTreeMap`, so iteration order
/// is already sorted; this function still owns byte production so the form
/// cannot drift with serializer defaults.
pub fn canonical_payload(payload: &Value) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::new();
    write_json_value(&mut buf, payload, 0)?;
    Ok(buf)
}

/// Build the versioned chain preimage for one entry.
///
/// Canonical CBOR map with integer keys:
/// `{0: version, 1: timestamp_micros, 2: message_id, 3: payload_hash, 4: prev_hash}`.
/// Definite lengths, smallest integer encodings, keys sorted by encoded
/// bytes. Every field is length-delimited, so no two distinct inputs can
/// produce the same preimage bytes.
pub fn chain_preimage(
    timestamp_micros: i64,
    message_id: &str,
    payload_hash: &PayloadHash,
    prev_hash: &ChainHash,
) -> Vec<u8> {
    let entries = vec![
        (
            Cbor::Integer(keys::VERSION.into()),
            Cbor::Integer(u64::from(PREIMAGE_VERSION).into()),
        ),
        (
            Cbor::Integer(keys::TIMESTAMP.into()),
            Cbor::Integer(timestamp_micros.into()),
        ),
        (
            Cbor::Integer(keys::MESSAGE_ID.into()),
            Cbor::Text(message_id.to_string()),
        ),
        (
            Cbor::Integer(keys::PAYLOAD_HASH.into()),
            Cbor::Bytes(payload_hash.as_bytes().to_vec()),
        ),
        (
            Cbor::Integer(keys::PREV_HASH.into()),
            Cbor::Bytes(prev_hash.as_bytes().to_vec()),
        ),
    ];

    let mut buf = Vec::new();
    encode_map_canonical(&mut buf, &entries);
    buf
}

// ───────────────────────── canonical JSON ─────────────────────────

fn write_json_value(buf: &mut Vec<u8>, value: &Value, depth: usize) -> Result<(), EncodingError> {
    if depth > MAX_PAYLOAD_DEPTH {
        return Err(EncodingError::DepthExceeded {
            limit: MAX_PAYLOAD_DEPTH,
        });
    }

    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => {
            // JSON has no encoding for NaN or infinity.
            if !n.is_i64() && !n.is_u64() {
                match n.as_f64() {
                    Some(f) if f.is_finite() => {}
                    _ => return Err(EncodingError::NonFiniteNumber(n.to_string())),
                }
            }
            buf.extend_from_slice(n.to_string().as_bytes());
        }
        Value::String(s) => write_json_string(buf, s),
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_json_value(buf, item, depth + 1)?;
            }
            buf.push(b']');
        }
        Value::Object(map) => {
            buf.push(b'{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_json_string(buf, key);
                buf.push(b':');
                write_json_value(buf, item, depth + 1)?;
            }
            buf.push(b'}');
        }
    }

    Ok(())
}

/// Write a JSON string literal with the standard escape set.
///
/// Matches serde_json's policy: short escapes for the named control
/// characters, `\u00XX` for the rest of the C0 range, everything else
/// (including non-ASCII) passed through as UTF-8.
fn write_json_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for c in s.chars() {
        match c {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\u{08}' => buf.extend_from_slice(b"\\b"),
            '\t' => buf.extend_from_slice(b"\\t"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\u{0c}' => buf.extend_from_slice(b"\\f"),
            '\r' => buf.extend_from_slice(b"\\r"),
            c if (c as u32) < 0x20 => {
                let code = c as u32;
                buf.extend_from_slice(format!("\\u{code:04x}").as_bytes());
            }
            c => {
                let mut utf8 = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    buf.push(b'"');
}

// ───────────────────────── canonical CBOR ─────────────────────────

/// Recursively encode a CBOR value.
///
/// Only the value types the preimage uses are supported; the map builder
/// above is the sole caller.
fn encode_value_to(buf: &mut Vec<u8>, value: &Cbor) {
    match value {
        Cbor::Integer(i) => encode_integer(buf, *i),
        Cbor::Bytes(b) => encode_bytes(buf, b),
        Cbor::Text(s) => encode_text(buf, s),
        Cbor::Map(entries) => encode_map_canonical(buf, entries),
        _ => unreachable!("preimage values are integers, bytes, text, and maps"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        // Major type 0: unsigned integer
        encode_uint(buf, 0, n as u64);
    } else {
        // Major type 1: negative integer
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type, smallest form.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Cbor, Cbor)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Cbor)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
