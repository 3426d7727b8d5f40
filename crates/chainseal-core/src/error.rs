//! Error types for the chainseal core.

use thiserror::Error;

/// Rejection of a submitted record before any hashing happens.
///
/// A record that fails validation never touches the chain: no entry is
/// built, no head moves.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} exceeds the maximum length of {limit} bytes")]
    FieldTooLong { field: &'static str, limit: usize },

    #[error("{field} contains characters outside [A-Za-z0-9._:@-]")]
    InvalidIdentifier { field: &'static str },

    #[error("payload nesting exceeds the canonical depth limit of {limit}")]
    PayloadTooDeep { limit: usize },
}

/// Failure to produce a canonical byte form for hashing.
#[derive(Debug, Clone, Error)]
pub enum EncodingError {
    #[error("payload nesting exceeds the canonical depth limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("number {0} has no canonical JSON form")]
    NonFiniteNumber(String),
}
