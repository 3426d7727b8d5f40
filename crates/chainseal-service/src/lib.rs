//! # chainseal-service
//!
//! HTTP face of the chainseal ledger. Accepts validated compliance
//! records on `POST /hash`, seals each one onto the hash chain, and
//! serves the chain head and recomputed audit windows.
//!
//! Storage backends are wired at startup from flags or the environment
//! (see [`config::Args`]): a sqlite or remote HTTP index as the
//! authoritative store, and an optional filesystem retention archive.

use std::sync::Arc;

use chainseal::Ledger;

pub mod config;
pub mod error;
pub mod routes;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The append-serialized ledger.
    pub ledger: Arc<Ledger>,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }
}
