//! HTTP implementation of the authoritative index.
//!
//! Speaks the document API of an Elasticsearch-compatible search index:
//! one document per entry, addressed by message id, in a daily index
//! named `{prefix}-YYYY.MM.DD`. Writes go through `_create`, which
//! refuses to overwrite an existing document, so the duplicate check
//! needs no coordination on our side.

use std::time::Duration;

use async_trait::async_trait;
use chainseal_core::HashEntry;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::key::StorageKey;
use crate::traits::{IndexOutcome, IndexStore};

/// Client for an HTTP document index.
#[derive(Clone)]
pub struct HttpIndex {
    client: Client,
    base_url: String,
    prefix: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpIndex {
    /// Create a client for the index at `base_url`, writing daily indices
    /// under `prefix`.
    pub fn new(base_url: &str, prefix: &str) -> Result<Self, IndexError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: prefix.to_string(),
            username: None,
            password: None,
        })
    }

    /// Attach basic-auth credentials to every request.
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(username) = &self.username {
            req = req.basic_auth(username, self.password.as_deref());
        }
        req
    }

    fn create_url(&self, key: &StorageKey) -> String {
        format!(
            "{}/{}/_create/{}",
            self.base_url,
            key.index_name(&self.prefix),
            key.message_id
        )
    }

    fn doc_url(&self, key: &StorageKey) -> String {
        format!(
            "{}/{}/_doc/{}",
            self.base_url,
            key.index_name(&self.prefix),
            key.message_id
        )
    }

    fn search_url(&self) -> String {
        format!("{}/{}-*/_search", self.base_url, self.prefix)
    }

    /// Fetch the entry already stored under `key`, to tell an idempotent
    /// retry apart from a real conflict.
    async fn existing_entry(&self, key: &StorageKey) -> Result<HashEntry, IndexError> {
        let resp = self.request(Method::GET, self.doc_url(key)).send().await?;
        if !resp.status().is_success() {
            return Err(unexpected(resp).await);
        }
        let doc: DocResponse = resp.json().await?;
        Ok(doc.source)
    }

    async fn search(&self, body: serde_json::Value) -> Result<Vec<HashEntry>, IndexError> {
        let resp = self
            .request(Method::POST, self.search_url())
            .json(&body)
            .send()
            .await?;

        // No daily index exists yet: an empty trail, not an error.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(unexpected(resp).await);
        }

        let search: SearchResponse = resp.json().await?;
        Ok(search.hits.hits.into_iter().map(|h| h.source).collect())
    }
}

#[async_trait]
impl IndexStore for HttpIndex {
    async fn store(&self, entry: &HashEntry) -> Result<IndexOutcome, IndexError> {
        let key = StorageKey::for_entry(entry);
        let resp = self
            .request(Method::PUT, self.create_url(&key))
            .json(entry)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            debug!(message_id = %entry.message_id, index = %key.index_name(&self.prefix), "stored entry");
            return Ok(IndexOutcome::Stored);
        }

        if status == StatusCode::CONFLICT {
            let existing = self.existing_entry(&key).await?;
            if existing.chain_hash == entry.chain_hash {
                return Ok(IndexOutcome::AlreadyStored);
            }
            warn!(message_id = %entry.message_id, "storage key already taken by a different entry");
            return Ok(IndexOutcome::Conflict {
                existing: existing.chain_hash,
            });
        }

        Err(unexpected(resp).await)
    }

    async fn latest(&self) -> Result<Option<HashEntry>, IndexError> {
        let body = json!({
            "size": 1,
            "sort": [{"sequence": {"order": "desc", "unmapped_type": "long"}}],
            "query": {"match_all": {}}
        });
        let mut hits = self.search(body).await?;
        Ok(if hits.is_empty() {
            None
        } else {
            Some(hits.swap_remove(0))
        })
    }

    async fn scan(&self, from_sequence: u64, limit: usize) -> Result<Vec<HashEntry>, IndexError> {
        let body = json!({
            "size": limit,
            "sort": [{"sequence": {"order": "asc", "unmapped_type": "long"}}],
            "query": {"range": {"sequence": {"gte": from_sequence}}}
        });
        self.search(body).await
    }
}

async fn unexpected(resp: reqwest::Response) -> IndexError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    IndexError::UnexpectedStatus { status, body }
}

#[derive(Debug, Deserialize)]
struct DocResponse {
    #[serde(rename = "_source")]
    source: HashEntry,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: HashEntry,
}
