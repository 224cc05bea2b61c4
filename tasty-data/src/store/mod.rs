//! Boundary to the search engine holding the place index.
//!
//! [`SearchStore`] exposes the four engine operations the rest of the crate
//! needs: index existence, index creation, bulk writes and search.
//! [`HttpSearchStore`] talks to an Elasticsearch-compatible HTTP API;
//! [`test_support::MemorySearchStore`] keeps documents in memory.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tasty_data::store::{HttpSearchStore, HttpSearchStoreConfig, SearchStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpSearchStoreConfig::new("http://localhost:9200")
//!     .with_timeout(Duration::from_secs(10));
//! let store = HttpSearchStore::with_config(config)?;
//! let exists = store.index_exists("places").await?;
//! println!("places index present: {exists}");
//! # Ok(())
//! # }
//! ```

mod http;

#[doc(hidden)]
pub mod test_support;


use async_trait::async_trait;
use serde_json::Value;
use tasty_core::ErrorKind;
use thiserror::Error;

pub use http::{
    DEFAULT_SEARCH_URL, DEFAULT_USER_AGENT, HttpSearchStore, HttpSearchStoreConfig,
    StoreBuildError,
};

/// Bytes added to each document by its action line and separators.
const ACTION_OVERHEAD: usize = 32;

/// One `index` action destined for a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    /// Document id in the index.
    pub id: String,
    /// Serialised JSON document.
    pub source: Vec<u8>,
}

impl BulkItem {
    /// Pair a document id with its serialised body.
    #[must_use]
    pub fn new(id: impl Into<String>, source: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }

    /// Approximate size of the item in a newline-delimited bulk body.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.source
            .len()
            .saturating_add(self.id.len())
            .saturating_add(ACTION_OVERHEAD)
    }
}

/// Result of one document within a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// The engine stored the document.
    Indexed,
    /// The engine refused the document.
    Rejected {
        /// Engine-provided `type: reason` description.
        reason: String,
    },
}

/// Per-document entry of a bulk response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResponseItem {
    /// Document id echoed by the engine.
    pub id: String,
    /// What happened to the document.
    pub outcome: DocumentOutcome,
}

/// Errors raised by search store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The engine could not be reached.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The engine did not answer in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The engine answered with an error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The engine's answer could not be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL.
        url: String,
        /// Decoder error description.
        message: String,
    },
    /// A request body could not be encoded.
    #[error("failed to encode request body: {message}")]
    Encode {
        /// Encoder error description.
        message: String,
    },
}

impl StoreError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::MalformedResponse,
            Self::Encode { .. } => ErrorKind::MalformedInput,
            Self::Network { .. } | Self::Timeout { .. } | Self::Http { .. } => {
                ErrorKind::StoreUnavailable
            }
        }
    }
}

/// Operations the search engine must provide.
///
/// Implementations are shared between ingestion workers and must therefore
/// be `Send + Sync`.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Whether `index` exists.
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError>;

    /// Create `index` with the given settings and mappings document.
    async fn create_index(&self, index: &str, definition: &Value) -> Result<(), StoreError>;

    /// Write `items` to `index` in one request.
    ///
    /// A transport failure fails the whole call; otherwise one
    /// [`BulkResponseItem`] is returned per document the engine reported on.
    async fn bulk(
        &self,
        index: &str,
        items: &[BulkItem],
    ) -> Result<Vec<BulkResponseItem>, StoreError>;

    /// Run a search request body against `index` and return the raw response.
    async fn search(&self, index: &str, body: &Value) -> Result<Value, StoreError>;
}
