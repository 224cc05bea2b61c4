//! Elasticsearch-compatible HTTP implementation of [`SearchStore`].

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::{BulkItem, BulkResponseItem, DocumentOutcome, SearchStore, StoreError};

/// Engine address used when none is configured.
pub const DEFAULT_SEARCH_URL: &str = "http://localhost:9200";

/// Default user agent for engine requests.
pub const DEFAULT_USER_AGENT: &str = "tasty-discoveries/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const NDJSON: &str = "application/x-ndjson";

/// Failure to construct an [`HttpSearchStore`].
#[derive(Debug, Error)]
#[error("failed to build HTTP client: {source}")]
pub struct StoreBuildError {
    #[source]
    source: reqwest::Error,
}

/// Configuration for [`HttpSearchStore`].
#[derive(Debug, Clone)]
pub struct HttpSearchStoreConfig {
    /// Base URL of the engine, e.g. `"http://localhost:9200"`.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpSearchStoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpSearchStoreConfig {
    /// Create a configuration for the engine at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Search store backed by an Elasticsearch-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct HttpSearchStore {
    client: Client,
    config: HttpSearchStoreConfig,
}

impl HttpSearchStore {
    /// Create a store for the engine at `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreBuildError> {
        Self::with_config(HttpSearchStoreConfig::new(base_url))
    }

    /// Create a store with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpSearchStoreConfig) -> Result<Self, StoreBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|source| StoreBuildError { source })?;
        Ok(Self { client, config })
    }

    /// Configuration the store was built with.
    #[must_use]
    pub fn config(&self) -> &HttpSearchStoreConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> StoreError {
        if error.is_timeout() {
            return StoreError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return StoreError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        StoreError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }

    async fn checked(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Response, StoreError> {
        request
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))
    }

    async fn read_json(response: Response, url: &str) -> Result<Value, StoreError> {
        response.json().await.map_err(|err| StoreError::Decode {
            url: url.to_owned(),
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl SearchStore for HttpSearchStore {
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        let url = self.url(index);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StoreError::Http {
                url,
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_owned(),
            }),
        }
    }

    async fn create_index(&self, index: &str, definition: &Value) -> Result<(), StoreError> {
        let url = self.url(index);
        self.checked(self.client.put(&url).json(definition), &url).await?;
        Ok(())
    }

    async fn bulk(
        &self,
        index: &str,
        items: &[BulkItem],
    ) -> Result<Vec<BulkResponseItem>, StoreError> {
        let url = self.url("_bulk");
        let body = encode_bulk_body(index, items).map_err(|err| StoreError::Encode {
            message: err.to_string(),
        })?;
        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, NDJSON)
            .body(body);
        let response = self.checked(request, &url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        decode_bulk_response(&bytes).map_err(|err| StoreError::Decode {
            url,
            message: err.to_string(),
        })
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Value, StoreError> {
        let url = self.url(&format!("{index}/_search"));
        let response = self.checked(self.client.post(&url).json(body), &url).await?;
        Self::read_json(response, &url).await
    }
}

/// Render `items` as a newline-delimited bulk body of `index` actions.
pub(crate) fn encode_bulk_body(
    index: &str,
    items: &[BulkItem],
) -> Result<Vec<u8>, serde_json::Error> {
    let capacity = items.iter().map(BulkItem::encoded_len).sum();
    let mut body = Vec::with_capacity(capacity);
    for item in items {
        let action = json!({ "index": { "_index": index, "_id": item.id } });
        serde_json::to_writer(&mut body, &action)?;
        body.push(b'\n');
        body.extend_from_slice(&item.source);
        body.push(b'\n');
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    items: Vec<BTreeMap<String, BulkAction>>,
}

#[derive(Debug, Deserialize)]
struct BulkAction {
    #[serde(rename = "_id", default)]
    id: String,
    status: u16,
    #[serde(default)]
    error: Option<BulkActionError>,
}

#[derive(Debug, Deserialize)]
struct BulkActionError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    reason: String,
}

impl BulkAction {
    fn into_item(self) -> BulkResponseItem {
        let outcome = match self.error {
            Some(error) => DocumentOutcome::Rejected {
                reason: format!("{}: {}", error.kind, error.reason),
            },
            None if (200..300).contains(&self.status) => DocumentOutcome::Indexed,
            None => DocumentOutcome::Rejected {
                reason: format!("status {}", self.status),
            },
        };
        BulkResponseItem {
            id: self.id,
            outcome,
        }
    }
}

/// Decode the per-document results of a bulk response.
pub(crate) fn decode_bulk_response(
    body: &[u8],
) -> Result<Vec<BulkResponseItem>, serde_json::Error> {
    let response: BulkResponse = serde_json::from_slice(body)?;
    Ok(response
        .items
        .into_iter()
        .filter_map(|entry| entry.into_values().next())
        .map(BulkAction::into_item)
        .collect())
}
