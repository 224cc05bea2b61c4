//! In-memory search store for tests.
//!
//! [`MemorySearchStore`] answers the same requests as the HTTP store without
//! a running engine. Listing queries honour `size`, `from` and the `id` sort;
//! nearest queries sort by haversine distance from the requested origin.
//! Individual documents can be scripted to be rejected, and the whole store
//! can be made unavailable.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use geo::{Distance, Haversine, Point};
use serde_json::{Value, json};

use super::{BulkItem, BulkResponseItem, DocumentOutcome, SearchStore, StoreError};

const MEMORY_URL: &str = "memory://search";

/// Deterministic in-memory [`SearchStore`].
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tasty_data::store::SearchStore;
/// use tasty_data::store::test_support::MemorySearchStore;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = MemorySearchStore::new().rejecting(["2"]);
/// store.create_index("places", &json!({})).await.unwrap();
/// assert!(store.index_exists("places").await.unwrap());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemorySearchStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    indices: BTreeMap<String, MemoryIndex>,
    rejected: BTreeSet<String>,
    unavailable: Option<String>,
    bulk_calls: usize,
    search_calls: usize,
}

#[derive(Debug, Default)]
struct MemoryIndex {
    definition: Value,
    documents: BTreeMap<String, Value>,
}

impl MemorySearchStore {
    /// Create an empty store with no indices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject documents with the given ids in every bulk request.
    #[must_use]
    pub fn rejecting<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().rejected.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Fail every request with a network error carrying `message`.
    #[must_use]
    pub fn unavailable(self, message: impl Into<String>) -> Self {
        self.lock().unavailable = Some(message.into());
        self
    }

    /// Create `index` holding `documents`, keyed by their `id` field.
    #[must_use]
    pub fn with_documents<I>(self, index: &str, documents: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        {
            let mut state = self.lock();
            let entry = state.indices.entry(index.to_owned()).or_default();
            for document in documents {
                let id = document_key(&document);
                entry.documents.insert(id, document);
            }
        }
        self
    }

    /// Number of documents stored in `index`.
    #[must_use]
    pub fn document_count(&self, index: &str) -> usize {
        self.lock()
            .indices
            .get(index)
            .map_or(0, |entry| entry.documents.len())
    }

    /// Stored document with `id`, if any.
    #[must_use]
    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.lock()
            .indices
            .get(index)
            .and_then(|entry| entry.documents.get(id).cloned())
    }

    /// Definition `index` was created with.
    #[must_use]
    pub fn definition(&self, index: &str) -> Option<Value> {
        self.lock()
            .indices
            .get(index)
            .map(|entry| entry.definition.clone())
    }

    /// Number of bulk requests received.
    #[must_use]
    pub fn bulk_calls(&self) -> usize {
        self.lock().bulk_calls
    }

    /// Number of search requests received.
    #[must_use]
    pub fn search_calls(&self) -> usize {
        self.lock().search_calls
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn check_available(&self) -> Result<(), StoreError> {
        match &self.unavailable {
            Some(message) => Err(StoreError::Network {
                url: MEMORY_URL.to_owned(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn document_key(document: &Value) -> String {
    match &document["id"] {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}

fn document_point(document: &Value) -> Point<f64> {
    let location = &document["location"];
    Point::new(
        location["lon"].as_f64().unwrap_or_default(),
        location["lat"].as_f64().unwrap_or_default(),
    )
}

fn as_count(value: &Value, default: usize) -> usize {
    value
        .as_u64()
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or(default)
}

fn nearest_origin(body: &Value) -> Option<Point<f64>> {
    let sort = body["sort"].as_array()?;
    sort.iter().find_map(|key| {
        let origin = &key["_geo_distance"]["location"];
        Some(Point::new(origin["lon"].as_f64()?, origin["lat"].as_f64()?))
    })
}

fn render_hits(index: &str, total: usize, documents: Vec<Value>) -> Value {
    let hits: Vec<Value> = documents
        .into_iter()
        .map(|source| {
            json!({
                "_index": index,
                "_id": document_key(&source),
                "_source": source,
            })
        })
        .collect();
    json!({
        "timed_out": false,
        "hits": {
            "total": { "value": total, "relation": "eq" },
            "hits": hits,
        }
    })
}

#[async_trait]
impl SearchStore for MemorySearchStore {
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        let state = self.lock();
        state.check_available()?;
        Ok(state.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, definition: &Value) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check_available()?;
        if state.indices.contains_key(index) {
            return Err(StoreError::Http {
                url: format!("{MEMORY_URL}/{index}"),
                status: 400,
                message: format!(
                    "resource_already_exists_exception: index [{index}] already exists"
                ),
            });
        }
        state.indices.insert(
            index.to_owned(),
            MemoryIndex {
                definition: definition.clone(),
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn bulk(
        &self,
        index: &str,
        items: &[BulkItem],
    ) -> Result<Vec<BulkResponseItem>, StoreError> {
        let mut state = self.lock();
        state.bulk_calls += 1;
        state.check_available()?;
        let rejected = state.rejected.clone();
        let entry = state.indices.entry(index.to_owned()).or_default();
        let mut responses = Vec::with_capacity(items.len());
        for item in items {
            let outcome = if rejected.contains(&item.id) {
                DocumentOutcome::Rejected {
                    reason: "mapper_parsing_exception: failed to parse document".to_owned(),
                }
            } else {
                match serde_json::from_slice::<Value>(&item.source) {
                    Ok(document) => {
                        entry.documents.insert(item.id.clone(), document);
                        DocumentOutcome::Indexed
                    }
                    Err(err) => DocumentOutcome::Rejected {
                        reason: format!("mapper_parsing_exception: {err}"),
                    },
                }
            };
            responses.push(BulkResponseItem {
                id: item.id.clone(),
                outcome,
            });
        }
        Ok(responses)
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Value, StoreError> {
        let mut state = self.lock();
        state.search_calls += 1;
        state.check_available()?;
        let Some(entry) = state.indices.get(index) else {
            return Err(StoreError::Http {
                url: format!("{MEMORY_URL}/{index}/_search"),
                status: 404,
                message: format!("index_not_found_exception: no such index [{index}]"),
            });
        };

        let mut documents: Vec<Value> = entry.documents.values().cloned().collect();
        let total = documents.len();
        if let Some(origin) = nearest_origin(body) {
            documents.sort_by(|left, right| {
                let left_distance = Haversine.distance(origin, document_point(left));
                let right_distance = Haversine.distance(origin, document_point(right));
                left_distance.total_cmp(&right_distance)
            });
        } else {
            documents.sort_by_key(|document| document["id"].as_u64().unwrap_or(u64::MAX));
        }

        let from = as_count(&body["from"], 0);
        let size = as_count(&body["size"], 10);
        let page = documents.into_iter().skip(from).take(size).collect();
        Ok(render_hits(index, total, page))
    }
}
