//! Index setup and end-to-end place ingestion.

use std::sync::Arc;

use camino::Utf8Path;
use serde_json::{Value, json};
use tasty_core::{ErrorKind, Place};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::bulk::{BulkError, BulkIndexer, BulkIndexerConfig, IngestReport};
use crate::records::{RecordError, read_places_file};
use crate::store::{SearchStore, StoreError};

/// Largest `from + size` window the place index accepts.
pub const MAX_RESULT_WINDOW: u64 = 20_000;

/// What [`ensure_index`] found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSetup {
    /// The index was absent and has been created.
    Created,
    /// The index already existed and was left untouched.
    AlreadyExists,
}

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input could not be parsed.
    #[error(transparent)]
    Records(#[from] RecordError),
    /// The index could not be checked or created.
    #[error("failed to prepare index {index}: {source}")]
    Setup {
        /// Target index.
        index: String,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The bulk pool stopped before every document was accounted for.
    #[error(transparent)]
    Bulk(#[from] BulkError),
}

impl IngestError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Records(err) => err.kind(),
            Self::Setup { source, .. } => source.kind(),
            Self::Bulk(err) => err.kind(),
        }
    }
}

/// Settings and mappings for the place index.
///
/// Text fields are analysed as free text and `location` is a geo point so
/// distance sorts work.
#[must_use]
pub fn index_mapping() -> Value {
    json!({
        "settings": {
            "index": { "max_result_window": MAX_RESULT_WINDOW }
        },
        "mappings": {
            "properties": {
                "name": { "type": "text" },
                "address": { "type": "text" },
                "phone": { "type": "text" },
                "location": { "type": "geo_point" }
            }
        }
    })
}

/// Create `index` with [`index_mapping`] unless it already exists.
///
/// An existing index is never redefined, even if its mapping differs.
///
/// # Errors
///
/// Returns [`IngestError::Setup`] when the store cannot be queried or
/// refuses the definition.
pub async fn ensure_index<S>(store: &S, index: &str) -> Result<IndexSetup, IngestError>
where
    S: SearchStore + ?Sized,
{
    let setup_error = |source: StoreError| IngestError::Setup {
        index: index.to_owned(),
        source,
    };
    if store.index_exists(index).await.map_err(setup_error)? {
        log::debug!("index {index} already exists");
        return Ok(IndexSetup::AlreadyExists);
    }
    store
        .create_index(index, &index_mapping())
        .await
        .map_err(setup_error)?;
    log::info!("created index {index}");
    Ok(IndexSetup::Created)
}

/// Index every place through a [`BulkIndexer`] after preparing the index.
///
/// # Errors
///
/// Returns [`IngestError::Setup`] if the index cannot be prepared and
/// [`IngestError::Bulk`] if the pool stops early. Per-document failures
/// are reported in the returned [`IngestReport`] instead.
pub async fn ingest_places<S>(
    store: Arc<S>,
    places: &[Place],
    config: BulkIndexerConfig,
    cancel: CancellationToken,
) -> Result<IngestReport, IngestError>
where
    S: SearchStore + ?Sized + 'static,
{
    ensure_index(store.as_ref(), &config.index).await?;
    let index = config.index.clone();
    let indexer = BulkIndexer::start(store, config, cancel);
    for place in places {
        if let Err(err) = indexer.add(place).await {
            // A closed queue means the workers stopped; their error explains why.
            return Err(match indexer.close().await {
                Err(pool_err) => pool_err.into(),
                Ok(_) => err.into(),
            });
        }
    }
    let report = indexer.close().await?;
    log::info!(
        "indexed {} of {} places into {index} ({} failed)",
        report.indexed,
        places.len(),
        report.failed
    );
    Ok(report)
}

/// Read a tab-separated file and ingest its places.
///
/// Parsing completes before the store is contacted, so a malformed file
/// leaves the index untouched.
///
/// # Errors
///
/// See [`read_places_file`] and [`ingest_places`].
pub async fn ingest_file<S>(
    store: Arc<S>,
    path: &Utf8Path,
    config: BulkIndexerConfig,
    cancel: CancellationToken,
) -> Result<IngestReport, IngestError>
where
    S: SearchStore + ?Sized + 'static,
{
    let places = read_places_file(path)?;
    log::info!("read {} places from {path}", places.len());
    ingest_places(store, &places, config, cancel).await
}
