//! Data access and ingestion for Tasty Discoveries.
//!
//! Responsibilities:
//! - Parse tab-separated place files into [`tasty_core::Place`] values.
//! - Talk to the search engine through the [`store::SearchStore`] boundary.
//! - Batch places into the index with a bounded worker pool.
//! - Answer listing and proximity queries over the index.
//!
//! Boundaries:
//! - Pagination rules, query documents and response mapping live in
//!   `tasty-core`.
//! - No global mutable state; ingestion counters are returned by value.

pub mod bulk;
pub mod catalog;
pub mod ingest;
pub mod records;
pub mod store;

pub use bulk::{
    BulkError, BulkIndexer, BulkIndexerConfig, DEFAULT_FLUSH_BYTES, DEFAULT_FLUSH_INTERVAL,
    DEFAULT_INDEX, IngestReport, ItemFailure, ItemOutcome,
};
pub use catalog::{CatalogError, PlaceCatalog};
pub use ingest::{
    IndexSetup, IngestError, MAX_RESULT_WINDOW, ensure_index, index_mapping, ingest_file,
    ingest_places,
};
pub use records::{RecordError, RecordSchema, places_from_rows, read_places, read_places_file};
pub use store::{
    DEFAULT_SEARCH_URL, HttpSearchStore, HttpSearchStoreConfig, SearchStore, StoreError,
};
