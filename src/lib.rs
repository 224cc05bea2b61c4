//! Facade crate for Tasty Discoveries.
//!
//! This crate re-exports the core domain types and, behind the `data`
//! feature, the ingestion pipeline, search store and place catalogue.

#![forbid(unsafe_code)]

pub use tasty_core::{
    CoordinateError, DEFAULT_PAGE_SIZE, ErrorKind, GeoPoint, NEAREST_LIMIT, PageError,
    PageRequest, Pagination, Place, PlacesPage, Recommendation, ResponseError, SearchHits,
    SearchQuery, map_search_response,
};

#[cfg(feature = "data")]
pub use tasty_data::{
    BulkError, BulkIndexer, BulkIndexerConfig, CatalogError, HttpSearchStore,
    HttpSearchStoreConfig, IndexSetup, IngestError, IngestReport, ItemFailure, PlaceCatalog,
    RecordError, SearchStore, StoreError, ensure_index, ingest_file, ingest_places,
    read_places, read_places_file,
};
