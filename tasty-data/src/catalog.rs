//! Query-time access to the place index.
//!
//! [`PlaceCatalog`] validates caller input, builds the search request, runs
//! it against the store and maps the answer into response documents.

use std::sync::Arc;

use tasty_core::{
    ErrorKind, GeoPoint, PageError, Pagination, PlacesPage, Recommendation, ResponseError,
    SearchQuery, map_search_response,
};
use thiserror::Error;

use crate::bulk::DEFAULT_INDEX;
use crate::store::{SearchStore, StoreError};

/// Errors raised while answering catalogue queries.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The page value was rejected.
    #[error(transparent)]
    Page(#[from] PageError),
    /// The store could not answer.
    #[error("search failed: {0}")]
    Store(#[from] StoreError),
    /// The store answered with an unexpected document.
    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl CatalogError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Page(err) => err.kind(),
            Self::Store(err) => err.kind(),
            Self::Response(err) => err.kind(),
        }
    }
}

/// Listing and recommendation queries over one index.
#[derive(Debug)]
pub struct PlaceCatalog<S: ?Sized> {
    store: Arc<S>,
    index: String,
    pagination: Pagination,
}

impl<S> PlaceCatalog<S>
where
    S: SearchStore + ?Sized,
{
    /// Query the default `places` index with the default page size.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            index: DEFAULT_INDEX.to_owned(),
            pagination: Pagination::default(),
        }
    }

    /// Query `index` instead.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Use a different pagination policy.
    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// One page of places in id order.
    ///
    /// A missing or empty `raw_page` selects the first page. Invalid page
    /// values are rejected without contacting the store.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Page`] for invalid or out-of-range pages,
    /// [`CatalogError::Store`] when the search fails and
    /// [`CatalogError::Response`] when the answer is malformed.
    pub async fn places(&self, raw_page: Option<&str>) -> Result<PlacesPage, CatalogError> {
        let request = self.pagination.parse_page(raw_page)?;
        let body = SearchQuery::page(&request).to_body();
        let response = self.store.search(&self.index, &body).await?;
        let hits = map_search_response(response)?;
        Ok(request.resolve(hits.places, hits.total)?)
    }

    /// The places closest to `origin`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the search fails and
    /// [`CatalogError::Response`] when the answer is malformed.
    pub async fn recommend(&self, origin: GeoPoint) -> Result<Recommendation, CatalogError> {
        let body = SearchQuery::nearest(origin).to_body();
        let response = self.store.search(&self.index, &body).await?;
        let hits = map_search_response(response)?;
        log::debug!(
            "recommending {} places near {},{}",
            hits.places.len(),
            origin.lat,
            origin.lon
        );
        Ok(Recommendation::new(hits.places))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::MemorySearchStore;
    use rstest::{fixture, rstest};
    use serde_json::Value;
    use std::future::Future;
    use tasty_core::test_support::{sample_place, sample_places};

    fn block_on<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime")
            .block_on(future)
    }

    fn documents(places: &[tasty_core::Place]) -> Vec<Value> {
        places
            .iter()
            .map(|place| serde_json::to_value(place).expect("serialise place"))
            .collect()
    }

    #[fixture]
    fn store() -> Arc<MemorySearchStore> {
        Arc::new(MemorySearchStore::new().with_documents("places", documents(&sample_places(25))))
    }

    #[rstest]
    fn lists_final_page(store: Arc<MemorySearchStore>) {
        let catalog = PlaceCatalog::new(store);
        let page = block_on(catalog.places(Some("3"))).expect("page three");
        assert_eq!(page.name, "Places");
        assert_eq!(page.total, 25);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.last_page, 3);
        let ids: Vec<u64> = page.places.iter().map(|place| place.id).collect();
        assert_eq!(ids, vec![21, 22, 23, 24, 25]);
    }

    #[rstest]
    fn missing_page_lists_first_ten(store: Arc<MemorySearchStore>) {
        let catalog = PlaceCatalog::new(store);
        let page = block_on(catalog.places(None)).expect("first page");
        assert_eq!(page.places.len(), 10);
        assert_eq!(page.prev_page, 0);
        assert_eq!(page.next_page, 2);
    }

    #[rstest]
    fn page_past_end_costs_one_search(store: Arc<MemorySearchStore>) {
        let catalog = PlaceCatalog::new(Arc::clone(&store));
        let err = block_on(catalog.places(Some("4"))).expect_err("out of range");
        assert_eq!(err.kind(), ErrorKind::PageOutOfRange);
        assert_eq!(store.search_calls(), 1);
    }

    #[rstest]
    #[case("0")]
    #[case("-2")]
    #[case("abc")]
    fn invalid_page_skips_store(store: Arc<MemorySearchStore>, #[case] raw: &str) {
        let catalog = PlaceCatalog::new(Arc::clone(&store));
        let err = block_on(catalog.places(Some(raw))).expect_err("invalid page");
        assert_eq!(err.kind(), ErrorKind::InvalidPage);
        assert!(err.kind().is_client_error());
        assert_eq!(store.search_calls(), 0);
    }

    #[rstest]
    fn empty_index_has_no_pages() {
        let store = Arc::new(MemorySearchStore::new().with_documents("places", Vec::new()));
        let err = block_on(PlaceCatalog::new(store).places(None)).expect_err("no pages");
        assert_eq!(err.kind(), ErrorKind::PageOutOfRange);
    }

    #[rstest]
    fn recommends_three_nearest() {
        let places = vec![
            sample_place(1, "far", 41.0, -74.0),
            sample_place(2, "nearest", 40.701, -74.0),
            sample_place(3, "second", 40.75, -74.0),
            sample_place(4, "third", 40.8, -74.0),
        ];
        let store = Arc::new(MemorySearchStore::new().with_documents("places", documents(&places)));
        let catalog = PlaceCatalog::new(store);
        let recommendation =
            block_on(catalog.recommend(GeoPoint::new(40.7, -74.0))).expect("recommend");
        assert_eq!(recommendation.name, "Recommendation");
        let names: Vec<&str> = recommendation
            .places
            .iter()
            .map(|place| place.name.as_str())
            .collect();
        assert_eq!(names, vec!["nearest", "second", "third"]);
    }

    #[rstest]
    fn custom_index_and_page_size() {
        let store = Arc::new(
            MemorySearchStore::new().with_documents("venues", documents(&sample_places(7))),
        );
        let pagination = Pagination::new(std::num::NonZeroU64::new(3).expect("non-zero"));
        let catalog = PlaceCatalog::new(store)
            .with_index("venues")
            .with_pagination(pagination);
        let page = block_on(catalog.places(Some("3"))).expect("page three");
        assert_eq!(page.last_page, 3);
        assert_eq!(page.places.len(), 1);
    }

    #[rstest]
    fn unavailable_store_is_reported() {
        let store = Arc::new(MemorySearchStore::new().unavailable("connection refused"));
        let err = block_on(PlaceCatalog::new(store).recommend(GeoPoint::new(0.0, 0.0)))
            .expect_err("store down");
        assert!(matches!(err, CatalogError::Store(_)));
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }
}
