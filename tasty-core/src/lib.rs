//! Core domain types for Tasty Discoveries.
//!
//! The crate is synchronous and free of I/O. It owns the [`Place`] model,
//! the pagination policy, the search query documents sent to the engine
//! and the mapping of engine responses back into places. Adapters that
//! talk to files or the network live in `tasty-data`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod page;
pub mod place;
pub mod query;
pub mod response;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::ErrorKind;
pub use page::{DEFAULT_PAGE_SIZE, PageError, PageRequest, Pagination, PlacesPage};
pub use place::{CoordinateError, GeoPoint, Place, Recommendation};
pub use query::{NEAREST_LIMIT, SearchQuery};
pub use response::{ResponseError, SearchHits, map_search_response};
