//! Mapping of engine search responses back into places.
//!
//! The engine answers with a generic document; only `hits.hits[]._source`
//! and `hits.total.value` are read. A response missing either part breaks
//! the store contract and is rejected as a whole.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{ErrorKind, Place};

/// Places decoded from one search response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchHits {
    /// Places in the order the engine returned them.
    pub places: Vec<Place>,
    /// Number of documents matching the query, not only those returned.
    pub total: u64,
}

/// Errors raised by [`map_search_response`].
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The response did not carry the expected hit and total structure.
    #[error("malformed search response: {source}")]
    Malformed {
        /// Decoder failure describing the missing or mistyped field.
        #[source]
        source: serde_json::Error,
    },
}

impl ResponseError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedResponse
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    hits: RawHits,
}

#[derive(Debug, Deserialize)]
struct RawHits {
    total: RawTotal,
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawTotal {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_source")]
    source: Place,
}

/// Decode a search response into places and the total hit count.
///
/// # Errors
///
/// Returns [`ResponseError::Malformed`] when the hit list, a hit's source
/// or the total is absent or mistyped. No partial results are returned.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use tasty_core::map_search_response;
///
/// let response = json!({
///     "hits": {
///         "total": { "value": 1, "relation": "eq" },
///         "hits": [{
///             "_id": "1",
///             "_source": {
///                 "id": 1, "name": "Cafe", "address": "123 St", "phone": "555",
///                 "location": { "lat": 40.75, "lon": -73.99 }
///             }
///         }]
///     }
/// });
/// let hits = map_search_response(response)?;
/// assert_eq!(hits.total, 1);
/// assert_eq!(hits.places[0].name, "Cafe");
/// # Ok::<(), tasty_core::ResponseError>(())
/// ```
pub fn map_search_response(response: Value) -> Result<SearchHits, ResponseError> {
    let raw: RawResponse = serde_json::from_value(response)
        .map_err(|source| ResponseError::Malformed { source })?;
    Ok(SearchHits {
        places: raw.hits.hits.into_iter().map(|hit| hit.source).collect(),
        total: raw.hits.total.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoPoint;
    use crate::test_support::hits_response;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn maps_hits_and_total() {
        let places = vec![
            Place::new(1, "Cafe", "123 St", "555-1234", GeoPoint::new(40.75, -73.99)),
            Place::new(2, "Deli", "9 Ave", "555-0000", GeoPoint::new(40.70, -74.01)),
        ];
        let hits = map_search_response(hits_response(&places, 25)).expect("valid response");
        assert_eq!(hits.total, 25);
        assert_eq!(hits.places, places);
    }

    #[rstest]
    fn empty_hit_list_is_valid() {
        let hits = map_search_response(hits_response(&[], 0)).expect("valid response");
        assert!(hits.places.is_empty());
        assert_eq!(hits.total, 0);
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({ "hits": { "total": { "value": 1 } } }))]
    #[case(json!({ "hits": { "hits": [] } }))]
    #[case(json!({ "hits": { "total": 3, "hits": [] } }))]
    #[case(json!({ "hits": { "total": { "value": 1 }, "hits": [{ "_id": "1" }] } }))]
    #[case(json!({ "hits": { "total": { "value": 1 }, "hits": [{ "_source": { "id": 1 } }] } }))]
    fn rejects_broken_contract(#[case] response: Value) {
        let err = map_search_response(response).expect_err("response should be rejected");
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }
}
