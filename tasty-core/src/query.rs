//! Search request documents sent to the engine.
//!
//! Two shapes exist: a paginated match-all listing sorted on the place id,
//! and a geo-distance query returning the places closest to a coordinate.

use serde_json::{Value, json};

use crate::{GeoPoint, PageRequest};

/// Number of places returned by a nearest-place query.
pub const NEAREST_LIMIT: u64 = 3;

/// Field holding the place coordinate in the index mapping.
const LOCATION_FIELD: &str = "location";

/// Field used as the default sort key for listings.
const SORT_FIELD: &str = "id";

/// A search request understood by the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchQuery {
    /// Every document, `size` at a time, skipping `from`.
    Page {
        /// Maximum number of hits to return.
        size: u64,
        /// Number of hits to skip.
        from: u64,
    },
    /// Documents sorted by ascending arc distance from `origin` in
    /// kilometres, capped at [`NEAREST_LIMIT`] hits.
    Nearest {
        /// Reference coordinate.
        origin: GeoPoint,
    },
}

impl SearchQuery {
    /// Listing query for a validated page request.
    ///
    /// # Examples
    /// ```
    /// use tasty_core::{Pagination, SearchQuery};
    ///
    /// let request = Pagination::default().parse_page(Some("2"))?;
    /// assert_eq!(SearchQuery::page(&request), SearchQuery::Page { size: 10, from: 10 });
    /// # Ok::<(), tasty_core::PageError>(())
    /// ```
    #[must_use]
    pub const fn page(request: &PageRequest) -> Self {
        Self::Page {
            size: request.size(),
            from: request.offset(),
        }
    }

    /// Nearest-place query around `origin`. Pagination does not apply.
    #[must_use]
    pub const fn nearest(origin: GeoPoint) -> Self {
        Self::Nearest { origin }
    }

    /// Render the JSON request body.
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::Page { size, from } => json!({
                "size": size,
                "from": from,
                "track_total_hits": true,
                "query": { "match_all": {} },
                "sort": [ { SORT_FIELD: { "order": "asc" } } ],
            }),
            Self::Nearest { origin } => json!({
                "size": NEAREST_LIMIT,
                "track_total_hits": true,
                "query": { "match_all": {} },
                "sort": [
                    {
                        "_geo_distance": {
                            LOCATION_FIELD: { "lat": origin.lat, "lon": origin.lon },
                            "order": "asc",
                            "unit": "km",
                            "mode": "min",
                            "distance_type": "arc",
                            "ignore_unmapped": true,
                        }
                    }
                ],
            }),
        }
    }
}
