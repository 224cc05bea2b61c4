//! The place entity and its embedded coordinate.

use std::num::ParseFloatError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ErrorKind;

/// A WGS84 coordinate in degrees.
///
/// Values are stored exactly as parsed; no range validation is applied, so
/// a latitude outside `[-90, 90]` is carried through unchanged.
///
/// # Examples
/// ```
/// use tasty_core::GeoPoint;
///
/// let point = GeoPoint::new(40.75, -73.99);
/// assert_eq!(point.lat, 40.75);
/// assert_eq!(point.lon, -73.99);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Construct a point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse textual latitude and longitude values, as received in a query
    /// string.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] naming the first value that is not a
    /// floating point number.
    ///
    /// # Examples
    /// ```
    /// use tasty_core::GeoPoint;
    ///
    /// let point = GeoPoint::from_query("40.7", "-74.0")?;
    /// assert_eq!(point, GeoPoint::new(40.7, -74.0));
    /// assert!(GeoPoint::from_query("north", "-74.0").is_err());
    /// # Ok::<(), tasty_core::CoordinateError>(())
    /// ```
    pub fn from_query(lat: &str, lon: &str) -> Result<Self, CoordinateError> {
        let lat_value = lat
            .parse::<f64>()
            .map_err(|source| CoordinateError::InvalidLatitude {
                value: lat.to_owned(),
                source,
            })?;
        let lon_value = lon
            .parse::<f64>()
            .map_err(|source| CoordinateError::InvalidLongitude {
                value: lon.to_owned(),
                source,
            })?;
        Ok(Self::new(lat_value, lon_value))
    }
}

/// Errors returned by [`GeoPoint::from_query`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// The latitude was not a floating point number.
    #[error("invalid 'latitude' value: {value}")]
    InvalidLatitude {
        /// Raw value supplied by the caller.
        value: String,
        /// Parser failure.
        #[source]
        source: ParseFloatError,
    },
    /// The longitude was not a floating point number.
    #[error("invalid 'longitude' value: {value}")]
    InvalidLongitude {
        /// Raw value supplied by the caller.
        value: String,
        /// Parser failure.
        #[source]
        source: ParseFloatError,
    },
}

impl CoordinateError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidCoordinate
    }
}

/// A place listed in the search index.
///
/// The identifier is assigned from the input row order during ingestion and
/// doubles as the document id in the store.
///
/// # Examples
/// ```
/// use tasty_core::{GeoPoint, Place};
///
/// let place = Place::new(1, "Cafe", "123 St", "555-1234", GeoPoint::new(40.75, -73.99));
/// assert_eq!(place.document_id(), "1");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Place {
    /// Sequential identifier, unique within one ingestion run.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Free-text postal address.
    pub address: String,
    /// Free-text phone number.
    pub phone: String,
    /// Geographic position.
    pub location: GeoPoint,
}

impl Place {
    /// Construct a place from its parts.
    #[must_use]
    pub fn new(
        id: u64,
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
        location: GeoPoint,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
            location,
        }
    }

    /// Identifier used for the document in the search store.
    #[must_use]
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// The nearest places to a caller-supplied coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Response label, always `"Recommendation"`.
    pub name: String,
    /// Places ordered by ascending distance.
    pub places: Vec<Place>,
}

impl Recommendation {
    /// Label carried by every recommendation response.
    pub const NAME: &'static str = "Recommendation";

    /// Wrap an ordered list of places.
    #[must_use]
    pub fn new(places: Vec<Place>) -> Self {
        Self {
            name: Self::NAME.to_owned(),
            places,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn serialises_with_nested_location() {
        let place = Place::new(7, "Cafe", "123 St", "555-1234", GeoPoint::new(40.75, -73.99));
        let value = serde_json::to_value(&place).expect("place should serialise");
        assert_eq!(
            value,
            json!({
                "id": 7,
                "name": "Cafe",
                "address": "123 St",
                "phone": "555-1234",
                "location": { "lat": 40.75, "lon": -73.99 }
            })
        );
    }

    #[rstest]
    #[case("91.5", "200.0", GeoPoint::new(91.5, 200.0))]
    #[case("-0", "0", GeoPoint::new(-0.0, 0.0))]
    fn accepts_out_of_range_coordinates(
        #[case] lat: &str,
        #[case] lon: &str,
        #[case] expected: GeoPoint,
    ) {
        let point = GeoPoint::from_query(lat, lon).expect("numeric values should parse");
        assert_eq!(point, expected);
    }

    #[rstest]
    fn rejects_non_numeric_latitude_first() {
        let err = GeoPoint::from_query("abc", "xyz").expect_err("latitude should fail");
        assert!(matches!(
            err,
            CoordinateError::InvalidLatitude { ref value, .. } if value == "abc"
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidCoordinate);
    }

    #[rstest]
    fn rejects_empty_longitude() {
        let err = GeoPoint::from_query("40.7", "").expect_err("empty longitude should fail");
        assert!(matches!(err, CoordinateError::InvalidLongitude { .. }));
    }

    #[rstest]
    fn recommendation_carries_fixed_name() {
        let recommendation = Recommendation::new(Vec::new());
        assert_eq!(recommendation.name, "Recommendation");
    }
}
