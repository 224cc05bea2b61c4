//! Fixtures shared by unit and behaviour tests across the workspace.

use serde_json::{Value, json};

use crate::{GeoPoint, Place};

/// Build a place with placeholder address and phone values.
#[must_use]
pub fn sample_place(id: u64, name: &str, lat: f64, lon: f64) -> Place {
    Place::new(
        id,
        name,
        format!("{id} Sample Street"),
        format!("555-{id:04}"),
        GeoPoint::new(lat, lon),
    )
}

/// Build `count` places with ids `1..=count` spread along a meridian.
#[must_use]
pub fn sample_places(count: u64) -> Vec<Place> {
    (1..=count)
        .map(|id| {
            #[expect(
                clippy::cast_precision_loss,
                clippy::float_arithmetic,
                reason = "fixture coordinates only need to be distinct"
            )]
            let lat = 40.0 + id as f64 * 0.01;
            sample_place(id, &format!("Place {id}"), lat, -74.0)
        })
        .collect()
}

/// Render an engine search response carrying `places` and `total`.
#[must_use]
pub fn hits_response(places: &[Place], total: u64) -> Value {
    let hits: Vec<Value> = places
        .iter()
        .map(|place| {
            json!({
                "_index": "places",
                "_id": place.document_id(),
                "_score": null,
                "_source": place,
            })
        })
        .collect();
    json!({
        "took": 1,
        "timed_out": false,
        "hits": {
            "total": { "value": total, "relation": "eq" },
            "max_score": null,
            "hits": hits,
        }
    })
}
