//! Scripted [`JsonFetcher`] used to drive the paging and fallback logic
//! without a network.
//!
//! Compiled for this crate's tests and, behind the `testing` feature, for
//! downstream crates that drive the fallback chain in their own tests.

#![allow(clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::sync::Mutex;

use reqwest::Url;
use serde_json::{Value, json};

use crate::{FetchError, JsonFetcher};

/// Answers each request with `respond(url)` and records every URL asked
/// for, in order.
pub struct ScriptedFetcher<R> {
    requests: Mutex<Vec<String>>,
    respond: R,
}

impl<R> ScriptedFetcher<R>
where
    R: Fn(&Url) -> Result<Value, FetchError> + Send + Sync,
{
    /// Fetcher that answers every request with `respond`.
    pub const fn new(respond: R) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            respond,
        }
    }

    /// Every URL requested so far.
    pub fn requests(&self) -> Vec<Url> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|u| Url::parse(u).unwrap())
            .collect()
    }

    /// Requests that asked for a page of features (as opposed to counts or
    /// item metadata).
    pub fn page_requests(&self) -> Vec<Url> {
        self.requests()
            .into_iter()
            .filter(|u| param(u, "resultOffset").is_some())
            .collect()
    }

    /// `resultOffset` of each page request.
    pub fn offsets(&self) -> Vec<u64> {
        self.page_requests().iter().filter_map(offset).collect()
    }

    /// `where` clause of each page request, in order.
    pub fn wheres(&self) -> Vec<String> {
        self.page_requests()
            .iter()
            .filter_map(|u| param(u, "where"))
            .collect()
    }
}

impl<R> JsonFetcher for ScriptedFetcher<R>
where
    R: Fn(&Url) -> Result<Value, FetchError> + Send + Sync,
{
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        (self.respond)(&parsed)
    }
}

/// Value of query parameter `name`, decoded.
pub fn param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// `resultOffset` of `url`, if any.
pub fn offset(url: &Url) -> Option<u64> {
    param(url, "resultOffset").and_then(|v| v.parse().ok())
}

/// Whether `url` is a `returnCountOnly` request.
pub fn is_count(url: &Url) -> bool {
    param(url, "returnCountOnly").as_deref() == Some("true")
}

/// A point feature with `OBJECTID` set to `id`.
pub fn point(id: usize, lng: f64, lat: f64) -> Value {
    json!({
        "type": "Feature",
        "id": id,
        "geometry": { "type": "Point", "coordinates": [lng, lat] },
        "properties": { "OBJECTID": id, "PROJECT": format!("Project {id}") }
    })
}

/// `n` Denver point features numbered from `start`.
pub fn points(start: usize, n: usize) -> Vec<Value> {
    (start..start + n)
        .map(|id| point(id, -104.99, 39.74))
        .collect()
}

/// A `GeoJSON` page. `exceeded` of `None` leaves the flag out entirely.
pub fn page(features: Vec<Value>, exceeded: Option<bool>) -> Value {
    let mut body = json!({ "type": "FeatureCollection", "features": features });
    if let Some(flag) = exceeded {
        body["exceededTransferLimit"] = json!(flag);
    }
    body
}

/// A `returnCountOnly` response body.
pub fn count(n: u64) -> Value {
    json!({ "count": n })
}

/// The error an HTTP fetcher reports for a non-2xx `status`.
pub fn http_error(url: &Url, status: u16) -> FetchError {
    FetchError::RequestFailed {
        status,
        url: url.to_string(),
    }
}

/// Object IDs of a collection's features, in order.
pub fn ids(collection: &geojson::FeatureCollection) -> Vec<u64> {
    collection
        .features
        .iter()
        .filter_map(|f| f.property("OBJECTID").and_then(Value::as_u64))
        .collect()
}
