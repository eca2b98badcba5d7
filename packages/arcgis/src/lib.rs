#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Paginated `ArcGIS` REST feature fetching with fallback.
//!
//! Layers are pulled from `FeatureServer`/`MapServer` query endpoints one
//! page at a time ([`paginate`]), merged into a single `GeoJSON`
//! [`geojson::FeatureCollection`], and resolved through an ordered chain of
//! URL/filter candidates ([`chain`]) until one of them yields data.
//!
//! All HTTP goes through the [`http::JsonFetcher`] trait so the paging and
//! fallback rules can be driven by scripted responses in tests.

pub mod chain;
pub mod http;
pub mod item;
pub mod paginate;
pub mod query;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use chain::{ChainRequest, ChainSuccess, fetch_with_fallback};
pub use http::{HttpFetcher, JsonFetcher};
pub use paginate::fetch_all_pages;

/// Errors that can occur while fetching features.
///
/// Every variant except [`FetchError::AllSourcesExhausted`] describes a
/// single failed request. The fallback chain treats them all alike: the
/// attempt is abandoned and the next candidate is tried.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("Malformed response from {url}: {message}")]
    MalformedResponse {
        /// Requested URL.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The service returned an `ArcGIS` error envelope
    /// (`{"error": {"code": ..., "message": ...}}`) with HTTP 200.
    #[error("ArcGIS error {code} from {url}: {message}")]
    Service {
        /// Requested URL.
        url: String,
        /// `ArcGIS` error code.
        code: i64,
        /// `ArcGIS` error message.
        message: String,
    },

    /// The request did not complete within the client timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Requested URL.
        url: String,
    },

    /// A query URL could not be built from the configured layer URL.
    #[error("Invalid query URL {url}: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser error.
        message: String,
    },

    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Every URL/filter candidate was tried and none produced features.
    #[error("All sources exhausted for {label} after {attempts} attempts")]
    AllSourcesExhausted {
        /// Label of the layer being fetched.
        label: String,
        /// Number of URL/filter combinations attempted.
        attempts: usize,
    },
}

impl FetchError {
    /// Builds an error from an `ArcGIS` error envelope's `error` object.
    pub(crate) fn from_envelope(error: &serde_json::Value, url: &str) -> Self {
        Self::Service {
            url: url.to_string(),
            code: error
                .get("code")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0),
            message: error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        }
    }

    pub(crate) fn malformed(url: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.to_string(),
            message: message.into(),
        }
    }
}
