//! `ArcGIS` query URL construction.
//!
//! Builds `<layer>/query` URLs for paged `GeoJSON` feature requests and for
//! `returnCountOnly` record counts. Parameters are percent-encoded through
//! [`reqwest::Url`], so `where` clauses can contain quotes and spaces.

use lihtc_map_arcgis_models::FilterCandidate;
use reqwest::Url;

use crate::FetchError;

/// Returns the `/query` endpoint for a layer URL.
///
/// Accepts layer URLs with or without a trailing slash or `/query` suffix.
#[must_use]
pub fn query_endpoint(layer_url: &str) -> String {
    let base = layer_url.trim().trim_end_matches('/');
    let base = base.strip_suffix("/query").unwrap_or(base);
    format!("{base}/query")
}

/// One filtered query against one layer.
#[derive(Debug, Clone, Copy)]
pub struct LayerQuery<'a> {
    /// Layer URL (`.../FeatureServer/0`).
    pub layer_url: &'a str,
    /// `where` clause.
    pub filter: &'a FilterCandidate,
    /// Fields to return. Empty means all fields (`*`).
    pub out_fields: &'a [String],
}

impl LayerQuery<'_> {
    fn out_fields_param(&self) -> String {
        if self.out_fields.is_empty() {
            "*".to_string()
        } else {
            self.out_fields.join(",")
        }
    }

    fn build(&self, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let endpoint = query_endpoint(self.layer_url);
        Url::parse_with_params(&endpoint, params)
            .map(String::from)
            .map_err(|e| FetchError::InvalidUrl {
                url: endpoint,
                message: e.to_string(),
            })
    }

    /// URL for the page of `page_size` features starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the layer URL cannot be parsed.
    pub fn page_url(&self, offset: u64, page_size: u32) -> Result<String, FetchError> {
        let out_fields = self.out_fields_param();
        let count = page_size.to_string();
        let offset = offset.to_string();
        self.build(&[
            ("where", self.filter.as_str()),
            ("outFields", out_fields.as_str()),
            ("returnGeometry", "true"),
            ("f", "geojson"),
            ("resultRecordCount", count.as_str()),
            ("resultOffset", offset.as_str()),
            ("outSR", "4326"),
            ("returnExceededLimitFeatures", "true"),
        ])
    }

    /// URL for the total number of records matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the layer URL cannot be parsed.
    pub fn count_url(&self) -> Result<String, FetchError> {
        self.build(&[
            ("where", self.filter.as_str()),
            ("returnCountOnly", "true"),
            ("f", "json"),
        ])
    }
}
