#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `ArcGIS` query configuration types.
//!
//! Describes where a feature layer lives (a service URL plus an optional
//! portal item that resolves to an alternate URL), which `where` filters to
//! try against it, and how to page through the results. All types
//! deserialize from the layer-set TOML files.

use std::fmt;

use lihtc_map_geography_models::fips::UsState;
use serde::{Deserialize, Serialize};

/// Default portal used for item lookups when none is configured.
pub const DEFAULT_PORTAL: &str = "https://www.arcgis.com";

/// Default records per page. Most `ArcGIS` services cap at 1000 or 2000.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Default ceiling on page requests per pagination run.
pub const DEFAULT_MAX_PAGES: u32 = 150;

/// A `where` clause candidate for an `ArcGIS` query.
///
/// Candidates may contain `{state}` (two-letter abbreviation) and `{fips}`
/// (two-digit FIPS code) placeholders, filled in by [`Self::expand`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCandidate(String);

impl FilterCandidate {
    /// The expression that matches every record.
    pub const MATCH_ALL: &'static str = "1=1";

    /// Creates a candidate from a raw `where` expression.
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    /// A candidate that matches every record.
    #[must_use]
    pub fn match_all() -> Self {
        Self::new(Self::MATCH_ALL)
    }

    /// The `where` expression as sent to the service.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this candidate applies no server-side constraint.
    ///
    /// Whitespace is ignored, so `"1 = 1"` also counts.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        let compact: String = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        compact == Self::MATCH_ALL
    }

    /// Substitutes `{state}` and `{fips}` placeholders for `state`.
    #[must_use]
    pub fn expand(&self, state: &UsState) -> Self {
        Self(
            self.0
                .replace("{state}", state.abbr)
                .replace("{fips}", state.fips),
        )
    }
}

impl fmt::Display for FilterCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilterCandidate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A portal content item whose metadata names the queryable service URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReference {
    /// Portal item ID (32 hex characters).
    pub id: String,
    /// Layer index appended to the resolved service URL when it points at
    /// a service root rather than a layer.
    pub layer: Option<u32>,
    /// Portal base URL. Defaults to [`DEFAULT_PORTAL`].
    pub portal: Option<String>,
}

impl ItemReference {
    /// URL of the item's JSON metadata.
    #[must_use]
    pub fn metadata_url(&self) -> String {
        let portal = self
            .portal
            .as_deref()
            .unwrap_or(DEFAULT_PORTAL)
            .trim_end_matches('/');
        format!("{portal}/sharing/rest/content/items/{}?f=json", self.id)
    }
}

/// Where a feature layer can be queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSource {
    /// Primary layer URL (`.../FeatureServer/0` or `.../MapServer/8`).
    pub url: String,
    /// Optional portal item resolving to an alternate layer URL, tried
    /// after the primary URL yields nothing.
    #[serde(default)]
    pub item: Option<ItemReference>,
}

/// Paging behaviour for a pagination run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    /// Records requested per page (`resultRecordCount`).
    pub page_size: u32,
    /// Hard ceiling on page requests. Reaching it ends the run early with
    /// whatever was accumulated.
    pub max_pages: u32,
    /// Issue a `returnCountOnly` query first so paging can stop as soon
    /// as every record has arrived.
    pub count_first: bool,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            count_first: true,
        }
    }
}
