#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Layer-set configuration types.
//!
//! A layer set is one map's worth of data: the region it focuses on, how
//! to page through services, and the ordered list of layers to load. Layer
//! sets are written as TOML and deserialized into [`LayerSetDefinition`].

use lihtc_map_arcgis_models::{
    DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, FilterCandidate, PageSettings, ServiceSource,
};
use lihtc_map_geography_models::Bounds;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// How a layer's failure affects the map.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayerCriticality {
    /// The map's subject data. When every live source fails, the embedded
    /// fallback dataset is shown instead.
    Primary,
    /// Decorative overlay. When every live source fails, the layer is
    /// simply left off.
    Optional,
}

/// The geographic focus of a layer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Human-readable name (e.g. `"Colorado"`).
    pub name: String,
    /// Two-letter state abbreviation, used to expand `{state}`/`{fips}` in
    /// filter templates.
    pub state: String,
    /// `[west, south, east, north]` bound used to trim `1=1` results.
    pub bbox: Bounds,
    /// Degrees added on every side of `bbox` before trimming, so features
    /// straddling the border are kept.
    #[serde(default)]
    pub bbox_padding: f64,
}

impl RegionConfig {
    /// The trimming bound: `bbox` grown by `bbox_padding`.
    #[must_use]
    pub fn padded_bounds(&self) -> Bounds {
        if self.bbox_padding > 0.0 {
            self.bbox.padded(self.bbox_padding)
        } else {
            self.bbox
        }
    }
}

/// Request and paging settings shared by every layer in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Default records per page.
    pub page_size: u32,
    /// Page ceiling per pagination run.
    pub max_pages: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Query the record count before paging.
    pub count_first: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            count_first: true,
        }
    }
}

/// One map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDefinition {
    /// Unique identifier (e.g. `"lihtc_properties"`). Also the output
    /// file stem.
    pub id: String,
    /// Human-readable name (e.g. `"LIHTC Properties"`).
    pub name: String,
    /// Whether failure falls back to embedded data or omits the layer.
    pub criticality: LayerCriticality,
    /// Name of the embedded fallback dataset for primary layers.
    #[serde(default)]
    pub fallback: Option<String>,
    /// Primary URL and optional alternate-URL item.
    #[serde(flatten)]
    pub source: ServiceSource,
    /// Fields to return. Empty means all fields.
    #[serde(default)]
    pub out_fields: Vec<String>,
    /// Filter candidates, narrowest first. May use `{state}` and `{fips}`.
    #[serde(default)]
    pub filters: Vec<FilterCandidate>,
    /// Overrides the set-wide page size (some services cap at 2000, some
    /// at 1000).
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Free-form notes shown by `layers`.
    #[serde(default)]
    pub description: Option<String>,
}

/// A complete layer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSetDefinition {
    /// Unique identifier (e.g. `"colorado"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Geographic focus.
    pub region: RegionConfig,
    /// Shared request settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Layers in display order.
    pub layers: Vec<LayerDefinition>,
}

impl LayerSetDefinition {
    /// Looks up a layer by ID.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&LayerDefinition> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Paging settings for `layer`, applying its page-size override.
    #[must_use]
    pub fn page_settings(&self, layer: &LayerDefinition) -> PageSettings {
        PageSettings {
            page_size: layer.page_size.unwrap_or(self.fetch.page_size),
            max_pages: self.fetch.max_pages,
            count_first: self.fetch.count_first,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
id = "test"
name = "Test"

[region]
name = "Colorado"
state = "CO"
bbox = [-109.06, 36.99, -102.04, 41.01]

[[layers]]
id = "counties"
name = "Counties"
criticality = "optional"
url = "https://example.test/MapServer/1"
"#;

    #[test]
    fn parses_minimal_layer_set_with_defaults() {
        let set: LayerSetDefinition = toml::from_str(MINIMAL).unwrap();
        assert_eq!(set.fetch, FetchConfig::default());
        assert!((set.region.bbox_padding).abs() < f64::EPSILON);

        let layer = set.layer("counties").unwrap();
        assert_eq!(layer.criticality, LayerCriticality::Optional);
        assert!(layer.source.item.is_none());
        assert!(layer.filters.is_empty());
        assert!(layer.out_fields.is_empty());
        assert!(set.layer("missing").is_none());
    }

    #[test]
    fn page_size_override_applies_per_layer() {
        let mut set: LayerSetDefinition = toml::from_str(MINIMAL).unwrap();
        set.fetch.page_size = 1000;
        let mut layer = set.layers[0].clone();
        assert_eq!(set.page_settings(&layer).page_size, 1000);

        layer.page_size = Some(2000);
        let settings = set.page_settings(&layer);
        assert_eq!(settings.page_size, 2000);
        assert_eq!(settings.max_pages, set.fetch.max_pages);
    }

    #[test]
    fn parses_item_reference_alongside_url() {
        let toml_str = format!(
            "{MINIMAL}\n[layers.item]\nid = \"abc\"\nlayer = 2\n"
        );
        let set: LayerSetDefinition = toml::from_str(&toml_str).unwrap();
        let item = set.layers[0].source.item.as_ref().unwrap();
        assert_eq!(item.id, "abc");
        assert_eq!(item.layer, Some(2));
    }

    #[test]
    fn padded_bounds_grow_only_when_padding_is_set() {
        let set: LayerSetDefinition = toml::from_str(MINIMAL).unwrap();
        assert_eq!(set.region.padded_bounds(), set.region.bbox);

        let mut region = set.region;
        region.bbox_padding = 0.25;
        assert!(region.padded_bounds().min_lng < region.bbox.min_lng);
    }

    #[test]
    fn criticality_displays_as_its_config_name() {
        #[derive(Deserialize)]
        struct Row {
            criticality: LayerCriticality,
        }

        for criticality in [LayerCriticality::Primary, LayerCriticality::Optional] {
            let name = criticality.to_string();
            let row: Row = toml::from_str(&format!("criticality = \"{name}\"")).unwrap();
            assert_eq!(row.criticality, criticality, "{name}");
        }
        assert_eq!(LayerCriticality::Primary.to_string(), "primary");
    }
}
