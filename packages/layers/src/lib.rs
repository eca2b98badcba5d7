#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map layers for the LIHTC map.
//!
//! Ties the embedded layer-set registry and fallback datasets to the
//! `ArcGIS` fetcher. Each layer is resolved through its URL/filter chain;
//! when that is exhausted, primary layers degrade to embedded data and
//! optional layers are left off.

pub mod config;
pub mod fallback;
pub mod load;
pub mod registry;

use lihtc_map_arcgis::FetchError;
use lihtc_map_layer_models::{LayerDefinition, LayerSetDefinition};

pub use load::{LayerOutcome, LoadContext, LoadedLayer, load_layer, load_layers};

/// Environment variable holding a comma-separated list of layer IDs to load.
pub const LAYERS_ENV_VAR: &str = "LIHTC_MAP_LAYERS";

/// Errors from loading layer configuration.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// The layer-set file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The layer-set TOML is malformed or has the wrong shape.
    #[error("Invalid layer set TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// `region.state` is not a US state or DC abbreviation.
    #[error("Unknown state abbreviation: {0}")]
    UnknownState(String),

    /// `region.bbox` is not finite or its edges are out of order.
    #[error("Layer set {0} has an invalid bounding box")]
    InvalidBounds(String),

    /// A page size or page ceiling is zero.
    #[error("{0}: page size and page ceiling must be positive")]
    InvalidFetch(String),

    /// Two layers share an ID.
    #[error("Duplicate layer ID: {0}")]
    DuplicateLayer(String),

    /// A layer names a fallback dataset that is not embedded.
    #[error("Layer {layer} names unknown fallback dataset {dataset}")]
    UnknownFallback {
        /// Layer ID.
        layer: String,
        /// Dataset name as written in the config.
        dataset: String,
    },

    /// No embedded layer set has the requested ID.
    #[error("Unknown layer set: {0}")]
    UnknownLayerSet(String),

    /// The layer set has no layer with the requested ID.
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    /// An embedded layer-set file failed to parse or validate.
    #[error("Embedded layer set {name} is invalid: {source}")]
    Embedded {
        /// File stem.
        name: String,
        /// Underlying error.
        source: Box<Self>,
    },

    /// The HTTP client could not be built.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Returns the layers to load, filtered by the `--layers` CLI flag or the
/// `LIHTC_MAP_LAYERS` environment variable. If neither is set, every layer
/// in the set is returned, in display order.
#[must_use]
pub fn enabled_layers(
    set: &LayerSetDefinition,
    cli_filter: Option<String>,
) -> Vec<&LayerDefinition> {
    let filter = cli_filter.or_else(|| std::env::var(LAYERS_ENV_VAR).ok());

    let Some(filter_str) = filter else {
        return set.layers.iter().collect();
    };

    let ids: Vec<&str> = filter_str.split(',').map(str::trim).collect();

    let filtered: Vec<&LayerDefinition> = set
        .layers
        .iter()
        .filter(|l| ids.contains(&l.id.as_str()))
        .collect();

    if filtered.is_empty() {
        log::warn!(
            "No matching layers found for filter {:?}. Available: {}",
            ids,
            set.layers
                .iter()
                .map(|l| l.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    filtered
}
