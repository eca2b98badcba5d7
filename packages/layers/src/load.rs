//! Loading layers through the fallback chain.

use std::time::{Duration, Instant};

use futures::future::join_all;
use geojson::FeatureCollection;
use lihtc_map_arcgis::{ChainRequest, FetchError, HttpFetcher, JsonFetcher, fetch_with_fallback};
use lihtc_map_arcgis_models::FilterCandidate;
use lihtc_map_geography_models::Bounds;
use lihtc_map_geography_models::fips::{self, UsState};
use lihtc_map_layer_models::{LayerCriticality, LayerDefinition, LayerSetDefinition};

use crate::LayerError;
use crate::fallback::fallback_dataset;

/// Everything a load needs: the fetcher, the layer set, and its resolved
/// state. Built once per run and shared by every layer.
#[derive(Debug)]
pub struct LoadContext<F> {
    fetcher: F,
    set: LayerSetDefinition,
    state: &'static UsState,
}

impl<F> LoadContext<F> {
    /// Binds `set` to `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::UnknownState`] if the set's region state is
    /// not recognised.
    pub fn new(fetcher: F, set: LayerSetDefinition) -> Result<Self, LayerError> {
        let state = fips::by_abbr(&set.region.state)
            .ok_or_else(|| LayerError::UnknownState(set.region.state.clone()))?;
        Ok(Self {
            fetcher,
            set,
            state,
        })
    }

    #[must_use]
    pub const fn set(&self) -> &LayerSetDefinition {
        &self.set
    }

    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Region bound used to trim `1=1` results.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.set.region.padded_bounds()
    }

    /// `layer`'s filter candidates with `{state}`/`{fips}` filled in.
    #[must_use]
    pub fn filters_for(&self, layer: &LayerDefinition) -> Vec<FilterCandidate> {
        layer
            .filters
            .iter()
            .map(|f| f.expand(self.state))
            .collect()
    }
}

impl LoadContext<HttpFetcher> {
    /// Builds a context backed by a real HTTP client using the set's
    /// configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the state is
    /// unknown.
    pub fn with_http(set: LayerSetDefinition) -> Result<Self, LayerError> {
        let fetcher = HttpFetcher::new(Duration::from_secs(set.fetch.timeout_secs))?;
        Self::new(fetcher, set)
    }
}

/// How a layer ended up on the map.
#[derive(Debug)]
pub enum LayerOutcome {
    /// Live data from one of the layer's sources.
    Live {
        collection: FeatureCollection,
        /// Layer URL that answered.
        url: String,
        /// Filter that matched.
        filter: FilterCandidate,
        /// Whether the result was trimmed to the region client-side.
        client_filtered: bool,
    },
    /// Every live source failed; the embedded dataset is shown instead.
    Fallback {
        collection: FeatureCollection,
        /// Embedded dataset name.
        dataset: String,
        /// Why the live sources were abandoned.
        cause: String,
    },
    /// Every live source failed and there is nothing to show.
    Omitted {
        /// Why the live sources were abandoned.
        cause: String,
    },
}

impl LayerOutcome {
    #[must_use]
    pub const fn collection(&self) -> Option<&FeatureCollection> {
        match self {
            Self::Live { collection, .. } | Self::Fallback { collection, .. } => Some(collection),
            Self::Omitted { .. } => None,
        }
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.collection().map_or(0, |c| c.features.len())
    }

    /// Short status label (`live`, `fallback`, `omitted`).
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Live { .. } => "live",
            Self::Fallback { .. } => "fallback",
            Self::Omitted { .. } => "omitted",
        }
    }

    /// Whether the layer is shown with something other than live data.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        !matches!(self, Self::Live { .. })
    }
}

/// A layer after loading.
#[derive(Debug)]
pub struct LoadedLayer {
    pub id: String,
    pub name: String,
    pub criticality: LayerCriticality,
    pub outcome: LayerOutcome,
}

/// Loads one layer. Never fails: exhaustion is turned into a
/// [`LayerOutcome::Fallback`] or [`LayerOutcome::Omitted`] according to
/// the layer's criticality.
pub async fn load_layer<F: JsonFetcher>(
    ctx: &LoadContext<F>,
    layer: &LayerDefinition,
) -> LoadedLayer {
    let start = Instant::now();
    log::info!("Loading layer: {} ({})", layer.name, layer.id);

    let filters = ctx.filters_for(layer);
    let request = ChainRequest {
        label: &layer.name,
        source: &layer.source,
        filters: &filters,
        out_fields: &layer.out_fields,
        settings: ctx.set.page_settings(layer),
        bounds: Some(ctx.bounds()),
    };

    let outcome = match fetch_with_fallback(&ctx.fetcher, &request).await {
        Ok(success) => {
            log::info!(
                "{}: {} features from {} where {} ({} attempts) in {:.1}s",
                layer.name,
                success.collection.features.len(),
                success.url,
                success.filter,
                success.attempts,
                start.elapsed().as_secs_f64()
            );
            LayerOutcome::Live {
                collection: success.collection,
                url: success.url,
                filter: success.filter,
                client_filtered: success.client_filtered,
            }
        }
        Err(e) => degrade(layer, &e),
    };

    LoadedLayer {
        id: layer.id.clone(),
        name: layer.name.clone(),
        criticality: layer.criticality,
        outcome,
    }
}

fn degrade(layer: &LayerDefinition, error: &FetchError) -> LayerOutcome {
    let cause = error.to_string();

    if layer.criticality == LayerCriticality::Optional {
        log::warn!("{}: omitting optional layer: {cause}", layer.name);
        return LayerOutcome::Omitted { cause };
    }

    let dataset = layer
        .fallback
        .as_deref()
        .and_then(|name| fallback_dataset(name).map(|collection| (name, collection)));

    match dataset {
        Some((name, collection)) => {
            log::warn!(
                "{}: live sources unavailable ({cause}), showing {} features from embedded dataset {name}",
                layer.name,
                collection.features.len()
            );
            LayerOutcome::Fallback {
                collection: collection.clone(),
                dataset: name.to_string(),
                cause,
            }
        }
        None => {
            log::error!(
                "{}: live sources unavailable ({cause}) and no fallback dataset, layer omitted",
                layer.name
            );
            LayerOutcome::Omitted { cause }
        }
    }
}

/// Loads `layers` concurrently. Results are in the same order as `layers`.
pub async fn load_layers<F: JsonFetcher>(
    ctx: &LoadContext<F>,
    layers: &[&LayerDefinition],
) -> Vec<LoadedLayer> {
    let start = Instant::now();

    let loaded = join_all(layers.iter().map(|layer| load_layer(ctx, layer))).await;

    let degraded = loaded.iter().filter(|l| l.outcome.is_degraded()).count();
    log::info!(
        "Loaded {} layers ({degraded} degraded) in {:.1}s",
        loaded.len(),
        start.elapsed().as_secs_f64()
    );

    loaded
}
