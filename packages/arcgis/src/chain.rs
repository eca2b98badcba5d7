//! Ordered fallback across layer URLs and filter candidates.
//!
//! Every filter is tried against the primary URL first, then (if a portal
//! item is configured) against the URL the item resolves to. The item is
//! only looked up once the primary URL has produced nothing. The first
//! attempt that yields at least one feature wins and nothing after it is
//! requested.
//!
//! A `1=1` candidate has no geographic constraint, so its result is
//! trimmed to the region bounds before it is judged empty or not.

use geojson::FeatureCollection;
use lihtc_map_arcgis_models::{FilterCandidate, PageSettings, ServiceSource};
use lihtc_map_geography_models::Bounds;

use crate::FetchError;
use crate::http::JsonFetcher;
use crate::item::resolve_item_url;
use crate::paginate::fetch_all_pages;
use crate::query::{LayerQuery, query_endpoint};

/// Everything needed to resolve one layer through the fallback chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainRequest<'a> {
    /// Label for log messages and errors (e.g. `"LIHTC Properties"`).
    pub label: &'a str,
    /// Primary URL and optional alternate-URL item.
    pub source: &'a ServiceSource,
    /// Filters in the order to try them, narrowest first. An empty list
    /// means a single `1=1` query.
    pub filters: &'a [FilterCandidate],
    /// Fields to return. Empty means all fields.
    pub out_fields: &'a [String],
    /// Paging behaviour for each attempt.
    pub settings: PageSettings,
    /// Region used to trim `1=1` results.
    pub bounds: Option<Bounds>,
}

/// The attempt that produced data.
#[derive(Debug)]
pub struct ChainSuccess {
    /// Features from the winning attempt (region-trimmed for `1=1`).
    pub collection: FeatureCollection,
    /// Layer URL that answered.
    pub url: String,
    /// Filter that matched.
    pub filter: FilterCandidate,
    /// Whether the bounding-box filter was applied client-side.
    pub client_filtered: bool,
    /// Number of URL/filter combinations tried, including the winner.
    pub attempts: usize,
}

/// Walks the fallback chain for `request`.
///
/// # Errors
///
/// Returns [`FetchError::AllSourcesExhausted`] if no URL/filter combination
/// yields features. Individual request failures are logged and skipped.
pub async fn fetch_with_fallback<F: JsonFetcher>(
    fetcher: &F,
    request: &ChainRequest<'_>,
) -> Result<ChainSuccess, FetchError> {
    let default_filters = [FilterCandidate::match_all()];
    let filters = if request.filters.is_empty() {
        &default_filters[..]
    } else {
        request.filters
    };

    let mut attempts = 0;

    if let Some(success) =
        try_filters(fetcher, request, filters, &request.source.url, &mut attempts).await
    {
        return Ok(success);
    }

    if let Some(item) = &request.source.item {
        match resolve_item_url(fetcher, item).await {
            Ok(url) if query_endpoint(&url) == query_endpoint(&request.source.url) => {
                log::info!(
                    "{}: item {} resolves to the primary URL, nothing left to try",
                    request.label,
                    item.id
                );
            }
            Ok(url) => {
                log::info!("{}: trying alternate URL {url}", request.label);
                if let Some(success) =
                    try_filters(fetcher, request, filters, &url, &mut attempts).await
                {
                    return Ok(success);
                }
            }
            Err(e) => {
                log::warn!("{}: could not resolve item {}: {e}", request.label, item.id);
            }
        }
    }

    Err(FetchError::AllSourcesExhausted {
        label: request.label.to_string(),
        attempts,
    })
}

async fn try_filters<F: JsonFetcher>(
    fetcher: &F,
    request: &ChainRequest<'_>,
    filters: &[FilterCandidate],
    url: &str,
    attempts: &mut usize,
) -> Option<ChainSuccess> {
    let label = request.label;

    for filter in filters {
        *attempts += 1;

        let query = LayerQuery {
            layer_url: url,
            filter,
            out_fields: request.out_fields,
        };

        let collection = match fetch_all_pages(fetcher, &query, &request.settings, label).await {
            Ok(collection) => collection,
            Err(e) => {
                log::warn!("{label}: query {filter} failed: {e}");
                continue;
            }
        };

        if collection.features.is_empty() {
            log::info!("{label}: no features for {filter}");
            continue;
        }

        let (collection, client_filtered) = match (filter.is_match_all(), request.bounds) {
            (true, Some(bounds)) => (lihtc_map_spatial::filter_to_bounds(collection, &bounds), true),
            (true, None) => {
                log::warn!("{label}: {filter} matched with no region bounds to trim to");
                (collection, false)
            }
            (false, _) => (collection, false),
        };

        if collection.features.is_empty() {
            log::info!("{label}: no features for {filter} inside the region");
            continue;
        }

        log::info!(
            "{label}: {} features via {filter} at {url}",
            collection.features.len()
        );

        return Some(ChainSuccess {
            collection,
            url: url.to_string(),
            filter: filter.clone(),
            client_filtered,
            attempts: *attempts,
        });
    }

    None
}
