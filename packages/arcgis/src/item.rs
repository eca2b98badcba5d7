//! Portal item resolution.
//!
//! A hosted layer is sometimes republished under a new service URL while
//! its portal item ID stays put. Looking up the item's metadata gives the
//! current URL to query.

use lihtc_map_arcgis_models::ItemReference;
use serde_json::Value;

use crate::FetchError;
use crate::http::JsonFetcher;

/// Resolves `item` to a queryable layer URL.
///
/// When the item's URL points at a service root and `item.layer` is set,
/// the layer index is appended.
///
/// # Errors
///
/// Returns [`FetchError`] if the metadata request fails, the portal returns
/// an error envelope, or the metadata has no `url`.
pub async fn resolve_item_url<F: JsonFetcher>(
    fetcher: &F,
    item: &ItemReference,
) -> Result<String, FetchError> {
    let metadata_url = item.metadata_url();
    let body = fetcher.get_json(&metadata_url).await?;

    if let Some(error) = body.get("error") {
        return Err(FetchError::from_envelope(error, &metadata_url));
    }

    let url = body
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| FetchError::malformed(&metadata_url, "item metadata has no url"))?;

    let resolved = with_layer_index(url, item.layer);
    log::debug!("Resolved item {} to {resolved}", item.id);
    Ok(resolved)
}

fn with_layer_index(url: &str, layer: Option<u32>) -> String {
    let trimmed = url.trim_end_matches('/');
    match layer {
        Some(index) if !ends_with_layer_index(trimmed) => format!("{trimmed}/{index}"),
        _ => trimmed.to_string(),
    }
}

fn ends_with_layer_index(url: &str) -> bool {
    url.rsplit('/')
        .next()
        .is_some_and(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
}
