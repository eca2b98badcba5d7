//! Paged retrieval of a filtered layer into one feature collection.
//!
//! Pages are requested strictly one after another with `resultOffset` set
//! to the number of features already received. Paging stops when:
//!
//! * a page comes back empty,
//! * a page is short and the service did not set `exceededTransferLimit`,
//! * the record count learned up front has been reached and the service did
//!   not set `exceededTransferLimit`, or
//! * the page ceiling is hit, which ends the run early but still returns
//!   what was accumulated.
//!
//! `exceededTransferLimit` always wins over the size and count checks.
//! Services silently cap pages at their own `maxRecordCount`, so a short
//! page carrying the flag does not mean the data ran out.

use geojson::{Feature, FeatureCollection};
use lihtc_map_arcgis_models::PageSettings;
use serde_json::{Value, json};

use crate::FetchError;
use crate::http::JsonFetcher;
use crate::query::LayerQuery;

/// One parsed page of query results.
#[derive(Debug)]
pub struct Page {
    /// Features in arrival order.
    pub features: Vec<Feature>,
    /// Whether the service signalled more records beyond this page.
    pub exceeded_transfer_limit: bool,
}

/// Parses a query response body into a [`Page`].
///
/// Accepts `GeoJSON` responses and, for services that ignore `f=geojson`,
/// Esri JSON responses whose features carry `attributes` and an Esri
/// geometry. The truncation flag is read from the top level or from a
/// `properties` member.
///
/// # Errors
///
/// * [`FetchError::Service`] if the body is an `ArcGIS` error envelope
/// * [`FetchError::MalformedResponse`] if there is no `features` array or a
///   feature cannot be interpreted
pub fn parse_page(body: Value, url: &str) -> Result<Page, FetchError> {
    if let Some(error) = body.get("error") {
        return Err(FetchError::from_envelope(error, url));
    }

    let exceeded_transfer_limit = body
        .get("exceededTransferLimit")
        .or_else(|| body.pointer("/properties/exceededTransferLimit"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let Value::Object(mut object) = body else {
        return Err(FetchError::malformed(url, "expected a JSON object"));
    };

    let Some(Value::Array(raw_features)) = object.remove("features") else {
        return Err(FetchError::malformed(url, "response has no features array"));
    };

    let features = raw_features
        .into_iter()
        .map(|raw| {
            let raw = if raw.get("type").is_none() && raw.get("attributes").is_some() {
                esri_feature_to_geojson(&raw)
            } else {
                raw
            };
            serde_json::from_value::<Feature>(raw)
                .map_err(|e| FetchError::malformed(url, format!("invalid feature: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        features,
        exceeded_transfer_limit,
    })
}

/// Rewrites an Esri JSON feature (`{"attributes": {...}, "geometry":
/// {...}}`) as a `GeoJSON` feature.
fn esri_feature_to_geojson(raw: &Value) -> Value {
    let geometry = raw
        .get("geometry")
        .and_then(esri_geometry_to_geojson)
        .unwrap_or(Value::Null);

    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": raw.get("attributes").cloned().unwrap_or(Value::Null),
    })
}

fn esri_geometry_to_geojson(geometry: &Value) -> Option<Value> {
    if let (Some(x), Some(y)) = (
        geometry.get("x").and_then(Value::as_f64),
        geometry.get("y").and_then(Value::as_f64),
    ) {
        return Some(json!({ "type": "Point", "coordinates": [x, y] }));
    }
    if let Some(rings) = geometry.get("rings") {
        return Some(json!({ "type": "Polygon", "coordinates": rings }));
    }
    if let Some(paths) = geometry.get("paths") {
        return Some(json!({ "type": "MultiLineString", "coordinates": paths }));
    }
    if let Some(points) = geometry.get("points") {
        return Some(json!({ "type": "MultiPoint", "coordinates": points }));
    }
    None
}

/// Asks the service how many records match the query.
///
/// Returns `None` if the count request fails or the response has no
/// usable `count` (non-fatal: paging proceeds without a known total).
pub async fn query_count<F: JsonFetcher>(
    fetcher: &F,
    query: &LayerQuery<'_>,
    label: &str,
) -> Option<u64> {
    let url = query.count_url().ok()?;
    match fetcher.get_json(&url).await {
        Ok(body) => {
            let count = body.get("count").and_then(Value::as_u64);
            if count.is_none() {
                log::warn!("{label}: count query returned no count, paging without a total");
            }
            count
        }
        Err(e) => {
            log::warn!("{label}: count query failed ({e}), paging without a total");
            None
        }
    }
}

/// Fetches every page of `query` and merges the features in arrival order.
///
/// # Errors
///
/// Returns the first [`FetchError`] raised by a page request. Features
/// from earlier pages are discarded in that case; a failed page is never
/// reported as a partial success.
pub async fn fetch_all_pages<F: JsonFetcher>(
    fetcher: &F,
    query: &LayerQuery<'_>,
    settings: &PageSettings,
    label: &str,
) -> Result<FeatureCollection, FetchError> {
    let page_size = settings.page_size.max(1);

    let total = if settings.count_first {
        query_count(fetcher, query, label).await
    } else {
        None
    };

    let mut features: Vec<Feature> = Vec::new();

    match total {
        Some(0) => {
            log::info!("{label}: no records match {}", query.filter);
            return Ok(collection(features));
        }
        Some(total) => log::info!("{label}: {total} records match {}", query.filter),
        None => {}
    }

    let mut pages: u32 = 0;

    loop {
        if pages >= settings.max_pages {
            log::warn!(
                "{label}: stopped after {pages} pages ({} features) without reaching the end",
                features.len()
            );
            break;
        }

        let offset = features.len() as u64;
        let url = query.page_url(offset, page_size)?;

        match total {
            Some(total) => log::info!("{label}: {offset} / {total} fetched"),
            None => log::info!("{label}: offset={offset}, limit={page_size}"),
        }

        let body = fetcher.get_json(&url).await?;
        pages += 1;
        let page = parse_page(body, &url)?;

        let count = page.features.len();
        if count == 0 {
            break;
        }
        features.extend(page.features);

        if page.exceeded_transfer_limit {
            continue;
        }
        if count < page_size as usize {
            break;
        }
        if total.is_some_and(|total| features.len() as u64 >= total) {
            break;
        }
    }

    log::info!(
        "{label}: download complete, {} features in {pages} pages",
        features.len()
    );

    Ok(collection(features))
}

const fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
