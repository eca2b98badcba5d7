//! Embedded fallback datasets.
//!
//! Each `.geojson` file in `packages/layers/fallback/` is baked into the
//! binary and parsed once on first use. A primary layer whose live sources
//! are all exhausted is rendered from one of these instead.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use geojson::{FeatureCollection, GeoJson};

/// `GeoJSON` datasets embedded at compile time.
const FALLBACK_GEOJSON: &[(&str, &str)] = &[(
    "colorado_lihtc",
    include_str!("../fallback/colorado_lihtc.geojson"),
)];

static DATASETS: LazyLock<BTreeMap<&'static str, FeatureCollection>> = LazyLock::new(|| {
    FALLBACK_GEOJSON
        .iter()
        .filter_map(|(name, raw)| match parse_dataset(raw) {
            Ok(collection) => Some((*name, collection)),
            Err(e) => {
                log::error!("Embedded fallback dataset {name} is unusable: {e}");
                None
            }
        })
        .collect()
});

fn parse_dataset(raw: &str) -> Result<FeatureCollection, String> {
    match raw.parse::<GeoJson>().map_err(|e| e.to_string())? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        other => Err(format!("expected a FeatureCollection, got {}", type_name(&other))),
    }
}

const fn type_name(value: &GeoJson) -> &'static str {
    match value {
        GeoJson::Geometry(_) => "Geometry",
        GeoJson::Feature(_) => "Feature",
        GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}

/// Names of every embedded dataset, whether or not it parsed.
pub fn dataset_names() -> impl Iterator<Item = &'static str> {
    FALLBACK_GEOJSON.iter().map(|(name, _)| *name)
}

/// Returns the embedded dataset called `name`.
#[must_use]
pub fn fallback_dataset(name: &str) -> Option<&'static FeatureCollection> {
    DATASETS.get(name)
}

#[cfg(test)]
mod tests {
    use lihtc_map_geography_models::Bounds;

    use super::*;

    #[test]
    fn every_embedded_dataset_parses() {
        for name in dataset_names() {
            let collection = fallback_dataset(name)
                .unwrap_or_else(|| panic!("{name} did not parse"));
            assert!(!collection.features.is_empty(), "{name} is empty");
        }
    }

    #[test]
    fn colorado_dataset_lies_inside_colorado() {
        let colorado = Bounds::new(-109.06, 36.99, -102.04, 41.01);
        let collection = fallback_dataset("colorado_lihtc").unwrap();

        for feature in &collection.features {
            let Some(geojson::Value::Point(position)) =
                feature.geometry.as_ref().map(|g| &g.value)
            else {
                panic!("expected point geometry");
            };
            let (lng, lat) = (position[0], position[1]);
            assert!(
                (colorado.min_lng..=colorado.max_lng).contains(&lng)
                    && (colorado.min_lat..=colorado.max_lat).contains(&lat),
                "({lng}, {lat}) is outside Colorado"
            );
            assert_eq!(
                feature.property("PROJ_ST").and_then(serde_json::Value::as_str),
                Some("CO")
            );
        }
    }

    #[test]
    fn unknown_dataset_is_none() {
        assert!(fallback_dataset("atlantis").is_none());
    }

    #[test]
    fn rejects_non_collection_geojson() {
        let err = parse_dataset(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#).unwrap_err();
        assert!(err.contains("Geometry"));
    }
}
