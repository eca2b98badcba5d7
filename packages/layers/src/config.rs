//! Parsing and validation of layer-set TOML.

use std::collections::BTreeSet;
use std::path::Path;

use lihtc_map_geography_models::fips;
use lihtc_map_layer_models::{LayerCriticality, LayerSetDefinition};

use crate::LayerError;
use crate::fallback::fallback_dataset;

/// Parses and validates a layer set from a TOML string.
///
/// # Errors
///
/// Returns [`LayerError::Toml`] if the TOML is malformed, or one of the
/// validation variants if the set refers to an unknown state or fallback
/// dataset, repeats a layer ID, or has an unusable bounding box.
pub fn parse_layer_set_toml(toml_str: &str) -> Result<LayerSetDefinition, LayerError> {
    let set: LayerSetDefinition = toml::de::from_str(toml_str)?;
    validate(&set)?;
    Ok(set)
}

/// Reads a layer set from `path`.
///
/// # Errors
///
/// Returns [`LayerError::Io`] if the file cannot be read, otherwise as
/// [`parse_layer_set_toml`].
pub fn load_layer_set_file(path: &Path) -> Result<LayerSetDefinition, LayerError> {
    let raw = std::fs::read_to_string(path)?;
    log::debug!("Loaded layer set from {}", path.display());
    parse_layer_set_toml(&raw)
}

fn validate(set: &LayerSetDefinition) -> Result<(), LayerError> {
    if fips::by_abbr(&set.region.state).is_none() {
        return Err(LayerError::UnknownState(set.region.state.clone()));
    }

    if !set.region.bbox.is_valid() {
        return Err(LayerError::InvalidBounds(set.id.clone()));
    }

    if set.fetch.page_size == 0 || set.fetch.max_pages == 0 {
        return Err(LayerError::InvalidFetch(set.id.clone()));
    }

    let mut seen = BTreeSet::new();
    for layer in &set.layers {
        if !seen.insert(layer.id.as_str()) {
            return Err(LayerError::DuplicateLayer(layer.id.clone()));
        }

        if layer.page_size == Some(0) {
            return Err(LayerError::InvalidFetch(layer.id.clone()));
        }

        match (&layer.fallback, layer.criticality) {
            (Some(name), _) if fallback_dataset(name).is_none() => {
                return Err(LayerError::UnknownFallback {
                    layer: layer.id.clone(),
                    dataset: name.clone(),
                });
            }
            (Some(_), LayerCriticality::Optional) => {
                log::warn!(
                    "{}: fallback dataset is ignored for optional layers",
                    layer.id
                );
            }
            (None, LayerCriticality::Primary) => {
                log::warn!(
                    "{}: primary layer has no fallback dataset and will be omitted if every source fails",
                    layer.id
                );
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer_set(region_state: &str, bbox: &str, layers: &str) -> String {
        format!(
            r#"
id = "test"
name = "Test"

[region]
name = "Test"
state = "{region_state}"
bbox = {bbox}
{layers}"#
        )
    }

    const LIHTC: &str = r#"
[[layers]]
id = "lihtc_properties"
name = "LIHTC Properties"
criticality = "primary"
fallback = "colorado_lihtc"
url = "https://example.test/LIHTC/FeatureServer/0"
filters = ["PROJ_ST='{state}'", "1=1"]
"#;

    const COLORADO_BBOX: &str = "[-109.06, 36.99, -102.04, 41.01]";

    #[test]
    fn accepts_valid_layer_set() {
        let set = parse_layer_set_toml(&layer_set("CO", COLORADO_BBOX, LIHTC)).unwrap();
        assert_eq!(set.layers.len(), 1);
        assert_eq!(set.layers[0].fallback.as_deref(), Some("colorado_lihtc"));
    }

    #[test]
    fn rejects_unknown_state() {
        let err = parse_layer_set_toml(&layer_set("ZZ", COLORADO_BBOX, LIHTC)).unwrap_err();
        assert!(matches!(err, LayerError::UnknownState(s) if s == "ZZ"));
    }

    #[test]
    fn rejects_inverted_bbox() {
        let err = parse_layer_set_toml(&layer_set("CO", "[-102.0, 41.0, -109.0, 37.0]", LIHTC))
            .unwrap_err();
        assert!(matches!(err, LayerError::InvalidBounds(_)));
    }

    #[test]
    fn rejects_duplicate_layer_ids() {
        let layers = format!("{LIHTC}{LIHTC}");
        let err = parse_layer_set_toml(&layer_set("CO", COLORADO_BBOX, &layers)).unwrap_err();
        assert!(matches!(err, LayerError::DuplicateLayer(id) if id == "lihtc_properties"));
    }

    #[test]
    fn rejects_unknown_fallback_dataset() {
        let layers = LIHTC.replace("colorado_lihtc", "nowhere_lihtc");
        let err = parse_layer_set_toml(&layer_set("CO", COLORADO_BBOX, &layers)).unwrap_err();
        assert!(matches!(
            err,
            LayerError::UnknownFallback { dataset, .. } if dataset == "nowhere_lihtc"
        ));
    }

    #[test]
    fn rejects_zero_page_size_override() {
        let layers = format!("{LIHTC}page_size = 0\n");
        let err = parse_layer_set_toml(&layer_set("CO", COLORADO_BBOX, &layers)).unwrap_err();
        assert!(matches!(err, LayerError::InvalidFetch(_)));
    }

    #[test]
    fn reports_malformed_toml() {
        let err = parse_layer_set_toml("id = ").unwrap_err();
        assert!(matches!(err, LayerError::Toml(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_layer_set_file(Path::new("/nonexistent/layers.toml")).unwrap_err();
        assert!(matches!(err, LayerError::Io(_)));
    }
}
