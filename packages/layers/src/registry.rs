//! Layer-set registry, loaded from embedded TOML configs.
//!
//! Each `.toml` file in `packages/layers/layer_sets/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a map for another
//! region is a matter of writing a new TOML file and listing it below.

use lihtc_map_layer_models::LayerSetDefinition;

use crate::LayerError;
use crate::config::parse_layer_set_toml;

/// TOML configs embedded at compile time.
const LAYER_SET_TOMLS: &[(&str, &str)] = &[
    ("colorado", include_str!("../layer_sets/colorado.toml")),
];

/// Layer set used when none is named.
pub const DEFAULT_LAYER_SET: &str = "colorado";

/// Returns every embedded layer set.
///
/// # Errors
///
/// Returns the first parse or validation error, naming the file.
pub fn all_layer_sets() -> Result<Vec<LayerSetDefinition>, LayerError> {
    LAYER_SET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_layer_set_toml(toml).map_err(|e| LayerError::Embedded {
                name: (*name).to_string(),
                source: Box::new(e),
            })
        })
        .collect()
}

/// Returns the embedded layer set with the given ID.
///
/// # Errors
///
/// Returns [`LayerError::UnknownLayerSet`] if no embedded set has that ID,
/// or any error from [`all_layer_sets`].
pub fn layer_set(id: &str) -> Result<LayerSetDefinition, LayerError> {
    all_layer_sets()?
        .into_iter()
        .find(|set| set.id == id)
        .ok_or_else(|| LayerError::UnknownLayerSet(id.to_string()))
}

#[cfg(test)]
mod tests {
    use lihtc_map_layer_models::LayerCriticality;

    use super::*;

    #[test]
    fn loads_all_layer_sets() {
        let sets = all_layer_sets().unwrap();
        assert_eq!(sets.len(), LAYER_SET_TOMLS.len());
    }

    #[test]
    fn layer_set_ids_match_file_names() {
        for (name, toml) in LAYER_SET_TOMLS {
            assert_eq!(parse_layer_set_toml(toml).unwrap().id, *name);
        }
    }

    #[test]
    fn default_layer_set_exists() {
        let set = layer_set(DEFAULT_LAYER_SET).unwrap();
        assert_eq!(set.region.state, "CO");
    }

    #[test]
    fn unknown_layer_set_is_an_error() {
        assert!(matches!(
            layer_set("atlantis"),
            Err(LayerError::UnknownLayerSet(id)) if id == "atlantis"
        ));
    }

    #[test]
    fn all_layers_have_required_fields() {
        for set in &all_layer_sets().unwrap() {
            for layer in &set.layers {
                assert!(!layer.id.is_empty(), "{}: layer id is empty", set.id);
                assert!(!layer.name.is_empty(), "{}: layer name is empty", layer.id);
                assert!(
                    layer.source.url.starts_with("https://"),
                    "{}: url is not https",
                    layer.id
                );
                assert!(!layer.filters.is_empty(), "{}: no filters", layer.id);
            }
        }
    }

    #[test]
    fn every_set_has_a_primary_layer_with_fallback() {
        for set in &all_layer_sets().unwrap() {
            assert!(
                set.layers.iter().any(|l| {
                    l.criticality == LayerCriticality::Primary && l.fallback.is_some()
                }),
                "{}: no primary layer with a fallback dataset",
                set.id
            );
        }
    }
}
