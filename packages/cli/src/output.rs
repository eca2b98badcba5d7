//! Writing layers to disk and summarising a run.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use geojson::FeatureCollection;
use lihtc_map_layers::{LayerOutcome, LoadedLayer};

/// `<dir>/<layer_id>.geojson`.
pub fn layer_path(dir: &Path, layer_id: &str) -> PathBuf {
    dir.join(format!("{layer_id}.geojson"))
}

/// Writes `collection` as `GeoJSON` to `path`, creating parent directories.
pub fn write_collection(path: &Path, collection: &FeatureCollection) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, collection)?;
    writer.flush()?;

    log::debug!(
        "Wrote {} features to {}",
        collection.features.len(),
        path.display()
    );
    Ok(())
}

/// Deletes a file left by an earlier run. Returns whether one existed.
pub fn remove_stale(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed stale {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Writes `collection` to stdout.
pub fn print_collection(collection: &FeatureCollection) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer(&mut lock, collection)?;
    writeln!(lock)
}

/// One row per layer: ID, outcome, feature count, and where the data
/// came from.
pub fn summary_table(loaded: &[LoadedLayer]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<20} {:<10} {:>8}  SOURCE", "ID", "OUTCOME", "FEATURES");
    let _ = writeln!(out, "{}", "-".repeat(70));

    for layer in loaded {
        let source = match &layer.outcome {
            LayerOutcome::Live {
                url,
                filter,
                client_filtered,
                ..
            } => {
                let trimmed = if *client_filtered { " (bbox)" } else { "" };
                format!("{url} where {filter}{trimmed}")
            }
            LayerOutcome::Fallback { dataset, .. } => format!("embedded {dataset}"),
            LayerOutcome::Omitted { cause } => cause.clone(),
        };
        let _ = writeln!(
            out,
            "{:<20} {:<10} {:>8}  {source}",
            layer.id,
            layer.outcome.status(),
            layer.outcome.feature_count()
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use lihtc_map_layer_models::LayerCriticality;

    use super::*;

    fn collection(n: usize) -> FeatureCollection {
        let features = (0..n)
            .map(|_| geojson::Feature {
                geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
                    -104.99, 39.74,
                ]))),
                ..Default::default()
            })
            .collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    fn loaded(id: &str, outcome: LayerOutcome) -> LoadedLayer {
        LoadedLayer {
            id: id.to_string(),
            name: id.to_string(),
            criticality: LayerCriticality::Optional,
            outcome,
        }
    }

    #[test]
    fn layer_files_are_named_after_the_layer() {
        assert_eq!(
            layer_path(Path::new("out"), "qct"),
            Path::new("out").join("qct.geojson")
        );
    }

    #[test]
    fn summary_lists_every_layer_with_its_outcome() {
        let table = summary_table(&[
            loaded(
                "lihtc_properties",
                LayerOutcome::Live {
                    collection: collection(3),
                    url: "https://lihtc.test/FeatureServer/0".to_string(),
                    filter: "1=1".into(),
                    client_filtered: true,
                },
            ),
            loaded(
                "qct",
                LayerOutcome::Omitted {
                    cause: "All sources exhausted for QCT after 2 attempts".to_string(),
                },
            ),
        ]);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("lihtc_properties"));
        assert!(lines[2].contains("live"));
        assert!(lines[2].contains("       3"));
        assert!(lines[2].ends_with("where 1=1 (bbox)"));
        assert!(lines[3].contains("omitted"));
        assert!(lines[3].contains("after 2 attempts"));
    }

    #[test]
    fn written_collection_reads_back() {
        let dir = std::env::temp_dir().join(format!("lihtc_map_output_{}", std::process::id()));
        let path = layer_path(&dir.join("nested"), "lihtc_properties");

        write_collection(&path, &collection(2)).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: FeatureCollection = raw.parse().unwrap();
        assert_eq!(parsed.features.len(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn stale_layer_file_is_removed_once() {
        let dir = std::env::temp_dir().join(format!("lihtc_map_stale_{}", std::process::id()));
        let path = layer_path(&dir, "counties");
        write_collection(&path, &collection(1)).unwrap();

        assert!(remove_stale(&path).unwrap());
        assert!(!path.exists());
        assert!(!remove_stale(&path).unwrap());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
