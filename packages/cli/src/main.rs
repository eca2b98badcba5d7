#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for fetching LIHTC map layers.

mod output;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use lihtc_map_layer_models::LayerSetDefinition;
use lihtc_map_layers::config::load_layer_set_file;
use lihtc_map_layers::registry::{DEFAULT_LAYER_SET, all_layer_sets, layer_set};
use lihtc_map_layers::{LayerError, LoadContext, enabled_layers, load_layer, load_layers};

#[derive(Parser)]
#[command(name = "lihtc_map", about = "LIHTC map layer fetcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which layer set to use.
#[derive(Args)]
struct SetArgs {
    /// Built-in layer set ID
    #[arg(long, default_value = DEFAULT_LAYER_SET)]
    set: String,
    /// Load the layer set from a TOML file instead of the built-in registry
    #[arg(long, conflicts_with = "set")]
    config: Option<PathBuf>,
}

impl SetArgs {
    fn load(&self) -> Result<LayerSetDefinition, LayerError> {
        match &self.config {
            Some(path) => load_layer_set_file(path),
            None => layer_set(&self.set),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in layer sets
    LayerSets,
    /// List the layers of a layer set
    Layers {
        #[command(flatten)]
        set: SetArgs,
    },
    /// Fetch a single layer and write it as `GeoJSON`
    Fetch {
        /// Layer identifier (e.g., "`lihtc_properties`")
        layer: String,
        #[command(flatten)]
        set: SetArgs,
        /// Output file. Writes to stdout if not given.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fetch every layer concurrently and write one `GeoJSON` file per layer
    FetchAll {
        #[command(flatten)]
        set: SetArgs,
        /// Comma-separated list of layer IDs to fetch (overrides `LIHTC_MAP_LAYERS` env var)
        #[arg(long)]
        layers: Option<String>,
        /// Directory to write `<layer_id>.geojson` files into
        #[arg(long)]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::LayerSets => {
            let sets = all_layer_sets()?;
            println!("{:<20} {:<8} NAME", "ID", "LAYERS");
            println!("{}", "-".repeat(50));
            for set in &sets {
                println!("{:<20} {:<8} {}", set.id, set.layers.len(), set.name);
            }
        }
        Commands::Layers { set } => {
            let set = set.load()?;
            println!("{} ({})", set.name, set.region.name);
            println!();
            println!("{:<20} {:<10} {:<16} NAME", "ID", "KIND", "FALLBACK");
            println!("{}", "-".repeat(70));
            for layer in &set.layers {
                println!(
                    "{:<20} {:<10} {:<16} {}",
                    layer.id,
                    layer.criticality,
                    layer.fallback.as_deref().unwrap_or("-"),
                    layer.name
                );
            }
        }
        Commands::Fetch { layer, set, output } => {
            let set = set.load()?;
            let definition = set
                .layer(&layer)
                .cloned()
                .ok_or_else(|| LayerError::UnknownLayer(layer.clone()))?;
            let ctx = LoadContext::with_http(set)?;

            let loaded = load_layer(&ctx, &definition).await;

            let Some(collection) = loaded.outcome.collection() else {
                return Err(format!("{}: layer omitted, nothing to write", loaded.name).into());
            };
            match &output {
                Some(path) => {
                    output::write_collection(path, collection)?;
                    log::info!(
                        "Wrote {} features ({}) to {}",
                        collection.features.len(),
                        loaded.outcome.status(),
                        path.display()
                    );
                }
                None => output::print_collection(collection)?,
            }
        }
        Commands::FetchAll {
            set,
            layers,
            output_dir,
        } => {
            let start = Instant::now();
            let ctx = LoadContext::with_http(set.load()?)?;
            let selected = enabled_layers(ctx.set(), layers);

            if selected.is_empty() {
                return Err("No layers selected".into());
            }

            let loaded = load_layers(&ctx, &selected).await;

            for layer in &loaded {
                let path = output::layer_path(&output_dir, &layer.id);
                match layer.outcome.collection() {
                    Some(collection) => output::write_collection(&path, collection)?,
                    None => {
                        if output::remove_stale(&path)? {
                            log::warn!(
                                "{}: omitted, removed {} from an earlier run",
                                layer.id,
                                path.display()
                            );
                        }
                    }
                }
            }

            print!("{}", output::summary_table(&loaded));
            log::info!(
                "Fetched {} layers into {} in {:.1}s",
                loaded.len(),
                output_dir.display(),
                start.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}
