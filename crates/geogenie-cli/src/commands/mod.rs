//! Command implementations

mod config;
mod key;
mod layers;
mod prompt;
mod run;

use crate::cli::{Cli, Commands};
use crate::errors;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use geogenie_core::models::LayerId;
use geogenie_geo::geojson_io;
use geogenie_store::MemoryLayerStore;
use std::path::PathBuf;

/// Execute a CLI command
pub async fn execute(cli: Cli, output: &OutputWriter) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => run::execute(&cli, args, output).await,
        Commands::Prompt(args) => prompt::execute(&cli, args, output).await,
        Commands::Layers(args) => layers::execute(args, output).await,
        Commands::Config => config::execute(&cli, output),
        Commands::Key(args) => key::execute(args, output).await,
    }
}

/// Load GeoJSON files into a fresh store, numbering layers from 1 in argument order
pub(crate) fn load_layers(paths: &[PathBuf]) -> Result<MemoryLayerStore> {
    let store = MemoryLayerStore::new();

    for (i, path) in paths.iter().enumerate() {
        if !path.exists() {
            return Err(errors::layer_file_not_found(path).into());
        }
        let layer = geojson_io::read_layer(path)
            .with_context(|| format!("Failed to load layer from {}", path.display()))?;
        tracing::info!("Loaded layer '{}' ({} features) from {}", layer.name, layer.len(), path.display());
        store.insert_layer(LayerId::new((i + 1).to_string()), layer);
    }

    Ok(store)
}
