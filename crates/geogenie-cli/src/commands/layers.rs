//! Layers command implementation

use crate::cli::LayersArgs;
use crate::output::OutputWriter;
use crate::output_types::LayerRow;
use anyhow::Result;
use geogenie_core::ports::LayerSource;

pub async fn execute(args: &LayersArgs, output: &OutputWriter) -> Result<()> {
    let store = super::load_layers(&args.layers)?;
    let catalog = store.catalog().await?;

    output.section(format!("Layers ({})", catalog.len()));
    output.table(catalog.layers().iter().map(LayerRow::from).collect())
}
