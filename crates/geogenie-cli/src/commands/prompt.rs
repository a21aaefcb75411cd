//! Prompt command implementation: show what would be sent, without sending it

use crate::cli::{Cli, PromptArgs};
use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::PromptOutput;
use anyhow::Result;
use geogenie_core::ports::LayerSource;
use geogenie_intent::PromptBuilder;

pub async fn execute(cli: &Cli, args: &PromptArgs, output: &OutputWriter) -> Result<()> {
    let config = config_loader::load_config_with_overrides(cli, None)?;
    let session = config.session_config(None);

    let store = super::load_layers(&args.layers)?;
    let catalog = store.catalog().await?;
    let prompt = PromptBuilder::build(&args.text, &catalog, &session);

    if output.is_json() {
        output.result(PromptOutput {
            characters: prompt.len(),
            layer_count: catalog.len(),
            system: prompt.system,
            user: prompt.user,
        })?;
    } else {
        output.section("System");
        println!("{}", prompt.system);
        output.section("User");
        println!("{}", prompt.user);
        output.section("Summary");
        output.kv("Provider", session.provider);
        output.kv("Model", &session.model);
        output.kv("Characters", prompt.len());
        output.kv("Layers", catalog.len());
    }

    Ok(())
}
