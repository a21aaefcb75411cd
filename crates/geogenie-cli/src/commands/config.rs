//! Config command implementation

use crate::cli::Cli;
use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::ConfigRow;
use anyhow::Result;

pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = config_loader::load_config_with_overrides(cli, None)?;

    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    let path = cli.config.clone().unwrap_or_else(config_loader::default_config_path);
    output.section("Configuration");
    output.kv("File", path.display());
    output.kv("Credentials", config_loader::credentials_path().display());
    output.table(rows)
}
