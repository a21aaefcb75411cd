//! Key command implementation

use crate::cli::{KeyArgs, KeyCommand, KeySetArgs};
use crate::config_loader;
use crate::errors::CliError;
use crate::interactive;
use crate::output::OutputWriter;
use crate::output_types::KeyStatusRow;
use anyhow::Result;
use geogenie_core::config::parse_provider;
use geogenie_core::models::Provider;
use geogenie_core::ports::CredentialStore;

pub async fn execute(args: &KeyArgs, output: &OutputWriter) -> Result<()> {
    match &args.command {
        KeyCommand::Set(set) => set_key(set, output).await,
        KeyCommand::Status => status(output),
    }
}

async fn set_key(args: &KeySetArgs, output: &OutputWriter) -> Result<()> {
    let provider = parse_provider(&args.provider)?;
    if !provider.requires_api_key() {
        output.warning(format!("{} runs locally and does not use an API key", provider));
    }

    let key = match &args.key {
        Some(key) => key.clone(),
        None => interactive::prompt_api_key(provider).await?,
    };
    if key.trim().is_empty() {
        return Err(CliError::new("Empty API key")
            .with_suggestion(format!("Pass the key: geogenie key set {} <KEY>", provider))
            .into());
    }

    let store = config_loader::credential_store();
    store.set(provider, &key)?;

    if output.is_json() {
        output.result(serde_json::json!({
            "provider": provider,
            "path": store.path().display().to_string(),
        }))?;
    } else {
        output.success(format!("Stored API key for {} in {}", provider, store.path().display()));
    }
    Ok(())
}

fn status(output: &OutputWriter) -> Result<()> {
    let store = config_loader::credential_store();

    let rows = Provider::ALL
        .iter()
        .map(|provider| {
            let stored = store.get(*provider)?.is_some_and(|k| !k.is_empty());
            let environment = match provider.api_key_env() {
                Some(var) if std::env::var(var).is_ok_and(|v| !v.trim().is_empty()) => format!("{} (set)", var),
                Some(var) => var.to_string(),
                None => "-".to_string(),
            };
            Ok(KeyStatusRow {
                provider: provider.to_string(),
                stored,
                environment,
                required: provider.requires_api_key(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    output.section("API keys");
    output.kv("Credentials", store.path().display());
    output.table(rows)
}
