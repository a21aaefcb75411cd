//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use geogenie_core::config::{parse_provider, CliConfigOverrides, LayeredConfig};
use geogenie_core::credentials::FileCredentialStore;
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Directory holding the user's configuration and stored keys
///
/// `GEOGENIE_HOME` wins over `~/.geogenie`.
pub fn geogenie_home() -> PathBuf {
    if let Some(home) = std::env::var_os("GEOGENIE_HOME") {
        return PathBuf::from(home);
    }
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geogenie")
}

pub fn default_config_path() -> PathBuf {
    geogenie_home().join("config.toml")
}

pub fn credentials_path() -> PathBuf {
    geogenie_home().join("credentials.toml")
}

pub fn credential_store() -> FileCredentialStore {
    FileCredentialStore::new(credentials_path())
}

/// Load layered configuration from a file path
///
/// A missing default file is fine; a missing explicit `--config` file is not.
pub fn load_config(path: Option<&Path>) -> Result<LayeredConfig> {
    let config = LayeredConfig::with_defaults();

    let config = match path {
        Some(path) => config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                config.load_from_file(&path).context("Failed to load configuration file")?
            } else {
                config
            }
        }
    };

    Ok(config.load_from_env())
}

/// Load layered configuration with the global CLI overrides applied
pub fn load_config_with_overrides(cli: &Cli, require_confirmation: Option<bool>) -> Result<LayeredConfig> {
    let mut config = load_config(cli.config.as_deref())?;

    let provider = cli.provider.as_deref().map(parse_provider).transpose()?;
    config.update_from_cli(CliConfigOverrides {
        provider,
        model: cli.model.clone(),
        base_url: None,
        require_confirmation,
    });
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogenie_core::config::ConfigSource;
    use geogenie_core::models::Provider;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_missing_default_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("GEOGENIE_HOME", dir.path());

        let config = load_config(None).unwrap();
        assert_eq!(config.provider.value, Provider::OpenAi);
        assert_eq!(credentials_path(), dir.path().join("credentials.toml"));

        std::env::remove_var("GEOGENIE_HOME");
    }

    #[test]
    #[serial]
    fn test_explicit_file_and_env_layers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "provider = \"anthropic\"\nmax_prompt_layers = 10\n").unwrap();
        std::env::set_var("GEOGENIE_MAX_PROMPT_LAYERS", "20");

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.provider.value, Provider::Anthropic);
        assert_eq!(config.provider.source, ConfigSource::File);
        assert_eq!(config.max_prompt_layers.value, 20);
        assert_eq!(config.max_prompt_layers.source, ConfigSource::Environment);

        std::env::remove_var("GEOGENIE_MAX_PROMPT_LAYERS");
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
