//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use geogenie_core::config::{parse_provider, CliConfigOverrides, ConfigSource, LayeredConfig};
use geogenie_core::models::Provider;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

const ENV_VARS: [&str; 7] = [
    "GEOGENIE_PROVIDER",
    "GEOGENIE_MODEL",
    "GEOGENIE_BASE_URL",
    "GEOGENIE_TIMEOUT_SECS",
    "GEOGENIE_MAX_TOKENS",
    "GEOGENIE_TEMPERATURE",
    "GEOGENIE_MAX_PROMPT_LAYERS",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_partial_file_configuration() {
    let file = config_file(
        r#"
model = "gpt-4o"
# Only override the model, leave others as defaults
"#,
    );

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.model.value, "gpt-4o");
    assert_eq!(config.model.source, ConfigSource::File);
    assert_eq!(config.provider.value, Provider::OpenAi);
    assert_eq!(config.provider.source, ConfigSource::Default);
    assert_eq!(config.max_tokens.value, 1000);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();

    let file = config_file(
        r#"
provider = "openai"
model = "gpt-4o"
max_prompt_layers = 20
"#,
    );

    env::set_var("GEOGENIE_PROVIDER", "ollama");
    env::set_var("GEOGENIE_MODEL", "llama3.1:70b");
    env::set_var("GEOGENIE_TIMEOUT_SECS", "120");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.provider.value, Provider::Ollama);
    assert_eq!(config.provider.source, ConfigSource::Environment);
    assert_eq!(config.model.value, "llama3.1:70b");
    assert_eq!(config.timeout_secs.value, 120);
    // File value survives where the environment is silent
    assert_eq!(config.max_prompt_layers.value, 20);
    assert_eq!(config.max_prompt_layers.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();

    env::set_var("GEOGENIE_PROVIDER", "gemini");
    env::set_var("GEOGENIE_TEMPERATURE", "hot");
    env::set_var("GEOGENIE_MAX_PROMPT_LAYERS", "0");
    env::set_var("GEOGENIE_TIMEOUT_SECS", "0");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.provider.value, Provider::OpenAi);
    assert_eq!(config.provider.source, ConfigSource::Default);
    assert_eq!(config.temperature.source, ConfigSource::Default);
    assert_eq!(config.max_prompt_layers.value, 50);
    assert_eq!(config.timeout_secs.value, 60);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();

    let file = config_file(r#"provider = "anthropic""#);
    env::set_var("GEOGENIE_PROVIDER", "ollama");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    assert_eq!(config.provider.value, Provider::Ollama);

    config.update_from_cli(CliConfigOverrides {
        provider: Some(Provider::OpenAi),
        ..Default::default()
    });
    assert_eq!(config.provider.value, Provider::OpenAi);
    assert_eq!(config.provider.source, ConfigSource::Cli);

    clear_env();
}

#[test]
#[serial]
fn test_session_config_reflects_layers() {
    clear_env();
    env::set_var("GEOGENIE_BASE_URL", "http://proxy.local/v1");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    config.update_from_cli(CliConfigOverrides {
        require_confirmation: Some(false),
        ..Default::default()
    });

    let session = config.session_config(Some("sk-test".to_string()));
    assert_eq!(session.provider, Provider::OpenAi);
    assert_eq!(session.model, "gpt-4o-mini");
    assert_eq!(session.base_url, "http://proxy.local/v1");
    assert_eq!(session.timeout, Duration::from_secs(60));
    assert_eq!(session.api_key.as_deref(), Some("sk-test"));
    assert!(!session.require_confirmation);

    clear_env();
}

#[test]
fn test_configuration_source_tracking() {
    let file = config_file("max_tokens = 500");
    let mut config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
    config.update_from_cli(CliConfigOverrides {
        model: Some("gpt-4.1".to_string()),
        ..Default::default()
    });

    let map = config.to_inspection_map();
    assert_eq!(map["max_tokens"], ("500".to_string(), ConfigSource::File));
    assert_eq!(map["model"], ("gpt-4.1".to_string(), ConfigSource::Cli));
    assert_eq!(map["temperature"].1, ConfigSource::Default);
}

#[test]
fn test_parse_provider_variations() {
    assert_eq!(parse_provider("openai").unwrap(), Provider::OpenAi);
    assert_eq!(parse_provider("OpenAI").unwrap(), Provider::OpenAi);
    assert_eq!(parse_provider("anthropic").unwrap(), Provider::Anthropic);
    assert_eq!(parse_provider(" ollama ").unwrap(), Provider::Ollama);
    assert!(parse_provider("").is_err());
    assert!(parse_provider("bard").is_err());
}

#[test]
fn test_invalid_toml_file() {
    let file = config_file("provider = [unterminated");
    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(result.is_err());
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let result = LayeredConfig::with_defaults().load_from_file(dir.path().join("nope.toml"));
    assert!(result.is_err());
}
