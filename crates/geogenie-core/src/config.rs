use crate::error::{GeogenieError, Result};
use crate::models::Provider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for GeoGenie
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub provider: ConfigValue<Provider>,
    pub model: ConfigValue<String>,
    pub base_url: ConfigValue<Option<String>>,
    pub timeout_secs: ConfigValue<u64>,
    pub max_tokens: ConfigValue<u32>,
    pub temperature: ConfigValue<f32>,
    pub max_prompt_layers: ConfigValue<usize>,
    pub require_confirmation: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            provider: ConfigValue::new(Provider::OpenAi, ConfigSource::Default),
            model: ConfigValue::new(Provider::OpenAi.default_model().to_string(), ConfigSource::Default),
            base_url: ConfigValue::new(None, ConfigSource::Default),
            timeout_secs: ConfigValue::new(60, ConfigSource::Default),
            max_tokens: ConfigValue::new(1000, ConfigSource::Default),
            temperature: ConfigValue::new(0.1, ConfigSource::Default),
            max_prompt_layers: ConfigValue::new(50, ConfigSource::Default),
            require_confirmation: ConfigValue::new(true, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeogenieError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeogenieError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(provider) = file_config.provider {
            self.provider.update(parse_provider(&provider)?, ConfigSource::File);
        }

        if let Some(model) = file_config.model {
            self.model.update(model, ConfigSource::File);
        }

        if let Some(base_url) = file_config.base_url {
            self.base_url.update(Some(base_url), ConfigSource::File);
        }

        if let Some(timeout_secs) = file_config.timeout_secs {
            self.timeout_secs.update(check_timeout(timeout_secs)?, ConfigSource::File);
        }

        if let Some(max_tokens) = file_config.max_tokens {
            self.max_tokens.update(max_tokens, ConfigSource::File);
        }

        if let Some(temperature) = file_config.temperature {
            self.temperature.update(check_temperature(temperature)?, ConfigSource::File);
        }

        if let Some(max_prompt_layers) = file_config.max_prompt_layers {
            self.max_prompt_layers
                .update(check_max_prompt_layers(max_prompt_layers)?, ConfigSource::File);
        }

        if let Some(require_confirmation) = file_config.require_confirmation {
            self.require_confirmation.update(require_confirmation, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOGENIE_PROVIDER
        if let Ok(provider_str) = env::var("GEOGENIE_PROVIDER") {
            match parse_provider(&provider_str) {
                Ok(provider) => self.provider.update(provider, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOGENIE_PROVIDER value '{}': expected openai, anthropic, or ollama",
                    provider_str
                ),
            }
        }

        // GEOGENIE_MODEL
        if let Ok(model) = env::var("GEOGENIE_MODEL") {
            if model.trim().is_empty() {
                tracing::warn!("Ignoring empty GEOGENIE_MODEL");
            } else {
                self.model.update(model, ConfigSource::Environment);
            }
        }

        // GEOGENIE_BASE_URL
        if let Ok(base_url) = env::var("GEOGENIE_BASE_URL") {
            self.base_url.update(Some(base_url), ConfigSource::Environment);
        }

        // GEOGENIE_TIMEOUT_SECS
        if let Ok(timeout_str) = env::var("GEOGENIE_TIMEOUT_SECS") {
            match timeout_str.parse::<u64>().ok().and_then(|t| check_timeout(t).ok()) {
                Some(timeout) => self.timeout_secs.update(timeout, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid GEOGENIE_TIMEOUT_SECS value '{}': expected a positive number of seconds",
                    timeout_str
                ),
            }
        }

        // GEOGENIE_MAX_TOKENS
        if let Ok(tokens_str) = env::var("GEOGENIE_MAX_TOKENS") {
            match tokens_str.parse::<u32>() {
                Ok(tokens) => self.max_tokens.update(tokens, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOGENIE_MAX_TOKENS value '{}': expected integer",
                    tokens_str
                ),
            }
        }

        // GEOGENIE_TEMPERATURE
        if let Ok(temperature_str) = env::var("GEOGENIE_TEMPERATURE") {
            match temperature_str.parse::<f32>().ok().and_then(|t| check_temperature(t).ok()) {
                Some(temperature) => self.temperature.update(temperature, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid GEOGENIE_TEMPERATURE value '{}': expected a number between 0 and 2",
                    temperature_str
                ),
            }
        }

        // GEOGENIE_MAX_PROMPT_LAYERS
        if let Ok(layers_str) = env::var("GEOGENIE_MAX_PROMPT_LAYERS") {
            match layers_str.parse::<usize>().ok().and_then(|n| check_max_prompt_layers(n).ok()) {
                Some(layers) => self.max_prompt_layers.update(layers, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid GEOGENIE_MAX_PROMPT_LAYERS value '{}': expected integer >= 1",
                    layers_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(provider) = overrides.provider {
            self.provider.update(provider, ConfigSource::Cli);
        }

        if let Some(model) = overrides.model {
            self.model.update(model, ConfigSource::Cli);
        }

        if let Some(base_url) = overrides.base_url {
            self.base_url.update(Some(base_url), ConfigSource::Cli);
        }

        if let Some(require_confirmation) = overrides.require_confirmation {
            self.require_confirmation.update(require_confirmation, ConfigSource::Cli);
        }
    }

    /// Model to use; the provider's own default when none was configured
    pub fn effective_model(&self) -> String {
        if self.model.source == ConfigSource::Default {
            self.provider.value.default_model().to_string()
        } else {
            self.model.value.clone()
        }
    }

    pub fn effective_base_url(&self) -> String {
        self.base_url
            .value
            .clone()
            .unwrap_or_else(|| self.provider.value.default_base_url().to_string())
    }

    /// Build the per-request session settings
    pub fn session_config(&self, api_key: Option<String>) -> SessionConfig {
        SessionConfig {
            provider: self.provider.value,
            model: self.effective_model(),
            api_key,
            base_url: self.effective_base_url(),
            timeout: Duration::from_secs(self.timeout_secs.value),
            max_tokens: self.max_tokens.value,
            temperature: self.temperature.value,
            max_prompt_layers: self.max_prompt_layers.value,
            require_confirmation: self.require_confirmation.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "provider".to_string(),
            (self.provider.value.to_string(), self.provider.source),
        );

        map.insert("model".to_string(), (self.effective_model(), self.model.source));

        map.insert("base_url".to_string(), (self.effective_base_url(), self.base_url.source));

        map.insert(
            "timeout_secs".to_string(),
            (self.timeout_secs.value.to_string(), self.timeout_secs.source),
        );

        map.insert(
            "max_tokens".to_string(),
            (self.max_tokens.value.to_string(), self.max_tokens.source),
        );

        map.insert(
            "temperature".to_string(),
            (self.temperature.value.to_string(), self.temperature.source),
        );

        map.insert(
            "max_prompt_layers".to_string(),
            (self.max_prompt_layers.value.to_string(), self.max_prompt_layers.source),
        );

        map.insert(
            "require_confirmation".to_string(),
            (self.require_confirmation.value.to_string(), self.require_confirmation.source),
        );

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    provider: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    max_prompt_layers: Option<usize>,
    require_confirmation: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub require_confirmation: Option<bool>,
}

/// Settings passed explicitly to every prompt and model call
#[derive(Clone, PartialEq)]
pub struct SessionConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_prompt_layers: usize,
    pub require_confirmation: bool,
}

impl SessionConfig {
    /// Session with default limits for `provider`
    pub fn for_provider(provider: Provider) -> Self {
        let mut config = LayeredConfig::with_defaults();
        config.provider.update(provider, ConfigSource::Cli);
        config.session_config(None)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        LayeredConfig::with_defaults().session_config(None)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("max_prompt_layers", &self.max_prompt_layers)
            .field("require_confirmation", &self.require_confirmation)
            .finish()
    }
}

/// Parse provider from string
pub fn parse_provider(s: &str) -> Result<Provider> {
    Provider::parse(s).ok_or_else(|| GeogenieError::ConfigInvalid {
        key: "provider".to_string(),
        reason: format!("Invalid provider: {}. Use openai, anthropic, or ollama", s),
    })
}

fn check_timeout(secs: u64) -> Result<u64> {
    if secs == 0 {
        return Err(GeogenieError::ConfigInvalid {
            key: "timeout_secs".to_string(),
            reason: "Timeout must be at least 1 second".to_string(),
        });
    }
    Ok(secs)
}

fn check_temperature(temperature: f32) -> Result<f32> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(GeogenieError::ConfigInvalid {
            key: "temperature".to_string(),
            reason: format!("Temperature {} is outside 0..=2", temperature),
        });
    }
    Ok(temperature)
}

fn check_max_prompt_layers(layers: usize) -> Result<usize> {
    if layers == 0 {
        return Err(GeogenieError::ConfigInvalid {
            key: "max_prompt_layers".to_string(),
            reason: "At least one layer must be listed in the prompt".to_string(),
        });
    }
    Ok(layers)
}
