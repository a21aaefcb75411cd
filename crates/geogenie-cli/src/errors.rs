use console::style;
use geogenie_core::error::{GeogenieError, ResolutionError, TransportError, ValidationErrorKind};
use geogenie_core::models::Provider;
use std::fmt;
use std::path::Path;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a layer file that does not exist
pub fn layer_file_not_found(path: &Path) -> CliError {
    CliError::new("Layer file not found")
        .with_context(format!("The specified GeoJSON file does not exist.\n\nPath: {}", path.display()))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Use absolute path or path relative to current directory")
        .with_help("Run: geogenie run --help")
}

/// Create error for a run without any layers
pub fn no_layers() -> CliError {
    CliError::new("No layers loaded")
        .with_context("Every operation works on loaded layers, and none were given.")
        .with_suggestion("Load a layer: geogenie run \"...\" --layer parcels.geojson")
        .with_suggestion("Check what the model would see: geogenie layers --layer parcels.geojson")
        .with_help("Run: geogenie run --help")
}

/// Create error for a provider without an API key
pub fn missing_api_key(provider: Provider) -> CliError {
    let mut error = CliError::new(format!("No API key for {}", provider))
        .with_context(format!("The {} provider needs an API key and none is stored.", provider))
        .with_suggestion(format!("Store one: geogenie key set {}", provider));

    if let Some(var) = provider.api_key_env() {
        error = error.with_suggestion(format!("Or export {}", var));
    }

    error
        .with_suggestion("Or use a local model: --provider ollama")
        .with_help("Run: geogenie key status")
}

/// Create error for an execution that did not produce a layer
pub fn execution_failed(diagnostics: &[String]) -> CliError {
    CliError::new("Operation failed")
        .with_context(format!("The operation ran but did not produce a layer.\n\n{}", diagnostics.join("\n")))
        .with_suggestion("Check the input layers for invalid geometries")
        .with_suggestion("Or adjust the parameters and run again")
}

fn from_geogenie(error: &GeogenieError) -> Option<CliError> {
    let cli_error = match error {
        GeogenieError::Validation(e) => {
            let mut cli_error = CliError::new(format!("Invalid {}", e.param))
                .with_context(format!("The model's request was rejected.\n\n{}", e));
            cli_error = match e.kind {
                ValidationErrorKind::UnknownLayer => cli_error
                    .with_suggestion("List the loaded layers: geogenie layers --layer ...")
                    .with_suggestion("Refer to a layer by its exact name"),
                ValidationErrorKind::UnknownField => {
                    cli_error.with_suggestion("Name a field the layer actually has (see geogenie layers)")
                }
                ValidationErrorKind::MissingCrs => {
                    cli_error.with_suggestion("Add a \"crs\" member to the GeoJSON file")
                }
                _ => cli_error.with_suggestion("Rephrase the request with explicit values and units"),
            };
            cli_error
        }
        GeogenieError::Resolution(ResolutionError::UnsupportedOperation { operation, detail }) => {
            CliError::new("Request not supported")
                .with_context(format!("Operation: {}\n\n{}", operation, detail))
                .with_suggestion("Ask for one of: buffer, clip, reproject, dissolve, intersection")
                .with_suggestion("Split multi-step requests into separate runs")
        }
        GeogenieError::Resolution(e @ ResolutionError::MalformedResponse { .. }) => {
            CliError::new("The model answered in an unexpected format")
                .with_context(e.to_string())
                .with_suggestion("Try again, or pick a stronger model with --model")
        }
        GeogenieError::Transport(TransportError::AuthError { provider, detail }) => {
            CliError::new(format!("Authentication with {} failed", provider))
                .with_context(detail.clone())
                .with_suggestion(format!("Store a valid key: geogenie key set {}", provider))
                .with_help("Run: geogenie key status")
        }
        GeogenieError::Transport(TransportError::NetworkError { provider, detail }) => {
            CliError::new(format!("Cannot reach {}", provider))
                .with_context(detail.clone())
                .with_suggestion("Check your network connection")
                .with_suggestion("For ollama, make sure the server is running: ollama serve")
        }
        GeogenieError::ConfigInvalid { key, reason } => {
            CliError::new(format!("Invalid configuration: {}", key))
                .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
                .with_suggestion("Check ~/.geogenie/config.toml for syntax errors")
                .with_help("Run: geogenie config")
        }
        _ => return None,
    };
    Some(cli_error)
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli_error) => return cli_error,
        Err(error) => error,
    };

    if let Some(cli_error) = error.chain().find_map(|e| e.downcast_ref::<GeogenieError>()).and_then(from_geogenie) {
        return cli_error;
    }

    let message = error.to_string();
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {:#}", error))
            .with_suggestion("Check the file path and try again")
    } else if message.contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {:#}", error))
            .with_suggestion("Check file permissions")
    } else {
        CliError::new(format!("{:#}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogenie_core::error::ValidationError;

    #[test]
    fn test_cli_error_passes_through() {
        let error = from_anyhow(anyhow::Error::new(no_layers()));
        assert_eq!(error.message, "No layers loaded");
        assert_eq!(error.suggestions.len(), 2);
    }

    #[test]
    fn test_unknown_layer_suggests_listing() {
        let validation = ValidationError::new(ValidationErrorKind::UnknownLayer, "input", "no loaded layer has this id or name")
            .with_received("hospitals");
        let error = from_anyhow(anyhow::Error::new(GeogenieError::from(validation)));

        assert_eq!(error.message, "Invalid input");
        assert!(error.context.unwrap().contains("hospitals"));
        assert!(error.suggestions[0].contains("geogenie layers"));
    }

    #[test]
    fn test_auth_error_points_at_key_command() {
        let transport = TransportError::AuthError { provider: "openai".to_string(), detail: "401".to_string() };
        let error = from_anyhow(anyhow::Error::new(GeogenieError::from(transport)).context("Request failed"));
        assert!(error.suggestions[0].contains("geogenie key set openai"));
    }

    #[test]
    fn test_missing_key_mentions_env_var() {
        let error = missing_api_key(Provider::Anthropic);
        assert!(error.suggestions.iter().any(|s| s.contains("ANTHROPIC_API_KEY")));
    }
}
