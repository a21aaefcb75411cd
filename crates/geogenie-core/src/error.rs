//! Error types for GeoGenie
//!
//! Each failure family of the request pipeline has its own type so callers can
//! tell a bad model answer from a bad request, a broken backend or a network
//! problem. [`GeogenieError`] wraps all of them.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The model answer could not be turned into an operation request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Malformed model response: {detail}")]
    MalformedResponse { detail: String },

    #[error("Unsupported operation '{operation}': {detail}")]
    UnsupportedOperation { operation: String, detail: String },
}

impl ResolutionError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse { detail: detail.into() }
    }

    pub fn unsupported(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnsupportedOperation { operation: operation.into(), detail: detail.into() }
    }
}

/// Why a parameter was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    MissingParameter,
    UnknownParameter,
    UnknownLayer,
    UnknownField,
    TypeMismatch,
    OutOfRange,
    InvalidEnumValue,
    MissingCrs,
    ConflictingLayers,
    IncompatibleGeometry,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingParameter => "Missing parameter",
            ValidationErrorKind::UnknownParameter => "Unknown parameter",
            ValidationErrorKind::UnknownLayer => "Unknown layer",
            ValidationErrorKind::UnknownField => "Unknown field",
            ValidationErrorKind::TypeMismatch => "Type mismatch",
            ValidationErrorKind::OutOfRange => "Value out of range",
            ValidationErrorKind::InvalidEnumValue => "Invalid option",
            ValidationErrorKind::MissingCrs => "Undefined CRS",
            ValidationErrorKind::ConflictingLayers => "Conflicting layers",
            ValidationErrorKind::IncompatibleGeometry => "Incompatible geometry",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request parameter failed validation
///
/// Carries the parameter name, the value the model (or user) supplied and the
/// constraint it broke, so the UI can explain the rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} for '{param}'{}: {detail}", received_suffix(.received))]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub param: String,
    pub received: Option<String>,
    pub detail: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, param: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { kind, param: param.into(), received: None, detail: detail.into() }
    }

    /// Attach the offending value
    pub fn with_received(mut self, received: impl fmt::Display) -> Self {
        self.received = Some(received.to_string());
        self
    }
}

fn received_suffix(received: &Option<String>) -> String {
    match received {
        Some(value) => format!(" (got {})", value),
        None => String::new(),
    }
}

/// Failure while running an approved operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Algorithm failed: {detail}")]
    AlgorithmError { detail: String },

    #[error("Execution cancelled")]
    Cancelled,
}

impl ExecutionError {
    pub fn algorithm(detail: impl Into<String>) -> Self {
        Self::AlgorithmError { detail: detail.into() }
    }
}

/// Failure talking to the language-model service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Network error talking to {provider}: {detail}")]
    NetworkError { provider: String, detail: String },

    #[error("Authentication failed for {provider}: {detail}")]
    AuthError { provider: String, detail: String },
}

/// Registry lookup for a name outside the supported operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown operation: {name}")]
pub struct UnknownOperation {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum GeogenieError {
    // Pipeline errors
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    UnknownOperation(#[from] UnknownOperation),

    // Session errors
    #[error("A request is already in flight for this session")]
    Busy,

    // Layer errors
    #[error("Layer not found: {id}")]
    LayerNotFound { id: String },

    #[error("Invalid {format} data: {reason}")]
    FormatValidation { format: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Credential store at {path} is unusable: {reason}")]
    CredentialStore { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeogenieError {
    /// Transport failures are the only ones a human "try again" can fix
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeogenieError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, GeogenieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_includes_received_value() {
        let err = ValidationError::new(
            ValidationErrorKind::OutOfRange,
            "distance",
            "expected a value in (0, 1000000] m",
        )
        .with_received("-5");

        let message = err.to_string();
        assert!(message.contains("distance"));
        assert!(message.contains("got -5"));
        assert!(message.contains("(0, 1000000] m"));
    }

    #[test]
    fn test_validation_error_display_without_received_value() {
        let err = ValidationError::new(
            ValidationErrorKind::MissingParameter,
            "input",
            "required parameter was not provided",
        );
        assert_eq!(
            err.to_string(),
            "Missing parameter for 'input': required parameter was not provided"
        );
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        let transport: GeogenieError = TransportError::NetworkError {
            provider: "openai".to_string(),
            detail: "timeout".to_string(),
        }
        .into();
        assert!(transport.is_retryable());

        let resolution: GeogenieError = ResolutionError::malformed("not json").into();
        assert!(!resolution.is_retryable());

        let execution: GeogenieError = ExecutionError::Cancelled.into();
        assert!(!execution.is_retryable());
    }
}
