//! Model round trip and strict response decoding

use geogenie_core::config::SessionConfig;
use geogenie_core::error::{ResolutionError, Result};
use geogenie_core::models::{OpName, OperationRequest, Prompt};
use geogenie_core::registry::AlgorithmRegistry;
use geogenie_llm::LlmBackend;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Wire shape of a model answer
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResponse {
    operation: Value,
    parameters: Map<String, Value>,
    #[serde(default)]
    notes: Vec<String>,
}

/// Turns a prompt into an [`OperationRequest`] through the language model
#[derive(Clone)]
pub struct IntentResolver {
    backend: Arc<dyn LlmBackend>,
}

impl IntentResolver {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// One model round trip, then strict decoding of the answer
    pub async fn resolve(&self, prompt: &Prompt, session: &SessionConfig) -> Result<OperationRequest> {
        tracing::info!("Resolving request with {} ({})", self.backend.name(), session.model);
        let text = self.backend.send(prompt, session).await?;
        tracing::debug!("Model answered with {} bytes", text.len());

        let request = Self::parse_response(&text)?;
        tracing::info!("Model chose '{}' with {} parameters", request.op, request.parameters.len());
        Ok(request)
    }

    /// Decode raw model output
    pub fn parse_response(text: &str) -> std::result::Result<OperationRequest, ResolutionError> {
        let body = strip_code_fence(text);

        let value: Value = serde_json::from_str(body)
            .map_err(|e| ResolutionError::malformed(format!("response is not valid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(ResolutionError::malformed("response must be a JSON object"));
        }

        let raw: RawResponse = serde_json::from_value(value).map_err(|e| ResolutionError::malformed(e.to_string()))?;

        let op = match &raw.operation {
            Value::String(name) => AlgorithmRegistry::lookup(name)
                .map(|spec| spec.op)
                .map_err(|e| ResolutionError::unsupported(e.name, format!("supported operations are {}", supported())))?,
            Value::Null => {
                let detail = if raw.notes.is_empty() {
                    "the model found no matching operation".to_string()
                } else {
                    raw.notes.join("; ")
                };
                return Err(ResolutionError::unsupported("none", detail));
            }
            Value::Array(items) => {
                let names: Vec<String> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                    .collect();
                return Err(ResolutionError::unsupported(
                    names.join(", "),
                    "a request must map to exactly one operation",
                ));
            }
            other => {
                return Err(ResolutionError::malformed(format!("'operation' must be a string, got {}", other)));
            }
        };

        let parameters = canonicalize(op, raw.parameters)?;
        Ok(OperationRequest { op, parameters, notes: raw.notes })
    }
}

/// Rewrite parameter aliases to their schema names
fn canonicalize(op: OpName, raw: Map<String, Value>) -> std::result::Result<BTreeMap<String, Value>, ResolutionError> {
    let spec = AlgorithmRegistry::spec(op);
    let mut parameters = BTreeMap::new();
    let mut given_as: BTreeMap<&'static str, String> = BTreeMap::new();

    for (name, value) in raw {
        let canonical = spec
            .canonical_param_name(&name)
            .ok_or_else(|| ResolutionError::malformed(format!("unknown parameter '{}' for {}", name, op)))?;

        if let Some(previous) = given_as.insert(canonical, name.clone()) {
            return Err(ResolutionError::malformed(format!(
                "'{}' and '{}' both set parameter '{}'",
                previous, name, canonical
            )));
        }
        parameters.insert(canonical.to_string(), value);
    }

    Ok(parameters)
}

/// Remove one surrounding markdown code fence, if present
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with('{') => body.trim(),
        _ => inner.trim(),
    }
}

fn supported() -> String {
    OpName::ALL.iter().map(OpName::as_str).collect::<Vec<_>>().join(", ")
}
