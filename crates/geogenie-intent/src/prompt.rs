//! Prompt construction
//!
//! The prompt is a pure function of the request text, the catalog and the
//! session: no clock, no randomness, no network.

use geogenie_core::config::SessionConfig;
use geogenie_core::models::{LayerCatalog, LayerDescriptor, OpName, Prompt};
use geogenie_core::registry::AlgorithmRegistry;
use std::fmt::Write;

const PREAMBLE: &str = "You are GeoGenie, an assistant that turns natural-language GIS requests into exactly one \
geoprocessing operation. Choose the operation that matches the request and fill in its parameters using only \
the layers listed below.";

/// Builds the prompt sent to the language model
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(user_text: &str, catalog: &LayerCatalog, session: &SessionConfig) -> Prompt {
        let mut system = String::new();
        system.push_str(PREAMBLE);
        system.push_str("\n\n");

        Self::write_layers(&mut system, catalog, session.max_prompt_layers);
        system.push('\n');
        Self::write_schema(&mut system);
        system.push('\n');
        Self::write_grammar(&mut system);

        let prompt = Prompt { system, user: user_text.to_string() };
        tracing::debug!(
            "Built prompt: {} bytes, {} of {} layers listed",
            prompt.len(),
            catalog.len().min(session.max_prompt_layers),
            catalog.len()
        );
        prompt
    }

    fn write_layers(out: &mut String, catalog: &LayerCatalog, limit: usize) {
        out.push_str("AVAILABLE LAYERS:\n");
        if catalog.is_empty() {
            out.push_str("(no layers are loaded)\n");
            return;
        }

        for layer in catalog.layers().iter().take(limit) {
            out.push_str(&Self::layer_line(layer));
            out.push('\n');
        }

        let omitted = catalog.len().saturating_sub(limit);
        if omitted > 0 {
            let _ = writeln!(out, "... {} more layers omitted", omitted);
        }
    }

    fn layer_line(layer: &LayerDescriptor) -> String {
        let crs = layer.crs.as_ref().map(|c| c.to_string()).unwrap_or_else(|| "undefined".to_string());
        let fields = if layer.fields.is_empty() {
            "none".to_string()
        } else {
            layer.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
        };

        format!(
            "- id: {} | name: {} | geometry: {} | crs: {} | features: {} | fields: {}",
            serde_json::Value::String(layer.id.to_string()),
            serde_json::Value::String(layer.name.clone()),
            layer.geometry_kind,
            crs,
            layer.feature_count,
            fields
        )
    }

    fn write_schema(out: &mut String) {
        out.push_str("OPERATIONS (JSON schema of each operation and its parameters):\n");
        let schema = serde_json::to_string_pretty(AlgorithmRegistry::all()).unwrap_or_default();
        out.push_str(&schema);
        out.push('\n');
    }

    fn write_grammar(out: &mut String) {
        let names: Vec<&str> = OpName::ALL.iter().map(OpName::as_str).collect();

        out.push_str("RESPONSE FORMAT:\n");
        out.push_str("Reply with a single JSON object and no other text:\n");
        out.push_str("{\"operation\": \"<operation>\", \"parameters\": {\"<name>\": <value>}, \"notes\": [\"<note>\"]}\n");
        out.push_str("Rules:\n");
        let _ = writeln!(out, "- \"operation\" is one of: {}.", names.join(", "));
        out.push_str("- \"parameters\" uses only the parameter names of that operation.\n");
        out.push_str("- Layer parameters are layer ids from AVAILABLE LAYERS.\n");
        out.push_str("- Distances are a number in meters or a string with a unit, e.g. \"0.5 km\".\n");
        out.push_str("- Leave out optional parameters the request does not mention.\n");
        out.push_str("- \"notes\" lists any assumption you made; use [] when there are none.\n");
        out.push_str(
            "- If no single operation fits, reply {\"operation\": null, \"parameters\": {}, \"notes\": [\"<reason>\"]}.\n",
        );
    }
}
