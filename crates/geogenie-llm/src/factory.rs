use std::sync::Arc;

use geogenie_core::models::Provider;

use crate::anthropic::AnthropicBackend;
use crate::ollama::OllamaBackend;
use crate::openai::OpenAiBackend;
use crate::ports::LlmBackend;

/// Create the adapter for `provider`
pub fn build_backend(provider: Provider) -> Arc<dyn LlmBackend> {
    match provider {
        Provider::OpenAi => Arc::new(OpenAiBackend::new()),
        Provider::Anthropic => Arc::new(AnthropicBackend::new()),
        Provider::Ollama => Arc::new(OllamaBackend::new()),
    }
}
