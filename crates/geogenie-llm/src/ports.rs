//! LLM port definitions

use async_trait::async_trait;
use geogenie_core::config::SessionConfig;
use geogenie_core::error::TransportError;
use geogenie_core::models::Prompt;

/// Port for a chat-style language model
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send a prompt and return the raw response text
    ///
    /// Makes exactly one request; retrying is left to the user.
    async fn send(&self, prompt: &Prompt, session: &SessionConfig) -> Result<String, TransportError>;

    /// Provider name used in diagnostics
    fn name(&self) -> &str;
}
