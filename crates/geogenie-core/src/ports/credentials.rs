use crate::error::Result;
use crate::models::Provider;

/// Port for API key storage
///
/// Implementations are internally synchronized and outlive individual requests.
pub trait CredentialStore: Send + Sync {
    /// Stored key for `provider`, if any
    fn get(&self, provider: Provider) -> Result<Option<String>>;

    /// Store or replace the key for `provider`
    fn set(&self, provider: Provider, api_key: &str) -> Result<()>;
}
