//! API key storage
//!
//! Keys are stored per provider. The file store keeps them in a small TOML
//! document readable only by the owner; encryption is left to the platform.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::error::{GeogenieError, Result};
use crate::models::Provider;
use crate::ports::CredentialStore;

/// Credential store that lives for the process only
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    keys: RwLock<HashMap<Provider, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, provider: Provider) -> Result<Option<String>> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        Ok(keys.get(&provider).cloned())
    }

    fn set(&self, provider: Provider, api_key: &str) -> Result<()> {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        keys.insert(provider, api_key.trim().to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    keys: BTreeMap<String, String>,
}

/// Credential store backed by a TOML file
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<CredentialFile> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| GeogenieError::CredentialStore {
            path: self.path.clone(),
            reason: format!("Failed to parse TOML: {}", e),
        })
    }

    fn write(&self, file: &CredentialFile) -> Result<()> {
        let content = toml::to_string_pretty(file)
            .map_err(|e| GeogenieError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut handle = options.open(&self.path)?;
        handle.write_all(content.as_bytes())?;

        // mode() only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, provider: Provider) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.keys.get(provider.as_str()).cloned())
    }

    fn set(&self, provider: Provider, api_key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.read()?;
        file.keys.insert(provider.as_str().to_string(), api_key.trim().to_string());
        self.write(&file)?;
        tracing::info!("Stored API key for {} in {}", provider, self.path.display());
        Ok(())
    }
}

/// API key for `provider`: the stored key, else the provider's environment variable
pub fn resolve_api_key(store: &dyn CredentialStore, provider: Provider) -> Result<Option<String>> {
    if let Some(key) = store.get(provider)?.filter(|k| !k.is_empty()) {
        return Ok(Some(key));
    }

    Ok(provider
        .api_key_env()
        .and_then(|var| std::env::var(var).ok())
        .filter(|k| !k.trim().is_empty()))
}
