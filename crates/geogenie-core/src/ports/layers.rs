use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CrsCode, LayerCatalog, LayerDescriptor};

/// Port for reading the currently loaded layers
#[async_trait]
pub trait LayerSource: Send + Sync {
    /// Describe every loaded layer as it is right now
    async fn snapshot(&self) -> Result<Vec<LayerDescriptor>>;

    /// Whether the host can build the coordinate reference system `crs`
    fn is_known_crs(&self, crs: &CrsCode) -> bool {
        let _ = crs;
        true
    }

    /// Fresh catalog built from a new snapshot
    async fn catalog(&self) -> Result<LayerCatalog> {
        Ok(LayerCatalog::new(self.snapshot().await?))
    }
}
