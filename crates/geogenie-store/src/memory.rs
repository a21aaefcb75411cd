//! In-memory layer store
//!
//! Layers keep their insertion order so catalog snapshots (and the prompts
//! built from them) are stable. Algorithm outputs are parked under a handle
//! until they are registered with `add_memory_layer` or dropped.

use async_trait::async_trait;
use geogenie_core::error::{ExecutionError, GeogenieError, Result};
use geogenie_core::models::{CrsCode, LayerDescriptor, LayerId};
use geogenie_core::ports::{AlgorithmCall, CancelFlag, ExecutionBackend, LayerSource, OutputSource, ProgressReporter};
use geogenie_geo::geojson_io;
use geogenie_geo::ops::{self, BufferOptions, EndCapStyle, JoinStyle};
use geogenie_geo::transform::{self, crs_match};
use geogenie_geo::FeatureLayer;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct StoreState {
    layers: Vec<(LayerId, FeatureLayer)>,
    outputs: HashMap<String, FeatureLayer>,
}

/// Shared, cloneable in-memory layer registry
#[derive(Debug, Clone, Default)]
pub struct MemoryLayerStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer under a fresh id
    pub fn add_layer(&self, layer: FeatureLayer) -> LayerId {
        let id = LayerId::new(uuid::Uuid::new_v4().to_string());
        self.insert_layer(id.clone(), layer);
        id
    }

    /// Register a layer under a caller-chosen id, replacing any layer with that id
    pub fn insert_layer(&self, id: LayerId, layer: FeatureLayer) {
        tracing::debug!("Registering layer '{}' as {} ({} features)", layer.name, id, layer.len());
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.layers.retain(|(existing, _)| *existing != id);
        state.layers.push((id, layer));
    }

    /// Load a GeoJSON file as a new layer
    pub fn load_geojson(&self, path: &Path) -> Result<LayerId> {
        let layer = geojson_io::read_layer(path)?;
        Ok(self.add_layer(layer))
    }

    pub fn get_layer(&self, id: &LayerId) -> Option<FeatureLayer> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.layers.iter().find(|(existing, _)| existing == id).map(|(_, layer)| layer.clone())
    }

    pub fn layer_count(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).layers.len()
    }

    /// Number of outputs produced but neither registered nor discarded
    pub fn pending_outputs(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).outputs.len()
    }

    fn layer_for(&self, call: &AlgorithmCall, key: &str) -> std::result::Result<FeatureLayer, ExecutionError> {
        let id = call.require_layer(key)?;
        self.get_layer(id)
            .ok_or_else(|| ExecutionError::algorithm(format!("layer {} is no longer loaded", id)))
    }

    fn describe(id: &LayerId, layer: &FeatureLayer) -> LayerDescriptor {
        LayerDescriptor {
            id: id.clone(),
            name: layer.name.clone(),
            geometry_kind: layer.geometry_kind(),
            crs: layer.crs.clone(),
            fields: layer.fields(),
            feature_count: layer.len(),
        }
    }
}

#[async_trait]
impl LayerSource for MemoryLayerStore {
    async fn snapshot(&self) -> Result<Vec<LayerDescriptor>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.layers.iter().map(|(id, layer)| Self::describe(id, layer)).collect())
    }

    fn is_known_crs(&self, crs: &CrsCode) -> bool {
        transform::is_known_crs(crs)
    }
}

/// Inputs of one algorithm run, owned so the run can move to a blocking thread
enum Job {
    Buffer { input: FeatureLayer, options: BufferOptions },
    Clip { input: FeatureLayer, overlay: FeatureLayer },
    Intersect { input: FeatureLayer, overlay: FeatureLayer },
    Reproject { input: FeatureLayer, target: CrsCode },
    Dissolve { input: FeatureLayer, field: Option<String> },
}

impl Job {
    fn run(self, name: String, step: ops::Step<'_>) -> std::result::Result<FeatureLayer, ExecutionError> {
        let (crs, features) = match self {
            Job::Buffer { input, options } => (input.crs.clone(), ops::buffer(&input, &options, step)?),
            Job::Clip { input, overlay } => (input.crs.clone(), ops::clip(&input, &overlay, step)?),
            Job::Intersect { input, overlay } => (input.crs.clone(), ops::intersect(&input, &overlay, step)?),
            Job::Reproject { input, target } => {
                let features = ops::reproject(&input, &target, step)?;
                (Some(target), features)
            }
            Job::Dissolve { input, field } => (input.crs.clone(), ops::dissolve(&input, field.as_deref(), step)?),
        };
        Ok(FeatureLayer::new(name, crs, features))
    }
}

impl MemoryLayerStore {
    fn prepare(&self, call: &AlgorithmCall) -> std::result::Result<Job, ExecutionError> {
        let input = self.layer_for(call, "INPUT")?;

        match call.algorithm_id {
            "native:buffer" => {
                let distance = call
                    .number("DISTANCE")
                    .ok_or_else(|| ExecutionError::algorithm("native:buffer requires DISTANCE"))?;
                let mut options = BufferOptions::new(distance);
                if let Some(segments) = call.number("SEGMENTS") {
                    options.segments = segments as u32;
                }
                if let Some(cap) = call.choice("END_CAP_STYLE").and_then(EndCapStyle::parse) {
                    options.end_cap = cap;
                }
                if let Some(join) = call.choice("JOIN_STYLE").and_then(JoinStyle::parse) {
                    options.join = join;
                }
                if let Some(limit) = call.number("MITER_LIMIT") {
                    options.miter_limit = limit;
                }
                Ok(Job::Buffer { input, options })
            }
            "native:clip" | "native:intersection" => {
                let overlay = align_overlay(&input, self.layer_for(call, "OVERLAY")?)?;
                if call.algorithm_id == "native:clip" {
                    Ok(Job::Clip { input, overlay })
                } else {
                    Ok(Job::Intersect { input, overlay })
                }
            }
            "native:reprojectlayer" => {
                let target = call
                    .crs("TARGET_CRS")
                    .cloned()
                    .ok_or_else(|| ExecutionError::algorithm("native:reprojectlayer requires TARGET_CRS"))?;
                Ok(Job::Reproject { input, target })
            }
            "native:dissolve" => Ok(Job::Dissolve { input, field: call.field("FIELD").map(str::to_string) }),
            other => Err(ExecutionError::algorithm(format!("unknown algorithm '{}'", other))),
        }
    }
}

/// Bring the overlay into the input's CRS, transforming on the fly when possible
fn align_overlay(input: &FeatureLayer, overlay: FeatureLayer) -> std::result::Result<FeatureLayer, ExecutionError> {
    match (&input.crs, &overlay.crs) {
        (Some(target), Some(source)) if !crs_match(target, source) => {
            tracing::info!("Transforming overlay '{}' from {} to {}", overlay.name, source, target);
            ops::reproject_layer(&overlay, target)
                .map_err(|e| ExecutionError::algorithm(format!("cannot align overlay '{}': {}", overlay.name, e)))
        }
        _ => Ok(overlay),
    }
}

#[async_trait]
impl ExecutionBackend for MemoryLayerStore {
    async fn run_algorithm(
        &self,
        call: &AlgorithmCall,
        progress: &ProgressReporter,
        cancel: &CancelFlag,
    ) -> std::result::Result<OutputSource, ExecutionError> {
        cancel.check()?;
        let job = self.prepare(call)?;
        tracing::info!("Running {} -> '{}'", call.algorithm_id, call.output_name);

        let name = call.output_name.clone();
        let progress = progress.clone();
        let cancel = cancel.clone();
        let output = tokio::task::spawn_blocking(move || {
            progress.report(0.0);
            let step = |done: usize, total: usize| {
                progress.report(done as f64 * 100.0 / total.max(1) as f64);
                cancel.check()
            };
            let layer = job.run(name, &step)?;
            progress.finish();
            Ok::<_, ExecutionError>(layer)
        })
        .await
        .map_err(|e| ExecutionError::algorithm(format!("algorithm task failed: {}", e)))??;

        let handle = uuid::Uuid::new_v4().to_string();
        let feature_count = output.len();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .outputs
            .insert(handle.clone(), output);

        Ok(OutputSource { handle, feature_count })
    }

    async fn add_memory_layer(&self, name: &str, source: OutputSource) -> Result<LayerId> {
        let mut layer = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .outputs
            .remove(&source.handle)
            .ok_or_else(|| GeogenieError::LayerNotFound { id: source.handle.clone() })?;

        layer.name = name.to_string();
        Ok(self.add_layer(layer))
    }

    async fn discard_output(&self, source: OutputSource) -> Result<()> {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .outputs
            .remove(&source.handle);
        Ok(())
    }

    async fn remove_layer(&self, id: &LayerId) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let before = state.layers.len();
        state.layers.retain(|(existing, _)| existing != id);
        if state.layers.len() == before {
            return Err(GeogenieError::LayerNotFound { id: id.to_string() });
        }
        tracing::debug!("Removed layer {}", id);
        Ok(())
    }
}
