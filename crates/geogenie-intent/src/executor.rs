//! Running confirmed operations on the execution backend
//!
//! Failures never escape as errors: every outcome is an [`ExecutionResult`].
//! Whatever the run leaves behind on failure or cancellation is removed
//! before the result is reported.

use geogenie_core::error::ExecutionError;
use geogenie_core::models::{ExecutionResult, LayerCatalog};
use geogenie_core::ports::{AlgorithmCall, CancelFlag, ExecutionBackend, LayerSource, ProgressReporter};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::confirm::ConfirmedOperation;
use crate::validator::ValidatedOperation;

#[derive(Clone)]
pub struct OperationExecutor {
    backend: Arc<dyn ExecutionBackend>,
    layers: Arc<dyn LayerSource>,
}

impl OperationExecutor {
    pub fn new(backend: Arc<dyn ExecutionBackend>, layers: Arc<dyn LayerSource>) -> Self {
        Self { backend, layers }
    }

    /// Backend call for `op`, writing into `output_name`
    pub fn build_call(op: &ValidatedOperation, output_name: impl Into<String>) -> AlgorithmCall {
        let spec = op.spec();
        let parameters: BTreeMap<&'static str, _> = spec
            .parameters
            .iter()
            .filter_map(|p| op.param(p.name).map(|value| (p.backend_key, value.clone())))
            .collect();

        AlgorithmCall { op: op.op(), algorithm_id: spec.backend_id, parameters, output_name: output_name.into() }
    }

    /// `<base>_<n>` with the smallest `n` not used by any loaded layer
    pub fn unique_name(base: &str, catalog: &LayerCatalog) -> String {
        (1u32..)
            .map(|n| format!("{}_{}", base, n))
            .find(|name| !catalog.contains_name(name))
            .unwrap_or_else(|| base.to_string())
    }

    pub async fn execute(
        &self,
        confirmed: ConfirmedOperation,
        progress: ProgressReporter,
        cancel: &CancelFlag,
    ) -> ExecutionResult {
        let op = confirmed.operation();

        let catalog = match self.layers.catalog().await {
            Ok(catalog) => catalog,
            Err(e) => return ExecutionResult::failed(vec![e.to_string()], progress.events(), progress.elapsed_ms()),
        };
        let output_name = Self::unique_name(op.target_layer_name(), &catalog);
        let call = Self::build_call(op, &output_name);

        tracing::info!("Executing {} into '{}'", call.algorithm_id, output_name);
        let outcome = self.backend.run_algorithm(&call, &progress, cancel).await;

        let source = match outcome {
            Ok(source) => source,
            Err(ExecutionError::Cancelled) => {
                let mut result = self.cancelled(&progress);
                result.diagnostics.extend(self.cleanup(&output_name).await);
                tracing::info!("Execution of {} cancelled", call.algorithm_id);
                return result;
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", call.algorithm_id, e);
                let mut diagnostics = vec![e.to_string()];
                diagnostics.extend(self.cleanup(&output_name).await);
                return ExecutionResult::failed(diagnostics, progress.events(), progress.elapsed_ms());
            }
        };

        // Cancelled after the algorithm finished: drop the result
        if cancel.is_cancelled() {
            if let Err(e) = self.backend.discard_output(source).await {
                tracing::warn!("Failed to discard output of {}: {}", call.algorithm_id, e);
            }
            return self.cancelled(&progress);
        }

        let feature_count = source.feature_count;
        let id = match self.backend.add_memory_layer(&output_name, source).await {
            Ok(id) => id,
            Err(e) => {
                let mut diagnostics = vec![format!("Failed to add output layer '{}': {}", output_name, e)];
                diagnostics.extend(self.cleanup(&output_name).await);
                return ExecutionResult::failed(diagnostics, progress.events(), progress.elapsed_ms());
            }
        };

        if cancel.is_cancelled() {
            if let Err(e) = self.backend.remove_layer(&id).await {
                tracing::warn!("Failed to remove cancelled output '{}': {}", output_name, e);
            }
            return self.cancelled(&progress);
        }

        tracing::info!("Created layer '{}' with {} features", output_name, feature_count);
        ExecutionResult::succeeded(id, output_name, feature_count, progress.events(), progress.elapsed_ms())
    }

    fn cancelled(&self, progress: &ProgressReporter) -> ExecutionResult {
        ExecutionResult::cancelled(progress.events(), progress.elapsed_ms())
    }

    /// Remove any layer the failed run registered under `output_name`
    async fn cleanup(&self, output_name: &str) -> Vec<String> {
        let catalog = match self.layers.catalog().await {
            Ok(catalog) => catalog,
            Err(e) => return vec![format!("Could not check for partial output: {}", e)],
        };

        let mut diagnostics = Vec::new();
        for layer in catalog.layers().iter().filter(|l| l.name == output_name) {
            match self.backend.remove_layer(&layer.id).await {
                Ok(()) => tracing::info!("Removed partial output layer '{}'", layer.name),
                Err(e) => diagnostics.push(format!("Failed to remove partial output '{}': {}", layer.name, e)),
            }
        }
        diagnostics
    }
}
