use async_trait::async_trait;
use std::collections::BTreeMap;

use super::progress::{CancelFlag, ProgressReporter};
use crate::error::{ExecutionError, Result};
use crate::models::{CrsCode, LayerId, OpName, ParamValue};

/// One backend algorithm invocation
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmCall {
    pub op: OpName,

    /// Backend algorithm id, e.g. `native:buffer`
    pub algorithm_id: &'static str,

    /// Values keyed by backend parameter key (`INPUT`, `DISTANCE`, ...)
    pub parameters: BTreeMap<&'static str, ParamValue>,

    /// Name the output layer will be registered under
    pub output_name: String,
}

impl AlgorithmCall {
    pub fn layer(&self, key: &str) -> Option<&LayerId> {
        self.parameters.get(key).and_then(ParamValue::as_layer)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(ParamValue::as_number)
    }

    pub fn crs(&self, key: &str) -> Option<&CrsCode> {
        self.parameters.get(key).and_then(ParamValue::as_crs)
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(ParamValue::as_field)
    }

    pub fn choice(&self, key: &str) -> Option<&'static str> {
        self.parameters.get(key).and_then(ParamValue::as_choice)
    }

    /// Required layer parameter, as an algorithm error when absent
    pub fn require_layer(&self, key: &str) -> std::result::Result<&LayerId, ExecutionError> {
        self.layer(key)
            .ok_or_else(|| ExecutionError::algorithm(format!("{} requires a {} layer", self.algorithm_id, key)))
    }
}

/// Result data produced by an algorithm, not yet registered as a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSource {
    /// Backend-specific reference to the produced data
    pub handle: String,
    pub feature_count: usize,
}

/// Port for the host's algorithm runner and layer registry
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Run one algorithm, reporting progress and honouring cancellation
    async fn run_algorithm(
        &self,
        call: &AlgorithmCall,
        progress: &ProgressReporter,
        cancel: &CancelFlag,
    ) -> std::result::Result<OutputSource, ExecutionError>;

    /// Register produced data as a new memory layer
    async fn add_memory_layer(&self, name: &str, source: OutputSource) -> Result<LayerId>;

    /// Drop produced data that will never be registered
    async fn discard_output(&self, source: OutputSource) -> Result<()> {
        let _ = source;
        Ok(())
    }

    /// Remove a loaded layer
    async fn remove_layer(&self, id: &LayerId) -> Result<()>;
}
