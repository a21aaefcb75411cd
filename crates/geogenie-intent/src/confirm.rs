//! User confirmation of a validated operation
//!
//! The gate shows the operation to a [`Confirmer`] until it is approved or
//! cancelled. Edits are merged into the request and validated again against a
//! fresh catalog; a rejected edit is shown back together with its error.

use async_trait::async_trait;
use geogenie_core::error::{Result, ValidationError};
use geogenie_core::models::OperationRequest;
use geogenie_core::ports::LayerSource;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::validator::{ParameterValidator, ValidatedOperation};

/// Answer of the user to a confirmation dialog
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Approve,
    /// Replace parameter values; `null` removes a parameter
    Edit(BTreeMap<String, Value>),
    Cancel,
}

/// UI port for the confirmation dialog
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Present `op`, with the error of the previous edit when it was rejected
    async fn confirm(&self, op: &ValidatedOperation, rejected: Option<&ValidationError>) -> Result<Decision>;
}

/// Confirmer that approves everything, for non-interactive use
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl Confirmer for AutoApprove {
    async fn confirm(&self, op: &ValidatedOperation, _rejected: Option<&ValidationError>) -> Result<Decision> {
        tracing::debug!("Auto-approving {}", op.op());
        Ok(Decision::Approve)
    }
}

/// A validated operation the user approved; the only input the executor accepts
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedOperation {
    operation: ValidatedOperation,
}

impl ConfirmedOperation {
    pub fn operation(&self) -> &ValidatedOperation {
        &self.operation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Confirmed(ConfirmedOperation),
    Cancelled,
}

#[derive(Clone)]
pub struct ConfirmationGate {
    confirmer: Arc<dyn Confirmer>,
    layers: Arc<dyn LayerSource>,
}

impl ConfirmationGate {
    pub fn new(confirmer: Arc<dyn Confirmer>, layers: Arc<dyn LayerSource>) -> Self {
        Self { confirmer, layers }
    }

    pub async fn confirm(&self, request: &OperationRequest, op: ValidatedOperation) -> Result<GateOutcome> {
        let mut request = request.clone();
        let mut op = op;
        let mut rejected: Option<ValidationError> = None;

        loop {
            match self.confirmer.confirm(&op, rejected.as_ref()).await? {
                Decision::Approve => {
                    tracing::info!("Operation {} approved", op.op());
                    return Ok(GateOutcome::Confirmed(ConfirmedOperation { operation: op }));
                }
                Decision::Cancel => {
                    tracing::info!("Operation {} cancelled at confirmation", op.op());
                    return Ok(GateOutcome::Cancelled);
                }
                Decision::Edit(edits) => {
                    let edited = request.merge_edits(&edits);
                    let catalog = self.layers.catalog().await?;
                    match ParameterValidator::validate(&edited, &catalog, &|crs| self.layers.is_known_crs(crs)) {
                        Ok(revalidated) => {
                            tracing::debug!("Edit accepted: {} parameters changed", edits.len());
                            request = edited;
                            op = revalidated;
                            rejected = None;
                        }
                        Err(e) => {
                            tracing::warn!("Edit rejected: {}", e);
                            rejected = Some(e);
                        }
                    }
                }
            }
        }
    }
}
