use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::layer::LayerId;

/// One progress update from a running algorithm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Percentage complete, 0..=100
    pub percent: u8,

    /// Milliseconds since the algorithm started
    pub elapsed_ms: u64,
}

/// Outcome of running an approved operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,

    /// Set when the run was cancelled by the user
    pub cancelled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_layer_id: Option<LayerId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_layer_name: Option<String>,

    pub feature_count: usize,
    pub diagnostics: Vec<String>,
    pub progress_events: Vec<ProgressEvent>,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn succeeded(
        output_layer_id: LayerId,
        output_layer_name: String,
        feature_count: usize,
        progress_events: Vec<ProgressEvent>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            success: true,
            cancelled: false,
            output_layer_id: Some(output_layer_id),
            output_layer_name: Some(output_layer_name),
            feature_count,
            diagnostics: Vec::new(),
            progress_events,
            elapsed_ms,
            finished_at: Utc::now(),
        }
    }

    pub fn failed(diagnostics: Vec<String>, progress_events: Vec<ProgressEvent>, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            cancelled: false,
            output_layer_id: None,
            output_layer_name: None,
            feature_count: 0,
            diagnostics,
            progress_events,
            elapsed_ms,
            finished_at: Utc::now(),
        }
    }

    pub fn cancelled(progress_events: Vec<ProgressEvent>, elapsed_ms: u64) -> Self {
        Self {
            cancelled: true,
            ..Self::failed(vec!["Execution cancelled".to_string()], progress_events, elapsed_ms)
        }
    }

    /// Highest progress percentage reported
    pub fn last_percent(&self) -> u8 {
        self.progress_events.last().map(|e| e.percent).unwrap_or(0)
    }
}
