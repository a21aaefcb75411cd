//! Run command implementation: the full request pipeline

use crate::cli::{Cli, RunArgs};
use crate::config_loader;
use crate::errors;
use crate::interactive::{self, DialoguerConfirmer};
use crate::output::OutputWriter;
use crate::output_types::RunOutput;
use crate::progress::ExecutionProgress;
use anyhow::{Context, Result};
use geogenie_core::credentials::resolve_api_key;
use geogenie_core::models::{Caveat, ExecutionResult};
use geogenie_geo::geojson_io;
use geogenie_intent::{AutoApprove, Confirmer, Decision, RequestOutcome, Session, SessionState, ValidatedOperation};
use geogenie_store::MemoryLayerStore;
use std::sync::{Arc, Mutex, PoisonError};

/// Remembers the operation the user last saw, for the final report
struct Recorded {
    inner: Arc<dyn Confirmer>,
    last: Mutex<Option<ValidatedOperation>>,
}

#[async_trait::async_trait]
impl Confirmer for Recorded {
    async fn confirm(
        &self,
        op: &ValidatedOperation,
        rejected: Option<&geogenie_core::error::ValidationError>,
    ) -> geogenie_core::Result<Decision> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(op.clone());
        self.inner.confirm(op, rejected).await
    }
}

pub async fn execute(cli: &Cli, args: &RunArgs, output: &OutputWriter) -> Result<()> {
    if args.layers.is_empty() {
        return Err(errors::no_layers().into());
    }

    let config = config_loader::load_config_with_overrides(cli, args.yes.then_some(false))?;
    let provider = config.provider.value;

    let api_key = resolve_api_key(&config_loader::credential_store(), provider)?;
    if provider.requires_api_key() && api_key.is_none() {
        return Err(errors::missing_api_key(provider).into());
    }
    let mut session_config = config.session_config(api_key);

    let store = super::load_layers(&args.layers)?;

    let progress = ExecutionProgress::new(&format!("Asking {} ({})...", provider, session_config.model));
    let inner: Arc<dyn Confirmer> = if session_config.require_confirmation {
        Arc::new(DialoguerConfirmer::clearing(progress.waiting()))
    } else {
        Arc::new(AutoApprove)
    };
    // The wrapper already picked dialog or auto-approval
    session_config.require_confirmation = true;
    let confirmer = Arc::new(Recorded { inner, last: Mutex::new(None) });

    let session = Session::new(
        session_config,
        geogenie_llm::build_backend(provider),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        confirmer.clone(),
    );
    session.set_progress_observer(progress.observer());

    // Ctrl-C cancels a running operation and exits otherwise
    let watcher = session.clone();
    let ctrl_c = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if watcher.state() == SessionState::Executing {
                watcher.cancel();
            } else {
                std::process::exit(130);
            }
        }
    });

    // A failed model call may be retried by the user; nothing else is
    let can_retry = !args.yes && !output.is_json() && console::Term::stderr().is_term();
    let outcome = loop {
        match session.submit(&args.text).await {
            Err(e) if e.is_retryable() && can_retry => {
                progress.waiting().finish_and_clear();
                if !interactive::confirm_retry(&e).await? {
                    return Err(e.into());
                }
            }
            other => {
                if other.is_err() {
                    progress.finish(false, "Request failed");
                }
                break other?;
            }
        }
    };
    ctrl_c.abort();

    let operation = confirmer.last.lock().unwrap_or_else(PoisonError::into_inner).take();
    let caveats: Vec<Caveat> = operation.as_ref().map(|op| op.caveats().to_vec()).unwrap_or_default();

    let result = match outcome {
        RequestOutcome::Cancelled => {
            progress.finish(false, "Cancelled");
            if output.is_json() {
                output.result(RunOutput {
                    request: args.text.clone(),
                    cancelled: true,
                    operation: operation.map(|op| op.op().to_string()),
                    output_layer: None,
                    feature_count: 0,
                    written_to: None,
                    caveats,
                    diagnostics: vec![],
                    progress: vec![],
                })?;
            } else {
                output.warning("Operation cancelled; nothing was run");
            }
            return Ok(());
        }
        RequestOutcome::Executed(result) => result,
    };

    if !result.success {
        progress.finish(false, if result.cancelled { "Cancelled" } else { "Failed" });
        if result.cancelled {
            output.warning("Execution cancelled; no layer was added");
            return Ok(());
        }
        return Err(errors::execution_failed(&result.diagnostics).into());
    }
    progress.finish(true, "Done");

    let written_to = match &args.output {
        Some(path) => {
            write_output(&store, &result, path)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    if output.is_json() {
        output.result(RunOutput {
            request: args.text.clone(),
            cancelled: false,
            operation: operation.map(|op| op.op().to_string()),
            output_layer: result.output_layer_name.clone(),
            feature_count: result.feature_count,
            written_to,
            caveats,
            diagnostics: result.diagnostics,
            progress: result.progress_events,
        })?;
    } else {
        output.success(format!(
            "Created layer '{}' with {} features",
            result.output_layer_name.as_deref().unwrap_or("?"),
            result.feature_count
        ));
        for caveat in caveats.iter().filter(|c| c.requires_attention()) {
            output.warning(caveat);
        }
        if let Some(path) = written_to {
            output.info(format!("Wrote output to {}", path));
        }
    }

    Ok(())
}

fn write_output(store: &MemoryLayerStore, result: &ExecutionResult, path: &std::path::Path) -> Result<()> {
    let layer = result
        .output_layer_id
        .as_ref()
        .and_then(|id| store.get_layer(id))
        .context("Output layer is missing from the store")?;

    geojson_io::write_layer(path, &layer).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {} features to {}", layer.len(), path.display());
    Ok(())
}
