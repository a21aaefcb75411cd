//! One user session: request lifecycle and the full pipeline
//!
//! A session handles one request at a time. Submitting while a request is in
//! flight fails with [`GeogenieError::Busy`].

use geogenie_core::config::SessionConfig;
use geogenie_core::error::{GeogenieError, Result};
use geogenie_core::models::ExecutionResult;
use geogenie_core::ports::{CancelFlag, ExecutionBackend, LayerSource, ProgressObserver, ProgressReporter};
use geogenie_llm::LlmBackend;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

use crate::confirm::{AutoApprove, ConfirmationGate, Confirmer, GateOutcome};
use crate::executor::OperationExecutor;
use crate::prompt::PromptBuilder;
use crate::resolver::IntentResolver;
use crate::validator::ParameterValidator;

/// Lifecycle of the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingModel,
    AwaitingConfirmation,
    Executing,
    Done,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle | Done | Failed | Cancelled, AwaitingModel)
                | (AwaitingModel, AwaitingConfirmation | Failed)
                | (AwaitingConfirmation, Executing | Cancelled | Failed)
                | (Executing, Done | Failed | Cancelled)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingModel => "waiting for the model",
            SessionState::AwaitingConfirmation => "waiting for confirmation",
            SessionState::Executing => "executing",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// How a submitted request ended, when it did not fail before execution
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// The operation ran; the result says whether it succeeded
    Executed(ExecutionResult),
    /// The user cancelled at the confirmation step, nothing ran
    Cancelled,
}

struct SessionInner {
    config: SessionConfig,
    layers: Arc<dyn LayerSource>,
    resolver: IntentResolver,
    gate: ConfirmationGate,
    executor: OperationExecutor,
    state: Mutex<SessionState>,
    busy: Arc<AtomicBool>,
    cancel: Mutex<Option<CancelFlag>>,
    observer: Mutex<Option<ProgressObserver>>,
}

/// Clears the busy flag when the request finishes, however it finishes
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Cloneable handle to a session
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Wire a session from its collaborators
    ///
    /// With `require_confirmation` off in `config`, `confirmer` is replaced by [`AutoApprove`].
    pub fn new(
        config: SessionConfig,
        llm: Arc<dyn LlmBackend>,
        layers: Arc<dyn LayerSource>,
        backend: Arc<dyn ExecutionBackend>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let confirmer: Arc<dyn Confirmer> = if config.require_confirmation { confirmer } else { Arc::new(AutoApprove) };

        Self {
            inner: Arc::new(SessionInner {
                resolver: IntentResolver::new(llm),
                gate: ConfirmationGate::new(confirmer, layers.clone()),
                executor: OperationExecutor::new(backend, layers.clone()),
                layers,
                config,
                state: Mutex::new(SessionState::Idle),
                busy: Arc::new(AtomicBool::new(false)),
                cancel: Mutex::new(None),
                observer: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// Receive progress updates of future executions
    pub fn set_progress_observer(&self, observer: ProgressObserver) {
        *self.inner.observer.lock().unwrap_or_else(PoisonError::into_inner) = Some(observer);
    }

    /// Request cancellation of the running execution, if any
    pub fn cancel(&self) {
        if let Some(flag) = self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            tracing::info!("Cancellation requested");
            flag.cancel();
        }
    }

    /// Run the whole pipeline for `text`
    pub async fn submit(&self, text: &str) -> Result<RequestOutcome> {
        let guard = self.begin()?;
        self.run(text, guard).await
    }

    /// Run the pipeline on a background task and hand the outcome to `on_complete`
    ///
    /// Busy is reported immediately rather than through the callback.
    pub fn spawn_submit<F>(&self, text: impl Into<String>, on_complete: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<RequestOutcome>) + Send + 'static,
    {
        let guard = self.begin()?;
        let session = self.clone();
        let text = text.into();
        Ok(tokio::spawn(async move {
            let outcome = session.run(&text, guard).await;
            on_complete(outcome);
        }))
    }

    fn begin(&self) -> Result<BusyGuard> {
        self.inner
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| GeogenieError::Busy)?;
        Ok(BusyGuard(self.inner.busy.clone()))
    }

    async fn run(&self, text: &str, _guard: BusyGuard) -> Result<RequestOutcome> {
        self.transition(SessionState::AwaitingModel);
        let outcome = self.pipeline(text).await;

        match &outcome {
            Ok(RequestOutcome::Cancelled) => self.transition(SessionState::Cancelled),
            Ok(RequestOutcome::Executed(result)) if result.success => self.transition(SessionState::Done),
            Ok(RequestOutcome::Executed(result)) if result.cancelled => self.transition(SessionState::Cancelled),
            Ok(RequestOutcome::Executed(_)) | Err(_) => self.transition(SessionState::Failed),
        }
        *self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner) = None;

        outcome
    }

    async fn pipeline(&self, text: &str) -> Result<RequestOutcome> {
        let inner = &self.inner;

        // Stage 1: prompt and model round trip
        let catalog = inner.layers.catalog().await?;
        let prompt = PromptBuilder::build(text, &catalog, &inner.config);
        let request = inner.resolver.resolve(&prompt, &inner.config).await?;

        // Stage 2: validation against a fresh snapshot
        let catalog = inner.layers.catalog().await?;
        let validated = ParameterValidator::validate(&request, &catalog, &|crs| inner.layers.is_known_crs(crs))?;
        self.transition(SessionState::AwaitingConfirmation);

        // Stage 3: confirmation
        let confirmed = match inner.gate.confirm(&request, validated).await? {
            GateOutcome::Confirmed(confirmed) => confirmed,
            GateOutcome::Cancelled => return Ok(RequestOutcome::Cancelled),
        };

        // Stage 4: execution
        self.transition(SessionState::Executing);
        let cancel = CancelFlag::new();
        *inner.cancel.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());
        let progress = match inner.observer.lock().unwrap_or_else(PoisonError::into_inner).clone() {
            Some(observer) => ProgressReporter::with_observer(observer),
            None => ProgressReporter::new(),
        };

        let result = inner.executor.execute(confirmed, progress, &cancel).await;
        Ok(RequestOutcome::Executed(result))
    }

    fn transition(&self, next: SessionState) {
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.can_transition_to(next) {
            tracing::warn!("Unexpected session transition {:?} -> {:?}", *state, next);
        }
        tracing::debug!("Session {:?} -> {:?}", *state, next);
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use SessionState::*;
        assert!(Idle.can_transition_to(AwaitingModel));
        assert!(Done.can_transition_to(AwaitingModel));
        assert!(AwaitingModel.can_transition_to(Failed));
        assert!(AwaitingConfirmation.can_transition_to(Cancelled));
        assert!(Executing.can_transition_to(Done));

        assert!(!Idle.can_transition_to(Executing));
        assert!(!AwaitingModel.can_transition_to(Executing));
        assert!(!AwaitingModel.can_transition_to(Cancelled));
        assert!(!Executing.can_transition_to(AwaitingModel));
        assert!(!Done.can_transition_to(Done));
    }
}
