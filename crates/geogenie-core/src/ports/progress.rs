use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::error::ExecutionError;
use crate::models::ProgressEvent;

/// Callback receiving progress updates, typically a UI progress bar
pub type ProgressObserver = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[derive(Default)]
struct ProgressState {
    last: Option<u8>,
    events: Vec<ProgressEvent>,
}

/// Collects progress from a running algorithm
///
/// Reported percentages are clamped to 0..=100 and never go backwards;
/// repeated or lower values are dropped.
#[derive(Clone)]
pub struct ProgressReporter {
    started: Instant,
    state: Arc<Mutex<ProgressState>>,
    observer: Option<ProgressObserver>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self { started: Instant::now(), state: Arc::default(), observer: None }
    }

    pub fn with_observer(observer: ProgressObserver) -> Self {
        Self { observer: Some(observer), ..Self::new() }
    }

    pub fn report(&self, percent: f64) {
        let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) as u8 } else { 0 };

        let event = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(state.last, Some(last) if percent <= last) {
                return;
            }
            let event = ProgressEvent { percent, elapsed_ms: self.elapsed_ms() };
            state.last = Some(percent);
            state.events.push(event);
            event
        };

        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    pub fn finish(&self) {
        self.report(100.0);
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).events.clone()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("events", &self.events().len())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Shared cancellation request
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested
    pub fn check(&self) -> Result<(), ExecutionError> {
        if self.is_cancelled() {
            Err(ExecutionError::Cancelled)
        } else {
            Ok(())
        }
    }
}
