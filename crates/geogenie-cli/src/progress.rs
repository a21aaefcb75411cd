use geogenie_core::ports::ProgressObserver;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Once};
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a percentage bar for a running operation
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}\n[{bar:40.cyan/blue}] {pos}% ({elapsed})") {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb.set_message(message.to_string());
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Progress display of one request: a spinner while the model works, then a
/// percentage bar fed by the session's progress events
///
/// The bar stays hidden until the first event, so confirmation dialogs are
/// not drawn over.
pub struct ExecutionProgress {
    waiting: ProgressBar,
    bar: ProgressBar,
}

impl ExecutionProgress {
    pub fn new(waiting_message: &str) -> Self {
        let bar = create_progress_bar("Running");
        bar.set_draw_target(ProgressDrawTarget::hidden());
        Self { waiting: create_spinner(waiting_message), bar }
    }

    /// Spinner shown until the operation starts
    pub fn waiting(&self) -> ProgressBar {
        self.waiting.clone()
    }

    pub fn observer(&self) -> ProgressObserver {
        let waiting = self.waiting.clone();
        let bar = self.bar.clone();
        let started = Arc::new(Once::new());
        Arc::new(move |event| {
            started.call_once(|| {
                waiting.finish_and_clear();
                bar.set_draw_target(ProgressDrawTarget::stderr());
            });
            bar.set_position(u64::from(event.percent));
        })
    }

    pub fn finish(&self, success: bool, message: &str) {
        self.waiting.finish_and_clear();
        if self.bar.is_hidden() {
            return;
        }
        if success {
            finish_success(&self.bar, message);
        } else {
            finish_error(&self.bar, message);
        }
    }
}
