//! Progress display using indicatif
//!
//! Wraps indicatif's `ProgressBar` so commands report live progress the same
//! way. Drawing goes to stderr and is suppressed when stderr is not a terminal.

use indicatif::{ProgressBar as IndicatifBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Spinner counting records as they are processed
#[derive(Clone)]
pub struct ProgressBar {
    bar: IndicatifBar,
}

impl ProgressBar {
    /// Create a spinner for a stream of unknown length
    pub fn new_spinner(label: &str) -> Self {
        let bar = IndicatifBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg} {pos} ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));

        Self { bar }
    }

    /// A progress bar that never draws
    pub fn hidden() -> Self {
        let bar = IndicatifBar::with_draw_target(None, ProgressDrawTarget::hidden());
        Self { bar }
    }

    /// Increment progress by 1
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish and clear the spinner, leaving a message line
    pub fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
