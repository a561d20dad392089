//! Search progress spinner for the CLI.
//!
//! Draws to stderr through `indicatif` when the `progress` feature is enabled
//! and stderr is a terminal; otherwise every call is a no-op.

use crate::search::SearchProgress;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
#[cfg(feature = "progress")]
use std::time::Duration;

/// Spinner showing hits and files searched while a search runs
pub struct SearchSpinner {
    #[cfg(feature = "progress")]
    bar: Option<ProgressBar>,
}

impl SearchSpinner {
    /// Create a spinner; `enabled = false` produces a silent one
    #[cfg(feature = "progress")]
    pub fn new(enabled: bool) -> Self {
        let draw_target = ProgressDrawTarget::stderr();
        if !enabled || draw_target.is_hidden() {
            return Self { bar: None };
        }

        let bar = ProgressBar::with_draw_target(None, draw_target);
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message("Searching...");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    #[cfg(not(feature = "progress"))]
    pub fn new(_enabled: bool) -> Self {
        Self {}
    }

    /// Update the message from a progress snapshot
    pub fn update(&self, progress: &SearchProgress) {
        #[cfg(feature = "progress")]
        if let Some(bar) = &self.bar {
            bar.set_message(format_progress(progress));
        }
        #[cfg(not(feature = "progress"))]
        let _ = progress;
    }

    /// Hide the spinner before printing results under it
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        #[cfg(feature = "progress")]
        if let Some(bar) = &self.bar {
            return bar.suspend(f);
        }
        f()
    }

    pub fn finish(&self) {
        #[cfg(feature = "progress")]
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// "N hits across M files so far [K files searched in T s]"
pub fn format_progress(progress: &SearchProgress) -> String {
    format!(
        "{} hits across {} files so far [{} files searched in {:.1} seconds]",
        progress.hits,
        progress.files_matched,
        progress.files_searched,
        progress.elapsed.as_secs_f64()
    )
}
