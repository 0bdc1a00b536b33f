//! Progress reporting for the network-bound stages (cache refresh, defect
//! fetches).
//!
//! The CLI shows a [`SpinnerProgress`] on stderr; library callers and tests
//! use [`NoopProgress`].

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub trait ProgressReporter: Send + Sync {
    /// Begin a new task with an optional total count.
    fn start(&self, task: &str, total: Option<u64>);

    fn advance(&self, amount: u64);

    /// Replace the status text shown next to the current task.
    fn message(&self, msg: &str);

    fn finish(&self);
}

#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _task: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn message(&self, _msg: &str) {}
    fn finish(&self) {}
}

/// Spinner (or bar, when the total is known) backed by `indicatif`.
#[derive(Debug)]
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::new_spinner(),
        }
    }

    /// A reporter that draws nothing; used for `--quiet` and non-TTY runs.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for SpinnerProgress {
    fn start(&self, task: &str, total: Option<u64>) {
        let style = match total {
            Some(total) => {
                self.bar.set_length(total);
                ProgressStyle::with_template("{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                    .map(|s| s.progress_chars("=> "))
            }
            None => ProgressStyle::with_template("{spinner:.green} {prefix} {msg}"),
        };
        self.bar
            .set_style(style.unwrap_or_else(|_| ProgressStyle::default_spinner()));
        self.bar.set_prefix(task.to_string());
        self.bar.set_message("");
        self.bar.reset();
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn advance(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
