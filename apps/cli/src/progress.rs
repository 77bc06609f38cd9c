//! Progress bar for CLI transfers

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rdl_core::TransferHooks;
use rdl_types::{TransferStatus, TransferSummary};
use std::ops::ControlFlow;

/// Progress bar driven by a transfer's progress hook
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    pub fn new(name: &str) -> Self {
        // Length is unknown until the first progress report
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        bar.set_message(name.to_string());
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Hooks that update this bar and pause once `stop_after` bytes are on disk
    pub fn hooks(&self, stop_after: Option<u64>) -> TransferHooks {
        let bar = self.bar.clone();
        TransferHooks::new().on_progress(move |done, total| {
            match total {
                Some(total) => bar.set_length(total),
                None => bar.set_length(done),
            }
            bar.set_position(done);

            match stop_after {
                Some(limit) if done >= limit => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        })
    }

    /// Finish the bar according to how the transfer ended
    pub fn finish(&self, summary: &TransferSummary) {
        match summary.status {
            TransferStatus::Completed => {
                self.bar.finish_with_message(format!(
                    "{} Download complete",
                    style("✓").green().bold()
                ));
            }
            TransferStatus::AlreadyComplete => {
                self.bar.finish_with_message(format!(
                    "{} Already complete",
                    style("✓").green().bold()
                ));
            }
            TransferStatus::Paused => {
                self.bar
                    .abandon_with_message(format!("{} Paused", style("⏸").yellow()));
            }
            TransferStatus::Unsupported | TransferStatus::Failed => {
                self.bar.abandon_with_message(format!(
                    "{} Failed: {}",
                    style("✗").red().bold(),
                    summary.error.as_deref().unwrap_or("Unknown error")
                ));
            }
        }
    }
}
