//! Progress reporting while a stack operation is in flight.

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use stackkit::{PollObserver, StackStatus};
use std::cell::OnceCell;
use std::time::Duration;

/// Create a spinner, hidden when `quiet`.
pub fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Updates a spinner and prints a line for every status sample.
///
/// The spinner appears with the first sample, so prompts shown earlier in
/// the run are left alone.
pub struct StatusSpinner {
    name: String,
    quiet: bool,
    bar: OnceCell<ProgressBar>,
}

impl StatusSpinner {
    pub fn new(name: &str, quiet: bool) -> Self {
        Self {
            name: name.to_string(),
            quiet,
            bar: OnceCell::new(),
        }
    }

    /// Stop the spinner and remove it from the terminal.
    pub fn finish(&self) {
        if let Some(bar) = self.bar.get() {
            bar.finish_and_clear();
        }
    }

    /// Line printed above the spinner for a sample, unless quiet.
    fn progress_line<'m>(&self, message: &'m str) -> Option<&'m str> {
        (!self.quiet).then_some(message)
    }

    fn bar(&self) -> &ProgressBar {
        self.bar
            .get_or_init(|| spinner(&format!("Waiting for {}", self.name), self.quiet))
    }
}

impl PollObserver for StatusSpinner {
    fn on_sample(&self, attempt: u32, status: StackStatus) {
        let message = sample_message(&self.name, attempt, status, &timestamp());
        let bar = self.bar();
        bar.set_message(message.clone());
        log::debug!("{}", message);

        if let Some(line) = self.progress_line(&message) {
            // A hidden bar (stderr not a terminal) drops println output
            if bar.is_hidden() {
                eprintln!("{line}");
            } else {
                bar.println(line);
            }
        }
    }
}

impl Drop for StatusSpinner {
    fn drop(&mut self) {
        self.finish();
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn sample_message(name: &str, attempt: u32, status: StackStatus, at: &str) -> String {
    format!("{name}: {status} (check {attempt}, {at})")
}
