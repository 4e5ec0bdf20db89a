//! Waiting for an in-flight create or delete to finish.
//!
//! The poller samples the stack status until one of:
//! - the operation's target status (success)
//! - any other terminal status (failure, no further samples)
//! - the attempt budget or deadline runs out
//! - the cancel token is tripped
//!
//! Transient describe errors are retried with backoff inside a single
//! attempt and never count as a status sample.

use crate::backend::Provisioner;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::retry::{self, LogCallback};
use crate::types::{Operation, PollConfig, StackStatus};
use std::time::Instant;

/// Receives one notification per status sample.
pub trait PollObserver {
    /// Called after each successful status sample.
    fn on_sample(&self, attempt: u32, status: StackStatus);
}

/// Observer that writes each sample to the log.
pub struct LogObserver;

impl PollObserver for LogObserver {
    fn on_sample(&self, attempt: u32, status: StackStatus) {
        log::info!("Status check {}: {}", attempt, status);
    }
}

/// Successful end of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Terminal status observed
    pub status: StackStatus,
    /// Number of status samples taken
    pub attempts: u32,
}

/// Samples stack status until a terminal state, budget exhaustion, or
/// cancellation.
pub struct Poller<'a> {
    config: PollConfig,
    observer: &'a dyn PollObserver,
    cancel: CancelToken,
}

impl Poller<'static> {
    /// Create a poller that logs samples and cannot be cancelled.
    pub fn new(config: PollConfig) -> Self {
        Poller {
            config,
            observer: &LogObserver,
            cancel: CancelToken::new(),
        }
    }
}

impl<'a> Poller<'a> {
    /// Report samples to `observer`.
    pub fn with_observer<'b>(self, observer: &'b dyn PollObserver) -> Poller<'b> {
        Poller {
            config: self.config,
            observer,
            cancel: self.cancel,
        }
    }

    /// Abort the wait when `cancel` is tripped.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Block until `name` finishes `operation`.
    ///
    /// Returns the terminal success status, or an error:
    /// [`Error::TerminalFailure`], [`Error::BudgetExhausted`],
    /// [`Error::Cancelled`], or the last describe error once its retries
    /// are used up.
    pub fn wait<P: Provisioner + ?Sized>(
        &self,
        provisioner: &P,
        name: &str,
        operation: Operation,
    ) -> Result<PollOutcome> {
        let target = operation.target_status();
        let started = Instant::now();
        let mut last_status = StackStatus::Unknown;
        let mut attempts = 0;

        log::info!("Waiting for {} to reach {}", name, target);

        while attempts < self.config.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(name));
            }
            if self
                .config
                .timeout
                .is_some_and(|timeout| started.elapsed() >= timeout)
            {
                log::warn!("Deadline reached while waiting for {}", name);
                break;
            }

            let sampled = retry::with_retry(
                &self.config.retry,
                Some(&LogCallback),
                Some(&self.cancel),
                || observe(provisioner, name, operation),
            );
            let status = match sampled {
                Ok(status) => status,
                Err(_) if self.cancel.is_cancelled() => return Err(self.cancelled(name)),
                Err(e) => return Err(e),
            };

            attempts += 1;
            last_status = status;
            self.observer.on_sample(attempts, status);

            if status == target {
                return Ok(PollOutcome { status, attempts });
            }
            if status.is_terminal() {
                return Err(Error::TerminalFailure {
                    name: name.to_string(),
                    status,
                });
            }

            if attempts < self.config.max_attempts && !self.cancel.sleep(self.config.interval) {
                return Err(self.cancelled(name));
            }
        }

        Err(Error::BudgetExhausted {
            name: name.to_string(),
            attempts,
            last_status,
        })
    }

    fn cancelled(&self, name: &str) -> Error {
        log::warn!("Stopped waiting for {}", name);
        Error::Cancelled {
            name: name.to_string(),
        }
    }
}

/// Describe `name`, treating a vanished stack as deleted while deleting.
pub fn observe<P: Provisioner + ?Sized>(
    provisioner: &P,
    name: &str,
    operation: Operation,
) -> Result<StackStatus> {
    match provisioner.describe(name) {
        Err(Error::StackNotFound { .. }) if operation == Operation::Delete => {
            Ok(StackStatus::DeleteComplete)
        }
        other => other,
    }
}
