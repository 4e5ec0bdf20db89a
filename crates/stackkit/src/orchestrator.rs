//! Stack lifecycle orchestration.
//!
//! A run moves strictly forward through
//! `Idle → Validating → ResolvingParameters → Submitting → Polling → Terminal`
//! and never retries a stage. Deletes skip parameter resolution, and skip
//! validation when no template is supplied. Whatever the outcome, the run
//! ends with one final describe whose status is reported to the caller.

use crate::backend::Provisioner;
use crate::cancel::CancelToken;
use crate::error::Error;
use crate::poller::{self, LogObserver, PollObserver, Poller};
use crate::resolver::{self, InputSource};
use crate::types::{Operation, PollConfig, StackRequest, StackStatus, Template};
use crate::validator;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Target status reached
    Success,
    /// Any stage failed
    Failed,
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing started yet
    Idle,
    /// Template submitted for validation
    Validating,
    /// Prompting for parameter values
    ResolvingParameters,
    /// Create or delete request in flight
    Submitting,
    /// Waiting for a terminal status
    Polling,
    /// Run finished
    Terminal(Outcome),
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Idle => f.write_str("idle"),
            Stage::Validating => f.write_str("validate"),
            Stage::ResolvingParameters => f.write_str("resolve"),
            Stage::Submitting => f.write_str("submit"),
            Stage::Polling => f.write_str("poll"),
            Stage::Terminal(Outcome::Success) => f.write_str("done"),
            Stage::Terminal(Outcome::Failed) => f.write_str("failed"),
        }
    }
}

/// Successful run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Stack name
    pub name: String,
    /// Operation performed
    pub operation: Operation,
    /// Status observed by the final describe
    pub status: StackStatus,
    /// Status samples taken while polling
    pub attempts: u32,
    /// Every stage entered, in order
    pub stages: Vec<Stage>,
}

/// A run that ended in `Terminal(Failed)`.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed for {name}: {source}")]
pub struct Failure {
    /// Stack name
    pub name: String,
    /// Stage the run failed in
    pub stage: Stage,
    /// Status observed by the final describe
    pub status: StackStatus,
    /// Every stage entered, in order
    pub stages: Vec<Stage>,
    /// Originating error
    #[source]
    pub source: Error,
}

/// Stage bookkeeping for a single run.
struct Run<'r> {
    name: &'r str,
    operation: Operation,
    stages: Vec<Stage>,
}

impl<'r> Run<'r> {
    fn new(name: &'r str, operation: Operation) -> Self {
        Self {
            name,
            operation,
            stages: vec![Stage::Idle],
        }
    }

    fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Idle)
    }

    fn enter(&mut self, stage: Stage) {
        log::info!("{} {}: {} -> {}", self.operation, self.name, self.current(), stage);
        self.stages.push(stage);
    }
}

/// Sequences validation, parameter resolution, submission and polling
/// against one provisioner.
pub struct Orchestrator<'a> {
    provisioner: &'a dyn Provisioner,
    poll: PollConfig,
    observer: &'a dyn PollObserver,
    cancel: CancelToken,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator with a polling budget.
    pub fn new(provisioner: &'a dyn Provisioner, poll: PollConfig) -> Self {
        Self {
            provisioner,
            poll,
            observer: &LogObserver,
            cancel: CancelToken::new(),
        }
    }

    /// Report poll samples to `observer`.
    pub fn with_observer(mut self, observer: &'a dyn PollObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Abort polling when `cancel` is tripped.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validate `template`, resolve its parameters from `input`, create the
    /// stack and wait for `CREATE_COMPLETE`.
    pub fn create(
        &self,
        name: &str,
        template: &Template,
        input: &mut dyn InputSource,
    ) -> Result<Report, Failure> {
        let mut run = Run::new(name, Operation::Create);

        run.enter(Stage::Validating);
        let declared = match validator::validate(self.provisioner, template) {
            Ok(declared) => declared,
            Err(e) => return Err(self.fail(run, e)),
        };

        run.enter(Stage::ResolvingParameters);
        let parameters = match resolver::resolve(&declared, input) {
            Ok(parameters) => parameters,
            Err(e) => return Err(self.fail(run, e)),
        };

        run.enter(Stage::Submitting);
        if let Err(e) = self.ensure_not_cancelled(name) {
            return Err(self.fail(run, e));
        }
        let request = StackRequest {
            name: name.to_string(),
            template: template.clone(),
            parameters,
        };
        log::info!("Creating stack {} with {} parameter(s)", name, request.parameters.len());
        match self.provisioner.create(&request) {
            Ok(ack) => log::info!(
                "Create acknowledged for {} ({})",
                ack.name,
                ack.id.as_deref().unwrap_or("no id")
            ),
            Err(e) => return Err(self.fail(run, e)),
        }

        self.poll(run)
    }

    /// Delete the stack and wait for `DELETE_COMPLETE`.
    ///
    /// When `template` is given it is validated first.
    pub fn delete(&self, name: &str, template: Option<&Template>) -> Result<Report, Failure> {
        let mut run = Run::new(name, Operation::Delete);

        if let Some(template) = template {
            run.enter(Stage::Validating);
            if let Err(e) = validator::validate(self.provisioner, template) {
                return Err(self.fail(run, e));
            }
        }

        run.enter(Stage::Submitting);
        if let Err(e) = self.ensure_not_cancelled(name) {
            return Err(self.fail(run, e));
        }
        log::info!("Deleting stack {}", name);
        match self.provisioner.delete(name) {
            Ok(ack) => log::info!("Delete acknowledged for {}", ack.name),
            Err(e) => return Err(self.fail(run, e)),
        }

        self.poll(run)
    }

    fn poll(&self, mut run: Run<'_>) -> Result<Report, Failure> {
        run.enter(Stage::Polling);
        let poller = Poller::new(self.poll.clone())
            .with_observer(self.observer)
            .with_cancel(self.cancel.clone());

        match poller.wait(self.provisioner, run.name, run.operation) {
            Ok(outcome) => {
                run.enter(Stage::Terminal(Outcome::Success));
                let status = self.final_status(&run);
                Ok(Report {
                    name: run.name.to_string(),
                    operation: run.operation,
                    status,
                    attempts: outcome.attempts,
                    stages: run.stages,
                })
            }
            Err(e) => Err(self.fail(run, e)),
        }
    }

    /// Nothing is sent to the provider once the operator has cancelled.
    fn ensure_not_cancelled(&self, name: &str) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            log::warn!("Cancelled before submitting {}", name);
            return Err(Error::Cancelled {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn fail(&self, mut run: Run<'_>, source: Error) -> Failure {
        let stage = run.current();
        run.enter(Stage::Terminal(Outcome::Failed));
        let status = self.final_status(&run);
        Failure {
            name: run.name.to_string(),
            stage,
            status,
            stages: run.stages,
            source,
        }
    }

    /// One last describe; anything unreadable is reported as UNKNOWN.
    fn final_status(&self, run: &Run<'_>) -> StackStatus {
        match poller::observe(self.provisioner, run.name, run.operation) {
            Ok(status) => {
                log::info!("Stack {} is {}", run.name, status);
                status
            }
            Err(e) => {
                log::debug!("Final status of {} unavailable: {}", run.name, e);
                StackStatus::Unknown
            }
        }
    }
}
