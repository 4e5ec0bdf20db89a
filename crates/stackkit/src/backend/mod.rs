//! Backend abstraction for stack providers.
//!
//! The [`Provisioner`] trait is the capability set the orchestrator and the
//! poller work against, so neither knows which provider is behind it:
//! - [`cloudformation::CloudFormationBackend`] drives the `aws` CLI
//! - [`deployment_manager::DeploymentManagerBackend`] drives `gcloud`
//! - a recording mock is used in tests

pub mod cloudformation;
pub mod deployment_manager;
#[cfg(test)]
pub(crate) mod mock;

use crate::error::{Error, Result};
use crate::poller::Poller;
use crate::types::{Ack, DeclaredParameter, Operation, PollConfig, StackRequest, StackStatus, Template};
use serde::{Deserialize, Serialize};
use std::process::{Command, Output};

/// Provisioning capabilities shared by every provider.
pub trait Provisioner: Send + Sync {
    /// Short provider name for messages.
    fn provider(&self) -> &'static str;

    /// Submit a template for validation and return its declared parameters.
    fn validate(&self, template: &Template) -> Result<Vec<DeclaredParameter>>;

    /// Submit a create request.
    fn create(&self, request: &StackRequest) -> Result<Ack>;

    /// Submit a delete request.
    fn delete(&self, name: &str) -> Result<Ack>;

    /// Query the current status of a stack.
    fn describe(&self, name: &str) -> Result<StackStatus>;

    /// Block until `name` reaches `target` or a terminal failure.
    ///
    /// Uses the default polling budget; callers needing cancellation or a
    /// custom budget use [`Poller`] directly.
    fn wait_until_terminal(&self, name: &str, target: StackStatus) -> Result<()> {
        let operation = match target {
            StackStatus::DeleteComplete => Operation::Delete,
            _ => Operation::Create,
        };
        Poller::new(PollConfig::default())
            .wait(self, name, operation)
            .map(|_| ())
    }
}

/// Provider variants selectable at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// CloudFormation via the `aws` CLI
    #[default]
    Aws,
    /// Deployment Manager via the `gcloud` CLI
    Gcp,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Aws => f.write_str("aws"),
            Provider::Gcp => f.write_str("gcp"),
        }
    }
}

/// Build the backend for `provider`.
///
/// `region` applies to CloudFormation, `project` to Deployment Manager.
pub fn connect(
    provider: Provider,
    region: &str,
    project: Option<&str>,
) -> Result<Box<dyn Provisioner>> {
    match provider {
        Provider::Aws => Ok(Box::new(cloudformation::CloudFormationBackend::new(region)?)),
        Provider::Gcp => {
            let project = project.ok_or_else(|| Error::CommandFailed {
                message: "a gcp project is required for Deployment Manager".to_string(),
                stderr: String::new(),
            })?;
            Ok(Box::new(deployment_manager::DeploymentManagerBackend::new(
                project,
            )?))
        }
    }
}

/// Find an executable on PATH.
pub(crate) fn find_program(program: &str) -> Result<String> {
    let output = Command::new("which")
        .arg(program)
        .output()
        .map_err(|_| Error::CliNotFound {
            program: program.to_string(),
        })?;

    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Ok(path);
        }
    }

    Err(Error::CliNotFound {
        program: program.to_string(),
    })
}

/// Run a provider CLI and return its raw output.
pub(crate) fn run_cli(program: &str, args: &[&str]) -> Result<Output> {
    log::debug!("Running: {} {}", program, args.join(" "));
    Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::CommandFailed {
            message: format!("failed to execute {program}: {e}"),
            stderr: String::new(),
        })
}

/// Run a provider CLI and classify failures for `operation` on `name`.
pub(crate) fn run_cli_checked(
    program: &str,
    args: &[&str],
    operation: &str,
    name: &str,
) -> Result<String> {
    let output = run_cli(program, args)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::from_cli_output(&stderr, operation, name));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
