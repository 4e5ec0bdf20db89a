//! Deployment Manager backend using `gcloud deployment-manager` commands.
//!
//! Deployments are created and deleted with `--async`; completion is
//! tracked by describing the deployment's latest operation.

use crate::backend::{Provisioner, find_program, run_cli_checked};
use crate::error::{Error, Result};
use crate::types::{Ack, DeclaredParameter, StackRequest, StackStatus, Template};
use std::io::Write;
use tempfile::NamedTempFile;

/// Backend that executes real `gcloud deployment-manager` commands.
pub struct DeploymentManagerBackend {
    /// Path to the gcloud executable
    gcloud_path: String,
    /// Project every deployment lives in
    project: String,
}

impl DeploymentManagerBackend {
    /// Create a backend for `project`.
    ///
    /// Returns an error if the `gcloud` CLI is not installed.
    pub fn new(project: impl Into<String>) -> Result<Self> {
        let gcloud_path = find_program("gcloud")?;
        Ok(Self {
            gcloud_path,
            project: project.into(),
        })
    }

    /// Run a `gcloud deployment-manager deployments` subcommand.
    fn run(&self, args: &[&str], operation: &str, name: &str) -> Result<String> {
        let mut full = vec!["deployment-manager", "deployments"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--project", self.project.as_str(), "--format", "json"]);
        run_cli_checked(&self.gcloud_path, &full, operation, name)
    }
}

/// gcloud only reads configs from files. The staged copy is removed when
/// the returned handle is dropped.
fn stage_config(template: &Template) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("furnace-")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(template.bytes())?;
    file.flush()?;
    Ok(file)
}

impl Provisioner for DeploymentManagerBackend {
    fn provider(&self) -> &'static str {
        "deployment-manager"
    }

    fn validate(&self, template: &Template) -> Result<Vec<DeclaredParameter>> {
        validate_config(template)
    }

    fn create(&self, request: &StackRequest) -> Result<Ack> {
        if !request.parameters.is_empty() {
            log::debug!(
                "Deployment Manager configs take no parameters; ignoring {}",
                request.parameters.len()
            );
        }

        let config = stage_config(&request.template)?;
        let config_arg = config.path().to_string_lossy().to_string();
        let stdout = self.run(
            &["create", request.name.as_str(), "--config", &config_arg, "--async"],
            "create",
            &request.name,
        )?;
        Ok(Ack::new(&request.name, operation_name(&stdout)))
    }

    fn delete(&self, name: &str) -> Result<Ack> {
        let stdout = self.run(&["delete", name, "--quiet", "--async"], "delete", name)?;
        Ok(Ack::new(name, operation_name(&stdout)))
    }

    fn describe(&self, name: &str) -> Result<StackStatus> {
        let stdout = self.run(&["describe", name], "describe", name)?;
        let json: serde_json::Value = serde_json::from_str(&stdout)?;
        Ok(status_from_describe(&json))
    }
}

/// Check a Deployment Manager config locally.
///
/// There is no server-side validate call; a config must be YAML with a
/// non-empty `resources` list. Configs declare no parameters.
fn validate_config(template: &Template) -> Result<Vec<DeclaredParameter>> {
    let body = template.as_str()?;
    let config: serde_yaml::Value = serde_yaml::from_str(body).map_err(|e| Error::Validation {
        message: e.to_string(),
    })?;

    let has_resources = config
        .get("resources")
        .and_then(serde_yaml::Value::as_sequence)
        .is_some_and(|r| !r.is_empty());
    if !has_resources {
        return Err(Error::Validation {
            message: "config must declare a non-empty 'resources' list".to_string(),
        });
    }

    Ok(Vec::new())
}

/// Translate the latest deployment operation into a stack status.
///
/// `operation_type` is `insert` or `delete`; `status` is one of `PENDING`,
/// `RUNNING`, `DONE`. A `DONE` operation carrying errors is a failure.
pub fn map_operation(operation_type: &str, status: &str, has_errors: bool) -> StackStatus {
    match (operation_type, status) {
        ("insert", "PENDING" | "RUNNING") => StackStatus::CreateInProgress,
        ("insert", "DONE") if has_errors => StackStatus::CreateFailed,
        ("insert", "DONE") => StackStatus::CreateComplete,
        ("delete", "PENDING" | "RUNNING") => StackStatus::DeleteInProgress,
        ("delete", "DONE") if has_errors => StackStatus::DeleteFailed,
        ("delete", "DONE") => StackStatus::DeleteComplete,
        _ => StackStatus::Unknown,
    }
}

/// Extract the status from `deployments describe` JSON.
///
/// gcloud nests the deployment under `deployment` together with its
/// `resources`; older releases print the deployment itself.
fn status_from_describe(json: &serde_json::Value) -> StackStatus {
    let deployment = json.get("deployment").unwrap_or(json);
    let operation = &deployment["operation"];

    let operation_type = operation["operationType"].as_str().unwrap_or_default();
    let status = operation["status"].as_str().unwrap_or_default();
    let has_errors = operation["error"]["errors"]
        .as_array()
        .is_some_and(|e| !e.is_empty());

    map_operation(operation_type, status, has_errors)
}

/// Operation name from an `--async` create/delete response, if any.
fn operation_name(stdout: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(stdout).ok()?;
    let operation = json.as_array().and_then(|a| a.first()).unwrap_or(&json);
    operation["name"].as_str().map(str::to_string)
}
