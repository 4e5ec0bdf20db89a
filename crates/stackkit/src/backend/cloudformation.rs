//! CloudFormation backend using `aws cloudformation` commands.

use crate::backend::{Provisioner, find_program, run_cli_checked};
use crate::error::{Error, Result};
use crate::types::{Ack, DeclaredParameter, StackRequest, StackStatus, Template};
use serde::Deserialize;

/// Backend that executes real `aws cloudformation` commands.
pub struct CloudFormationBackend {
    /// Path to the aws executable
    aws_path: String,
    /// Region every call is pinned to
    region: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ValidateTemplateOutput {
    #[serde(default)]
    parameters: Vec<TemplateParameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TemplateParameter {
    parameter_key: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateStackOutput {
    #[serde(default)]
    stack_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksOutput {
    #[serde(default)]
    stacks: Vec<StackSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackSummary {
    stack_status: String,
}

impl CloudFormationBackend {
    /// Create a backend for `region`.
    ///
    /// Returns an error if the `aws` CLI is not installed.
    pub fn new(region: impl Into<String>) -> Result<Self> {
        let aws_path = find_program("aws")?;
        Ok(Self {
            aws_path,
            region: region.into(),
        })
    }

    /// Run an `aws cloudformation` subcommand with region and JSON output.
    fn run(&self, args: &[&str], operation: &str, name: &str) -> Result<String> {
        let mut full = vec!["cloudformation"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--region", self.region.as_str(), "--output", "json"]);
        run_cli_checked(&self.aws_path, &full, operation, name)
    }
}

impl Provisioner for CloudFormationBackend {
    fn provider(&self) -> &'static str {
        "cloudformation"
    }

    fn validate(&self, template: &Template) -> Result<Vec<DeclaredParameter>> {
        let body = template.as_str()?;
        let stdout = self.run(&["validate-template", "--template-body", body], "validate", "")?;
        parse_validate_output(&stdout)
    }

    fn create(&self, request: &StackRequest) -> Result<Ack> {
        let body = request.template.as_str()?;
        let parameters = serde_json::to_string(&request.parameters)?;
        let mut args = vec![
            "create-stack",
            "--stack-name",
            request.name.as_str(),
            "--template-body",
            body,
        ];
        if !request.parameters.is_empty() {
            args.extend_from_slice(&["--parameters", parameters.as_str()]);
        }

        let stdout = self.run(&args, "create", &request.name)?;
        let output: CreateStackOutput = serde_json::from_str(&stdout)?;
        Ok(Ack::new(&request.name, output.stack_id))
    }

    fn delete(&self, name: &str) -> Result<Ack> {
        // delete-stack prints nothing on success
        self.run(&["delete-stack", "--stack-name", name], "delete", name)?;
        Ok(Ack::new(name, None))
    }

    fn describe(&self, name: &str) -> Result<StackStatus> {
        let stdout = self.run(&["describe-stacks", "--stack-name", name], "describe", name)?;
        parse_describe_output(&stdout, name)
    }
}

/// Translate a CloudFormation stack status.
///
/// Rollback states only follow a failed create, so they count as
/// `CREATE_FAILED`.
pub fn map_status(native: &str) -> StackStatus {
    match native {
        "CREATE_IN_PROGRESS" => StackStatus::CreateInProgress,
        "CREATE_COMPLETE" => StackStatus::CreateComplete,
        "CREATE_FAILED" => StackStatus::CreateFailed,
        "ROLLBACK_IN_PROGRESS" | "ROLLBACK_COMPLETE" | "ROLLBACK_FAILED" => {
            StackStatus::CreateFailed
        }
        "DELETE_IN_PROGRESS" => StackStatus::DeleteInProgress,
        "DELETE_COMPLETE" => StackStatus::DeleteComplete,
        "DELETE_FAILED" => StackStatus::DeleteFailed,
        _ => StackStatus::Unknown,
    }
}

fn parse_validate_output(stdout: &str) -> Result<Vec<DeclaredParameter>> {
    let output: ValidateTemplateOutput = serde_json::from_str(stdout)?;
    Ok(output
        .parameters
        .into_iter()
        .map(|p| DeclaredParameter {
            key: p.parameter_key,
            description: p.description.unwrap_or_default(),
            default: p.default_value,
        })
        .collect())
}

fn parse_describe_output(stdout: &str, name: &str) -> Result<StackStatus> {
    let output: DescribeStacksOutput = serde_json::from_str(stdout)?;
    output
        .stacks
        .first()
        .map(|s| map_status(&s.stack_status))
        .ok_or_else(|| Error::StackNotFound {
            name: name.to_string(),
        })
}
