//! Core types for stack lifecycle management.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Common stack status vocabulary.
///
/// Each backend translates its provider-native statuses into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackStatus {
    /// Create submitted, resources still being provisioned
    CreateInProgress,
    /// Create finished successfully
    CreateComplete,
    /// Create failed (includes provider-side rollback)
    CreateFailed,
    /// Delete submitted, resources still being removed
    DeleteInProgress,
    /// Delete finished successfully
    DeleteComplete,
    /// Delete failed
    DeleteFailed,
    /// Anything the backend could not map
    Unknown,
}

impl StackStatus {
    /// Get the canonical upper-snake name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            StackStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            StackStatus::CreateComplete => "CREATE_COMPLETE",
            StackStatus::CreateFailed => "CREATE_FAILED",
            StackStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            StackStatus::DeleteComplete => "DELETE_COMPLETE",
            StackStatus::DeleteFailed => "DELETE_FAILED",
            StackStatus::Unknown => "UNKNOWN",
        }
    }

    /// Whether no further transition happens without a new operation.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            StackStatus::CreateInProgress | StackStatus::DeleteInProgress | StackStatus::Unknown
        )
    }

    /// Whether this is a terminal failure status.
    pub fn is_failure(&self) -> bool {
        matches!(self, StackStatus::CreateFailed | StackStatus::DeleteFailed)
    }

    /// Whether this is a terminal success status.
    pub fn is_success(&self) -> bool {
        matches!(self, StackStatus::CreateComplete | StackStatus::DeleteComplete)
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle operation submitted to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Create a new stack
    Create,
    /// Delete an existing stack
    Delete,
}

impl Operation {
    /// The status that marks this operation as successfully finished.
    pub fn target_status(&self) -> StackStatus {
        match self {
            Operation::Create => StackStatus::CreateComplete,
            Operation::Delete => StackStatus::DeleteComplete,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// Raw template body as loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    body: Vec<u8>,
}

impl Template {
    /// Wrap raw template bytes.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }

    /// Raw bytes of the template.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Template body as text. Providers only accept UTF-8 documents.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.body).map_err(|e| Error::Validation {
            message: format!("template is not valid UTF-8: {e}"),
        })
    }
}

/// A named input slot discovered by template validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredParameter {
    /// Parameter key as declared in the template
    pub key: String,
    /// Human-readable description (may be empty)
    pub description: String,
    /// Default value, if the template declares one
    pub default: Option<String>,
}

impl DeclaredParameter {
    /// Create a parameter without a default.
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            default: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A concrete value for one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedParameter {
    /// Parameter key
    #[serde(rename = "ParameterKey")]
    pub key: String,
    /// Value submitted to the provider
    #[serde(rename = "ParameterValue")]
    pub value: String,
}

impl ResolvedParameter {
    /// Create a resolved parameter.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Everything a provider needs to create a stack.
#[derive(Debug, Clone)]
pub struct StackRequest {
    /// Stack (deployment) name
    pub name: String,
    /// Template the stack is instantiated from
    pub template: Template,
    /// Resolved parameters, in declaration order
    pub parameters: Vec<ResolvedParameter>,
}

/// Provider acknowledgement of a create or delete submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Stack name the submission was made for
    pub name: String,
    /// Provider identifier (stack id, operation name), when returned
    pub id: Option<String>,
}

impl Ack {
    /// Create an acknowledgement.
    pub fn new(name: impl Into<String>, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Pick the stack name: an explicit, non-blank name wins over the default.
pub fn stack_name(explicit: Option<&str>, default: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Configuration for retrying transient provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        // NaN and negative products fall back to the cap and zero
        let capped = delay.min(self.max_delay.as_secs_f64()).max(0.0);
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Budget for waiting on an in-flight operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Pause between status samples
    pub interval: Duration,
    /// Maximum number of status samples
    pub max_attempts: u32,
    /// Overall deadline, measured from the start of polling
    pub timeout: Option<Duration>,
    /// Retry policy for transient describe failures
    pub retry: RetryConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 360,
            timeout: Some(Duration::from_secs(60 * 60)),
            retry: RetryConfig::default(),
        }
    }
}
