//! Error types for stack lifecycle operations.
//!
//! Errors are categorized so the poller knows what to retry and the
//! orchestrator can report which kind of failure ended a run.

use crate::types::StackStatus;
use thiserror::Error;

/// Categories of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Template rejected by the provider
    Validation,
    /// Create or delete request rejected
    Submission,
    /// Recoverable query failure (throttling, timeouts, connectivity)
    Transient,
    /// Provider reported the operation as failed
    TerminalFailure,
    /// Stack or deployment does not exist
    NotFound,
    /// Polling budget or deadline used up
    Exhausted,
    /// Operator aborted the wait
    Cancelled,
    /// Interactive input could not be read
    Input,
    /// Provider CLI missing or misbehaving
    Provider,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Template rejected",
            Self::Submission => "Request rejected",
            Self::Transient => "Temporary provider failure",
            Self::TerminalFailure => "Operation failed",
            Self::NotFound => "Stack not found",
            Self::Exhausted => "Gave up waiting",
            Self::Cancelled => "Cancelled",
            Self::Input => "Input unavailable",
            Self::Provider => "Provider CLI error",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Validation => "Fix the template and run the command again",
            Self::Submission => "Check credentials, quotas and whether the stack already exists",
            Self::Transient => "Check your connection and try again",
            Self::TerminalFailure => "Inspect the stack events in the provider console",
            Self::NotFound => "Check the stack name and region/project",
            Self::Exhausted => "The operation may still be running; check its status later",
            Self::Cancelled => "The operation may still be running; check its status later",
            Self::Input => "Run the command from an interactive terminal",
            Self::Provider => "Install and configure the provider CLI",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while driving a stack lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    /// Template rejected (malformed syntax, unresolvable reference, ...)
    #[error("template validation failed: {message}")]
    Validation {
        /// Provider's rejection message
        message: String,
    },

    /// Create or delete call rejected
    #[error("{operation} request rejected: {message}")]
    Submission {
        /// Which call was rejected
        operation: String,
        /// Provider's rejection message
        message: String,
    },

    /// Recoverable failure while querying status
    #[error("transient provider error: {message}")]
    Transient {
        /// Details from the failed query
        message: String,
    },

    /// Provider reports the operation failed
    #[error("stack {name} reached {status}")]
    TerminalFailure {
        /// Stack name
        name: String,
        /// Failure status observed
        status: StackStatus,
    },

    /// Stack does not exist
    #[error("stack not found: {name}")]
    StackNotFound {
        /// Stack name
        name: String,
    },

    /// Poll attempts or deadline exhausted before a terminal status
    #[error("gave up on {name} after {attempts} status checks (last status {last_status})")]
    BudgetExhausted {
        /// Stack name
        name: String,
        /// Number of status samples taken
        attempts: u32,
        /// Last status observed
        last_status: StackStatus,
    },

    /// Wait aborted through the cancel token
    #[error("cancelled while waiting for {name}")]
    Cancelled {
        /// Stack name
        name: String,
    },

    /// Interactive input failed
    #[error("could not read parameter input: {0}")]
    Input(#[source] std::io::Error),

    /// Provider CLI not installed
    #[error("{program} not found in PATH")]
    CliNotFound {
        /// Executable that was looked up
        program: String,
    },

    /// Provider CLI invocation failed in an unrecognized way
    #[error("command failed: {message}")]
    CommandFailed {
        /// What was being run
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Submission { .. } => ErrorCategory::Submission,
            Error::Transient { .. } => ErrorCategory::Transient,
            Error::TerminalFailure { .. } => ErrorCategory::TerminalFailure,
            Error::StackNotFound { .. } => ErrorCategory::NotFound,
            Error::BudgetExhausted { .. } => ErrorCategory::Exhausted,
            Error::Cancelled { .. } => ErrorCategory::Cancelled,
            Error::Input(_) => ErrorCategory::Input,
            Error::CliNotFound { .. } | Error::CommandFailed { .. } => ErrorCategory::Provider,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Classify stderr of a failed provider CLI call.
    ///
    /// `operation` names the call ("validate", "create", "delete",
    /// "describe") and decides what a generic rejection turns into. Only a
    /// describe can be transient or report a missing stack; the other calls
    /// are rejections of the request itself.
    pub fn from_cli_output(stderr: &str, operation: &str, name: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let message = stderr.trim().to_string();

        if operation == "describe" {
            if is_transient(&stderr_lower) {
                return Error::Transient { message };
            }
            if is_not_found(&stderr_lower) {
                return Error::StackNotFound {
                    name: name.to_string(),
                };
            }
        }

        match operation {
            "validate" => Error::Validation { message },
            "create" | "delete" => Error::Submission {
                operation: operation.to_string(),
                message,
            },
            _ => Error::CommandFailed {
                message: format!("{operation} failed for {name}"),
                stderr: message,
            },
        }
    }
}

// aws: Throttling / RequestLimitExceeded; gcloud: RATE_LIMIT_EXCEEDED, 503s
fn is_transient(stderr_lower: &str) -> bool {
    const PATTERNS: &[&str] = &[
        "(throttling)",
        "rate exceeded",
        "requestlimitexceeded",
        "rate_limit_exceeded",
        "ratelimitexceeded",
        "connection reset",
        "connection refused",
        "could not connect",
        "connect timeout",
        "read timeout",
        "temporarily unavailable",
        "service unavailable",
        "serviceunavailable",
        "code=503",
    ];
    PATTERNS.iter().any(|p| stderr_lower.contains(p))
        || (stderr_lower.contains("connection") && stderr_lower.contains("timed out"))
}

// aws: "Stack with id web does not exist"; gcloud: "NOT_FOUND: ... is not
// found" or "ResponseError: code=404"
fn is_not_found(stderr_lower: &str) -> bool {
    const PATTERNS: &[&str] = &[
        "does not exist",
        "was not found",
        "is not found",
        "not_found",
        "notfound",
        "code=404",
    ];
    PATTERNS.iter().any(|p| stderr_lower.contains(p))
}

/// Result type for stack operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::Validation.is_retryable());
        assert!(!ErrorCategory::TerminalFailure.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
    }

    #[test]
    fn test_from_cli_output_throttling() {
        let err = Error::from_cli_output(
            "An error occurred (Throttling) when calling the DescribeStacks operation: Rate exceeded",
            "describe",
            "web",
        );
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_cli_output_not_found() {
        let err = Error::from_cli_output(
            "An error occurred (ValidationError) when calling the DescribeStacks operation: Stack with id web does not exist",
            "describe",
            "web",
        );
        assert!(matches!(err, Error::StackNotFound { ref name } if name == "web"));
    }

    #[test]
    fn test_from_cli_output_validation() {
        let err = Error::from_cli_output(
            "An error occurred (ValidationError) when calling the ValidateTemplate operation: Invalid template property or properties [Foo]",
            "validate",
            "web",
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_from_cli_output_submission() {
        let err = Error::from_cli_output(
            "An error occurred (AlreadyExistsException) when calling the CreateStack operation: Stack [web] already exists",
            "create",
            "web",
        );
        assert!(matches!(err, Error::Submission { ref operation, .. } if operation == "create"));
    }

    #[test]
    fn test_from_cli_output_gcloud_not_found() {
        let err = Error::from_cli_output(
            "ERROR: (gcloud.deployment-manager.deployments.describe) NOT_FOUND: The object 'projects/p/global/deployments/web' is not found.",
            "describe",
            "web",
        );
        assert!(matches!(err, Error::StackNotFound { ref name } if name == "web"));

        let err = Error::from_cli_output(
            "ERROR: (gcloud.deployment-manager.deployments.describe) ResponseError: code=404, message=The object 'projects/p/global/deployments/web' is not found.",
            "describe",
            "web",
        );
        assert!(matches!(err, Error::StackNotFound { .. }));
    }

    #[test]
    fn test_from_cli_output_gcloud_rate_limit() {
        let err = Error::from_cli_output(
            "ERROR: (gcloud.deployment-manager.deployments.describe) RATE_LIMIT_EXCEEDED: Quota exceeded",
            "describe",
            "web",
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_cli_output_missing_parameter_value_is_submission() {
        let err = Error::from_cli_output(
            "An error occurred (ValidationError) when calling the CreateStack operation: Parameter validation failed: parameter value ops for parameter name KeyName does not exist",
            "create",
            "web",
        );
        assert_eq!(err.category(), ErrorCategory::Submission);
    }

    #[test]
    fn test_from_cli_output_timeout_property_is_not_transient() {
        let err = Error::from_cli_output(
            "An error occurred (ValidationError) when calling the ValidateTemplate operation: Invalid template property Timeout",
            "validate",
            "web",
        );
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = Error::from_cli_output(
            "An error occurred (ValidationError) when calling the CreateStack operation: Parameters: [HealthCheckTimeout] must have values; internal error count 0",
            "create",
            "web",
        );
        assert_eq!(err.category(), ErrorCategory::Submission);
    }

    #[test]
    fn test_from_cli_output_unrecognized_describe() {
        let err = Error::from_cli_output("AccessDenied", "describe", "web");
        assert_eq!(err.category(), ErrorCategory::Provider);
    }
}
