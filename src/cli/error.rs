//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::{ApplicationError, UsageError};
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(#[from] UsageError),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::Usage(u) => CliError::Usage(u),
            other => CliError::Infra(InfraError::Application(other)),
        }
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Every failure maps to the same small code; the message says what went wrong.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) | CliError::Infra(_) => crate::exitcode::FAILURE,
        }
    }

    /// Option capacity ran out: the client is misconfigured, not misused.
    pub fn is_programming_limit(&self) -> bool {
        match self {
            CliError::Usage(u) => u.source.is_programming_limit(),
            CliError::Infra(InfraError::Application(e)) => e.is_programming_limit(),
            CliError::Infra(_) => false,
        }
    }

    /// Usage text to print after the error message, if any.
    pub fn usage(&self) -> Option<&str> {
        match self {
            CliError::Usage(_) if self.is_programming_limit() => None,
            CliError::Usage(u) => Some(u.usage.as_str()),
            CliError::Infra(_) => None,
        }
    }

    /// The line printed for this error.
    pub fn message(&self) -> String {
        if self.is_programming_limit() {
            format!("internal limit reached: {self}")
        } else {
            self.to_string()
        }
    }
}
