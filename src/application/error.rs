//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{ParseError, SessionError};

/// A parse failure together with the usage text of the command that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source}")]
pub struct UsageError {
    pub source: ParseError,
    pub usage: String,
}

impl UsageError {
    pub fn new(source: ParseError, usage: impl Into<String>) -> Self {
        Self {
            source,
            usage: usage.into(),
        }
    }
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Usage(#[from] UsageError),

    #[error("{message}")]
    Config { message: String },

    #[error("{0}")]
    Connection(SessionError),

    #[error("{0}")]
    Translation(SessionError),

    #[error("cannot read input: {}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Too many options is a configuration fault rather than user input.
    pub fn is_programming_limit(&self) -> bool {
        matches!(self, ApplicationError::Usage(u) if u.source.is_programming_limit())
    }
}

impl From<SessionError> for ApplicationError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Translation(_) => ApplicationError::Translation(e),
            _ => ApplicationError::Connection(e),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
