//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Structured reasons a command line could not be parsed.
///
/// The payload is the offending option as the user typed it (without the
/// leading dash), so the message points at the exact token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid option: -{0}")]
    UnknownOption(String),

    #[error("option -{0} needs an argument")]
    MissingArgumentValue(String),

    #[error("option -{0} needs a non-negative integer argument")]
    NonNegativeArgumentRequired(String),

    #[error("option -{0} needs a flag and an argument")]
    TwoPartArgumentRequired(String),

    #[error("option -{0} does not take a value")]
    UnexpectedValue(String),

    #[error("too many options on command (limit {limit})")]
    TooManyOptions { limit: usize },

    #[error("{}", if *.extra { "unexpected arguments" } else { "missing/wrong number of arguments" })]
    WrongPositionalArgumentCount { count: usize, extra: bool },
}

impl ParseError {
    /// Capacity overflow is a configuration fault, not bad user input.
    pub fn is_programming_limit(&self) -> bool {
        matches!(self, ParseError::TooManyOptions { .. })
    }
}

/// Charset names and discovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CharsetError {
    #[error("unknown character set: {0}")]
    Unknown(String),

    #[error("could not discover a narrow character set from the environment")]
    DiscoveryFailed,
}

/// Failures reported by a remote session outside the accumulated error set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("connect to server failed: {0}")]
    Connect(String),

    #[error("translation of argument failed: {0}")]
    Translation(String),

    #[error("session I/O failed: {0}")]
    Io(String),
}
