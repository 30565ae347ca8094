//! CLI layer: client grammar, command execution and terminal output

pub mod args;
pub mod commands;
pub mod error;
pub mod output;

pub use commands::{execute, parse_command_line, Invocation};
pub use error::{CliError, CliResult};
