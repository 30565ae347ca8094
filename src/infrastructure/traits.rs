//! I/O boundary traits for testability
//!
//! These traits abstract the remote session, terminal output, configuration
//! lookup and process execution, allowing the dispatcher and negotiator to
//! be tested with mock implementations.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::Output;

use crate::domain::{ErrorRecord, ErrorSet, SessionError, Severity};

/// One tagged record: ordered `(key, value)` fields.
pub type StatRecord = Vec<(String, String)>;

/// Connection to the server, one command per `run`.
pub trait RemoteSession {
    /// Open the connection.
    fn init(&mut self) -> Result<(), SessionError>;

    /// Set a variable for the next `run`; an empty name appends a command argument.
    fn set_var(&mut self, name: &str, value: &str) -> Result<(), SessionError>;

    /// Execute one command, streaming output and errors to `ui`.
    fn run(&mut self, command: &str, ui: &mut dyn UiSink);

    /// Close the connection; returns the result code and every error seen.
    fn finalize(&mut self) -> (i32, ErrorSet);

    /// The connection was lost.
    fn dropped(&self) -> bool;

    /// A fatal error was recorded.
    fn has_fatals(&self) -> bool;
}

/// Destination of everything a command produces.
pub trait UiSink {
    /// Untagged output line.
    fn message(&mut self, severity: Severity, text: &str);

    /// Tagged record.
    fn stat(&mut self, record: &StatRecord);

    /// Raw text (file content).
    fn text(&mut self, data: &str);

    /// Error raised by the session.
    fn error(&mut self, record: &ErrorRecord);

    /// Data piped to the client, read on first use.
    fn input_data(&mut self) -> io::Result<String>;

    /// Progress update; callable from a collaborator's callback.
    fn progress(&self, _description: &str, _position: u64, _total: Option<u64>) {}

    /// Called once when the run is over.
    fn finished(&mut self, _exit_code: i32) {}
}

/// Line-oriented input for batch modes.
pub trait LineSource {
    /// Read the next line into `buf` (replacing its content); false at end of input.
    fn read_line(&mut self, buf: &mut String) -> io::Result<bool>;
}

impl<R: BufRead> LineSource for R {
    fn read_line(&mut self, buf: &mut String) -> io::Result<bool> {
        buf.clear();
        let n = BufRead::read_line(self, buf)?;
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(n > 0)
    }
}

/// Layered `NAME=value` configuration (enviro file, config files, process env).
pub trait ConfigProvider {
    fn get(&self, name: &str) -> Option<String>;

    /// Override a value for the rest of the run.
    fn update(&mut self, name: &str, value: &str);

    /// Discover configuration files from `cwd` upwards.
    fn load(&mut self, cwd: &Path) -> io::Result<()>;

    /// Config file found by the last `load`, if any.
    fn config_file(&self) -> Option<PathBuf> {
        None
    }
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with arguments and extra environment variables.
    fn run(&self, cmd: &str, args: &[String], env: &[(String, String)]) -> io::Result<Output>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[String], env: &[(String, String)]) -> io::Result<Output> {
        std::process::Command::new(cmd)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(std::process::Stdio::null())
            .output()
    }
}
