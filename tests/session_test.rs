//! Tests for ProcessSession with a scripted command runner
#![cfg(unix)]

use std::collections::HashMap;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use depot::application::services::{EnvironmentNegotiator, SessionConfig};
use depot::cli::{parse_command_line, Invocation};
use depot::domain::{ErrorRecord, SessionError, Severity, Subsystem};
use depot::infrastructure::enviro::LayeredEnviro;
use depot::infrastructure::session::ProcessSession;
use depot::infrastructure::traits::{CommandRunner, RemoteSession, StatRecord, UiSink};

// ============================================================
// Mocks
// ============================================================

#[derive(Debug, Clone)]
struct Call {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

/// Answers every run with the same output and records the call.
struct ScriptedRunner {
    stdout: String,
    stderr: String,
    code: i32,
    spawn_error: bool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRunner {
    fn new(stdout: &str, stderr: &str, code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            code,
            spawn_error: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn unspawnable() -> Self {
        Self {
            spawn_error: true,
            ..Self::new("", "", 0)
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &str, args: &[String], env: &[(String, String)]) -> io::Result<Output> {
        self.calls.lock().unwrap().push(Call {
            program: cmd.into(),
            args: args.to_vec(),
            env: env.to_vec(),
        });
        if self.spawn_error {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        Ok(Output {
            status: ExitStatus::from_raw(self.code << 8),
            stdout: self.stdout.clone().into_bytes(),
            stderr: self.stderr.clone().into_bytes(),
        })
    }
}

#[derive(Debug, Default)]
struct CollectingUi {
    messages: Vec<String>,
    stats: Vec<StatRecord>,
    errors: Vec<ErrorRecord>,
}

impl UiSink for CollectingUi {
    fn message(&mut self, _severity: Severity, text: &str) {
        self.messages.push(text.into());
    }

    fn stat(&mut self, record: &StatRecord) {
        self.stats.push(record.clone());
    }

    fn text(&mut self, data: &str) {
        self.messages.push(data.into());
    }

    fn error(&mut self, record: &ErrorRecord) {
        self.errors.push(record.clone());
    }

    fn input_data(&mut self) -> io::Result<String> {
        Ok(String::new())
    }
}

// ============================================================
// Helpers
// ============================================================

fn config_for(argv: &[&str]) -> SessionConfig {
    let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
    let mut cmd = match parse_command_line(&argv).unwrap() {
        Invocation::Run(cmd) => cmd,
        other => panic!("unexpected {other:?}"),
    };
    let mut provider = LayeredEnviro::with_env(HashMap::new(), None, None);
    EnvironmentNegotiator::new(&mut provider)
        .negotiate(&mut cmd.options, Path::new("/"))
        .unwrap()
}

/// An existing file standing in for the backend program.
fn backend() -> NamedTempFile {
    NamedTempFile::new().unwrap()
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Connection
// ============================================================

#[test]
fn given_missing_backend_when_initializing_then_connect_error() {
    // Arrange
    let config = config_for(&["info"]);
    let runner = Arc::new(ScriptedRunner::new("", "", 0));
    let mut session = ProcessSession::new(runner, "/nonexistent/dir/p4", &config, false).unwrap();

    // Act
    let result = session.init();

    // Assert
    assert!(matches!(result, Err(SessionError::Connect(_))));
}

#[test]
fn given_connection_settings_when_running_then_argv_carries_them_in_order() {
    // Arrange
    let program = backend();
    let program_path = program.path().to_string_lossy().into_owned();
    let config = config_for(&["-p", "srv:1666", "-u", "bob", "-c", "ws", "-H", "box", "fstat"]);
    let runner = Arc::new(ScriptedRunner::new("", "", 0));
    let mut session = ProcessSession::new(runner.clone(), program_path.clone(), &config, true).unwrap();
    let mut ui = CollectingUi::default();

    // Act
    session.init().unwrap();
    session.set_var("maxResults", "5").unwrap();
    session.set_var("prog", "ignored").unwrap();
    session.set_var("", "//depot/a").unwrap();
    session.run("fstat", &mut ui);

    // Assert
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, program_path);
    let version = format!("-zversion={}", env!("CARGO_PKG_VERSION"));
    let expected = strings(&[
        "-p", "srv:1666", "-u", "bob", "-c", "ws", "-H", "box", "-d", "/",
        "-zprog=depot", &version, "-ztag",
        "-Zapi=99999", "-ZenableStreams", "-ZenableGraph", "-ZexpandAndmaps",
        "-zmaxResults=5", "fstat", "//depot/a",
    ]);
    assert_eq!(calls[0].args, expected);
    assert!(calls[0].env.is_empty());
}

#[test]
fn given_password_when_running_then_passed_through_environment_only() {
    // Arrange
    let program = backend();
    let config = config_for(&["-P", "s3cret", "-H", "box", "info"]);
    let runner = Arc::new(ScriptedRunner::new("", "", 0));
    let mut session = ProcessSession::new(runner.clone(), program.path().to_string_lossy(), &config, false).unwrap();

    // Act
    session.init().unwrap();
    session.run("info", &mut CollectingUi::default());

    // Assert
    let call = &runner.calls()[0];
    assert_eq!(call.env, vec![("P4PASSWD".to_string(), "s3cret".to_string())]);
    assert!(!call.args.iter().any(|a| a.contains("s3cret")));
}

// ============================================================
// Output
// ============================================================

#[test]
fn given_tagged_output_when_running_then_records_and_messages_are_separated() {
    // Arrange
    let program = backend();
    let config = config_for(&["-H", "box", "fstat"]);
    let stdout = "... depotFile //depot/a\n... headRev 3\n\n... depotFile //depot/b\nplain line\n";
    let runner = Arc::new(ScriptedRunner::new(stdout, "", 0));
    let mut session = ProcessSession::new(runner, program.path().to_string_lossy(), &config, true).unwrap();
    let mut ui = CollectingUi::default();

    // Act
    session.init().unwrap();
    session.run("fstat", &mut ui);
    let (result, errors) = session.finalize();

    // Assert
    assert_eq!(ui.stats.len(), 2);
    assert_eq!(
        ui.stats[0],
        vec![
            ("depotFile".to_string(), "//depot/a".to_string()),
            ("headRev".to_string(), "3".to_string())
        ]
    );
    assert_eq!(ui.stats[1], vec![("depotFile".to_string(), "//depot/b".to_string())]);
    assert_eq!(ui.messages, vec!["plain line"]);
    assert_eq!(result, 0);
    assert_eq!(errors.count(), 0);
}

// ============================================================
// Error classification
// ============================================================

#[test]
fn given_network_failure_when_running_then_rpc_error_and_session_dropped() {
    // Arrange
    let program = backend();
    let config = config_for(&["-H", "box", "sync"]);
    let runner = Arc::new(ScriptedRunner::new("", "TCP connect to srv:1666 failed.\n", 1));
    let mut session = ProcessSession::new(runner, program.path().to_string_lossy(), &config, false).unwrap();
    let mut ui = CollectingUi::default();

    // Act
    session.init().unwrap();
    session.run("sync", &mut ui);

    // Assert
    assert!(session.dropped());
    let (result, errors) = session.finalize();
    assert_eq!(result, 1);
    assert_eq!(errors.count(), 1);
    assert!(errors.includes_subsystem(Subsystem::Rpc));
    assert_eq!(ui.errors.len(), 1);
}

#[test]
fn given_warning_only_when_running_then_result_is_success() {
    // Arrange
    let program = backend();
    let config = config_for(&["-H", "box", "sync"]);
    let runner = Arc::new(ScriptedRunner::new("", "warning: file(s) up-to-date.\n", 0));
    let mut session = ProcessSession::new(runner, program.path().to_string_lossy(), &config, false).unwrap();

    // Act
    session.init().unwrap();
    session.run("sync", &mut CollectingUi::default());
    let (result, errors) = session.finalize();

    // Assert
    assert_eq!(result, 0);
    let record = errors.at(0).unwrap();
    assert_eq!(record.severity, Severity::Warn);
    assert_eq!(record.text, "file(s) up-to-date.");
}

#[test]
fn given_nonzero_exit_without_stderr_when_running_then_client_failure_recorded() {
    // Arrange
    let program = backend();
    let config = config_for(&["-H", "box", "info"]);
    let runner = Arc::new(ScriptedRunner::new("", "", 3));
    let mut session = ProcessSession::new(runner, program.path().to_string_lossy(), &config, false).unwrap();

    // Act
    session.init().unwrap();
    session.run("info", &mut CollectingUi::default());
    let (result, errors) = session.finalize();

    // Assert
    assert_eq!(result, 1);
    let record = errors.at(0).unwrap();
    assert_eq!(record.subsystem, Subsystem::Client);
    assert!(record.text.ends_with("exited with status 3"));
    assert!(!session.dropped());
}

#[test]
fn given_spawn_failure_when_running_then_fatal_and_dropped() {
    // Arrange
    let program = backend();
    let config = config_for(&["-H", "box", "info"]);
    let runner = Arc::new(ScriptedRunner::unspawnable());
    let mut session = ProcessSession::new(runner, program.path().to_string_lossy(), &config, false).unwrap();

    // Act
    session.init().unwrap();
    session.run("info", &mut CollectingUi::default());

    // Assert
    assert!(session.dropped());
    assert!(session.has_fatals());
}

#[test]
fn given_argument_outside_latin1_when_setting_then_translation_error() {
    // Arrange
    let config = config_for(&["-Q", "iso8859-1", "-H", "box", "edit"]);
    let runner = Arc::new(ScriptedRunner::new("", "", 0));
    let mut session = ProcessSession::new(runner, "p4", &config, false).unwrap();

    // Act
    let accepted = session.set_var("", "café.txt");
    let rejected = session.set_var("", "日本.txt");

    // Assert
    assert!(accepted.is_ok());
    assert!(matches!(rejected, Err(SessionError::Translation(_))));
}
