//! Remote session backed by an external client program
//!
//! Each `run` executes the configured backend once, passing the session's
//! connection settings as global flags, the accumulated `-z` variables and
//! the command with its arguments. Standard output is streamed to the
//! interface (`... key value` lines become tagged records), standard error
//! is classified into error records; network failures belong to the RPC
//! subsystem and mark the session as dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::application::services::SessionConfig;
use crate::domain::{CharSet, ErrorRecord, ErrorSet, SessionError, Severity, Subsystem};
use crate::infrastructure::traits::{CommandRunner, RemoteSession, StatRecord, UiSink};

const NETWORK_FAILURE_PATTERN: &str = r"(?i)(connect to server failed|tcp (connect|receive|send)|rpc ?transport|partner exited unexpectedly|connection (reset|refused|closed)|timed out|broken pipe)";

pub struct ProcessSession<'a> {
    runner: Arc<dyn CommandRunner>,
    backend: String,
    config: &'a SessionConfig,
    tagged: bool,
    network: Regex,
    connected: bool,
    dropped: bool,
    vars: Vec<(String, String)>,
    args: Vec<String>,
    errors: ErrorSet,
}

/// Locate `program` on `PATH`, or check it directly when it contains a separator.
fn resolve_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Render `name=value`, or `name` alone for an empty value.
fn assignment(name: &str, value: &str) -> String {
    if value.is_empty() {
        name.to_string()
    } else {
        format!("{name}={value}")
    }
}

impl<'a> ProcessSession<'a> {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        backend: impl Into<String>,
        config: &'a SessionConfig,
        tagged: bool,
    ) -> Result<Self, SessionError> {
        let network = Regex::new(NETWORK_FAILURE_PATTERN)
            .map_err(|e| SessionError::Io(format!("network pattern: {e}")))?;
        Ok(Self {
            runner,
            backend: backend.into(),
            config,
            tagged,
            network,
            connected: false,
            dropped: false,
            vars: Vec::new(),
            args: Vec::new(),
            errors: ErrorSet::new(),
        })
    }

    /// Connection flags shared by every invocation.
    fn global_args(&self) -> Vec<String> {
        let c = self.config;
        let mut args = vec!["-p".to_string(), c.port.clone()];
        let optional = [
            ("-u", &c.user),
            ("-c", &c.client),
            ("-H", &c.host),
            ("-L", &c.language),
        ];
        for (flag, value) in optional {
            if let Some(v) = value {
                args.push(flag.to_string());
                args.push(v.clone());
            }
        }
        if !c.charset.is_untranslated() {
            args.push("-C".into());
            args.push(c.charset.to_string());
        }
        if c.command_charset != c.charset {
            args.push("-Q".into());
            args.push(c.command_charset.to_string());
        }
        args.push("-d".into());
        args.push(c.cwd.display().to_string());
        args.push(format!("-zprog={}", c.program));
        args.push(format!("-zversion={}", c.version));
        if self.tagged && !c.variables.iter().any(|(name, _)| name == "tag") {
            args.push("-ztag".into());
        }
        for (name, value) in &c.protocol {
            args.push(format!("-Z{}", assignment(name, value)));
        }
        args
    }

    fn record(&mut self, record: ErrorRecord, ui: &mut dyn UiSink) {
        if record.subsystem == Subsystem::Rpc {
            self.dropped = true;
        }
        ui.error(&record);
        self.errors.push(record);
    }

    fn classify(&self, line: &str) -> ErrorRecord {
        if self.network.is_match(line) {
            return ErrorRecord::rpc(line);
        }
        match line.split_once(':') {
            Some(("warning", text)) => ErrorRecord::new(Subsystem::Server, Severity::Warn, text.trim()),
            Some(("fatal", text)) => ErrorRecord::new(Subsystem::Server, Severity::Fatal, text.trim()),
            _ => ErrorRecord::new(Subsystem::Server, Severity::Failed, line),
        }
    }

    fn stream_stdout(&self, command: &str, stdout: &str, ui: &mut dyn UiSink) {
        let mut record = StatRecord::new();
        for (n, line) in stdout.lines().enumerate() {
            ui.progress(command, n as u64 + 1, None);
            if let Some(field) = line.strip_prefix("... ") {
                let (key, value) = field.split_once(' ').unwrap_or((field, ""));
                record.push((key.to_string(), value.to_string()));
                continue;
            }
            if !record.is_empty() {
                ui.stat(&record);
                record.clear();
            }
            if !line.is_empty() {
                ui.message(Severity::Info, line);
            }
        }
        if !record.is_empty() {
            ui.stat(&record);
        }
    }
}

impl RemoteSession for ProcessSession<'_> {
    fn init(&mut self) -> Result<(), SessionError> {
        let path = resolve_program(&self.backend)
            .ok_or_else(|| SessionError::Connect(format!("backend '{}' not found", self.backend)))?;
        debug!("init: backend={} port={}", path.display(), self.config.port);
        self.connected = true;
        self.dropped = false;
        self.vars.clear();
        self.args.clear();
        Ok(())
    }

    fn set_var(&mut self, name: &str, value: &str) -> Result<(), SessionError> {
        let charset: CharSet = self.config.argument_charset;
        if !charset.encodes(value) {
            return Err(SessionError::Translation(format!(
                "'{value}' cannot be represented in {charset}"
            )));
        }
        if name.is_empty() {
            self.args.push(value.to_string());
        } else if name != "prog" && name != "version" {
            self.vars.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self, ui))]
    fn run(&mut self, command: &str, ui: &mut dyn UiSink) {
        let mut argv = self.global_args();
        argv.extend(
            self.vars
                .drain(..)
                .map(|(name, value)| format!("-z{}", assignment(&name, &value))),
        );
        argv.push(command.to_string());
        argv.append(&mut self.args);

        let env: Vec<(String, String)> = self
            .config
            .password
            .iter()
            .map(|p| ("P4PASSWD".to_string(), p.clone()))
            .collect();

        if !self.connected {
            warn!("run: session not initialized");
        }
        let output = match self.runner.run(&self.backend, &argv, &env) {
            Ok(output) => output,
            Err(e) => {
                let record = ErrorRecord::new(
                    Subsystem::Client,
                    Severity::Fatal,
                    format!("cannot run {}: {}", self.backend, e),
                );
                self.dropped = true;
                self.record(record, ui);
                return;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        self.stream_stdout(command, &stdout, ui);

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut failed = false;
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            let record = self.classify(line);
            failed |= record.severity >= Severity::Failed;
            self.record(record, ui);
        }
        if !output.status.success() && !failed {
            let code = output.status.code().unwrap_or(-1);
            let record = ErrorRecord::new(
                Subsystem::Client,
                Severity::Failed,
                format!("{} exited with status {}", self.backend, code),
            );
            self.record(record, ui);
        }
    }

    fn finalize(&mut self) -> (i32, ErrorSet) {
        self.connected = false;
        let errors = std::mem::take(&mut self.errors);
        let code = i32::from(errors.test());
        debug!("finalize: result={} errors={}", code, errors.count());
        (code, errors)
    }

    fn dropped(&self) -> bool {
        self.dropped
    }

    fn has_fatals(&self) -> bool {
        self.errors.has_fatal()
    }
}
