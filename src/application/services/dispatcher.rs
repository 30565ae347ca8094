//! Command dispatch with batching and bounded retry
//!
//! ```text
//! Idle -> Connecting -> Running -> Closing -> Done
//!              ^                      |
//!              +---- RetryPending <---+   (RPC failure, budget left)
//! ```
//!
//! A failed `init` is terminal. After `finalize`, a non-zero result whose
//! errors include the RPC subsystem is retried while the budget lasts; the
//! same options, interface and input lines are used again.

use std::path::PathBuf;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::application::services::negotiator::SessionConfig;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{ErrorSet, ExecutionBatch, RetryBudget, Subsystem};
use crate::exitcode;
use crate::infrastructure::traits::{LineSource, RemoteSession, UiSink};

/// Command run when no positional argument is given.
pub const DEFAULT_COMMAND: &str = "help";

/// Positional that turns file-batch mode into one command per line.
pub const RUN_KEYWORD: &str = "run";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Connecting,
    Running,
    Closing,
    RetryPending,
    Done,
}

/// Where extra arguments come from.
pub enum BatchInput {
    /// All positionals form one invocation.
    SingleShot,
    /// `-x file`
    File {
        path: PathBuf,
        source: Box<dyn LineSource>,
    },
    /// `-x -`: data buffered by the interface.
    Piped,
}

impl std::fmt::Debug for BatchInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchInput::SingleShot => f.write_str("SingleShot"),
            BatchInput::File { path, .. } => write!(f, "File({})", path.display()),
            BatchInput::Piped => f.write_str("Piped"),
        }
    }
}

/// Outcome of one dispatcher run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub exit_code: i32,
    pub retries_used: u32,
    pub invocations: usize,
    pub errors: ErrorSet,
}

/// Input lines read so far; replayed on retry.
struct LineCache {
    input: BatchInput,
    lines: Vec<String>,
    exhausted: bool,
}

impl LineCache {
    fn new(input: BatchInput) -> Self {
        Self {
            input,
            lines: Vec::new(),
            exhausted: false,
        }
    }

    fn line(&mut self, index: usize, ui: &mut dyn UiSink) -> ApplicationResult<Option<String>> {
        while index >= self.lines.len() && !self.exhausted {
            match &mut self.input {
                BatchInput::SingleShot => self.exhausted = true,
                BatchInput::Piped => {
                    let data = ui.input_data().map_err(|e| ApplicationError::OperationFailed {
                        context: "read piped input".into(),
                        source: Box::new(e),
                    })?;
                    self.lines.extend(data.lines().map(|l| l.trim_end_matches('\r').to_string()));
                    self.exhausted = true;
                }
                BatchInput::File { path, source } => {
                    let mut buf = String::new();
                    if source.read_line(&mut buf).with_input_path(path)? {
                        self.lines.push(buf);
                    } else {
                        self.exhausted = true;
                    }
                }
            }
        }
        Ok(self.lines.get(index).cloned())
    }
}

/// Splits input lines into words; double quotes group.
#[derive(Debug, Clone)]
pub struct WordSplitter {
    re: Regex,
}

impl WordSplitter {
    pub fn new() -> ApplicationResult<Self> {
        let re = Regex::new(r#""([^"]*)"|(\S+)"#).map_err(|e| ApplicationError::OperationFailed {
            context: "compile word pattern".into(),
            source: Box::new(e),
        })?;
        Ok(Self { re })
    }

    pub fn split(&self, line: &str) -> Vec<String> {
        self.re
            .captures_iter(line)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Drives one command through connect, run, close and retry.
pub struct CommandDispatcher<'a> {
    session: Box<dyn RemoteSession + 'a>,
    config: &'a SessionConfig,
    splitter: WordSplitter,
    state: DispatchState,
    budget: RetryBudget,
    invocations: usize,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(session: Box<dyn RemoteSession + 'a>, config: &'a SessionConfig) -> ApplicationResult<Self> {
        Ok(Self {
            session,
            config,
            splitter: WordSplitter::new()?,
            state: DispatchState::Idle,
            budget: RetryBudget::new(config.retries),
            invocations: 0,
        })
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    fn stopped(&self) -> bool {
        self.session.dropped() || self.session.has_fatals()
    }

    /// Send variables and arguments, then run `command`.
    fn invoke(&mut self, command: &str, args: &[String], ui: &mut dyn UiSink) -> ApplicationResult<()> {
        for (name, value) in &self.config.variables {
            self.session.set_var(name, value)?;
        }
        for arg in args {
            self.session.set_var("", arg)?;
        }
        debug!("invoke: command={} args={}", command, args.len());
        self.session.run(command, ui);
        self.invocations += 1;
        Ok(())
    }

    fn run_single(&mut self, command: &str, fixed: &[String], ui: &mut dyn UiSink) -> ApplicationResult<()> {
        self.invoke(command, fixed, ui)
    }

    /// Fixed arguments plus up to `batch_size` lines per invocation.
    fn run_batched(
        &mut self,
        command: &str,
        fixed: &[String],
        lines: &mut LineCache,
        ui: &mut dyn UiSink,
    ) -> ApplicationResult<()> {
        let mut batch = ExecutionBatch::new();
        let mut index = 0;
        while !self.stopped() {
            let Some(line) = lines.line(index, ui)? else {
                break;
            };
            index += 1;
            let words = self.splitter.split(&line);
            if words.is_empty() {
                continue;
            }
            batch.push_line(words);
            if batch.is_full(self.config.batch_size) {
                let args: Vec<String> = fixed.iter().cloned().chain(batch.take()).collect();
                self.invoke(command, &args, ui)?;
            }
        }
        if !batch.is_empty() && !self.stopped() {
            let args: Vec<String> = fixed.iter().cloned().chain(batch.take()).collect();
            self.invoke(command, &args, ui)?;
        }
        Ok(())
    }

    /// Every non-blank line is its own command.
    fn run_each_line(&mut self, lines: &mut LineCache, ui: &mut dyn UiSink) -> ApplicationResult<()> {
        let mut index = 0;
        while !self.stopped() {
            let Some(line) = lines.line(index, ui)? else {
                break;
            };
            index += 1;
            let words = self.splitter.split(&line);
            if let Some((command, args)) = words.split_first() {
                self.invoke(command, args, ui)?;
            }
        }
        Ok(())
    }

    fn run_once(&mut self, positionals: &[String], lines: &mut LineCache, ui: &mut dyn UiSink) -> ApplicationResult<()> {
        let (command, fixed) = match positionals.split_first() {
            Some((c, rest)) if !c.is_empty() => (c.as_str(), rest),
            _ => (DEFAULT_COMMAND, &positionals[positionals.len().min(1)..]),
        };
        if matches!(lines.input, BatchInput::SingleShot) {
            self.run_single(command, fixed, ui)
        } else if command == RUN_KEYWORD && fixed.is_empty() {
            self.run_each_line(lines, ui)
        } else {
            self.run_batched(command, fixed, lines, ui)
        }
    }

    /// Run the state machine to completion.
    #[instrument(level = "debug", skip_all, fields(input = ?input))]
    pub fn dispatch(
        &mut self,
        positionals: &[String],
        input: BatchInput,
        ui: &mut dyn UiSink,
    ) -> ApplicationResult<DispatchReport> {
        let mut lines = LineCache::new(input);
        self.state = DispatchState::Connecting;
        loop {
            match self.state {
                DispatchState::Idle | DispatchState::Connecting => {
                    if let Err(e) = self.session.init() {
                        self.state = DispatchState::Done;
                        return Err(ApplicationError::Connection(e));
                    }
                    self.state = DispatchState::Running;
                }
                DispatchState::Running => {
                    let outcome = self.run_once(positionals, &mut lines, ui);
                    if let Err(e) = outcome {
                        // errors already reached the interface while running
                        let (result, errors) = self.session.finalize();
                        debug!("dispatch: aborted result={} errors={}", result, errors.count());
                        self.state = DispatchState::Done;
                        return Err(e);
                    }
                    self.state = DispatchState::Closing;
                }
                DispatchState::Closing => {
                    let (result, errors) = self.session.finalize();
                    let retryable = result != 0 && errors.includes_subsystem(Subsystem::Rpc);
                    if retryable && self.budget.try_consume() {
                        warn!(
                            "dispatch: RPC failure, retry {}/{}",
                            self.budget.used(),
                            self.budget.allowed()
                        );
                        self.state = DispatchState::RetryPending;
                        continue;
                    }
                    self.state = DispatchState::Done;
                    let exit_code = if result == 0 { exitcode::OK } else { exitcode::FAILURE };
                    info!(
                        "dispatch: done exit={} invocations={} retries={}",
                        exit_code,
                        self.invocations,
                        self.budget.used()
                    );
                    return Ok(DispatchReport {
                        exit_code,
                        retries_used: self.budget.used(),
                        invocations: self.invocations,
                        errors,
                    });
                }
                DispatchState::RetryPending => {
                    self.state = DispatchState::Connecting;
                }
                DispatchState::Done => {
                    return Err(ApplicationError::OperationFailed {
                        context: "dispatch".into(),
                        source: "dispatcher already finished".into(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_quoted_words_when_splitting_then_quotes_group() {
        let s = WordSplitter::new().unwrap();
        assert_eq!(
            s.split(r#"edit "my file.txt"  other"#),
            vec!["edit", "my file.txt", "other"]
        );
        assert!(s.split("   ").is_empty());
    }
}
