//! Console interface implementations
//!
//! One [`ConsoleUi`] renders every [`Interface`] variant. Output and error
//! streams are injectable so rendering can be asserted in tests.

use std::io::{self, Read, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use colored::{Color, Colorize};
use serde_json::{Map, Value};

use crate::application::services::Interface;
use crate::domain::{ErrorRecord, Severity};
use crate::infrastructure::traits::{StatRecord, UiSink};

/// Progress writer shared with collaborator callbacks.
#[derive(Clone)]
pub struct ProgressSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    trace: bool,
}

impl ProgressSink {
    pub fn new(writer: Box<dyn Write + Send>, trace: bool) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            trace,
        }
    }

    pub fn report(&self, description: &str, position: u64, total: Option<u64>) {
        let Ok(mut w) = self.writer.lock() else {
            return;
        };
        let amount = match total {
            Some(t) => format!("{position}/{t}"),
            None => position.to_string(),
        };
        let _ = if self.trace {
            writeln!(w, "progress: {description} {amount}")
        } else {
            write!(w, "\r{description} {amount}").and_then(|_| w.flush())
        };
    }
}

/// Severity to colour mapping parsed from `P4COLORS` (`@info=green:@error=red`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorRules {
    rules: Vec<(String, Color)>,
}

impl ColorRules {
    pub fn parse(spec: &str) -> Self {
        let rules = spec
            .split(':')
            .filter_map(|rule| rule.trim().trim_start_matches('@').split_once('='))
            .filter_map(|(name, color)| {
                Color::from_str(color.trim())
                    .ok()
                    .map(|c| (name.trim().to_lowercase(), c))
            })
            .collect();
        Self { rules }
    }

    pub fn color_for(&self, severity: Severity) -> Option<Color> {
        let name = severity.to_string();
        self.rules.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
    }
}

pub struct ConsoleUi {
    interface: Interface,
    quiet: bool,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    input: Option<Box<dyn Read>>,
    piped: Option<String>,
    progress: Option<ProgressSink>,
    colors: ColorRules,
}

impl ConsoleUi {
    /// Interface on stdout/stderr, piped data from stdin.
    pub fn new(interface: Interface, quiet: bool) -> Self {
        Self::with_streams(
            interface,
            quiet,
            Box::new(io::stdout()),
            Box::new(io::stderr()),
            Box::new(io::stdin()),
        )
    }

    pub fn with_streams(
        interface: Interface,
        quiet: bool,
        out: Box<dyn Write>,
        err: Box<dyn Write>,
        input: Box<dyn Read>,
    ) -> Self {
        let progress = match &interface {
            Interface::Progress { trace } => Some(ProgressSink::new(Box::new(io::stderr()), *trace)),
            _ => None,
        };
        let colors = match &interface {
            Interface::Colorized { rules, force } => {
                if *force {
                    colored::control::set_override(true);
                }
                ColorRules::parse(rules)
            }
            _ => ColorRules::default(),
        };
        Self {
            interface,
            quiet,
            out,
            err,
            input: Some(input),
            piped: None,
            progress,
            colors,
        }
    }

    fn json_line(&mut self, value: Value) {
        let _ = writeln!(self.out, "{value}");
    }

    fn tagged(&mut self, record: &StatRecord) {
        for (k, v) in record {
            let _ = writeln!(self.out, "... {k} {v}");
        }
        let _ = writeln!(self.out);
    }

    /// Substitute `%key%` placeholders; unknown keys become empty.
    fn format_record(fmt: &str, record: &StatRecord) -> String {
        let mut out = String::new();
        let mut rest = fmt;
        while let Some(start) = rest.find('%') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('%') {
                Some(end) => {
                    let key = &after[..end];
                    if let Some((_, v)) = record.iter().find(|(k, _)| k == key) {
                        out.push_str(v);
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Apply `Name=value` (set) and `Name+=value` (append) edits.
    fn munge(fields: &[String], record: &StatRecord) -> StatRecord {
        let mut record = record.clone();
        for edit in fields {
            let (name, value, append) = match edit.split_once("+=") {
                Some((n, v)) => (n, v, true),
                None => match edit.split_once('=') {
                    Some((n, v)) => (n, v, false),
                    None => continue,
                },
            };
            match record.iter_mut().find(|(k, _)| k == name) {
                Some((_, existing)) if append => {
                    existing.push(' ');
                    existing.push_str(value);
                }
                Some((_, existing)) => *existing = value.to_string(),
                None => record.push((name.to_string(), value.to_string())),
            }
        }
        record
    }
}

fn record_to_json(record: &StatRecord) -> Value {
    let map: Map<String, Value> = record
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

impl UiSink for ConsoleUi {
    fn message(&mut self, severity: Severity, text: &str) {
        if self.quiet && severity == Severity::Info {
            return;
        }
        match &self.interface {
            Interface::Debug { .. } => {
                let _ = writeln!(self.out, "{severity}: {text}");
            }
            Interface::Structured(_) => {
                let value = serde_json::json!({ "level": severity.to_string(), "data": text });
                self.json_line(value);
            }
            Interface::Colorized { .. } => {
                let line = match self.colors.color_for(severity) {
                    Some(c) => text.color(c).to_string(),
                    None => text.to_string(),
                };
                let _ = writeln!(self.out, "{line}");
            }
            _ => {
                let _ = writeln!(self.out, "{text}");
            }
        }
    }

    fn stat(&mut self, record: &StatRecord) {
        if self.quiet {
            return;
        }
        match self.interface.clone() {
            Interface::Structured(_) => self.json_line(record_to_json(record)),
            Interface::Formatted(fmt) => {
                let line = Self::format_record(&fmt, record);
                let _ = writeln!(self.out, "{line}");
            }
            Interface::FieldMunge(fields) => {
                let munged = Self::munge(&fields, record);
                self.tagged(&munged);
            }
            Interface::Debug { .. } => {
                for (k, v) in record {
                    let _ = writeln!(self.out, "info1: {k} {v}");
                }
            }
            _ => self.tagged(record),
        }
    }

    fn text(&mut self, data: &str) {
        let _ = self.out.write_all(data.as_bytes());
    }

    fn error(&mut self, record: &ErrorRecord) {
        match &self.interface {
            Interface::Debug { message_ids } => {
                let _ = if *message_ids {
                    writeln!(self.err, "{} [{:?}]: {}", record.severity, record.subsystem, record.text)
                } else {
                    writeln!(self.err, "{}: {}", record.severity, record.text)
                };
            }
            Interface::Structured(_) => {
                let value = serde_json::json!({
                    "level": record.severity.to_string(),
                    "data": record.text,
                });
                self.json_line(value);
            }
            Interface::Colorized { .. } => {
                let color = self.colors.color_for(record.severity).unwrap_or(Color::Red);
                let _ = writeln!(self.err, "{}", record.text.color(color));
            }
            _ => {
                let _ = writeln!(self.err, "{}", record.text);
            }
        }
    }

    fn input_data(&mut self) -> io::Result<String> {
        if let Some(data) = &self.piped {
            return Ok(data.clone());
        }
        let mut data = String::new();
        if let Some(mut input) = self.input.take() {
            input.read_to_string(&mut data)?;
        }
        self.piped = Some(data.clone());
        Ok(data)
    }

    fn progress(&self, description: &str, position: u64, total: Option<u64>) {
        if let Some(sink) = &self.progress {
            sink.report(description, position, total);
        }
    }

    fn finished(&mut self, exit_code: i32) {
        if let Some(sink) = &self.progress {
            if !sink.trace {
                let _ = writeln!(self.err);
            }
        }
        if self.interface.reports_exit() {
            let _ = writeln!(self.out, "exit: {exit_code}");
        }
        let _ = self.out.flush();
    }
}
