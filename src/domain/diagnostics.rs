//! Remote error records accumulated over a run

use std::fmt;

/// Component that raised an error. Only `Rpc` errors are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Rpc,
    Client,
    Server,
    Support,
    Script,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Failed,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warn => "warning",
            Severity::Failed => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub subsystem: Subsystem,
    pub severity: Severity,
    pub text: String,
}

impl ErrorRecord {
    pub fn new(subsystem: Subsystem, severity: Severity, text: impl Into<String>) -> Self {
        Self {
            subsystem,
            severity,
            text: text.into(),
        }
    }

    pub fn rpc(text: impl Into<String>) -> Self {
        Self::new(Subsystem::Rpc, Severity::Failed, text)
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Ordered collection of error records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSet {
    records: Vec<ErrorRecord>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when any record at `Failed` or above is present.
    pub fn test(&self) -> bool {
        self.records.iter().any(|r| r.severity >= Severity::Failed)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn at(&self, i: usize) -> Option<&ErrorRecord> {
        self.records.get(i)
    }

    pub fn push(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, other: ErrorSet) {
        self.records.extend(other.records);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn includes_subsystem(&self, subsystem: Subsystem) -> bool {
        self.records.iter().any(|r| r.subsystem == subsystem)
    }

    pub fn has_fatal(&self) -> bool {
        self.records.iter().any(|r| r.severity == Severity::Fatal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }
}

impl FromIterator<ErrorRecord> for ErrorSet {
    fn from_iter<T: IntoIterator<Item = ErrorRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
