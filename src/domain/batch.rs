//! Batch accumulation and the retry counter

/// Default number of input lines per invocation.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Words collected for one invocation plus the number of lines they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionBatch {
    words: Vec<String>,
    lines: usize,
}

impl ExecutionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one input line's words.
    pub fn push_line<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(words.into_iter().map(Into::into));
        self.lines += 1;
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    pub fn is_full(&self, batch_size: usize) -> bool {
        self.lines >= batch_size
    }

    /// Hand out the accumulated words and start a fresh cycle.
    pub fn take(&mut self) -> Vec<String> {
        self.lines = 0;
        std::mem::take(&mut self.words)
    }
}

/// Batch size from the raw `-b` value.
///
/// The value is read as a leading integer (anything unreadable counts as 0)
/// and clamped to at least one line. No value gives the default.
pub fn effective_batch_size(requested: Option<&str>) -> usize {
    match requested {
        None => DEFAULT_BATCH_SIZE,
        Some(text) => usize::try_from(leading_integer(text)).unwrap_or(0).max(1),
    }
}

/// Optional sign followed by digits; stops at the first other character.
fn leading_integer(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Bounded retry counter; `used` never exceeds `allowed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    allowed: u32,
    used: u32,
}

impl RetryBudget {
    pub fn new(allowed: u32) -> Self {
        Self { allowed, used: 0 }
    }

    /// Consume one retry if any is left.
    pub fn try_consume(&mut self) -> bool {
        if self.used < self.allowed {
            self.used += 1;
            true
        } else {
            false
        }
    }

    pub fn allowed(&self) -> u32 {
        self.allowed
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn remaining(&self) -> u32 {
        self.allowed - self.used
    }
}
