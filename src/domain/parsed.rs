//! Parsed option values in order of appearance

use std::fmt;

use crate::domain::error::ParseError;
use crate::domain::grammar::Grammar;
use crate::domain::options::{descriptor, OptionCode, OptionDescriptor, ValueArity};

/// Default capacity of a [`ParsedOptionSet`].
pub const MAX_OPTIONS: usize = 256;

/// Key under which a parsed value is stored.
///
/// Options with a short letter are stored under the letter whichever form
/// the user typed; long-only options are stored under their code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Short(char),
    Long(OptionCode),
}

impl From<char> for OptionKey {
    fn from(c: char) -> Self {
        OptionKey::Short(c)
    }
}

impl From<OptionCode> for OptionKey {
    fn from(code: OptionCode) -> Self {
        OptionKey::Long(code)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKey::Short(c) => write!(f, "{c}"),
            OptionKey::Long(code) => match descriptor(*code) {
                Some(d) => write!(f, "-{}", d.long_name),
                None => write!(f, "{code:?}"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOption {
    pub flag: OptionKey,
    pub flag2: Option<char>,
    pub value: String,
}

impl ParsedOption {
    pub fn new(flag: OptionKey, flag2: Option<char>, value: impl Into<String>) -> Self {
        Self {
            flag,
            flag2,
            value: value.into(),
        }
    }
}

/// Ordered, capacity-bounded collection produced by one parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOptionSet {
    entries: Vec<ParsedOption>,
    capacity: usize,
}

impl Default for ParsedOptionSet {
    fn default() -> Self {
        Self::with_capacity(MAX_OPTIONS)
    }
}

impl ParsedOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Append an entry; overflowing the capacity is an error, never a truncation.
    pub fn push(&mut self, option: ParsedOption) -> Result<(), ParseError> {
        if self.entries.len() >= self.capacity {
            return Err(ParseError::TooManyOptions {
                limit: self.capacity,
            });
        }
        self.entries.push(option);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParsedOption> {
        self.entries.iter()
    }

    /// First value of `key`.
    pub fn get(&self, key: impl Into<OptionKey>) -> Option<&str> {
        self.get_nth(key, 0)
    }

    /// Value of the `index`-th occurrence of `key` (plain, no sub-flag).
    pub fn get_nth(&self, key: impl Into<OptionKey>, index: usize) -> Option<&str> {
        self.lookup(key.into(), None, index)
    }

    /// Value of a two-part option such as `-Zk value`.
    pub fn get_two_part(&self, key: impl Into<OptionKey>, flag2: char, index: usize) -> Option<&str> {
        self.lookup(key.into(), Some(flag2), index)
    }

    pub fn has(&self, key: impl Into<OptionKey>) -> bool {
        self.get(key).is_some()
    }

    /// All plain occurrences of `key`, in order.
    pub fn all(&self, key: impl Into<OptionKey>) -> Vec<&str> {
        let key = key.into();
        self.entries
            .iter()
            .filter(|o| o.flag == key && o.flag2.is_none())
            .map(|o| o.value.as_str())
            .collect()
    }

    /// Numeric value of `key`; values were validated at parse time for
    /// numeric options, anything else yields `None`.
    pub fn get_number(&self, key: impl Into<OptionKey>) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    fn position(&self, key: OptionKey, flag2: Option<char>, index: usize) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, o)| o.flag == key && o.flag2 == flag2)
            .nth(index)
            .map(|(i, _)| i)
    }

    fn lookup(&self, key: OptionKey, flag2: Option<char>, index: usize) -> Option<&str> {
        self.position(key, flag2, index)
            .map(|i| self.entries[i].value.as_str())
    }

    /// Remove the `index`-th occurrence of `key`, keeping the others in order.
    pub fn discard(&mut self, key: impl Into<OptionKey>, flag2: Option<char>, index: usize) -> bool {
        match self.position(key.into(), flag2, index) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Copy out the first value of `key`, then overwrite the stored buffer
    /// with zero bytes in place.
    pub fn take_secret(&mut self, key: impl Into<OptionKey>) -> Option<String> {
        let i = self.position(key.into(), None, 0)?;
        let secret = self.entries[i].value.clone();
        let mut bytes = std::mem::take(&mut self.entries[i].value).into_bytes();
        bytes.iter_mut().for_each(|b| *b = 0);
        // All-zero bytes are valid UTF-8; the allocation is reused.
        self.entries[i].value = String::from_utf8(bytes).unwrap_or_default();
        Some(secret)
    }

    /// `-Xy value` rendering of entry `i`.
    pub fn format_option(&self, i: usize) -> Option<String> {
        let o = self.entries.get(i)?;
        let flag2 = o.flag2.map(String::from).unwrap_or_default();
        Some(format!("-{}{} {}", o.flag, flag2, o.value))
    }

    /// One line per entry, for debug logging.
    pub fn dump(&self) -> String {
        self.entries
            .iter()
            .map(|o| {
                format!(
                    "Flag {} Flags2 {} Val {}\n",
                    o.flag,
                    o.flag2.map(String::from).unwrap_or_default(),
                    o.value
                )
            })
            .collect()
    }

    /// Re-serialize into an argument vector that parses back to this set
    /// under `grammar`.
    pub fn to_args(&self, grammar: &Grammar) -> Vec<String> {
        let mut args = Vec::with_capacity(self.entries.len() * 2);
        for o in &self.entries {
            match o.flag {
                OptionKey::Short(c) => match grammar.short_arity(c) {
                    Some(ValueArity::Boolean) if o.value == "true" => args.push(format!("-{c}")),
                    Some(ValueArity::Inline) => args.push(format!("-{c}{}", o.value)),
                    Some(arity) if arity.takes_value() => {
                        let flag2 = o.flag2.map(String::from).unwrap_or_default();
                        args.push(format!("-{c}{flag2}"));
                        args.push(o.value.clone());
                    }
                    // a value the short form cannot carry came from the long form
                    _ => {
                        if let Some(d) = grammar.long_by_short(c) {
                            push_long(&mut args, d, &o.value);
                        }
                    }
                },
                OptionKey::Long(code) => {
                    if let Some(d) = descriptor(code) {
                        push_long(&mut args, d, &o.value);
                    }
                }
            }
        }
        args
    }
}

fn push_long(args: &mut Vec<String>, d: &OptionDescriptor, value: &str) {
    match d.arity {
        ValueArity::Boolean => args.push(format!("--{}", d.long_name)),
        ValueArity::Optional if value.is_empty() => args.push(format!("--{}", d.long_name)),
        _ => args.push(format!("--{}={}", d.long_name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(entries: &[(char, &str)]) -> ParsedOptionSet {
        let mut set = ParsedOptionSet::new();
        for (c, v) in entries {
            set.push(ParsedOption::new(OptionKey::Short(*c), None, *v)).unwrap();
        }
        set
    }

    #[test]
    fn given_repeated_flags_when_reading_occurrences_then_order_is_kept() {
        let set = set_of(&[('E', "A=1"), ('q', "true"), ('E', "B=2")]);

        assert_eq!(set.get('E'), Some("A=1"));
        assert_eq!(set.get_nth('E', 1), Some("B=2"));
        assert_eq!(set.get_nth('E', 2), None);
        assert_eq!(set.all('E'), vec!["A=1", "B=2"]);
    }

    #[test]
    fn given_full_set_when_pushing_then_reports_too_many_options() {
        let mut set = ParsedOptionSet::with_capacity(1);
        set.push(ParsedOption::new('q'.into(), None, "true")).unwrap();

        let err = set.push(ParsedOption::new('s'.into(), None, "true")).unwrap_err();

        assert_eq!(err, ParseError::TooManyOptions { limit: 1 });
        assert!(err.is_programming_limit());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn given_password_when_taking_secret_then_buffer_is_zeroed() {
        let mut set = set_of(&[('P', "hunter2")]);

        let secret = set.take_secret('P');

        assert_eq!(secret.as_deref(), Some("hunter2"));
        let scrubbed = set.get('P').unwrap();
        assert_eq!(scrubbed.len(), 7);
        assert!(scrubbed.bytes().all(|b| b == 0));
    }

    #[test]
    fn given_two_part_entry_when_looking_up_then_sub_flag_is_required() {
        let mut set = ParsedOptionSet::new();
        set.push(ParsedOption::new('Z'.into(), Some('k'), "v")).unwrap();

        assert_eq!(set.get('Z'), None);
        assert_eq!(set.get_two_part('Z', 'k', 0), Some("v"));
        assert_eq!(set.format_option(0).as_deref(), Some("-Zk v"));
    }

    #[test]
    fn given_middle_occurrence_when_discarding_then_others_remain() {
        let mut set = set_of(&[('z', "a"), ('z', "b"), ('z', "c")]);

        assert!(set.discard('z', None, 1));
        assert!(!set.discard('z', None, 5));

        assert_eq!(set.all('z'), vec!["a", "c"]);
    }

    #[test]
    fn test_dump_lists_every_entry() {
        let set = set_of(&[('b', "2"), ('x', "list.txt")]);
        let dump = set.dump();
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.contains("Flag x Flags2  Val list.txt"));
    }
}
