//! Generic option interpreter
//!
//! One parse call walks the argument vector once, consulting the active
//! [`Grammar`] for every flag. Option scanning ends at the first token that
//! does not start with `-`, at a bare `-`, after `--`, or after an option
//! whose arity stops parsing. Whatever is left is positional and is checked
//! against a [`PositionalRule`].
//!
//! `--explain` switches the parser into a help-collecting mode: every
//! following option name is looked up and its help text returned instead of
//! being applied.

use std::ops::BitOr;

use tracing::{debug, trace};

use crate::application::error::UsageError;
use crate::domain::{
    descriptor_by_name, Grammar, OptionDescriptor, OptionKey, ParseError, ParsedOption,
    ParsedOptionSet, ValueArity, MAX_OPTIONS,
};

/// Accepted counts of positional arguments, combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalRule(u8);

impl PositionalRule {
    pub const NONE: Self = Self(0b00_0001);
    pub const ONE: Self = Self(0b00_0010);
    pub const TWO: Self = Self(0b00_0100);
    pub const THREE: Self = Self(0b00_1000);
    /// More than three.
    pub const MORE: Self = Self(0b01_0000);
    /// Synthesize one empty positional when none is given.
    pub const MAKE_ONE: Self = Self(0b10_0000);
    pub const ANY: Self = Self(0b01_1111);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn allows(self, count: usize) -> bool {
        let bit = match count {
            0 => Self::NONE,
            1 => Self::ONE,
            2 => Self::TWO,
            3 => Self::THREE,
            _ => Self::MORE,
        };
        self.contains(bit)
    }

    /// Validate (and for `MAKE_ONE`, complete) the positional arguments.
    pub fn check(self, positionals: &mut Vec<String>) -> Result<(), ParseError> {
        if self.allows(positionals.len()) {
            return Ok(());
        }
        if self.contains(Self::MAKE_ONE) && positionals.is_empty() {
            positionals.push(String::new());
            return Ok(());
        }
        Err(ParseError::WrongPositionalArgumentCount {
            count: positionals.len(),
            extra: self.contains(Self::NONE),
        })
    }
}

impl BitOr for PositionalRule {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Options and positional arguments of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub options: ParsedOptionSet,
    pub positionals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(ParsedCommand),
    /// `--explain` was given; help texts in request order.
    Explain(Vec<String>),
}

/// Interprets argument vectors against a grammar.
#[derive(Debug, Clone)]
pub struct OptionParser {
    capacity: usize,
}

impl Default for OptionParser {
    fn default() -> Self {
        Self {
            capacity: MAX_OPTIONS,
        }
    }
}

/// Scanner state for one parse call.
struct Scan<'a> {
    args: &'a [String],
    pos: usize,
    explain: bool,
    helps: Vec<String>,
    options: ParsedOptionSet,
}

impl<'a> Scan<'a> {
    fn next_word(&mut self) -> Option<&'a str> {
        let word = self.args.get(self.pos)?;
        self.pos += 1;
        Some(word.as_str())
    }

    /// Inline text if present, else the next word.
    fn value_or_next(&mut self, inline: Option<&'a str>) -> Option<&'a str> {
        match inline {
            Some(v) if !v.is_empty() => Some(v),
            _ => self.next_word(),
        }
    }

    fn push(&mut self, flag: OptionKey, flag2: Option<char>, value: &str) -> Result<(), ParseError> {
        trace!("parse: flag={} flag2={:?} value={}", flag, flag2, value);
        self.options.push(ParsedOption::new(flag, flag2, value))
    }
}

impl OptionParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Parse `args` (program name already removed).
    ///
    /// Every failure carries `usage` so the caller can print it unchanged.
    pub fn parse(
        &self,
        args: &[String],
        grammar: &Grammar,
        rule: PositionalRule,
        usage: &str,
    ) -> Result<ParseOutcome, UsageError> {
        self.parse_inner(args, grammar, rule)
            .map_err(|e| UsageError::new(e, usage))
    }

    fn parse_inner(
        &self,
        args: &[String],
        grammar: &Grammar,
        rule: PositionalRule,
    ) -> Result<ParseOutcome, ParseError> {
        debug!("parse: {} args", args.len());
        let mut scan = Scan {
            args,
            pos: 0,
            explain: false,
            helps: Vec::new(),
            options: ParsedOptionSet::with_capacity(self.capacity),
        };

        while let Some(arg) = args.get(scan.pos) {
            if arg == "-" || !arg.starts_with('-') {
                break;
            }
            scan.pos += 1;
            if arg == "--" {
                break;
            }
            let stop = match arg.strip_prefix("--") {
                Some(long) => parse_long(&mut scan, grammar, long)?,
                None => parse_short(&mut scan, grammar, &arg[1..])?,
            };
            if stop {
                break;
            }
        }

        if scan.explain {
            if scan.helps.is_empty() {
                scan.helps = grammar.long_descriptors().map(help_text).collect();
            }
            return Ok(ParseOutcome::Explain(scan.helps));
        }

        let mut positionals = args[scan.pos..].to_vec();
        rule.check(&mut positionals)?;
        debug!(
            "parse: {} options, {} positionals",
            scan.options.len(),
            positionals.len()
        );
        Ok(ParseOutcome::Parsed(ParsedCommand {
            options: scan.options,
            positionals,
        }))
    }
}

fn help_text(d: &OptionDescriptor) -> String {
    d.help
        .map(str::to_string)
        .unwrap_or_else(|| format!("{d}: no help available."))
}

fn is_non_negative_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && s.parse::<i64>().is_ok()
}

/// Handle `--name[=value]`. Returns true when scanning must stop.
fn parse_long<'a>(scan: &mut Scan<'a>, grammar: &Grammar, long: &'a str) -> Result<bool, ParseError> {
    let (name, inline) = match long.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (long, None),
    };
    let typed = format!("-{name}");

    if name == "explain" {
        if inline.is_some() {
            return Err(ParseError::UnexpectedValue(typed));
        }
        scan.explain = true;
        return Ok(false);
    }

    if scan.explain {
        let d = descriptor_by_name(name).ok_or(ParseError::UnknownOption(typed))?;
        scan.helps.push(help_text(d));
        return Ok(false);
    }

    let d = grammar
        .long_by_name(name)
        .ok_or_else(|| ParseError::UnknownOption(typed.clone()))?;
    let key = d.short.map(OptionKey::Short).unwrap_or(OptionKey::Long(d.code));

    match d.arity {
        ValueArity::Boolean => {
            if inline.is_some() {
                return Err(ParseError::UnexpectedValue(typed));
            }
            scan.push(key, None, "true")?;
        }
        ValueArity::Optional => {
            scan.push(key, None, inline.unwrap_or(""))?;
        }
        ValueArity::TwoPart => {
            let text = scan
                .value_or_next(inline)
                .ok_or_else(|| ParseError::TwoPartArgumentRequired(typed.clone()))?;
            let mut chars = text.chars();
            let flag2 = chars
                .next()
                .ok_or_else(|| ParseError::TwoPartArgumentRequired(typed.clone()))?;
            scan.push(key, Some(flag2), chars.as_str())?;
        }
        ValueArity::Inline
        | ValueArity::InlineOrNext
        | ValueArity::NumericNonNegative
        | ValueArity::InlineOrNextThenStop => {
            let value = match inline {
                Some(v) => v,
                None => scan
                    .next_word()
                    .ok_or_else(|| ParseError::MissingArgumentValue(typed.clone()))?,
            };
            if d.arity == ValueArity::NumericNonNegative && !is_non_negative_integer(value) {
                return Err(ParseError::NonNegativeArgumentRequired(typed));
            }
            scan.push(key, None, value)?;
            return Ok(d.arity == ValueArity::InlineOrNextThenStop);
        }
    }
    Ok(false)
}

/// Handle one `-abc` token. Returns true when scanning must stop.
fn parse_short<'a>(scan: &mut Scan<'a>, grammar: &Grammar, body: &'a str) -> Result<bool, ParseError> {
    let mut rest = body;
    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        let typed = c.to_string();

        if scan.explain {
            let d = grammar
                .long_by_short(c)
                .ok_or(ParseError::UnknownOption(typed))?;
            scan.helps.push(help_text(d));
            continue;
        }

        let arity = grammar
            .short_arity(c)
            .ok_or_else(|| ParseError::UnknownOption(typed.clone()))?;
        let key = OptionKey::Short(c);

        match arity {
            ValueArity::Boolean | ValueArity::Optional => {
                scan.push(key, None, "true")?;
            }
            ValueArity::Inline => {
                scan.push(key, None, rest)?;
                return Ok(false);
            }
            ValueArity::TwoPart => {
                let flag2 = rest
                    .chars()
                    .next()
                    .ok_or(ParseError::TwoPartArgumentRequired(typed.clone()))?;
                let after = &rest[flag2.len_utf8()..];
                let value = scan
                    .value_or_next(Some(after))
                    .ok_or(ParseError::MissingArgumentValue(typed))?;
                scan.push(key, Some(flag2), value)?;
                return Ok(false);
            }
            ValueArity::InlineOrNext
            | ValueArity::NumericNonNegative
            | ValueArity::InlineOrNextThenStop => {
                let value = scan
                    .value_or_next(Some(rest))
                    .ok_or_else(|| ParseError::MissingArgumentValue(typed.clone()))?;
                if arity == ValueArity::NumericNonNegative && !is_non_negative_integer(value) {
                    return Err(ParseError::NonNegativeArgumentRequired(typed));
                }
                scan.push(key, None, value)?;
                return Ok(arity == ValueArity::InlineOrNextThenStop);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionCode;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn parsed(outcome: ParseOutcome) -> ParsedCommand {
        match outcome {
            ParseOutcome::Parsed(cmd) => cmd,
            ParseOutcome::Explain(h) => panic!("unexpected explain outcome: {h:?}"),
        }
    }

    #[test]
    fn given_clustered_booleans_when_parsing_then_each_is_true() {
        let g = Grammar::short("qsb:");
        let out = OptionParser::new()
            .parse(&args(&["-qs", "-b5", "sync"]), &g, PositionalRule::ANY, "usage")
            .unwrap();
        let cmd = parsed(out);

        assert_eq!(cmd.options.get('q'), Some("true"));
        assert_eq!(cmd.options.get('s'), Some("true"));
        assert_eq!(cmd.options.get('b'), Some("5"));
        assert_eq!(cmd.positionals, vec!["sync"]);
    }

    #[test]
    fn given_inline_arity_when_token_ends_then_value_is_empty() {
        let g = Grammar::short("a.q");
        let cmd = parsed(
            OptionParser::new()
                .parse(&args(&["-a", "-q"]), &g, PositionalRule::NONE, "")
                .unwrap(),
        );

        assert_eq!(cmd.options.get('a'), Some(""));
        assert_eq!(cmd.options.get('q'), Some("true"));
    }

    #[test]
    fn given_stop_arity_when_parsing_then_later_dashes_are_positional() {
        let g = Grammar::short("s$q");
        let cmd = parsed(
            OptionParser::new()
                .parse(&args(&["-s", "x", "-q", "y"]), &g, PositionalRule::ANY, "")
                .unwrap(),
        );

        assert_eq!(cmd.options.get('s'), Some("x"));
        assert!(!cmd.options.has('q'));
        assert_eq!(cmd.positionals, vec!["-q", "y"]);
    }

    #[test]
    fn given_two_part_without_selector_when_parsing_then_error() {
        let g = Grammar::short("Z+");
        let err = OptionParser::new()
            .parse(&args(&["-Z"]), &g, PositionalRule::ANY, "u")
            .unwrap_err();
        assert_eq!(err.source, ParseError::TwoPartArgumentRequired("Z".into()));
        assert_eq!(err.usage, "u");
    }

    #[test]
    fn given_two_part_when_parsing_then_selector_and_value_are_split() {
        let g = Grammar::short("Z+");
        let cmd = parsed(
            OptionParser::new()
                .parse(&args(&["-Zk", "v1", "-Zjv2"]), &g, PositionalRule::ANY, "")
                .unwrap(),
        );
        assert_eq!(cmd.options.get_two_part('Z', 'k', 0), Some("v1"));
        assert_eq!(cmd.options.get_two_part('Z', 'j', 0), Some("v2"));
    }

    #[test]
    fn given_long_only_option_when_parsing_then_stored_under_code() {
        let g = Grammar::new("", &[OptionCode::Field, OptionCode::Color]);
        let cmd = parsed(
            OptionParser::new()
                .parse(&args(&["--field", "Owner=me", "--color"]), &g, PositionalRule::NONE, "")
                .unwrap(),
        );
        assert_eq!(cmd.options.get(OptionCode::Field), Some("Owner=me"));
        assert_eq!(cmd.options.get(OptionCode::Color), Some("true"));
    }

    #[test]
    fn given_boolean_long_with_value_when_parsing_then_unexpected_value() {
        let g = Grammar::new("q", &[OptionCode::Quiet]);
        let err = OptionParser::new()
            .parse(&args(&["--quiet=yes"]), &g, PositionalRule::ANY, "")
            .unwrap_err();
        assert_eq!(err.source, ParseError::UnexpectedValue("-quiet".into()));
    }

    #[test]
    fn given_rule_without_none_when_no_positionals_then_wrong_count() {
        let g = Grammar::short("q");
        let err = OptionParser::new()
            .parse(&args(&["-q"]), &g, PositionalRule::ONE | PositionalRule::TWO, "")
            .unwrap_err();
        assert_eq!(
            err.source,
            ParseError::WrongPositionalArgumentCount { count: 0, extra: false }
        );
    }

    #[test]
    fn given_make_one_when_no_positionals_then_empty_one_is_synthesized() {
        let g = Grammar::short("");
        let cmd = parsed(
            OptionParser::new()
                .parse(&[], &g, PositionalRule::ONE | PositionalRule::MAKE_ONE, "")
                .unwrap(),
        );
        assert_eq!(cmd.positionals, vec![String::new()]);
    }

    #[test]
    fn given_make_one_alone_when_no_positionals_then_empty_one_is_synthesized() {
        let g = Grammar::short("");
        let cmd = parsed(
            OptionParser::new()
                .parse(&[], &g, PositionalRule::MAKE_ONE, "")
                .unwrap(),
        );
        assert_eq!(cmd.positionals, vec![String::new()]);
    }

    #[test]
    fn given_none_or_make_one_when_no_positionals_then_none_is_accepted_as_is() {
        let g = Grammar::short("");
        let cmd = parsed(
            OptionParser::new()
                .parse(&[], &g, PositionalRule::NONE | PositionalRule::MAKE_ONE, "")
                .unwrap(),
        );
        assert!(cmd.positionals.is_empty());
    }

    #[test]
    fn given_make_one_when_two_positionals_then_wrong_count() {
        let g = Grammar::short("");
        let err = OptionParser::new()
            .parse(&args(&["a", "b"]), &g, PositionalRule::ONE | PositionalRule::MAKE_ONE, "")
            .unwrap_err();
        assert_eq!(
            err.source,
            ParseError::WrongPositionalArgumentCount { count: 2, extra: false }
        );
    }

    #[test]
    fn given_numeric_value_beyond_i64_when_parsing_then_non_negative_required() {
        let g = Grammar::short("r#");
        let err = OptionParser::new()
            .parse(&args(&["-r", "99999999999999999999"]), &g, PositionalRule::ANY, "")
            .unwrap_err();
        assert_eq!(err.source, ParseError::NonNegativeArgumentRequired("r".into()));
    }

    #[test]
    fn given_small_capacity_when_overflowing_then_programming_limit() {
        let g = Grammar::short("q");
        let err = OptionParser::with_capacity(2)
            .parse(&args(&["-qqq"]), &g, PositionalRule::ANY, "")
            .unwrap_err();
        assert!(err.source.is_programming_limit());
    }

    #[test]
    fn given_explain_with_short_flag_when_parsing_then_help_comes_from_long_row() {
        let g = Grammar::new("m#", &[OptionCode::Max]);
        let out = OptionParser::new()
            .parse(&args(&["--explain", "-m"]), &g, PositionalRule::NONE, "")
            .unwrap();
        match out {
            ParseOutcome::Explain(helps) => {
                assert_eq!(helps.len(), 1);
                assert!(helps[0].starts_with("--max (-m)"));
            }
            other => panic!("expected explain, got {other:?}"),
        }
    }
}
