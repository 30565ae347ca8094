//! Declarative option catalog
//!
//! Every flag the client understands is one row in [`OPTION_TABLE`]. Rows are
//! pure data; the parser interprets them, so adding an option never requires
//! new parsing code. Long names must be unique; short letters are not (the
//! same letter means different things for different commands).

use std::fmt;

/// Stable identity of a table row, independent of its spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionCode {
    Change,
    Port,
    User,
    Client,
    Preview,
    Delete,
    Force,
    Max,
    Quiet,
    Host,
    Password,
    Charset,
    CmdCharset,
    Variable,
    Help,
    Version,
    Batchsize,
    Blocksize,
    MessageType,
    Xargs,
    Progress,
    Compress,
    Directory,
    Retries,
    Limit,
    Aliases,
    Field,
    Color,
    Script,
    ScriptMaxMem,
    ScriptMaxTime,
    ScriptEnableDebug,
    NoScript,
    ScriptLang,
    ScriptLangVersion,
    ScriptApiVersion,
}

/// How an option obtains its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueArity {
    /// No value; recorded as `"true"`.
    Boolean,
    /// Rest of the current token (`-avalue`), possibly empty.
    Inline,
    /// Rest of the token, else the next word.
    InlineOrNext,
    /// Like `InlineOrNext`, must be a non-negative integer.
    NumericNonNegative,
    /// Like `InlineOrNext`, then everything after is positional.
    InlineOrNextThenStop,
    /// Secondary flag letter, then a value (`-Zkvalue`, `-Zk value`).
    TwoPart,
    /// Long form only: `--name=value` or bare `--name`.
    Optional,
}

impl ValueArity {
    /// Interpret the grammar character that follows a short flag letter.
    pub fn from_modifier(c: char) -> Option<Self> {
        match c {
            '.' => Some(ValueArity::Inline),
            ':' => Some(ValueArity::InlineOrNext),
            '#' => Some(ValueArity::NumericNonNegative),
            '$' => Some(ValueArity::InlineOrNextThenStop),
            '+' => Some(ValueArity::TwoPart),
            _ => None,
        }
    }

    pub fn modifier(self) -> Option<char> {
        match self {
            ValueArity::Boolean | ValueArity::Optional => None,
            ValueArity::Inline => Some('.'),
            ValueArity::InlineOrNext => Some(':'),
            ValueArity::NumericNonNegative => Some('#'),
            ValueArity::InlineOrNextThenStop => Some('$'),
            ValueArity::TwoPart => Some('+'),
        }
    }

    pub fn takes_value(self) -> bool {
        !matches!(self, ValueArity::Boolean)
    }
}

/// One row of the option catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub long_name: &'static str,
    pub code: OptionCode,
    pub short: Option<char>,
    pub arity: ValueArity,
    pub help: Option<&'static str>,
}

impl fmt::Display for OptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.short {
            Some(c) => write!(f, "--{} (-{})", self.long_name, c),
            None => write!(f, "--{}", self.long_name),
        }
    }
}

const fn row(
    long_name: &'static str,
    code: OptionCode,
    short: Option<char>,
    arity: ValueArity,
    help: Option<&'static str>,
) -> OptionDescriptor {
    OptionDescriptor {
        long_name,
        code,
        short,
        arity,
        help,
    }
}

use OptionCode as C;
use ValueArity as A;

/// The process-wide option catalog.
pub static OPTION_TABLE: &[OptionDescriptor] = &[
    row("client", C::Client, Some('c'), A::InlineOrNext,
        Some("--client (-c): names the client workspace to use.")),
    row("port", C::Port, Some('p'), A::InlineOrNext,
        Some("--port (-p): network address of the server.")),
    row("user", C::User, Some('u'), A::InlineOrNext,
        Some("--user (-u): user name to run the command as.")),
    row("change", C::Change, Some('c'), A::InlineOrNext,
        Some("--change (-c): changelist the command applies to.")),
    row("preview", C::Preview, Some('n'), A::Boolean,
        Some("--preview (-n): show what the command would do without doing it.")),
    row("delete", C::Delete, Some('d'), A::Boolean,
        Some("--delete (-d): delete the named object.")),
    row("force", C::Force, Some('f'), A::Boolean,
        Some("--force (-f): override the normal safety checks.")),
    row("max", C::Max, Some('m'), A::NumericNonNegative,
        Some("--max (-m): maximum number of objects to report.")),
    row("quiet", C::Quiet, Some('q'), A::Boolean,
        Some("--quiet (-q): suppress informational output.")),
    row("host", C::Host, Some('H'), A::InlineOrNext,
        Some("--host (-H): host name, overriding the network configuration.")),
    row("password", C::Password, Some('P'), A::InlineOrNext,
        Some("--password (-P): password or ticket to authenticate with.")),
    row("charset", C::Charset, Some('C'), A::InlineOrNext,
        Some("--charset (-C): character set of file content and output.")),
    row("command-charset", C::CmdCharset, Some('Q'), A::InlineOrNext,
        Some("--command-charset (-Q): character set used for the command line and protocol.")),
    row("variable", C::Variable, Some('v'), A::InlineOrNext,
        Some("--variable (-v): debug level or configurable variable (name=value).")),
    row("help", C::Help, Some('h'), A::Boolean,
        Some("--help (-h): print usage and exit.")),
    row("version", C::Version, Some('V'), A::Boolean,
        Some("--version (-V): print the client version and exit.")),
    row("batchsize", C::Batchsize, Some('b'), A::NumericNonNegative,
        Some("--batchsize (-b): number of input lines sent per command with --xargs.")),
    row("blocksize", C::Blocksize, Some('b'), A::NumericNonNegative,
        Some("--blocksize (-b): block size used for calculations.")),
    row("message-type", C::MessageType, Some('s'), A::Boolean,
        Some("--message-type (-s): prefix each output line with its message type.")),
    row("xargs", C::Xargs, Some('x'), A::InlineOrNext,
        Some("--xargs (-x): read extra arguments from the named file ('-' for piped data).")),
    row("progress", C::Progress, Some('I'), A::Optional,
        Some("--progress (-I): show progress indicators; --progress=debug for a plain trace.")),
    row("compress", C::Compress, Some('z'), A::Boolean,
        Some("--compress (-z): compress the output.")),
    row("directory", C::Directory, Some('d'), A::InlineOrNext,
        Some("--directory (-d): directory to treat as the current directory.")),
    row("retries", C::Retries, Some('r'), A::NumericNonNegative,
        Some("--retries (-r): times to retry a command after a network failure.")),
    row("limit", C::Limit, None, A::NumericNonNegative,
        Some("--limit: limit the number of entries displayed.")),
    row("aliases", C::Aliases, None, A::InlineOrNext,
        Some("--aliases: alias handling (dry-run, no, expand).")),
    row("field", C::Field, None, A::InlineOrNext,
        Some("--field: set or append a spec field (Name=value, Name+=value).")),
    row("color", C::Color, None, A::Boolean,
        Some("--color: force coloured output even when not writing to a terminal.")),
    row("script", C::Script, None, A::InlineOrNextThenStop, None),
    row("script-max-mem", C::ScriptMaxMem, None, A::NumericNonNegative, None),
    row("script-max-time", C::ScriptMaxTime, None, A::NumericNonNegative, None),
    row("script-enable-debug", C::ScriptEnableDebug, None, A::Boolean, None),
    row("no-script", C::NoScript, None, A::Boolean,
        Some("--no-script: do not run client-side extensions.")),
    row("script-lang", C::ScriptLang, None, A::InlineOrNext,
        Some("--script-lang: implementation language of the script.")),
    row("script-lang-version", C::ScriptLangVersion, None, A::InlineOrNext,
        Some("--script-lang-version: version of the script language.")),
    row("script-api-version", C::ScriptApiVersion, None, A::InlineOrNext,
        Some("--script-api-version: script API version.")),
];

/// Row for an option code. Every code has exactly one row.
pub fn descriptor(code: OptionCode) -> Option<&'static OptionDescriptor> {
    OPTION_TABLE.iter().find(|d| d.code == code)
}

/// Row for a long name, searching the whole table.
pub fn descriptor_by_name(name: &str) -> Option<&'static OptionDescriptor> {
    OPTION_TABLE.iter().find(|d| d.long_name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn given_option_table_when_checking_long_names_then_all_are_unique() {
        let mut seen = HashSet::new();
        for d in OPTION_TABLE {
            assert!(seen.insert(d.long_name), "duplicate long name {}", d.long_name);
        }
    }

    #[test]
    fn given_option_table_when_checking_codes_then_each_code_has_one_row() {
        let mut seen = HashSet::new();
        for d in OPTION_TABLE {
            assert!(seen.insert(d.code), "duplicate code {:?}", d.code);
        }
    }

    #[test]
    fn given_optional_arity_when_checking_rows_then_only_long_parsing_sees_it() {
        for d in OPTION_TABLE {
            assert_ne!(d.arity.modifier(), Some('?'));
        }
        assert_eq!(ValueArity::from_modifier('?'), None);
    }

    #[test]
    fn test_descriptor_display() {
        let max = descriptor(OptionCode::Max).unwrap();
        assert_eq!(max.to_string(), "--max (-m)");
        let field = descriptor_by_name("field").unwrap();
        assert_eq!(field.to_string(), "--field");
    }
}
