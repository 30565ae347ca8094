//! Output strategy selection
//!
//! The interface is chosen once, before connecting, from the parsed options
//! and the `P4COLORS` setting. Selection is a pure function so the
//! precedence can be tested without a terminal.

use crate::domain::{OptionCode, ParsedOptionSet};

/// Serialized record formats selected with `-G`, `-R` or `-M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    /// `-G`, `-M g`
    Python,
    /// `-M j`
    Json,
    /// `-R`, `-M r`
    Ruby,
    /// `-M p`
    Php,
}

impl StructuredFormat {
    fn from_marshal_flag(value: &str) -> Option<Self> {
        match value {
            "g" => Some(StructuredFormat::Python),
            "j" => Some(StructuredFormat::Json),
            "r" => Some(StructuredFormat::Ruby),
            "p" => Some(StructuredFormat::Php),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interface {
    /// `-s` prefixes each line with its message type; `-e` adds message ids.
    Debug { message_ids: bool },
    /// `-F fmt`
    Formatted(String),
    Structured(StructuredFormat),
    /// `-z tag`
    Tagged,
    /// `--field Name=value` edits applied to spec forms.
    FieldMunge(Vec<String>),
    /// `-I`, `--progress=debug` for a line-per-update trace.
    Progress { trace: bool },
    /// Colour rules from `P4COLORS`; `force` when `--color` is given.
    Colorized { rules: String, force: bool },
    Plain,
}

impl Interface {
    /// Whether the session must request tagged output for this interface.
    pub fn wants_tagged(&self) -> bool {
        matches!(
            self,
            Interface::Formatted(_)
                | Interface::Structured(_)
                | Interface::Tagged
                | Interface::FieldMunge(_)
        )
    }

    /// `exit: N` is printed after the run.
    pub fn reports_exit(&self) -> bool {
        matches!(self, Interface::Debug { .. })
    }
}

/// Pick the interface by fixed precedence.
pub fn select_interface(opts: &ParsedOptionSet, colors: Option<&str>) -> Interface {
    if opts.has('s') {
        return Interface::Debug { message_ids: false };
    }
    if opts.has('e') {
        return Interface::Debug { message_ids: true };
    }
    if let Some(fmt) = opts.get('F') {
        return Interface::Formatted(fmt.to_string());
    }
    if opts.has('G') {
        return Interface::Structured(StructuredFormat::Python);
    }
    if opts.has('R') {
        return Interface::Structured(StructuredFormat::Ruby);
    }
    if let Some(format) = opts.get('M').and_then(StructuredFormat::from_marshal_flag) {
        return Interface::Structured(format);
    }
    if opts.all('z').iter().any(|v| *v == "tag") {
        return Interface::Tagged;
    }
    let fields = opts.all(OptionCode::Field);
    if !fields.is_empty() {
        return Interface::FieldMunge(fields.into_iter().map(String::from).collect());
    }
    if let Some(progress) = opts.get('I') {
        return Interface::Progress {
            trace: progress == "debug",
        };
    }
    match colors {
        Some(rules) if !rules.is_empty() => Interface::Colorized {
            rules: rules.to_string(),
            force: opts.has(OptionCode::Color),
        },
        _ => Interface::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OptionKey, ParsedOption};

    fn opts(entries: &[(OptionKey, &str)]) -> ParsedOptionSet {
        let mut set = ParsedOptionSet::new();
        for (k, v) in entries {
            set.push(ParsedOption::new(*k, None, *v)).unwrap();
        }
        set
    }

    #[test]
    fn given_debug_and_structured_flags_when_selecting_then_debug_wins() {
        let set = opts(&[('G'.into(), "true"), ('s'.into(), "true")]);
        assert_eq!(
            select_interface(&set, Some("@info=green")),
            Interface::Debug { message_ids: false }
        );
    }

    #[test]
    fn given_marshal_flag_when_selecting_then_format_follows_letter() {
        let set = opts(&[('M'.into(), "j")]);
        assert_eq!(
            select_interface(&set, None),
            Interface::Structured(StructuredFormat::Json)
        );
    }

    #[test]
    fn given_field_and_progress_when_selecting_then_field_wins() {
        let set = opts(&[('I'.into(), "true"), (OptionCode::Field.into(), "Owner=me")]);
        assert_eq!(
            select_interface(&set, None),
            Interface::FieldMunge(vec!["Owner=me".into()])
        );
    }

    #[test]
    fn given_colors_env_when_no_flags_then_colorized() {
        let set = opts(&[(OptionCode::Color.into(), "true")]);
        assert_eq!(
            select_interface(&set, Some("@info=green")),
            Interface::Colorized {
                rules: "@info=green".into(),
                force: true
            }
        );
        assert_eq!(select_interface(&ParsedOptionSet::new(), Some("")), Interface::Plain);
    }
}
