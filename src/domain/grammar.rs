//! Active grammar for one parse call
//!
//! A grammar combines a short-form spec string such as `"b:c:qx:r#"` with the
//! list of long-option codes accepted by the same command. The string is
//! compiled once into `(letter, arity)` pairs: a letter followed by one of
//! `. : # $ +` takes that arity, any other letter is boolean.

use crate::domain::options::{descriptor, OptionCode, OptionDescriptor, ValueArity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    shorts: Vec<(char, ValueArity)>,
    longs: Vec<OptionCode>,
}

impl Grammar {
    pub fn new(short_spec: &str, longs: &[OptionCode]) -> Self {
        let mut shorts = Vec::new();
        let mut chars = short_spec.chars().peekable();
        while let Some(c) = chars.next() {
            let arity = match chars.peek().copied().and_then(ValueArity::from_modifier) {
                Some(arity) => {
                    chars.next();
                    arity
                }
                None => ValueArity::Boolean,
            };
            shorts.push((c, arity));
        }
        Self {
            shorts,
            longs: longs.to_vec(),
        }
    }

    /// Short-only grammar.
    pub fn short(short_spec: &str) -> Self {
        Self::new(short_spec, &[])
    }

    /// Arity of a short letter, `None` if the letter is not in this grammar.
    pub fn short_arity(&self, c: char) -> Option<ValueArity> {
        self.shorts.iter().find(|(s, _)| *s == c).map(|(_, a)| *a)
    }

    /// Long option accepted by this grammar under `name`.
    pub fn long_by_name(&self, name: &str) -> Option<&'static OptionDescriptor> {
        self.long_descriptors().find(|d| d.long_name == name)
    }

    /// Long option of this grammar whose short form is `c`.
    pub fn long_by_short(&self, c: char) -> Option<&'static OptionDescriptor> {
        self.long_descriptors().find(|d| d.short == Some(c))
    }

    pub fn long_descriptors(&self) -> impl Iterator<Item = &'static OptionDescriptor> + '_ {
        self.longs.iter().filter_map(|code| descriptor(*code))
    }

    pub fn has_longs(&self) -> bool {
        !self.longs.is_empty()
    }
}
