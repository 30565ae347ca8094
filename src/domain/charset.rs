//! Character sets known to the client
//!
//! The content charset governs file content and output translation, the
//! command charset governs argument and protocol text. Both come from the same
//! table; the code-unit width (granularity) decides whether the command
//! charset can be used directly or a narrow one has to be discovered.

use std::fmt;

use crate::domain::error::CharsetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharSet {
    None,
    Auto,
    Utf8,
    Utf8Bom,
    Iso8859_1,
    ShiftJis,
    EucJp,
    Iso8859_15,
    Iso8859_5,
    MacOsRoman,
    WinAnsi,
    Koi8R,
    Cp949,
    Cp1251,
    Utf16,
    Utf16NoBom,
    Utf16Le,
    Utf16LeBom,
    Utf16Be,
    Utf16BeBom,
    Utf32,
    Utf32NoBom,
    Utf32Le,
    Utf32LeBom,
    Utf32Be,
    Cp936,
    Cp950,
    Cp850,
    Cp858,
    Cp1253,
    Iso8859_7,
    Utf32BeBom,
    Cp852,
    Cp1250,
    Iso8859_2,
}

/// Name table in listing order.
static CHARSETS: &[(&str, CharSet)] = &[
    ("none", CharSet::None),
    ("auto", CharSet::Auto),
    ("utf8", CharSet::Utf8),
    ("utf8-bom", CharSet::Utf8Bom),
    ("iso8859-1", CharSet::Iso8859_1),
    ("shiftjis", CharSet::ShiftJis),
    ("eucjp", CharSet::EucJp),
    ("iso8859-15", CharSet::Iso8859_15),
    ("iso8859-5", CharSet::Iso8859_5),
    ("macosroman", CharSet::MacOsRoman),
    ("winansi", CharSet::WinAnsi),
    ("koi8-r", CharSet::Koi8R),
    ("cp949", CharSet::Cp949),
    ("cp1251", CharSet::Cp1251),
    ("utf16", CharSet::Utf16),
    ("utf16-nobom", CharSet::Utf16NoBom),
    ("utf16le", CharSet::Utf16Le),
    ("utf16le-bom", CharSet::Utf16LeBom),
    ("utf16be", CharSet::Utf16Be),
    ("utf16be-bom", CharSet::Utf16BeBom),
    ("utf32", CharSet::Utf32),
    ("utf32-nobom", CharSet::Utf32NoBom),
    ("utf32le", CharSet::Utf32Le),
    ("utf32le-bom", CharSet::Utf32LeBom),
    ("utf32be", CharSet::Utf32Be),
    ("cp936", CharSet::Cp936),
    ("cp950", CharSet::Cp950),
    ("cp850", CharSet::Cp850),
    ("cp858", CharSet::Cp858),
    ("cp1253", CharSet::Cp1253),
    ("iso8859-7", CharSet::Iso8859_7),
    ("utf32be-bom", CharSet::Utf32BeBom),
    ("cp852", CharSet::Cp852),
    ("cp1250", CharSet::Cp1250),
    ("iso8859-2", CharSet::Iso8859_2),
];

/// Locale variables consulted by discovery, most specific first.
pub const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_CTYPE", "LANG"];

impl CharSet {
    /// Exact lookup by the client's own spelling.
    pub fn lookup(name: &str) -> Result<Self, CharsetError> {
        CHARSETS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, cs)| *cs)
            .ok_or_else(|| CharsetError::Unknown(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        CHARSETS
            .iter()
            .find(|(_, cs)| *cs == self)
            .map(|(n, _)| *n)
            .unwrap_or("none")
    }

    /// Bytes per code unit.
    pub fn granularity(self) -> usize {
        use CharSet::*;
        match self {
            Utf16 | Utf16NoBom | Utf16Le | Utf16LeBom | Utf16Be | Utf16BeBom => 2,
            Utf32 | Utf32NoBom | Utf32Le | Utf32LeBom | Utf32Be | Utf32BeBom => 4,
            _ => 1,
        }
    }

    pub fn is_wide(self) -> bool {
        self.granularity() != 1
    }

    /// No translation is performed.
    pub fn is_untranslated(self) -> bool {
        matches!(self, CharSet::None)
    }

    /// Whether `text` can be sent in this charset.
    ///
    /// Only the Latin-1 code pages are checked character by character; the
    /// other legacy tables are passed through to the server unchecked.
    pub fn encodes(self, text: &str) -> bool {
        match self {
            CharSet::Iso8859_1 | CharSet::Iso8859_15 => text.chars().all(|c| (c as u32) <= 0xFF),
            _ => true,
        }
    }

    /// Every valid name, for error listings.
    pub fn all_names() -> impl Iterator<Item = &'static str> {
        CHARSETS.iter().map(|(n, _)| *n)
    }

    /// Map a locale codeset (`UTF-8`, `ISO-8859-1`, `Shift_JIS`) to a table entry.
    pub fn from_codeset(codeset: &str) -> Option<Self> {
        let wanted = normalize(codeset);
        let alias = match wanted.as_str() {
            "sjis" => "shiftjis",
            "cp1252" | "windows1252" => "winansi",
            "gbk" | "gb2312" => "cp936",
            "big5" => "cp950",
            "euckr" => "cp949",
            "macroman" => "macosroman",
            other => other,
        };
        CHARSETS
            .iter()
            .find(|(n, cs)| normalize(n) == alias && !matches!(cs, CharSet::Auto))
            .map(|(_, cs)| *cs)
    }

    /// Discover a narrow charset from the locale variables.
    ///
    /// `lookup_var` reads one variable; the first variable whose codeset maps to
    /// a narrow table entry wins.
    pub fn discover<F>(lookup_var: F) -> Result<Self, CharsetError>
    where
        F: Fn(&str) -> Option<String>,
    {
        LOCALE_VARS
            .iter()
            .filter_map(|var| lookup_var(var))
            .filter_map(|locale| {
                let codeset = locale.split_once('.')?.1;
                let codeset = codeset.split('@').next().unwrap_or(codeset);
                CharSet::from_codeset(codeset)
            })
            .find(|cs| !cs.is_wide())
            .ok_or(CharsetError::DiscoveryFailed)
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
