//! Session environment negotiation
//!
//! Resolves the working directory, layered configuration and character sets
//! from the parsed options, producing the one [`SessionConfig`] the rest of
//! the run reads from.
//!
//! Order of operations:
//! 1. `-d` fixes the working directory.
//! 2. `-E var=value` overrides are applied, configuration files are
//!    discovered from the working directory, and the overrides are applied
//!    again so they beat discovered values.
//! 3. Content and command charsets are resolved; a wide command charset
//!    requires a narrow one discovered from the locale.
//! 4. The overrides are applied a third time, then every other session value
//!    is read with option > configuration > default precedence.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    effective_batch_size, CharSet, CharsetError, OptionCode, ParsedOptionSet,
};
use crate::infrastructure::traits::ConfigProvider;

pub const DEFAULT_PORT: &str = "perforce:1666";
pub const DEFAULT_PROGRAM: &str = "depot";

/// Protocol settings requested on every connection.
const BASE_PROTOCOL: [(&str, &str); 4] = [
    ("api", "99999"),
    ("enableStreams", ""),
    ("enableGraph", ""),
    ("expandAndmaps", ""),
];

/// Debug levels given with `-v`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugLevels {
    /// Bare numeric level (`-v 2`).
    pub general: u8,
    /// Named levels (`-v rpc=3`).
    pub named: Vec<(String, u8)>,
}

impl DebugLevels {
    pub fn from_options(opts: &ParsedOptionSet) -> Self {
        let mut levels = Self::default();
        for v in opts.all('v') {
            match v.split_once('=') {
                Some((name, level)) => match level.parse() {
                    Ok(n) => levels.named.push((name.to_string(), n)),
                    Err(_) => warn!("ignoring debug level {}", v),
                },
                None => match v.parse::<u8>() {
                    Ok(n) => levels.general = levels.general.max(n),
                    Err(_) => warn!("ignoring debug level {}", v),
                },
            }
        }
        levels
    }
}

/// Everything a run needs, constructed once and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cwd: PathBuf,
    pub config_file: Option<PathBuf>,
    pub client: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: String,
    pub language: Option<String>,
    pub password: Option<String>,
    /// Content charset (`-C`).
    pub charset: CharSet,
    /// Command charset (`-Q`).
    pub command_charset: CharSet,
    /// Narrow charset arguments are sent in; differs from `command_charset`
    /// only when that one is wide.
    pub argument_charset: CharSet,
    pub program: String,
    pub version: String,
    /// `-z` variables in order.
    pub variables: Vec<(String, String)>,
    /// Protocol settings requested at connect time.
    pub protocol: Vec<(String, String)>,
    pub debug: DebugLevels,
    pub quiet: bool,
    pub batch_size: usize,
    pub retries: u32,
    /// `P4COLORS` rules.
    pub colors: Option<String>,
    pub force_color: bool,
}

/// Split `name=value`; a bare name has an empty value.
fn split_assignment(text: &str) -> (String, String) {
    match text.split_once('=') {
        Some((k, v)) => (k.to_string(), v.to_string()),
        None => (text.to_string(), String::new()),
    }
}

fn expand(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

fn charset_listing(name: &str) -> String {
    let names = CharSet::all_names().chunks(8);
    let lines = names.into_iter().map(|mut c| c.join(", ")).join(",\n    ");
    format!(
        "Character set must be one of:\n    {lines}\nCheck P4CHARSET and your '-C' option (got '{name}')."
    )
}

/// Builds a [`SessionConfig`] from parsed options and a configuration provider.
pub struct EnvironmentNegotiator<'a> {
    provider: &'a mut dyn ConfigProvider,
    default_port: String,
}

impl<'a> EnvironmentNegotiator<'a> {
    pub fn new(provider: &'a mut dyn ConfigProvider) -> Self {
        Self {
            provider,
            default_port: DEFAULT_PORT.to_string(),
        }
    }

    pub fn with_default_port(mut self, port: impl Into<String>) -> Self {
        self.default_port = port.into();
        self
    }

    fn apply_overrides(&mut self, overrides: &[(String, String)]) {
        for (name, value) in overrides {
            self.provider.update(name, value);
        }
    }

    /// Option value, else configuration value; empty strings count as unset.
    fn value(&self, opts: &ParsedOptionSet, flag: char, var: &str) -> Option<String> {
        opts.get(flag)
            .map(str::to_string)
            .or_else(|| self.provider.get(var))
            .filter(|v| !v.is_empty())
    }

    fn discover(&self) -> Result<CharSet, CharsetError> {
        CharSet::discover(|var| self.provider.get(var))
    }

    /// Resolve the content charset; `auto` falls back to no translation.
    fn content_charset(&self, opts: &ParsedOptionSet) -> ApplicationResult<CharSet> {
        let name = opts
            .get('C')
            .or_else(|| opts.get('l'))
            .map(str::to_string)
            .or_else(|| self.provider.get("P4CHARSET"))
            .filter(|v| !v.is_empty());
        let Some(name) = name else {
            return Ok(CharSet::None);
        };
        match CharSet::lookup(&name) {
            Ok(CharSet::Auto) => Ok(self.discover().unwrap_or_else(|_| {
                debug!("content_charset: auto discovery failed, using none");
                CharSet::None
            })),
            Ok(cs) => Ok(cs),
            Err(_) => Err(ApplicationError::Config {
                message: charset_listing(&name),
            }),
        }
    }

    fn command_charset(&self, opts: &ParsedOptionSet, content: CharSet) -> ApplicationResult<CharSet> {
        let name = opts
            .get('Q')
            .map(str::to_string)
            .or_else(|| self.provider.get("P4COMMANDCHARSET"))
            .filter(|v| !v.is_empty());
        let Some(name) = name else {
            return Ok(content);
        };
        match CharSet::lookup(&name) {
            Ok(CharSet::Auto) => self.discover().map_err(|e| ApplicationError::Config {
                message: e.to_string(),
            }),
            Ok(cs) => Ok(cs),
            Err(_) => Err(ApplicationError::Config {
                message: "P4COMMANDCHARSET unknown".to_string(),
            }),
        }
    }

    /// Resolve the full session configuration.
    ///
    /// `opts` is mutable only so the password buffer can be scrubbed.
    #[instrument(level = "debug", skip_all, fields(cwd = %cwd.display()))]
    pub fn negotiate(&mut self, opts: &mut ParsedOptionSet, cwd: &Path) -> ApplicationResult<SessionConfig> {
        let cwd = match opts.get('d') {
            Some(dir) => cwd.join(expand(dir)),
            None => cwd.to_path_buf(),
        };
        let overrides: Vec<(String, String)> = opts
            .all('E')
            .into_iter()
            .map(split_assignment)
            .filter(|(name, _)| !name.is_empty())
            .collect();

        self.apply_overrides(&overrides);
        self.provider
            .load(&cwd)
            .map_err(|e| ApplicationError::Config {
                message: format!("configuration discovery in {}: {}", cwd.display(), e),
            })?;
        self.apply_overrides(&overrides);

        let charset = self.content_charset(opts)?;
        let command_charset = self.command_charset(opts, charset)?;
        let argument_charset = if command_charset.is_wide() {
            debug!("negotiate: command charset {} is wide, discovering", command_charset);
            self.discover().map_err(|_| ApplicationError::Config {
                message: format!(
                    "command charset {command_charset} is wide and no narrow charset could be discovered from LC_ALL, LC_CTYPE or LANG"
                ),
            })?
        } else {
            command_charset
        };
        self.apply_overrides(&overrides);

        let password = opts
            .take_secret('P')
            .or_else(|| self.provider.get("P4PASSWD"))
            .filter(|v| !v.is_empty());

        let mut program = DEFAULT_PROGRAM.to_string();
        let mut version = env!("CARGO_PKG_VERSION").to_string();
        let variables: Vec<(String, String)> = opts.all('z').into_iter().map(split_assignment).collect();
        for (name, value) in &variables {
            match name.as_str() {
                "prog" => program = value.clone(),
                "version" => version = value.clone(),
                _ => {}
            }
        }

        let mut protocol: Vec<(String, String)> = BASE_PROTOCOL
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if opts.has('G') || opts.has('R') || opts.has(OptionCode::Field) {
            protocol.push(("tag".into(), String::new()));
            protocol.push(("specstring".into(), String::new()));
        } else if opts.has('M') {
            protocol.push(("specstring".into(), String::new()));
        }
        protocol.extend(opts.all('Z').into_iter().map(split_assignment));

        let batch_size = effective_batch_size(opts.get('b'));
        let retries = opts
            .get_number('r')
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0);

        let config = SessionConfig {
            config_file: self.provider.config_file(),
            client: self.value(opts, 'c', "P4CLIENT"),
            user: self
                .value(opts, 'u', "P4USER")
                .or_else(|| self.provider.get("USER").filter(|v| !v.is_empty())),
            host: self
                .value(opts, 'H', "P4HOST")
                .or_else(|| hostname::get().ok().map(|h| h.to_string_lossy().into_owned())),
            port: self
                .value(opts, 'p', "P4PORT")
                .unwrap_or_else(|| self.default_port.clone()),
            language: self.value(opts, 'L', "P4LANGUAGE"),
            password,
            charset,
            command_charset,
            argument_charset,
            program,
            version,
            variables,
            protocol,
            debug: DebugLevels::from_options(opts),
            quiet: opts.has('q'),
            batch_size,
            retries,
            colors: self.provider.get("P4COLORS"),
            force_color: opts.has(OptionCode::Color),
            cwd,
        };
        debug!(
            "negotiate: port={} charset={} command_charset={} batch_size={} retries={}",
            config.port, config.charset, config.command_charset, config.batch_size, config.retries
        );
        Ok(config)
    }
}
