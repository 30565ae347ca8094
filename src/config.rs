//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/depot/depot.toml`
//! 3. Environment variables: `DEPOT_*` prefix
//!
//! These settings describe the client installation. Connection values
//! (`P4PORT`, `P4USER`, ...) live in the enviro and config files read by
//! [`crate::infrastructure::enviro::LayeredEnviro`].

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::application::services::DEFAULT_PORT;

/// Unified configuration for depot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Program executed for each remote invocation (default: p4)
    pub backend: String,
    /// Persisted `NAME=value` file (default: ~/.p4enviro)
    pub enviro_file: PathBuf,
    /// Config file name searched from the working directory when `P4CONFIG` is unset
    pub config_name: Option<String>,
    /// Server address when neither `-p` nor `P4PORT` is given
    pub default_port: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: "p4".into(),
            enviro_file: default_enviro_file(),
            config_name: None,
            default_port: DEFAULT_PORT.into(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub backend: Option<String>,
    pub enviro_file: Option<PathBuf>,
    pub config_name: Option<String>,
    pub default_port: Option<String>,
}

fn default_enviro_file() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".p4enviro"))
        .unwrap_or_else(|| PathBuf::from("~/.p4enviro"))
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
pub fn expand_env_vars(input: &str) -> String {
    shellexpand::full(input)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Get the XDG config directory for depot.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "depot").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("depot.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.enviro_file.to_string_lossy().as_ref());
        self.enviro_file = PathBuf::from(expanded);
        self.backend = expand_env_vars(&self.backend);
    }

    /// Overlay wins where it specifies a value.
    fn apply(&self, overlay: &RawSettings) -> Self {
        Self {
            backend: overlay.backend.clone().unwrap_or_else(|| self.backend.clone()),
            enviro_file: overlay
                .enviro_file
                .clone()
                .unwrap_or_else(|| self.enviro_file.clone()),
            config_name: overlay.config_name.clone().or_else(|| self.config_name.clone()),
            default_port: overlay
                .default_port
                .clone()
                .unwrap_or_else(|| self.default_port.clone()),
        }
    }

    /// Load settings with layered precedence from the XDG location.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings using `global_path` as the global config file.
    pub fn load_from(global_path: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(path) = global_path {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.apply(&raw);
            }
        }

        // 3. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply DEPOT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("DEPOT").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("backend") {
            settings.backend = val;
        }
        if let Ok(val) = config.get_string("enviro_file") {
            settings.enviro_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("config_name") {
            settings.config_name = Some(val).filter(|v| !v.is_empty());
        }
        if let Ok(val) = config.get_string("default_port") {
            settings.default_port = val;
        }
        Ok(settings)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_files_when_loading_then_defaults_apply() {
        let settings = Settings::load_from(None).unwrap();
        assert!(!settings.backend.is_empty());
        assert_eq!(Settings::default().default_port, DEFAULT_PORT);
    }

    #[test]
    fn given_overlay_when_applying_then_only_specified_fields_change() {
        let base = Settings::default();
        let raw = RawSettings {
            backend: Some("/opt/p4".into()),
            config_name: Some(".p4config".into()),
            ..RawSettings::default()
        };

        let merged = base.apply(&raw);

        assert_eq!(merged.backend, "/opt/p4");
        assert_eq!(merged.config_name.as_deref(), Some(".p4config"));
        assert_eq!(merged.enviro_file, base.enviro_file);
    }
}
