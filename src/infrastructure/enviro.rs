//! Layered `NAME=value` configuration
//!
//! Lookup order, first hit wins:
//! 1. runtime overrides (`-E`)
//! 2. the config file named by `P4CONFIG`, found by walking up from the
//!    working directory
//! 3. the process environment
//! 4. the enviro file (`~/.p4enviro` by default)

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::infrastructure::traits::ConfigProvider;

/// Parse `NAME=value` lines; blank lines and `#` comments are skipped.
pub fn parse_assignments(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct LayeredEnviro {
    overrides: HashMap<String, String>,
    config: HashMap<String, String>,
    config_file: Option<PathBuf>,
    process: HashMap<String, String>,
    enviro: HashMap<String, String>,
    enviro_file: Option<PathBuf>,
    default_config_name: Option<String>,
}

impl LayeredEnviro {
    /// Provider over the current process environment.
    pub fn new(enviro_file: Option<PathBuf>, default_config_name: Option<String>) -> Self {
        Self::with_env(std::env::vars().collect(), enviro_file, default_config_name)
    }

    /// Provider over an explicit environment snapshot.
    pub fn with_env(
        process: HashMap<String, String>,
        enviro_file: Option<PathBuf>,
        default_config_name: Option<String>,
    ) -> Self {
        Self {
            process,
            enviro_file,
            default_config_name,
            ..Self::default()
        }
    }

    fn read_file(path: &Path) -> io::Result<HashMap<String, String>> {
        let content = std::fs::read_to_string(path)?;
        Ok(parse_assignments(&content).into_iter().collect())
    }

    fn find_config(&self, cwd: &Path, name: &str) -> Option<PathBuf> {
        cwd.ancestors()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

impl ConfigProvider for LayeredEnviro {
    fn get(&self, name: &str) -> Option<String> {
        self.overrides
            .get(name)
            .or_else(|| self.config.get(name))
            .or_else(|| self.process.get(name))
            .or_else(|| self.enviro.get(name))
            .cloned()
    }

    fn update(&mut self, name: &str, value: &str) {
        trace!("update: {}={}", name, value);
        self.overrides.insert(name.to_string(), value.to_string());
    }

    fn load(&mut self, cwd: &Path) -> io::Result<()> {
        if let Some(path) = &self.enviro_file {
            if path.is_file() {
                self.enviro = Self::read_file(path)?;
                debug!("load: enviro={} entries={}", path.display(), self.enviro.len());
            }
        }

        self.config.clear();
        self.config_file = None;
        let name = self
            .get("P4CONFIG")
            .filter(|n| !n.is_empty())
            .or_else(|| self.default_config_name.clone());
        let Some(name) = name else {
            return Ok(());
        };
        if let Some(path) = self.find_config(cwd, &name) {
            self.config = Self::read_file(&path)?;
            debug!("load: config={} entries={}", path.display(), self.config.len());
            self.config_file = Some(path);
        }
        Ok(())
    }

    fn config_file(&self) -> Option<PathBuf> {
        self.config_file.clone()
    }
}
