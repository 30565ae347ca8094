//! Service container for dependency injection
//!
//! Wires the configuration provider and remote session with their dependencies.

use std::sync::Arc;

use crate::application::services::SessionConfig;
use crate::config::Settings;
use crate::domain::SessionError;
use crate::infrastructure::enviro::LayeredEnviro;
use crate::infrastructure::session::ProcessSession;
use crate::infrastructure::traits::{CommandRunner, RealCommandRunner};

/// Container holding the collaborators of one client run.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealCommandRunner))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, cmd: Arc<dyn CommandRunner>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, cmd }
    }

    /// Configuration provider over the process environment and enviro file.
    pub fn enviro(&self) -> LayeredEnviro {
        LayeredEnviro::new(
            Some(self.settings.enviro_file.clone()),
            self.settings.config_name.clone(),
        )
    }

    /// Session running the configured backend.
    pub fn session<'a>(
        &self,
        config: &'a SessionConfig,
        tagged: bool,
    ) -> Result<ProcessSession<'a>, SessionError> {
        ProcessSession::new(Arc::clone(&self.cmd), self.settings.backend.clone(), config, tagged)
    }
}
