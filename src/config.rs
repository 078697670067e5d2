//! Configuration management for levipack.
//!
//! Reads configuration from a .env file (loaded by `main`) and environment
//! variables. Environment variables take precedence.

use std::env;
use std::path::{Path, PathBuf};

/// Levipack configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Command used for privileged filesystem operations (default: sudo).
    pub sudo_command: String,
    /// Override for the static resources directory.
    resources_override: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Recognized variables:
    /// - `LEVIPACK_SUDO`: privilege-escalation command (e.g. `doas`)
    /// - `LEVIPACK_RESOURCES`: static resources directory
    pub fn load() -> Self {
        let sudo_command = env::var("LEVIPACK_SUDO").unwrap_or_else(|_| "sudo".to_string());
        let resources_override = env::var("LEVIPACK_RESOURCES").ok().map(PathBuf::from);

        Self {
            sudo_command,
            resources_override,
        }
    }

    /// The static resources directory merged into the distribution namespace.
    ///
    /// Defaults to `<workspace>/resources` unless overridden.
    pub fn resources_dir(&self, workspace: &Path) -> PathBuf {
        self.resources_override
            .clone()
            .unwrap_or_else(|| workspace.join("resources"))
    }
}
