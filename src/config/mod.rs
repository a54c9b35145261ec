// ABOUTME: User settings for deckhand, read from deckhand.yml in the workspace.
// ABOUTME: Handles discovery, defaults, validation, and environment overrides.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILENAME: &str = "deckhand.yml";
pub const SETTINGS_FILENAME_ALT: &str = "deckhand.yaml";
pub const SETTINGS_FILENAME_DIR: &str = ".deckhand/config.yml";

/// Environment variable that overrides `cli_path`.
pub const CLI_PATH_ENV: &str = "DECKHAND_CLI";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Executable name or path of the deploy CLI.
    #[serde(default = "default_cli_path")]
    pub cli_path: String,

    /// Timeout for ordinary CLI queries.
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,

    /// Timeout for the lightweight version probe.
    #[serde(default = "default_version_timeout", with = "humantime_serde")]
    pub version_timeout: Duration,

    /// Command run in a terminal when the CLI is missing.
    #[serde(default)]
    pub install_command: Option<Vec<String>>,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Number of poll ticks before a deploy watcher gives up.
    #[serde(default = "default_tick_ceiling")]
    pub tick_ceiling: u32,

    /// What to do with a still-open deploy terminal when a new deploy starts.
    #[serde(default)]
    pub deploy_policy: DeployPolicy,

    /// Dashboard auto-refresh interval.
    #[serde(default = "default_refresh_interval", with = "humantime_serde")]
    pub refresh_interval: Duration,

    #[serde(default = "default_true")]
    pub show_status_indicator: bool,

    /// Number of log lines requested by `logs`.
    #[serde(default = "default_log_tail")]
    pub log_tail: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployPolicy {
    /// Dispose the stale deploy terminal and start a fresh attempt.
    #[default]
    Restart,
    /// Bring the running deploy terminal forward and do nothing else.
    Focus,
}

fn default_cli_path() -> String {
    "ship".to_string()
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_version_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_tick_ceiling() -> u32 {
    600
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_log_tail() -> u32 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cli_path: default_cli_path(),
            command_timeout: default_command_timeout(),
            version_timeout: default_version_timeout(),
            install_command: None,
            poll_interval: default_poll_interval(),
            tick_ceiling: default_tick_ceiling(),
            deploy_policy: DeployPolicy::default(),
            refresh_interval: default_refresh_interval(),
            show_status_indicator: true,
            log_tail: default_log_tail(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is a valid "all defaults" file.
        if yaml.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content)?;
        settings.validate(path)?;
        Ok(settings)
    }

    /// Find the settings file in `dir`, falling back to defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Settings::default()),
        }
    }

    fn find(dir: &Path) -> Option<PathBuf> {
        [
            dir.join(SETTINGS_FILENAME),
            dir.join(SETTINGS_FILENAME_ALT),
            dir.join(SETTINGS_FILENAME_DIR),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(CLI_PATH_ENV)
            && !path.trim().is_empty()
        {
            self.cli_path = path;
        }
        self
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidConfig {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if self.cli_path.trim().is_empty() {
            return Err(invalid("cli_path cannot be empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval must be greater than zero"));
        }
        if self.tick_ceiling == 0 {
            return Err(invalid("tick_ceiling must be at least 1"));
        }
        if self.refresh_interval.is_zero() {
            return Err(invalid("refresh_interval must be greater than zero"));
        }
        if self.command_timeout.is_zero() {
            return Err(invalid("command_timeout must be greater than zero"));
        }
        if self.version_timeout.is_zero() {
            return Err(invalid("version_timeout must be greater than zero"));
        }
        if let Some(cmd) = &self.install_command
            && cmd.is_empty()
        {
            return Err(invalid("install_command cannot be an empty list"));
        }
        Ok(())
    }
}
