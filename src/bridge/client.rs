// ABOUTME: Typed deploy CLI queries behind the DeployCli trait.
// ABOUTME: CliBridge implements them by spawning the configured binary.

use async_trait::async_trait;
use std::time::Duration;

use super::error::BridgeError;
use super::identity::{Identity, parse_version};
use super::records::{ListEntry, ProjectDetail, ProjectList, StatusReport};
use super::runner::CliRunner;
use crate::config::Settings;
use crate::types::ProjectName;

/// Queries the rest of deckhand needs from the deploy CLI.
///
/// Implemented by [`CliBridge`] for the real binary; tests script their own.
#[async_trait]
pub trait DeployCli: Send + Sync {
    /// `list --json`
    async fn list_projects(&self) -> Result<Vec<ListEntry>, BridgeError>;

    /// `status --json`
    async fn status(&self) -> Result<StatusReport, BridgeError>;

    /// `status <name> --json`
    async fn project_status(&self, name: &ProjectName) -> Result<ProjectDetail, BridgeError>;

    /// Current identity of the CLI account.
    async fn whoami(&self) -> Result<Identity, BridgeError>;

    /// Version string reported by the CLI.
    async fn version(&self) -> Result<String, BridgeError>;

    /// Last `tail` log lines. Errors are returned as the text itself.
    async fn logs(&self, name: &ProjectName, tail: u32) -> String;

    /// Full argv for running `args` in a terminal.
    fn command_line(&self, args: &[&str]) -> Vec<String>;

    /// Whether the binary is present and answers a version probe.
    async fn is_installed(&self) -> bool {
        match self.version().await {
            Ok(version) => {
                tracing::debug!("Deploy CLI version {}", version);
                true
            }
            Err(e) => {
                tracing::debug!("Deploy CLI not available: {}", e);
                false
            }
        }
    }

    /// Whether the CLI reports a logged-in identity. Any failure counts as logged out.
    async fn is_authenticated(&self) -> bool {
        match self.whoami().await {
            Ok(identity) => identity.logged_in,
            Err(e) => {
                tracing::debug!("Identity check failed: {}", e);
                false
            }
        }
    }
}

/// [`DeployCli`] backed by the real executable.
#[derive(Debug, Clone)]
pub struct CliBridge {
    runner: CliRunner,
    version_timeout: Duration,
}

impl CliBridge {
    pub fn new(runner: CliRunner, version_timeout: Duration) -> Self {
        Self {
            runner,
            version_timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            CliRunner::new(settings.cli_path.clone(), settings.command_timeout),
            settings.version_timeout,
        )
    }

    pub fn runner(&self) -> &CliRunner {
        &self.runner
    }
}

#[async_trait]
impl DeployCli for CliBridge {
    async fn list_projects(&self) -> Result<Vec<ListEntry>, BridgeError> {
        self.runner
            .run_json::<ProjectList<ListEntry>>(&["list"])
            .await
            .map(|list| list.0)
    }

    async fn status(&self) -> Result<StatusReport, BridgeError> {
        self.runner.run_json(&["status"]).await
    }

    async fn project_status(&self, name: &ProjectName) -> Result<ProjectDetail, BridgeError> {
        self.runner.run_json(&["status", name.as_str()]).await
    }

    async fn whoami(&self) -> Result<Identity, BridgeError> {
        let timeout = self.runner.default_timeout();
        match self
            .runner
            .run_capturing_combined(&["whoami", "--json"], timeout)
            .await
        {
            Ok(output) => Ok(Identity::parse(&output)),
            // Logged-out CLIs commonly exit non-zero with the reason on stderr.
            Err(BridgeError::NonZeroExit { message, .. }) => Ok(Identity::from_text(&message)),
            Err(e) => Err(e),
        }
    }

    async fn version(&self) -> Result<String, BridgeError> {
        let output = self
            .runner
            .run_capturing_combined(&["version"], self.version_timeout)
            .await?;
        Ok(parse_version(&output).unwrap_or_else(|| output.trim().to_string()))
    }

    async fn logs(&self, name: &ProjectName, tail: u32) -> String {
        let tail = tail.to_string();
        let timeout = self.runner.default_timeout();
        match self
            .runner
            .run_capturing_combined(&["logs", name.as_str(), "--tail", &tail], timeout)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Log fetch for {} failed: {}", name, e);
                format!("Failed to fetch logs for {name}: {e}")
            }
        }
    }

    fn command_line(&self, args: &[&str]) -> Vec<String> {
        std::iter::once(self.runner.binary())
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }
}
