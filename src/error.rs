// ABOUTME: Application-wide error types for deckhand.
// ABOUTME: Precondition failures carry their own remediation, bridge failures wrap BridgeError.

use std::path::PathBuf;
use thiserror::Error;

use crate::bridge::BridgeError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no project folder is open")]
    NoWorkspace,

    #[error("the deploy CLI is not installed")]
    CliNotInstalled,

    #[error("not logged in to the deploy CLI")]
    NotAuthenticated,

    #[error("could not determine the current project; pass a project name")]
    NoCurrentProject,

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project {0} has no public URL")]
    NoProjectUrl(String),

    #[error("deploy of {project} failed{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    DeployFailed {
        project: String,
        detail: Option<String>,
    },

    #[error("gave up waiting for the deploy after {0} checks")]
    DeployTimedOut(u32),

    #[error("deploy cancelled")]
    DeployCancelled,

    #[error("`{command}` exited with {}", .code.map(|c| format!("status {c}")).unwrap_or_else(|| "no status".to_string()))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("invalid project name: {0}")]
    InvalidProjectName(#[from] crate::types::ProjectNameError),

    #[error("invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether the host was already told about this failure through its own
    /// remediation path (message, install flow, login flow).
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            Error::NoWorkspace | Error::CliNotInstalled | Error::NotAuthenticated
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
