// ABOUTME: Host UI surface the coordinator drives: terminals, status indicator, prompts.
// ABOUTME: The terminal binary implements it; tests provide a recording fake.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::types::ProjectStatus;
use crate::view::ProjectView;

/// Persistent status line shown by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    pub text: String,
    pub tooltip: String,
    /// Host command run when the indicator is clicked.
    pub command: Option<String>,
}

impl StatusIndicator {
    pub fn deploying() -> Self {
        Self {
            text: "◐ Deploying…".to_string(),
            tooltip: "A deploy is running; its result will be reported here".to_string(),
            command: Some("dashboard".to_string()),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            text: "Deploy: sign in".to_string(),
            tooltip: "Not logged in to the deploy CLI".to_string(),
            command: Some("login".to_string()),
        }
    }

    pub fn for_project(view: &ProjectView) -> Self {
        let text = format!("{} {}", view.status.glyph(), view.name);
        let tooltip = match (&view.status, &view.public_url) {
            (ProjectStatus::Live, Some(url)) => format!("{} is live at {}", view.name, url),
            (status, _) => format!("{} is {}", view.name, status),
        };
        let command = match view.status {
            ProjectStatus::Live if view.public_url.is_some() => "open-url",
            _ => "dashboard",
        };
        Self {
            text,
            tooltip,
            command: Some(command.to_string()),
        }
    }
}

/// A terminal-like text stream running one command line.
#[async_trait]
pub trait HostTerminal: Send + Sync + 'static {
    /// Bring the terminal to the front.
    fn focus(&self);

    /// Close the terminal and stop whatever it runs.
    fn dispose(&self);

    /// Whether the terminal has been closed by the user or disposed.
    fn is_closed(&self) -> bool;

    /// Resolves once the terminal is closed or disposed.
    async fn closed(&self);

    /// Resolves once the command has finished running, or the terminal closed.
    async fn finished(&self);
}

/// Primitives the host environment offers.
#[async_trait]
pub trait HostUi: Send + Sync + 'static {
    type Terminal: HostTerminal;

    /// Folder of the open project, if any.
    fn workspace_dir(&self) -> Option<PathBuf>;

    /// Open a terminal in `cwd` running `argv`.
    fn open_terminal(
        &self,
        title: &str,
        cwd: &Path,
        argv: &[String],
    ) -> Result<Arc<Self::Terminal>>;

    /// Show or clear the status indicator.
    fn set_status(&self, indicator: Option<StatusIndicator>);

    fn show_info(&self, message: &str);

    fn show_error(&self, message: &str);

    /// Ask for confirmation; `confirm_label` names the accepting button.
    async fn confirm(&self, message: &str, confirm_label: &str) -> bool;

    fn open_url(&self, url: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectName;

    fn view(status: ProjectStatus, url: Option<&str>) -> ProjectView {
        let mut view = ProjectView::merge(ProjectName::new("app").unwrap(), None, None, None);
        view.status = status;
        view.public_url = url.map(str::to_string);
        view
    }

    #[test]
    fn live_project_indicator_opens_url() {
        let indicator =
            StatusIndicator::for_project(&view(ProjectStatus::Live, Some("https://app.dev")));
        assert_eq!(indicator.text, "● app");
        assert!(indicator.tooltip.contains("https://app.dev"));
        assert_eq!(indicator.command.as_deref(), Some("open-url"));
    }

    #[test]
    fn other_states_open_dashboard() {
        let indicator = StatusIndicator::for_project(&view(ProjectStatus::Failed, None));
        assert_eq!(indicator.tooltip, "app is failed");
        assert_eq!(indicator.command.as_deref(), Some("dashboard"));
    }
}
