// ABOUTME: Lifecycle status reported by the deploy CLI for a project.
// ABOUTME: Unrecognised status strings collapse to Unknown instead of failing.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Live,
    Building,
    Failed,
    Stopped,
    Exited,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Live => "live",
            ProjectStatus::Building => "building",
            ProjectStatus::Failed => "failed",
            ProjectStatus::Stopped => "stopped",
            ProjectStatus::Exited => "exited",
            ProjectStatus::Unknown => "unknown",
        }
    }

    /// Single-character marker used in the dashboard and status indicator.
    pub fn glyph(&self) -> &'static str {
        match self {
            ProjectStatus::Live => "●",
            ProjectStatus::Building => "◐",
            ProjectStatus::Failed => "✗",
            ProjectStatus::Stopped | ProjectStatus::Exited => "○",
            ProjectStatus::Unknown => "?",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
