// ABOUTME: Point-in-time map of project name to status and URL.
// ABOUTME: Built by merging list and status queries; never mutated once built.

use std::collections::BTreeMap;

use crate::bridge::{BridgeError, DeployCli, ListEntry, StatusReport};
use crate::types::{ProjectName, ProjectStatus};

/// State of one project at the moment a snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub status: ProjectStatus,
    /// Public URL, empty when the project has none.
    pub url: String,
}

impl ProjectSnapshot {
    pub fn new(status: ProjectStatus, url: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
        }
    }
}

/// Immutable snapshot of every known project, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    projects: BTreeMap<ProjectName, ProjectSnapshot>,
}

impl Snapshot {
    /// Merge `list` and `status` results by project name.
    ///
    /// List fields take precedence; status fields fill gaps (a project only
    /// `status` knows about, or a URL the list entry lacks).
    pub fn merge(list: &[ListEntry], status: &StatusReport) -> Self {
        let mut projects: BTreeMap<ProjectName, ProjectSnapshot> = status
            .projects
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    ProjectSnapshot::new(entry.status, entry.url.clone().unwrap_or_default()),
                )
            })
            .collect();

        for entry in list {
            let fallback_url = projects
                .get(&entry.name)
                .map(|p| p.url.clone())
                .unwrap_or_default();
            let url = entry.public_url.clone().unwrap_or(fallback_url);
            projects.insert(entry.name.clone(), ProjectSnapshot::new(entry.status, url));
        }

        Self { projects }
    }

    /// Query list and status concurrently and merge whatever came back.
    ///
    /// Fails only when both queries fail; one failing yields a partial snapshot.
    pub async fn fetch<C: DeployCli + ?Sized>(cli: &C) -> Result<Self, BridgeError> {
        let (list, status) = tokio::join!(cli.list_projects(), cli.status());

        match (list, status) {
            (Ok(list), Ok(status)) => Ok(Self::merge(&list, &status)),
            (Ok(list), Err(e)) => {
                tracing::debug!("Status query failed, using list only: {}", e);
                Ok(Self::merge(&list, &StatusReport::default()))
            }
            (Err(e), Ok(status)) => {
                tracing::debug!("List query failed, using status only: {}", e);
                Ok(Self::merge(&[], &status))
            }
            (Err(list_err), Err(status_err)) => {
                tracing::debug!("Status query also failed: {}", status_err);
                Err(list_err)
            }
        }
    }

    /// Take the pre-deploy baseline. Never fails: a failed query gives an empty baseline,
    /// which still lets first-time deploys be detected.
    pub async fn capture<C: DeployCli + ?Sized>(cli: &C) -> Self {
        match Self::fetch(cli).await {
            Ok(snapshot) => {
                tracing::debug!("Captured baseline of {} project(s)", snapshot.len());
                snapshot
            }
            Err(e) => {
                tracing::warn!("Could not capture project baseline, starting empty: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, name: &ProjectName) -> Option<&ProjectSnapshot> {
        self.projects.get(name)
    }

    /// Projects in lexicographic name order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProjectName, &ProjectSnapshot)> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl FromIterator<(ProjectName, ProjectSnapshot)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (ProjectName, ProjectSnapshot)>>(iter: I) -> Self {
        Self {
            projects: iter.into_iter().collect(),
        }
    }
}
