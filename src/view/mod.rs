// ABOUTME: Read model merging list, status, and per-project detail into one view.
// ABOUTME: Rebuilt from fresh CLI queries on every refresh and never stored.

mod render;

pub use render::{format_duration_ms, format_relative, render_dashboard, render_detail};

use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::bridge::{
    AutoDeploy, BridgeError, DeployCli, DeployRecord, ListEntry, ProjectDetail, StatusEntry,
};
use crate::types::{ProjectName, ProjectStatus};

/// Everything known about one project after a refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    pub name: ProjectName,
    pub status: ProjectStatus,
    pub public_url: Option<String>,
    pub local_url: Option<String>,
    pub tunnel_active: bool,
    pub framework: Option<String>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub network: Option<String>,
    pub uptime: Option<String>,
    pub auto_deploy: Option<AutoDeploy>,
    pub directory: Option<String>,
    pub custom_domains: Vec<String>,
    /// Recent deploys, in the order the CLI reported them.
    pub deploys: Vec<DeployRecord>,
}

impl ProjectView {
    /// Merge the three sources for `name`.
    ///
    /// Overlapping fields resolve list, then status, then detail. An `unknown`
    /// status counts as missing so a better source can fill it.
    pub fn merge(
        name: ProjectName,
        list: Option<&ListEntry>,
        status: Option<&StatusEntry>,
        detail: Option<&ProjectDetail>,
    ) -> Self {
        let resources = detail.and_then(|d| d.resources.as_ref());

        let project_status = [
            list.map(|l| l.status),
            status.map(|s| s.status),
            detail.map(|d| d.status),
        ]
        .into_iter()
        .flatten()
        .find(|s| *s != ProjectStatus::Unknown)
        .unwrap_or_default();

        ProjectView {
            name,
            status: project_status,
            public_url: list
                .and_then(|l| l.public_url.clone())
                .or_else(|| status.and_then(|s| s.url.clone()))
                .or_else(|| detail.and_then(|d| d.public_url.clone())),
            local_url: status
                .and_then(|s| s.local_url.clone())
                .or_else(|| detail.and_then(|d| d.local_url.clone())),
            tunnel_active: list
                .map(|l| l.tunnel_active)
                .or_else(|| detail.map(|d| d.tunnel_active))
                .unwrap_or(false),
            framework: status
                .and_then(|s| s.framework.clone())
                .or_else(|| detail.and_then(|d| d.framework.clone())),
            cpu: status
                .and_then(|s| s.cpu.clone())
                .or_else(|| resources.and_then(|r| r.cpu.clone())),
            memory: status
                .and_then(|s| s.memory.clone())
                .or_else(|| resources.and_then(|r| r.memory.clone())),
            network: resources.and_then(|r| r.net.clone()),
            uptime: status
                .and_then(|s| s.uptime.clone())
                .or_else(|| detail.and_then(|d| d.uptime.clone())),
            auto_deploy: list.and_then(|l| l.auto_deploy.clone()),
            directory: detail.and_then(|d| d.directory.clone()),
            custom_domains: detail.map(|d| d.custom_domains.clone()).unwrap_or_default(),
            deploys: detail.map(|d| d.deploys.clone()).unwrap_or_default(),
        }
    }

    /// Most recent deploy, if the CLI reported any.
    pub fn latest_deploy(&self) -> Option<&DeployRecord> {
        self.deploys.first()
    }
}

/// Build views for every project the CLI knows.
///
/// List and status are queried together; with `details`, each project's
/// detail is then fetched concurrently. A failed detail leaves that source
/// empty. Fails only when both list and status fail.
pub async fn collect_views<C: DeployCli + ?Sized>(
    cli: &C,
    details: bool,
) -> Result<Vec<ProjectView>, BridgeError> {
    let (list, status) = tokio::join!(cli.list_projects(), cli.status());

    let (list, status) = match (list, status) {
        (Err(list_err), Err(status_err)) => {
            tracing::debug!("Status query also failed: {}", status_err);
            return Err(list_err);
        }
        (list, status) => (
            list.unwrap_or_else(|e| {
                tracing::debug!("List query failed: {}", e);
                Vec::new()
            }),
            status.map(|s| s.projects).unwrap_or_else(|e| {
                tracing::debug!("Status query failed: {}", e);
                Vec::new()
            }),
        ),
    };

    let list_by_name: HashMap<_, _> = list.iter().map(|e| (e.name.clone(), e)).collect();
    let status_by_name: HashMap<_, _> = status.iter().map(|e| (e.name.clone(), e)).collect();

    let mut names: Vec<ProjectName> = list_by_name
        .keys()
        .chain(status_by_name.keys())
        .cloned()
        .collect();
    names.sort();
    names.dedup();

    let detail_by_name: BTreeMap<ProjectName, ProjectDetail> = if details {
        let fetched = join_all(names.iter().map(|name| cli.project_status(name))).await;
        names
            .iter()
            .cloned()
            .zip(fetched)
            .filter_map(|(name, result)| match result {
                Ok(detail) => Some((name, detail)),
                Err(e) => {
                    tracing::debug!("Detail query for {} failed: {}", name, e);
                    None
                }
            })
            .collect()
    } else {
        BTreeMap::new()
    };

    Ok(names
        .into_iter()
        .map(|name| {
            let list = list_by_name.get(&name).copied();
            let status = status_by_name.get(&name).copied();
            let detail = detail_by_name.get(&name);
            ProjectView::merge(name, list, status, detail)
        })
        .collect())
}

/// Build the view of a single project, or `None` when no source knows it.
pub async fn project_view<C: DeployCli + ?Sized>(
    cli: &C,
    name: &ProjectName,
) -> Result<Option<ProjectView>, BridgeError> {
    let (list, status, detail) = tokio::join!(
        cli.list_projects(),
        cli.status(),
        cli.project_status(name)
    );

    let list = match (list, &status, &detail) {
        (Err(e), Err(_), Err(_)) => return Err(e),
        (list, _, _) => list,
    };

    let list_entry = list
        .ok()
        .and_then(|entries| entries.into_iter().find(|e| &e.name == name));
    let status_entry = status
        .ok()
        .and_then(|report| report.projects.into_iter().find(|e| &e.name == name));
    let detail = detail.ok();

    if list_entry.is_none() && status_entry.is_none() && detail.is_none() {
        return Ok(None);
    }

    Ok(Some(ProjectView::merge(
        name.clone(),
        list_entry.as_ref(),
        status_entry.as_ref(),
        detail.as_ref(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Resources;

    fn name(s: &str) -> ProjectName {
        ProjectName::new(s).unwrap()
    }

    fn list_entry() -> ListEntry {
        ListEntry {
            name: name("app"),
            status: ProjectStatus::Live,
            public_url: Some("https://list.dev".to_string()),
            tunnel_active: true,
            auto_deploy: Some(AutoDeploy {
                repo: "me/app".to_string(),
                branch: "main".to_string(),
            }),
        }
    }

    fn status_entry() -> StatusEntry {
        StatusEntry {
            name: name("app"),
            framework: Some("nextjs".to_string()),
            status: ProjectStatus::Building,
            url: Some("https://status.dev".to_string()),
            local_url: Some("http://localhost:3000".to_string()),
            cpu: Some("2%".to_string()),
            memory: None,
            uptime: Some("3h".to_string()),
        }
    }

    fn detail() -> ProjectDetail {
        ProjectDetail {
            name: name("app"),
            directory: Some("/src/app".to_string()),
            framework: Some("react".to_string()),
            status: ProjectStatus::Failed,
            container_id: None,
            container_name: None,
            uptime: Some("1h".to_string()),
            local_url: Some("http://localhost:4000".to_string()),
            public_url: Some("https://detail.dev".to_string()),
            tunnel_active: false,
            resources: Some(Resources {
                cpu: Some("9%".to_string()),
                memory: Some("256MiB".to_string()),
                net: Some("1kB/s".to_string()),
            }),
            deploys: vec![],
            custom_domains: vec!["app.example.com".to_string()],
        }
    }

    #[test]
    fn list_overrides_status_overrides_detail() {
        let list = list_entry();
        let status = status_entry();
        let detail = detail();
        let view = ProjectView::merge(name("app"), Some(&list), Some(&status), Some(&detail));

        assert_eq!(view.status, ProjectStatus::Live);
        assert_eq!(view.public_url.as_deref(), Some("https://list.dev"));
        assert!(view.tunnel_active);
        assert_eq!(view.framework.as_deref(), Some("nextjs"));
        assert_eq!(view.local_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(view.cpu.as_deref(), Some("2%"));
        assert_eq!(view.uptime.as_deref(), Some("3h"));
    }

    #[test]
    fn detail_fills_gaps() {
        let status = status_entry();
        let detail = detail();
        let view = ProjectView::merge(name("app"), None, Some(&status), Some(&detail));

        assert_eq!(view.status, ProjectStatus::Building);
        assert_eq!(view.public_url.as_deref(), Some("https://status.dev"));
        assert!(!view.tunnel_active);
        assert_eq!(view.memory.as_deref(), Some("256MiB"));
        assert_eq!(view.network.as_deref(), Some("1kB/s"));
        assert_eq!(view.directory.as_deref(), Some("/src/app"));
        assert_eq!(view.custom_domains, ["app.example.com"]);
        assert!(view.auto_deploy.is_none());
    }

    #[test]
    fn unknown_status_yields_to_later_source() {
        let mut status = status_entry();
        status.status = ProjectStatus::Unknown;
        let detail = detail();
        let view = ProjectView::merge(name("app"), None, Some(&status), Some(&detail));

        assert_eq!(view.status, ProjectStatus::Failed);
    }

    #[test]
    fn no_sources_gives_unknown() {
        let view = ProjectView::merge(name("ghost"), None, None, None);
        assert_eq!(view.status, ProjectStatus::Unknown);
        assert!(view.public_url.is_none());
        assert!(view.latest_deploy().is_none());
    }
}
