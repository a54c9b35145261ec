// ABOUTME: Transition rules comparing a poll result against the pre-deploy baseline.
// ABOUTME: Pure functions; the first matching project in name order wins.

use super::snapshot::{ProjectSnapshot, Snapshot};
use crate::types::{ProjectName, ProjectStatus};

/// A detected end of a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A project went live on a URL it did not have before.
    Succeeded { project: ProjectName, url: String },
    /// A project moved into the failed state.
    Failed { project: ProjectName },
}

/// Find the first project whose state moved to success or failure since `baseline`.
///
/// Projects are visited in lexicographic name order. For each project the
/// success rule is checked before the failure rule.
pub fn detect(baseline: &Snapshot, current: &Snapshot) -> Option<Transition> {
    current.iter().find_map(|(name, now)| {
        let before = baseline.get(name);
        if is_success(before, now) {
            Some(Transition::Succeeded {
                project: name.clone(),
                url: now.url.clone(),
            })
        } else if is_failure(before, now) {
            Some(Transition::Failed {
                project: name.clone(),
            })
        } else {
            None
        }
    })
}

/// Live with a URL, and either not live before or live on a different URL.
///
/// An already-live project on an unchanged URL is not a new success.
fn is_success(before: Option<&ProjectSnapshot>, now: &ProjectSnapshot) -> bool {
    if now.status != ProjectStatus::Live || now.url.is_empty() {
        return false;
    }
    match before {
        None => true,
        Some(before) => before.status != ProjectStatus::Live || before.url != now.url,
    }
}

/// Failed now and not failed in the baseline.
fn is_failure(before: Option<&ProjectSnapshot>, now: &ProjectSnapshot) -> bool {
    now.status == ProjectStatus::Failed
        && before.is_none_or(|b| b.status != ProjectStatus::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, ProjectStatus, &str)]) -> Snapshot {
        entries
            .iter()
            .map(|(n, status, url)| {
                (
                    ProjectName::new(n).unwrap(),
                    ProjectSnapshot::new(*status, *url),
                )
            })
            .collect()
    }

    #[test]
    fn new_live_project_is_success() {
        let baseline = Snapshot::default();
        let current = snapshot(&[("app", ProjectStatus::Live, "https://app.example.com")]);

        assert_eq!(
            detect(&baseline, &current),
            Some(Transition::Succeeded {
                project: ProjectName::new("app").unwrap(),
                url: "https://app.example.com".to_string(),
            })
        );
    }

    #[test]
    fn redeploy_with_new_url_reports_new_url() {
        let baseline = snapshot(&[("app", ProjectStatus::Live, "https://old.example.com")]);
        let current = snapshot(&[("app", ProjectStatus::Live, "https://new.example.com")]);

        match detect(&baseline, &current) {
            Some(Transition::Succeeded { url, .. }) => assert_eq!(url, "https://new.example.com"),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn unchanged_live_project_is_not_success() {
        let baseline = snapshot(&[("app", ProjectStatus::Live, "https://app.example.com")]);
        let current = baseline.clone();

        assert_eq!(detect(&baseline, &current), None);
    }

    #[test]
    fn live_without_url_is_not_success() {
        let baseline = Snapshot::default();
        let current = snapshot(&[("app", ProjectStatus::Live, "")]);

        assert_eq!(detect(&baseline, &current), None);
    }

    #[test]
    fn building_to_live_on_same_url_is_success() {
        let baseline = snapshot(&[("app", ProjectStatus::Building, "https://app.example.com")]);
        let current = snapshot(&[("app", ProjectStatus::Live, "https://app.example.com")]);

        assert!(matches!(
            detect(&baseline, &current),
            Some(Transition::Succeeded { .. })
        ));
    }

    #[test]
    fn transition_into_failure_is_reported() {
        let baseline = snapshot(&[("app", ProjectStatus::Building, "")]);
        let current = snapshot(&[("app", ProjectStatus::Failed, "")]);

        assert_eq!(
            detect(&baseline, &current),
            Some(Transition::Failed {
                project: ProjectName::new("app").unwrap()
            })
        );
    }

    #[test]
    fn already_failed_project_is_not_reported() {
        let baseline = snapshot(&[("app", ProjectStatus::Failed, "")]);
        let current = snapshot(&[("app", ProjectStatus::Failed, "")]);

        assert_eq!(detect(&baseline, &current), None);
    }

    #[test]
    fn unknown_project_failing_is_reported() {
        let current = snapshot(&[("app", ProjectStatus::Failed, "")]);
        assert!(matches!(
            detect(&Snapshot::default(), &current),
            Some(Transition::Failed { .. })
        ));
    }

    #[test]
    fn ties_resolve_in_name_order() {
        let current = snapshot(&[
            ("zeta", ProjectStatus::Live, "https://zeta.dev"),
            ("alpha", ProjectStatus::Failed, ""),
            ("beta", ProjectStatus::Live, "https://beta.dev"),
        ]);

        assert_eq!(
            detect(&Snapshot::default(), &current),
            Some(Transition::Failed {
                project: ProjectName::new("alpha").unwrap()
            })
        );
    }
}
