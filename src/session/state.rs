// ABOUTME: States a deploy session moves through, published to observers.
// ABOUTME: Terminal states are resting states; a new deploy may start from any of them.

use crate::types::ProjectName;
use crate::watch::WatchOutcome;

/// Where the coordinator is in the deploy lifecycle.
///
/// `Idle -> PreflightChecking -> Running -> {Succeeded | Failed | TimedOut | UserCancelled}`.
/// A failed pre-flight check returns to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing has been deployed yet.
    #[default]
    Idle,
    /// Checking workspace, CLI presence, and login.
    PreflightChecking,
    /// The deploy terminal is open and the watcher is polling.
    Running,
    /// A project went live on a new URL.
    Succeeded { project: ProjectName, url: String },
    /// A project moved into the failed state.
    Failed { project: ProjectName },
    /// The watcher gave up after its tick ceiling.
    TimedOut,
    /// The deploy terminal was closed before a result.
    UserCancelled,
}

impl SessionState {
    /// Whether this state ends a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded { .. }
                | SessionState::Failed { .. }
                | SessionState::TimedOut
                | SessionState::UserCancelled
        )
    }

    /// Whether a session is being set up or is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::PreflightChecking | SessionState::Running)
    }
}

impl From<WatchOutcome> for SessionState {
    fn from(outcome: WatchOutcome) -> Self {
        match outcome {
            WatchOutcome::Succeeded { project, url } => SessionState::Succeeded { project, url },
            WatchOutcome::Failed { project } => SessionState::Failed { project },
            WatchOutcome::TimedOut { .. } => SessionState::TimedOut,
            WatchOutcome::Cancelled => SessionState::UserCancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_busy_are_disjoint() {
        let states = [
            SessionState::Idle,
            SessionState::PreflightChecking,
            SessionState::Running,
            SessionState::Succeeded {
                project: ProjectName::new("app").unwrap(),
                url: "https://app.dev".to_string(),
            },
            SessionState::Failed {
                project: ProjectName::new("app").unwrap(),
            },
            SessionState::TimedOut,
            SessionState::UserCancelled,
        ];

        for state in &states {
            assert!(!(state.is_terminal() && state.is_busy()), "{state:?}");
        }
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::Idle.is_busy());
    }

    #[test]
    fn watch_outcomes_map_to_terminal_states() {
        assert_eq!(
            SessionState::from(WatchOutcome::TimedOut { ticks: 600 }),
            SessionState::TimedOut
        );
        assert_eq!(
            SessionState::from(WatchOutcome::Cancelled),
            SessionState::UserCancelled
        );
    }
}
