// ABOUTME: Logged-in state of the deploy CLI with change notification.
// ABOUTME: Also waits for an interactive login to take effect by polling whoami.

use std::time::Duration;
use tokio::sync::watch;

use crate::bridge::DeployCli;
use crate::host::HostTerminal;

/// Process-wide "logged in" flag. Subscribers see transitions only.
#[derive(Debug)]
pub struct AuthState {
    tx: watch::Sender<bool>,
}

impl AuthState {
    pub fn new(logged_in: bool) -> Self {
        let (tx, _) = watch::channel(logged_in);
        Self { tx }
    }

    pub fn is_logged_in(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record a new value, notifying subscribers only if it changed.
    pub fn set(&self, logged_in: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == logged_in {
                false
            } else {
                *current = logged_in;
                true
            }
        });
        if changed {
            tracing::info!(logged_in, "Deploy CLI login state changed");
        }
        changed
    }

    /// Re-query the CLI and publish the result.
    pub async fn refresh<C: DeployCli + ?Sized>(&self, cli: &C) -> bool {
        let logged_in = cli.is_authenticated().await;
        self.set(logged_in);
        logged_in
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// How long to wait for an interactive login.
#[derive(Debug, Clone, Copy)]
pub struct LoginPoll {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for LoginPoll {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            attempts: 90,
        }
    }
}

/// Poll until the CLI reports a login, the login terminal finishes, or attempts run out.
///
/// When the terminal finishes first, one last check decides.
pub async fn wait_for_login<C, T>(cli: &C, terminal: &T, poll: LoginPoll) -> bool
where
    C: DeployCli + ?Sized,
    T: HostTerminal + ?Sized,
{
    let finished = terminal.finished();
    tokio::pin!(finished);

    for _ in 0..poll.attempts {
        tokio::select! {
            _ = &mut finished => return cli.is_authenticated().await,
            _ = tokio::time::sleep(poll.interval) => {
                if cli.is_authenticated().await {
                    return true;
                }
            }
        }
    }

    tracing::warn!("Timed out waiting for login");
    false
}
