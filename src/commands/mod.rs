// ABOUTME: Command module aggregator for the deckhand CLI.
// ABOUTME: Each handler drives the coordinator and reports through Output.

mod account;
mod dashboard;
mod deploy;
mod projects;

pub use account::{init, install_cli, link, login, logout};
pub use dashboard::{dashboard, refresh};
pub use deploy::deploy;
pub use projects::{destroy, logs, open_url, restart, stop};

use deckhand::bridge::DeployCli;
use deckhand::error::{Error, Result};
use deckhand::host::HostTerminal;
use deckhand::session::Coordinator;
use deckhand::terminal::{TerminalHandle, TerminalHost};

pub type App = Coordinator<dyn DeployCli, TerminalHost>;

/// Wait for a terminal command and turn a non-zero exit into an error.
async fn wait_for(terminal: &TerminalHandle) -> Result<()> {
    terminal.finished().await;
    if terminal.is_closed() || terminal.succeeded() {
        return Ok(());
    }
    Err(Error::CommandFailed {
        command: terminal.title().to_string(),
        code: terminal.exit_code(),
    })
}
