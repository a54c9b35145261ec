// ABOUTME: HostUi implementation for a plain terminal session.
// ABOUTME: Terminals are child processes sharing our stdio; Ctrl-C closes them.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;

use crate::error::Result;
use crate::host::{HostTerminal, HostUi, StatusIndicator};
use crate::output::{Output, OutputMode};

/// A command running in the foreground of this terminal.
#[derive(Debug)]
pub struct TerminalHandle {
    title: String,
    closed: watch::Sender<bool>,
    /// `None` while running; `Some(code)` once finished (`code` is `None` when killed).
    finished: watch::Sender<Option<Option<i32>>>,
}

impl TerminalHandle {
    fn spawn(title: &str, cwd: &Path, argv: &[String], json: bool) -> Result<Arc<Self>> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "empty command line")
        })?;

        // Keep stdout clean for JSON lines.
        let stdout = if json {
            Stdio::from(io::stderr())
        } else {
            Stdio::inherit()
        };

        let child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let (closed, _) = watch::channel(false);
        let (finished, _) = watch::channel(None);
        let handle = Arc::new(Self {
            title: title.to_string(),
            closed,
            finished,
        });

        tokio::spawn(supervise(Arc::clone(&handle), child));
        Ok(handle)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Exit code once finished. `None` while running or when the process was killed.
    pub fn exit_code(&self) -> Option<i32> {
        (*self.finished.borrow()).flatten()
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code() == Some(0)
    }
}

/// Wait for the child to exit, killing it if the terminal is closed first.
async fn supervise(handle: Arc<TerminalHandle>, mut child: Child) {
    let mut closed = handle.closed.subscribe();
    let closed = async move { closed.wait_for(|c| *c).await.map(|_| ()) };

    let code = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::debug!("Waiting on {} failed: {}", handle.title, e);
                None
            }
        },
        _ = closed => {
            tracing::debug!("Terminal {} closed, stopping its command", handle.title);
            stop(&handle.title, &mut child).await;
            None
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("Interrupted, closing terminal {}", handle.title);
            handle.closed.send_replace(true);
            stop(&handle.title, &mut child).await;
            None
        }
    };

    handle.finished.send_replace(Some(code));
}

async fn stop(title: &str, child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!("Failed to kill {}: {}", title, e);
    }
    if let Err(e) = child.wait().await {
        tracing::debug!("Waiting on {} after kill failed: {}", title, e);
    }
}

#[async_trait]
impl HostTerminal for TerminalHandle {
    fn focus(&self) {
        // The child already owns the foreground.
    }

    fn dispose(&self) {
        self.closed.send_replace(true);
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|c| *c).await;
    }

    async fn finished(&self) {
        let mut rx = self.finished.subscribe();
        let _ = rx.wait_for(|f| f.is_some()).await;
    }
}

/// [`HostUi`] that prints through [`Output`] and runs terminals as child processes.
#[derive(Debug)]
pub struct TerminalHost {
    output: Output,
    workspace: Option<PathBuf>,
    show_status: bool,
    assume_yes: bool,
    last_status: Mutex<Option<StatusIndicator>>,
}

impl TerminalHost {
    pub fn new(output: Output, workspace: Option<PathBuf>, show_status: bool) -> Self {
        Self {
            output,
            workspace,
            show_status,
            assume_yes: false,
            last_status: Mutex::new(None),
        }
    }

    /// Answer every confirmation with yes.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn output(&self) -> &Output {
        &self.output
    }
}

#[async_trait]
impl HostUi for TerminalHost {
    type Terminal = TerminalHandle;

    fn workspace_dir(&self) -> Option<PathBuf> {
        self.workspace.clone()
    }

    fn open_terminal(
        &self,
        title: &str,
        cwd: &Path,
        argv: &[String],
    ) -> Result<Arc<TerminalHandle>> {
        self.output.progress(&format!("» {title}: {}", argv.join(" ")));
        TerminalHandle::spawn(title, cwd, argv, self.output.mode() == OutputMode::Json)
    }

    fn set_status(&self, indicator: Option<StatusIndicator>) {
        if !self.show_status {
            return;
        }
        let mut last = self.last_status.lock();
        if *last == indicator {
            return;
        }
        if let Some(indicator) = &indicator {
            self.output.status(&indicator.text, &indicator.tooltip);
        }
        *last = indicator;
    }

    fn show_info(&self, message: &str) {
        self.output.info(message);
    }

    fn show_error(&self, message: &str) {
        self.output.error(message);
    }

    async fn confirm(&self, message: &str, confirm_label: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        eprint!("{message} [{confirm_label}/N] ");
        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut line).await {
            Ok(_) => is_yes(&line, confirm_label),
            Err(e) => {
                tracing::debug!("Could not read confirmation: {}", e);
                false
            }
        }
    }

    fn open_url(&self, url: &str) -> Result<()> {
        self.output.info(&format!("Opening {url}"));

        let opener = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        if let Err(e) = Command::new(opener)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            tracing::warn!("Could not launch {}: {}", opener, e);
        }
        Ok(())
    }
}

fn is_yes(answer: &str, confirm_label: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y")
        || answer.eq_ignore_ascii_case("yes")
        || answer.eq_ignore_ascii_case(confirm_label)
}
