// ABOUTME: Test support utilities.
// ABOUTME: Scripted DeployCli and recording HostUi fakes shared by integration tests.

use async_trait::async_trait;
use deckhand::bridge::{
    BridgeError, DeployCli, Identity, ListEntry, ProjectDetail, StatusReport,
};
use deckhand::error::Result;
use deckhand::host::{HostTerminal, HostUi, StatusIndicator};
use deckhand::types::{ProjectName, ProjectStatus};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::sync::watch;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("deckhand=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Ordered record of calls made to the fakes.
pub type Journal = Arc<Mutex<Vec<String>>>;

#[allow(dead_code)]
pub fn name(s: &str) -> ProjectName {
    ProjectName::new(s).unwrap()
}

#[allow(dead_code)]
pub fn entry(project: &str, status: ProjectStatus, url: Option<&str>) -> ListEntry {
    ListEntry {
        name: name(project),
        status,
        public_url: url.map(str::to_string),
        tunnel_active: url.is_some(),
        auto_deploy: None,
    }
}

/// One scripted answer to `list`.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Poll {
    Projects(Vec<ListEntry>),
    /// Both list and status fail for this poll.
    Fail,
}

/// DeployCli that replays a script of list results.
///
/// Each `list_projects` call consumes the next scripted poll; once the
/// script runs out the last poll repeats. `status` mirrors the current poll.
pub struct FakeCli {
    script: Mutex<VecDeque<Poll>>,
    current: Mutex<Poll>,
    pub installed: AtomicBool,
    pub logged_in: AtomicBool,
    pub list_calls: AtomicUsize,
    pub delay: Mutex<Duration>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub details: Mutex<HashMap<String, ProjectDetail>>,
    journal: Journal,
}

#[allow(dead_code)]
impl FakeCli {
    pub fn new(script: Vec<Poll>) -> Self {
        Self::with_journal(script, Journal::default())
    }

    pub fn with_journal(script: Vec<Poll>, journal: Journal) -> Self {
        Self {
            script: Mutex::new(script.into()),
            current: Mutex::new(Poll::Projects(Vec::new())),
            installed: AtomicBool::new(true),
            logged_in: AtomicBool::new(true),
            list_calls: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            details: Mutex::new(HashMap::new()),
            journal,
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn add_detail(&self, detail: ProjectDetail) {
        self.details
            .lock()
            .insert(detail.name.as_str().to_string(), detail);
    }

    fn failure(command: &str) -> BridgeError {
        BridgeError::NonZeroExit {
            command: command.to_string(),
            code: Some(1),
            message: "scripted failure".to_string(),
        }
    }
}

#[async_trait]
impl DeployCli for FakeCli {
    async fn list_projects(&self) -> std::result::Result<Vec<ListEntry>, BridgeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push("list".to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let poll = {
            let mut script = self.script.lock();
            let mut current = self.current.lock();
            if let Some(next) = script.pop_front() {
                *current = next;
            }
            current.clone()
        };

        match poll {
            Poll::Projects(entries) => Ok(entries),
            Poll::Fail => Err(Self::failure("list")),
        }
    }

    async fn status(&self) -> std::result::Result<StatusReport, BridgeError> {
        match &*self.current.lock() {
            Poll::Projects(_) => Ok(StatusReport::default()),
            Poll::Fail => Err(Self::failure("status")),
        }
    }

    async fn project_status(
        &self,
        name: &ProjectName,
    ) -> std::result::Result<ProjectDetail, BridgeError> {
        self.details
            .lock()
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| Self::failure("status <name>"))
    }

    async fn whoami(&self) -> std::result::Result<Identity, BridgeError> {
        let logged_in = self.logged_in.load(Ordering::SeqCst);
        Ok(Identity {
            logged_in,
            email: logged_in.then(|| "dev@example.com".to_string()),
            user: None,
        })
    }

    async fn version(&self) -> std::result::Result<String, BridgeError> {
        if self.installed.load(Ordering::SeqCst) {
            Ok("1.0.0".to_string())
        } else {
            Err(BridgeError::NotFound {
                binary: "ship".to_string(),
            })
        }
    }

    async fn logs(&self, name: &ProjectName, tail: u32) -> String {
        format!("last {tail} lines of {name}\n")
    }

    fn command_line(&self, args: &[&str]) -> Vec<String> {
        std::iter::once("ship")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }
}

/// Terminal that only changes state when the test says so.
pub struct FakeTerminal {
    pub title: String,
    pub argv: Vec<String>,
    pub focused: AtomicUsize,
    closed: watch::Sender<bool>,
    finished: watch::Sender<bool>,
}

#[allow(dead_code)]
impl FakeTerminal {
    fn new(title: &str, argv: &[String]) -> Self {
        Self {
            title: title.to_string(),
            argv: argv.to_vec(),
            focused: AtomicUsize::new(0),
            closed: watch::channel(false).0,
            finished: watch::channel(false).0,
        }
    }

    /// The command ran to completion; the terminal stays open.
    pub fn finish(&self) {
        self.finished.send_replace(true);
    }

    /// The user closed the terminal.
    pub fn close(&self) {
        self.closed.send_replace(true);
        self.finished.send_replace(true);
    }

    pub fn focus_count(&self) -> usize {
        self.focused.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostTerminal for FakeTerminal {
    fn focus(&self) {
        self.focused.fetch_add(1, Ordering::SeqCst);
    }

    fn dispose(&self) {
        self.close();
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
        let _ = rx.wait_for(|f| *f).await;
    }
}

/// HostUi that records everything it is asked to do.
pub struct FakeHost {
    pub workspace: Option<PathBuf>,
    pub terminals: Mutex<Vec<Arc<FakeTerminal>>>,
    pub statuses: Mutex<Vec<Option<StatusIndicator>>>,
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub opened_urls: Mutex<Vec<String>>,
    pub confirm_answer: AtomicBool,
    pub confirmations: AtomicUsize,
    /// When set, `open_terminal` fails as if the command could not be spawned.
    pub refuse_terminals: AtomicBool,
    journal: Journal,
}

#[allow(dead_code)]
impl FakeHost {
    pub fn new(workspace: Option<PathBuf>) -> Self {
        Self::with_journal(workspace, Journal::default())
    }

    pub fn with_journal(workspace: Option<PathBuf>, journal: Journal) -> Self {
        Self {
            workspace,
            terminals: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
            infos: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            opened_urls: Mutex::new(Vec::new()),
            confirm_answer: AtomicBool::new(false),
            confirmations: AtomicUsize::new(0),
            refuse_terminals: AtomicBool::new(false),
            journal,
        }
    }

    pub fn terminal_argvs(&self) -> Vec<Vec<String>> {
        self.terminals
            .lock()
            .iter()
            .map(|t| t.argv.clone())
            .collect()
    }

    /// Most recent terminal whose command includes `subcommand`.
    pub fn terminal(&self, subcommand: &str) -> Option<Arc<FakeTerminal>> {
        self.terminals
            .lock()
            .iter()
            .rev()
            .find(|t| t.argv.iter().any(|a| a == subcommand))
            .cloned()
    }

    pub fn last_status(&self) -> Option<Option<StatusIndicator>> {
        self.statuses.lock().last().cloned()
    }
}

#[async_trait]
impl HostUi for FakeHost {
    type Terminal = FakeTerminal;

    fn workspace_dir(&self) -> Option<PathBuf> {
        self.workspace.clone()
    }

    fn open_terminal(&self, title: &str, _cwd: &Path, argv: &[String]) -> Result<Arc<FakeTerminal>> {
        self.journal
            .lock()
            .push(format!("open_terminal {}", argv.join(" ")));
        if self.refuse_terminals.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("cannot spawn terminal").into());
        }
        let terminal = Arc::new(FakeTerminal::new(title, argv));
        self.terminals.lock().push(Arc::clone(&terminal));
        Ok(terminal)
    }

    fn set_status(&self, indicator: Option<StatusIndicator>) {
        self.statuses.lock().push(indicator);
    }

    fn show_info(&self, message: &str) {
        self.infos.lock().push(message.to_string());
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    async fn confirm(&self, _message: &str, _confirm_label: &str) -> bool {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        self.confirm_answer.load(Ordering::SeqCst)
    }

    fn open_url(&self, url: &str) -> Result<()> {
        self.opened_urls.lock().push(url.to_string());
        Ok(())
    }
}
