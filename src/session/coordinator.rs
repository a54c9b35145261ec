// ABOUTME: Drives deploy attempts end to end and forwards project commands to the CLI.
// ABOUTME: Holds the single active DeploySession; starting a new one replaces or focuses the old.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::deploy_session::DeploySession;
use super::state::SessionState;
use super::subscribers::Subscribers;
use crate::auth::{AuthState, LoginPoll, wait_for_login};
use crate::bridge::DeployCli;
use crate::config::{DeployPolicy, Settings};
use crate::error::{Error, Result};
use crate::host::{HostTerminal, HostUi, StatusIndicator};
use crate::types::ProjectName;
use crate::view::{self, ProjectView};
use crate::watch::{Snapshot, WatchConfig, WatchOutcome, Watcher};

struct ActiveSession<T> {
    session: Arc<DeploySession<T>>,
    task: JoinHandle<()>,
}

struct Inner<C: ?Sized, H: HostUi> {
    cli: Arc<C>,
    host: Arc<H>,
    settings: Settings,
    login_poll: LoginPoll,
    auth: AuthState,
    subscribers: Subscribers,
    state: watch::Sender<SessionState>,
    active: Mutex<Option<ActiveSession<H::Terminal>>>,
    /// Serialises `start_deploy` so two requests never interleave.
    gate: tokio::sync::Mutex<()>,
    next_session_id: AtomicU64,
}

/// Owner of the deploy session and entry point for every host command.
pub struct Coordinator<C: ?Sized, H: HostUi> {
    inner: Arc<Inner<C, H>>,
}

impl<C: ?Sized, H: HostUi> Clone for Coordinator<C, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, H> Coordinator<C, H>
where
    C: DeployCli + ?Sized + 'static,
    H: HostUi,
{
    pub fn new(cli: Arc<C>, host: Arc<H>, settings: Settings) -> Self {
        Self::with_login_poll(cli, host, settings, LoginPoll::default())
    }

    pub fn with_login_poll(
        cli: Arc<C>,
        host: Arc<H>,
        settings: Settings,
        login_poll: LoginPoll,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            inner: Arc::new(Inner {
                cli,
                host,
                settings,
                login_poll,
                auth: AuthState::new(false),
                subscribers: Subscribers::default(),
                state,
                active: Mutex::new(None),
                gate: tokio::sync::Mutex::new(()),
                next_session_id: AtomicU64::new(1),
            }),
        }
    }

    /// Build a coordinator and read the initial login state.
    pub async fn activate(cli: Arc<C>, host: Arc<H>, settings: Settings) -> Self {
        let coordinator = Self::new(cli, host, settings);
        coordinator.inner.auth.refresh(&*coordinator.inner.cli).await;
        coordinator
    }

    pub fn cli(&self) -> &Arc<C> {
        &self.inner.cli
    }

    pub fn host(&self) -> &Arc<H> {
        &self.inner.host
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn auth(&self) -> &AuthState {
        &self.inner.auth
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.inner.subscribers
    }

    /// Receiver for session state changes.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// The running deploy session, if there is one.
    pub fn active_session(&self) -> Option<Arc<DeploySession<H::Terminal>>> {
        self.inner
            .active
            .lock()
            .as_ref()
            .map(|active| Arc::clone(&active.session))
    }

    /// Start a deploy of the open workspace.
    ///
    /// Returns once the deploy terminal is open and the watcher is running;
    /// the result arrives through [`Subscribers`] and the state channel.
    /// Precondition failures have already been shown to the user when this
    /// returns their error.
    pub async fn start_deploy(&self) -> Result<()> {
        let inner = &self.inner;
        let _gate = inner.gate.lock().await;

        let Some(workspace) = inner.host.workspace_dir() else {
            inner
                .host
                .show_error("Open a project folder before deploying.");
            return Err(Error::NoWorkspace);
        };

        let had_session = self.active_session().is_some();
        if !had_session {
            self.publish(SessionState::PreflightChecking);
        }

        if let Err(e) = self.preflight(&workspace).await {
            if !had_session {
                self.publish(SessionState::Idle);
            }
            return Err(e);
        }

        if inner.settings.deploy_policy == DeployPolicy::Focus
            && let Some(session) = self.active_session()
            && !session.terminal().is_closed()
        {
            tracing::debug!(session = session.id(), "Deploy already running, focusing it");
            session.terminal().focus();
            return Ok(());
        }

        self.teardown_active();

        let baseline = Arc::new(Snapshot::capture(&*inner.cli).await);

        let argv = inner.cli.command_line(&["deploy"]);
        let terminal = match inner.host.open_terminal("Deploy", &workspace, &argv) {
            Ok(terminal) => terminal,
            Err(e) => {
                inner.host.set_status(None);
                self.publish(SessionState::Idle);
                inner
                    .host
                    .show_error(&format!("Could not start the deploy: {e}"));
                return Err(e);
            }
        };

        let config = WatchConfig::from_settings(&inner.settings);
        let watcher = Watcher::new(Arc::clone(&inner.cli), Arc::clone(&baseline), config);
        let id = inner.next_session_id.fetch_add(1, Ordering::SeqCst);
        let session = Arc::new(DeploySession::new(
            id,
            Arc::clone(&terminal),
            baseline,
            watcher.ticks(),
            config.tick_ceiling,
        ));

        inner.host.set_status(Some(StatusIndicator::deploying()));
        self.publish(SessionState::Running);
        tracing::info!(
            session = id,
            baseline_projects = session.baseline().len(),
            "Deploy started"
        );

        // Hold the slot while spawning so the task cannot finish before it is stored.
        let mut slot = inner.active.lock();
        let coordinator = self.clone();
        let task_session = Arc::clone(&session);
        let task = tokio::spawn(async move {
            let terminal = Arc::clone(task_session.terminal());
            let outcome = watcher.run(terminal.closed()).await;
            coordinator.finish(&task_session, outcome);
        });
        *slot = Some(ActiveSession { session, task });

        Ok(())
    }

    /// Close the running deploy's terminal, which ends its session as cancelled.
    ///
    /// Works after the deploy command itself has exited, while the watcher is
    /// still polling. Returns false when no deploy is running.
    pub fn cancel_deploy(&self) -> bool {
        match self.active_session() {
            Some(session) => {
                tracing::info!(session = session.id(), "Cancelling deploy");
                session.terminal().dispose();
                true
            }
            None => false,
        }
    }

    async fn preflight(&self, workspace: &Path) -> Result<()> {
        let inner = &self.inner;

        if !inner.cli.is_installed().await {
            self.offer_install(workspace);
            return Err(Error::CliNotInstalled);
        }

        if inner.auth.refresh(&*inner.cli).await {
            return Ok(());
        }

        inner
            .host
            .show_info("Log in to the deploy CLI in the terminal to continue.");
        if self.run_login(workspace).await? {
            Ok(())
        } else {
            inner
                .host
                .show_error("Not logged in to the deploy CLI. Deploy cancelled.");
            Err(Error::NotAuthenticated)
        }
    }

    /// Dispose the previous session, if any. Its outcome is never reported.
    fn teardown_active(&self) {
        let previous = self.inner.active.lock().take();
        if let Some(active) = previous {
            if active.session.mark_terminated() {
                tracing::info!(session = active.session.id(), "Replacing running deploy");
            }
            active.task.abort();
            active.session.terminal().dispose();
        }
    }

    fn finish(&self, session: &DeploySession<H::Terminal>, outcome: WatchOutcome) {
        if !session.mark_terminated() {
            return;
        }

        {
            let mut slot = self.inner.active.lock();
            if slot
                .as_ref()
                .is_some_and(|active| active.session.id() == session.id())
            {
                slot.take();
            }
        }

        self.inner.host.set_status(None);
        self.publish(SessionState::from(outcome.clone()));

        let subscribers = &self.inner.subscribers;
        match outcome {
            WatchOutcome::Succeeded { project, url } => {
                tracing::info!(%project, %url, "Deploy succeeded");
                subscribers.notify_success(&project, &url);
            }
            WatchOutcome::Failed { project } => {
                tracing::info!(%project, "Deploy failed");
                subscribers.notify_failure();
            }
            WatchOutcome::TimedOut { ticks } => {
                tracing::info!(ticks, "Deploy watch timed out");
                subscribers.notify_timeout();
            }
            WatchOutcome::Cancelled => {
                tracing::info!(session = session.id(), "Deploy terminal closed before a result");
            }
        }
    }

    fn publish(&self, state: SessionState) {
        tracing::debug!(?state, "Session state");
        self.inner.state.send_replace(state);
    }

    fn offer_install(&self, workspace: &Path) {
        let host = &self.inner.host;
        match &self.inner.settings.install_command {
            Some(argv) => match host.open_terminal("Install deploy CLI", workspace, argv) {
                Ok(_) => host.show_info("Installing the deploy CLI. Deploy again once it finishes."),
                Err(e) => host.show_error(&format!("Could not start the installer: {e}")),
            },
            None => host.show_error(&format!(
                "The deploy CLI `{}` was not found. Install it, or set install_command in deckhand.yml.",
                self.inner.settings.cli_path
            )),
        }
    }

    /// Open the login terminal and wait for the login to take effect.
    async fn run_login(&self, cwd: &Path) -> Result<bool> {
        let inner = &self.inner;
        let argv = inner.cli.command_line(&["login"]);
        let terminal = inner.host.open_terminal("Deploy login", cwd, &argv)?;
        let logged_in = wait_for_login(&*inner.cli, &*terminal, inner.login_poll).await;
        inner.auth.set(logged_in);
        Ok(logged_in)
    }

    fn cwd(&self) -> Result<PathBuf> {
        match self.inner.host.workspace_dir() {
            Some(dir) => Ok(dir),
            None => Ok(std::env::current_dir()?),
        }
    }

    fn run_in_terminal(&self, title: &str, cwd: &Path, args: &[&str]) -> Result<Arc<H::Terminal>> {
        let argv = self.inner.cli.command_line(args);
        tracing::debug!(?argv, "Opening terminal");
        self.inner.host.open_terminal(title, cwd, &argv)
    }

    /// Run the configured installer, or explain how to install when none is set.
    pub fn install_cli(&self) -> Result<Option<Arc<H::Terminal>>> {
        let cwd = self.cwd()?;
        match &self.inner.settings.install_command {
            Some(argv) => Ok(Some(self.inner.host.open_terminal(
                "Install deploy CLI",
                &cwd,
                argv,
            )?)),
            None => {
                self.offer_install(&cwd);
                Ok(None)
            }
        }
    }

    /// `<cli> login`, then wait for the CLI to report a login.
    pub async fn login(&self) -> Result<bool> {
        let cwd = self.cwd()?;
        let logged_in = self.run_login(&cwd).await?;
        if !logged_in {
            self.inner.host.show_error("Login did not complete.");
        }
        Ok(logged_in)
    }

    /// `<cli> logout`. Returns the login state afterwards.
    pub async fn logout(&self) -> Result<bool> {
        let cwd = self.cwd()?;
        let terminal = self.run_in_terminal("Deploy logout", &cwd, &["logout"])?;
        terminal.finished().await;
        Ok(self.inner.auth.refresh(&*self.inner.cli).await)
    }

    fn require_workspace(&self) -> Result<PathBuf> {
        self.inner.host.workspace_dir().ok_or_else(|| {
            self.inner.host.show_error("Open a project folder first.");
            Error::NoWorkspace
        })
    }

    /// `<cli> init` in the workspace.
    pub fn init(&self) -> Result<Arc<H::Terminal>> {
        let workspace = self.require_workspace()?;
        self.run_in_terminal("Deploy init", &workspace, &["init"])
    }

    /// `<cli> link` in the workspace.
    pub fn link(&self) -> Result<Arc<H::Terminal>> {
        let workspace = self.require_workspace()?;
        self.run_in_terminal("Deploy link", &workspace, &["link"])
    }

    pub fn stop_project(&self, name: &ProjectName) -> Result<Arc<H::Terminal>> {
        let cwd = self.cwd()?;
        self.run_in_terminal(&format!("Stop {name}"), &cwd, &["stop", name.as_str()])
    }

    pub fn restart_project(&self, name: &ProjectName) -> Result<Arc<H::Terminal>> {
        let cwd = self.cwd()?;
        self.run_in_terminal(&format!("Restart {name}"), &cwd, &["restart", name.as_str()])
    }

    /// Destroy after confirmation. Declining returns `Ok(None)` without running anything.
    pub async fn destroy_project(&self, name: &ProjectName) -> Result<Option<Arc<H::Terminal>>> {
        let message = format!(
            "Destroy {name}? This removes the project and its deployments and cannot be undone."
        );
        if !self.inner.host.confirm(&message, "Destroy").await {
            tracing::debug!(%name, "Destroy declined");
            return Ok(None);
        }

        let cwd = self.cwd()?;
        self.run_in_terminal(&format!("Destroy {name}"), &cwd, &["destroy", name.as_str()])
            .map(Some)
    }

    /// Re-read every project and the login state, and update the status indicator.
    pub async fn refresh(&self) -> Result<Vec<ProjectView>> {
        let inner = &self.inner;
        let (views, logged_in) = tokio::join!(
            view::collect_views(&*inner.cli, true),
            inner.auth.refresh(&*inner.cli)
        );
        let views = views?;

        if self.active_session().is_none() {
            let current = self.workspace_project_name();
            let indicator = if !logged_in {
                Some(StatusIndicator::signed_out())
            } else {
                current
                    .and_then(|name| views.iter().find(|v| v.name == name))
                    .map(StatusIndicator::for_project)
            };
            inner.host.set_status(indicator);
        }

        Ok(views)
    }

    pub async fn project_view(&self, name: &ProjectName) -> Result<ProjectView> {
        view::project_view(&*self.inner.cli, name)
            .await?
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))
    }

    /// Open the project's public URL in the host. Returns the URL.
    pub async fn open_url(&self, name: &ProjectName) -> Result<String> {
        let view = self.project_view(name).await?;
        let url = view
            .public_url
            .ok_or_else(|| Error::NoProjectUrl(name.to_string()))?;
        self.inner.host.open_url(&url)?;
        Ok(url)
    }

    /// Recent log lines, or the error text when they could not be fetched.
    pub async fn view_logs(&self, name: &ProjectName) -> String {
        self.inner.cli.logs(name, self.inner.settings.log_tail).await
    }

    /// Pick the project a command applies to.
    ///
    /// An explicit name wins. Otherwise the workspace folder name is used when
    /// the CLI knows a project by that name, or when the list cannot be read.
    pub async fn resolve_project(&self, explicit: Option<&str>) -> Result<ProjectName> {
        if let Some(name) = explicit {
            return Ok(ProjectName::new(name)?);
        }

        let candidate = self
            .workspace_project_name()
            .ok_or(Error::NoCurrentProject)?;

        match self.inner.cli.list_projects().await {
            Ok(entries) if entries.iter().any(|e| e.name == candidate) => Ok(candidate),
            Ok(_) => Err(Error::NoCurrentProject),
            Err(e) => {
                tracing::debug!("Could not list projects, assuming {}: {}", candidate, e);
                Ok(candidate)
            }
        }
    }

    fn workspace_project_name(&self) -> Option<ProjectName> {
        let dir = self.inner.host.workspace_dir()?;
        let base = dir.file_name()?.to_string_lossy();
        ProjectName::new(&base).ok()
    }
}
