// ABOUTME: Mutable state of one in-flight deploy: terminal handle, baseline, tick count.
// ABOUTME: The terminated flag makes completion fire at most once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::host::HostTerminal;
use crate::watch::{Snapshot, TickCounter};

/// One deploy attempt between pre-flight and its terminal state.
pub struct DeploySession<T: ?Sized> {
    id: u64,
    terminal: Arc<T>,
    baseline: Arc<Snapshot>,
    ticks: TickCounter,
    tick_ceiling: u32,
    terminated: AtomicBool,
}

impl<T: HostTerminal + ?Sized> DeploySession<T> {
    pub(crate) fn new(
        id: u64,
        terminal: Arc<T>,
        baseline: Arc<Snapshot>,
        ticks: TickCounter,
        tick_ceiling: u32,
    ) -> Self {
        Self {
            id,
            terminal,
            baseline,
            ticks,
            tick_ceiling,
            terminated: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn terminal(&self) -> &Arc<T> {
        &self.terminal
    }

    /// The pre-deploy baseline. Shared read-only with the watcher.
    pub fn baseline(&self) -> &Arc<Snapshot> {
        &self.baseline
    }

    /// Poll ticks started so far.
    pub fn ticks(&self) -> u32 {
        self.ticks.get()
    }

    pub fn tick_ceiling(&self) -> u32 {
        self.tick_ceiling
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Claim the right to end this session. Only the first caller gets `true`.
    pub(crate) fn mark_terminated(&self) -> bool {
        !self.terminated.swap(true, Ordering::SeqCst)
    }
}

impl<T: ?Sized> std::fmt::Debug for DeploySession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploySession")
            .field("id", &self.id)
            .field("baseline_projects", &self.baseline.len())
            .field("ticks", &self.ticks.get())
            .field("tick_ceiling", &self.tick_ceiling)
            .field("terminated", &self.terminated.load(Ordering::SeqCst))
            .finish()
    }
}
