// ABOUTME: Fixed-interval poll loop that detects the end of a running deploy.
// ABOUTME: One query set in flight at a time; stops on a transition, the tick ceiling, or cancel.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::diff::{Transition, detect};
use super::snapshot::Snapshot;
use crate::bridge::DeployCli;
use crate::config::Settings;
use crate::types::ProjectName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    pub interval: Duration,
    /// Polls allowed before giving up.
    pub tick_ceiling: u32,
}

impl WatchConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            interval: settings.poll_interval,
            tick_ceiling: settings.tick_ceiling,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            tick_ceiling: 600,
        }
    }
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    Succeeded { project: ProjectName, url: String },
    Failed { project: ProjectName },
    /// The ceiling was reached without a transition.
    TimedOut { ticks: u32 },
    Cancelled,
}

impl From<Transition> for WatchOutcome {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Succeeded { project, url } => WatchOutcome::Succeeded { project, url },
            Transition::Failed { project } => WatchOutcome::Failed { project },
        }
    }
}

/// Shared count of poll ticks a watcher has started.
#[derive(Debug, Clone, Default)]
pub struct TickCounter(Arc<AtomicU32>);

impl TickCounter {
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Polls the deploy CLI and compares each result against a fixed baseline.
pub struct Watcher<C: ?Sized> {
    cli: Arc<C>,
    baseline: Arc<Snapshot>,
    config: WatchConfig,
    ticks: TickCounter,
}

impl<C: DeployCli + ?Sized> Watcher<C> {
    pub fn new(cli: Arc<C>, baseline: Arc<Snapshot>, config: WatchConfig) -> Self {
        Self {
            cli,
            baseline,
            config,
            ticks: TickCounter::default(),
        }
    }

    pub fn ticks(&self) -> TickCounter {
        self.ticks.clone()
    }

    pub fn baseline(&self) -> &Arc<Snapshot> {
        &self.baseline
    }

    /// Poll until a transition, the tick ceiling, or `cancelled` resolves.
    ///
    /// The first poll happens one interval after the call. A tick that runs
    /// long delays the next one rather than overlapping it, and missed ticks
    /// are skipped. Failed polls are logged and count towards the ceiling.
    pub async fn run<F>(self, cancelled: F) -> WatchOutcome
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;

        tokio::pin!(cancelled);

        loop {
            tokio::select! {
                biased;
                _ = &mut cancelled => return WatchOutcome::Cancelled,
                _ = interval.tick() => {}
            }

            let tick = self.ticks.increment();

            let polled = tokio::select! {
                biased;
                _ = &mut cancelled => return WatchOutcome::Cancelled,
                polled = Snapshot::fetch(&*self.cli) => polled,
            };

            match polled {
                Ok(current) => {
                    if let Some(transition) = detect(&self.baseline, &current) {
                        tracing::info!(tick, ?transition, "Deploy finished");
                        return transition.into();
                    }
                    tracing::trace!(tick, "No transition yet");
                }
                Err(e) => tracing::debug!(tick, "Poll failed, will retry: {}", e),
            }

            if tick >= self.config.tick_ceiling {
                tracing::warn!(
                    "Gave up watching deploy after {} polls without a result",
                    tick
                );
                return WatchOutcome::TimedOut { ticks: tick };
            }
        }
    }
}
