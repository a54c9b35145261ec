// ABOUTME: Deploy completion detection by polling project state against a baseline.
// ABOUTME: Snapshot capture, pure transition rules, and the cancellable poll loop.

mod diff;
mod snapshot;
mod watcher;

pub use diff::{Transition, detect};
pub use snapshot::{ProjectSnapshot, Snapshot};
pub use watcher::{TickCounter, WatchConfig, WatchOutcome, Watcher};
