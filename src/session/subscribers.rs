// ABOUTME: Observer lists for deploy success, failure, and timeout.
// ABOUTME: Any number of handlers per kind; each can be removed by its id.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::ProjectName;

/// Handle for removing a handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SuccessHandler = Arc<dyn Fn(&ProjectName, &str) + Send + Sync>;
type PlainHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    success: Mutex<Vec<(SubscriptionId, SuccessHandler)>>,
    failure: Mutex<Vec<(SubscriptionId, PlainHandler)>>,
    timeout: Mutex<Vec<(SubscriptionId, PlainHandler)>>,
}

impl Subscribers {
    /// Called with `(project, public_url)` when a deploy goes live.
    pub fn on_success<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ProjectName, &str) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.success.lock().push((id, Arc::new(handler)));
        id
    }

    /// Called when a deploy fails. Carries no details; refresh views to see them.
    pub fn on_failure<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.failure.lock().push((id, Arc::new(handler)));
        id
    }

    /// Called when the watcher gives up without a result.
    pub fn on_timeout<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.timeout.lock().push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.success.lock().retain(|(sid, _)| {
            let keep = *sid != id;
            removed |= !keep;
            keep
        });
        for list in [&self.failure, &self.timeout] {
            list.lock().retain(|(sid, _)| {
                let keep = *sid != id;
                removed |= !keep;
                keep
            });
        }
        removed
    }

    // Handlers are cloned out so none runs while a list is locked.

    pub(crate) fn notify_success(&self, project: &ProjectName, url: &str) {
        let handlers: Vec<_> = self.success.lock().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(project, url);
        }
    }

    pub(crate) fn notify_failure(&self) {
        let handlers: Vec<_> = self.failure.lock().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler();
        }
    }

    pub(crate) fn notify_timeout(&self) {
        let handlers: Vec<_> = self.timeout.lock().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler();
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}
