// ABOUTME: Deploy session management: one deploy attempt at a time, end to end.
// ABOUTME: Exposes the session state machine, subscriber lists, and the coordinator.

mod coordinator;
mod deploy_session;
mod state;
mod subscribers;

pub use coordinator::Coordinator;
pub use deploy_session::DeploySession;
pub use state::SessionState;
pub use subscribers::{SubscriptionId, Subscribers};
