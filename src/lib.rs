// ABOUTME: Library root for deckhand - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod auth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod output;
pub mod session;
pub mod terminal;
pub mod types;
pub mod view;
pub mod watch;
