// ABOUTME: Bridge error types with the SNAFU pattern.
// ABOUTME: Separates process failures from unparseable output for callers.

use snafu::Snafu;
use std::time::Duration;

/// Failure of a single deploy CLI invocation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BridgeError {
    #[snafu(display("deploy CLI not found: {binary}"))]
    NotFound { binary: String },

    #[snafu(display("failed to run {binary}: {source}"))]
    Spawn {
        binary: String,
        source: std::io::Error,
    },

    #[snafu(display("`{command}` timed out after {:.1}s", timeout.as_secs_f64()))]
    Timeout { command: String, timeout: Duration },

    #[snafu(display("`{command}` exited with {}: {message}", exit_code_label(*code)))]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        message: String,
    },

    #[snafu(display("`{command}` returned invalid JSON: {source}"))]
    Parse {
        command: String,
        source: serde_json::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeErrorKind {
    /// Binary missing, non-zero exit, or timeout.
    Process,
    /// Output was not the JSON that was asked for.
    Parse,
}

impl BridgeError {
    pub fn kind(&self) -> BridgeErrorKind {
        match self {
            BridgeError::Parse { .. } => BridgeErrorKind::Parse,
            BridgeError::NotFound { .. }
            | BridgeError::Spawn { .. }
            | BridgeError::Timeout { .. }
            | BridgeError::NonZeroExit { .. } => BridgeErrorKind::Process,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }

    /// Message text the CLI itself produced, if any.
    pub fn cli_message(&self) -> Option<&str> {
        match self {
            BridgeError::NonZeroExit { message, .. } => Some(message),
            _ => None,
        }
    }
}

fn exit_code_label(code: Option<i32>) -> String {
    code.map(|c| format!("code {c}"))
        .unwrap_or_else(|| "a signal".to_string())
}
