// ABOUTME: Bridge to the external deploy CLI: subprocess runner, JSON records, typed queries.
// ABOUTME: Every call spawns a fresh process; nothing is pooled or kept alive.

mod client;
mod error;
mod identity;
mod records;
mod runner;

pub use client::{CliBridge, DeployCli};
pub use error::{BridgeError, BridgeErrorKind};
pub use identity::{Identity, parse_version};
pub use records::{
    AutoDeploy, DeployRecord, ListEntry, ProjectDetail, Resources, StatusEntry, StatusReport,
};
pub use runner::{CliRunner, MAX_OUTPUT_BYTES};
