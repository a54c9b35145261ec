// ABOUTME: Validated domain types shared by the bridge, watcher, and views.
// ABOUTME: Project names are checked before they reach a command line.

mod project_name;
mod status;

pub use project_name::{ProjectName, ProjectNameError};
pub use status::ProjectStatus;
