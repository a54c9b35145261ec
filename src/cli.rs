// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "Deploy projects through the ship CLI and watch them go live")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (for CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Output JSON lines for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Project folder to work in (defaults to the current directory)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the workspace and wait until it is live or fails
    Deploy,

    /// Set up the workspace as a new project
    Init,

    /// Link the workspace to an existing project
    Link,

    /// Show all projects, or one project in detail
    Refresh {
        /// Project to show in detail
        project: Option<String>,
    },

    /// Open a project's public URL
    OpenUrl {
        /// Project name (defaults to the workspace project)
        project: Option<String>,
    },

    /// Print recent log lines of a project
    Logs {
        /// Project name (defaults to the workspace project)
        project: Option<String>,
    },

    /// Stop a project
    Stop {
        /// Project name (defaults to the workspace project)
        project: Option<String>,
    },

    /// Restart a project
    Restart {
        /// Project name (defaults to the workspace project)
        project: Option<String>,
    },

    /// Destroy a project and its deployments
    Destroy {
        /// Project name (defaults to the workspace project)
        project: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Log in to the deploy CLI
    Login,

    /// Log out of the deploy CLI
    Logout,

    /// Live overview of all projects, refreshed periodically
    Dashboard,

    /// Install the deploy CLI
    InstallCli,
}
