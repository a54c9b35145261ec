// ABOUTME: Entry point for the deckhand CLI application.
// ABOUTME: Parses arguments, builds the coordinator, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::App;
use deckhand::bridge::{CliBridge, DeployCli};
use deckhand::config::Settings;
use deckhand::error::Result;
use deckhand::output::{Output, OutputMode};
use deckhand::terminal::TerminalHost;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = output_mode(&cli);

    match run(cli, mode).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Precondition failures were already reported by the host.
            if !e.is_surfaced() {
                Output::new(mode).error(&e.to_string());
            }
            ExitCode::FAILURE
        }
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    }
}

fn workspace_dir(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let dir = match explicit {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    Ok(dir.is_dir().then_some(dir))
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let workspace = workspace_dir(cli.workspace)?;
    let settings = match &workspace {
        Some(dir) => Settings::discover(dir)?,
        None => Settings::default(),
    }
    .with_env_overrides();

    let assume_yes = matches!(cli.command, Commands::Destroy { yes: true, .. });
    let host = TerminalHost::new(
        Output::new(mode),
        workspace,
        settings.show_status_indicator,
    )
    .assume_yes(assume_yes);

    let bridge: Arc<dyn DeployCli> = Arc::new(CliBridge::from_settings(&settings));
    let app: App = App::activate(bridge, Arc::new(host), settings).await;
    let output = Output::new(mode);

    match cli.command {
        Commands::Deploy => commands::deploy(&app, output).await,
        Commands::Init => commands::init(&app, output).await,
        Commands::Link => commands::link(&app, output).await,
        Commands::Refresh { project } => commands::refresh(&app, project.as_deref(), output).await,
        Commands::OpenUrl { project } => commands::open_url(&app, project.as_deref(), output).await,
        Commands::Logs { project } => commands::logs(&app, project.as_deref(), output).await,
        Commands::Stop { project } => commands::stop(&app, project.as_deref(), output).await,
        Commands::Restart { project } => commands::restart(&app, project.as_deref(), output).await,
        Commands::Destroy { project, .. } => {
            commands::destroy(&app, project.as_deref(), output).await
        }
        Commands::Login => commands::login(&app, output).await,
        Commands::Logout => commands::logout(&app, output).await,
        Commands::Dashboard => commands::dashboard(&app, output).await,
        Commands::InstallCli => commands::install_cli(&app, output).await,
    }
}
