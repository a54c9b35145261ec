// ABOUTME: Refresh and dashboard commands: project overview, once or on a timer.
// ABOUTME: A failed background refresh keeps the previous view on screen.

use super::App;
use chrono::Utc;
use deckhand::error::Result;
use deckhand::output::{Output, OutputMode};
use deckhand::view::{ProjectView, render_dashboard, render_detail};
use tokio::time::MissedTickBehavior;

async fn identity(app: &App) -> Option<String> {
    match app.cli().whoami().await {
        Ok(identity) if identity.logged_in => identity.display_name().map(str::to_string),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Identity check failed: {}", e);
            None
        }
    }
}

fn print_views(views: &[ProjectView], who: Option<&str>, output: &Output) {
    match output.mode() {
        OutputMode::Json => output.data(views),
        _ => output.text(&render_dashboard(views, who)),
    }
}

/// Print all projects, or the detail of one.
pub async fn refresh(app: &App, project: Option<&str>, output: Output) -> Result<()> {
    if let Some(project) = project {
        let name = app.resolve_project(Some(project)).await?;
        let view = app.project_view(&name).await?;
        match output.mode() {
            OutputMode::Json => output.data(&view),
            _ => output.text(&render_detail(&view, Utc::now())),
        }
        return Ok(());
    }

    let views = app.refresh().await?;
    let who = identity(app).await;
    print_views(&views, who.as_deref(), &output);
    Ok(())
}

/// Redraw the overview every `refresh_interval` until interrupted.
pub async fn dashboard(app: &App, output: Output) -> Result<()> {
    let mut interval = tokio::time::interval(app.settings().refresh_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut shown = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = interval.tick() => {}
        }

        match app.refresh().await {
            Ok(views) => {
                let who = identity(app).await;
                if output.mode() == OutputMode::Normal {
                    // Clear the screen and move home.
                    print!("\x1b[2J\x1b[H");
                }
                print_views(&views, who.as_deref(), &output);
                shown = true;
            }
            Err(e) if shown => tracing::warn!("Refresh failed, keeping the last view: {}", e),
            Err(e) => return Err(e),
        }
    }
}
