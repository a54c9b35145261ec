// ABOUTME: Deploy command implementation.
// ABOUTME: Starts a deploy session and waits for the watcher's verdict.

use super::App;
use deckhand::error::{Error, Result};
use deckhand::output::{Output, OutputMode};
use deckhand::session::SessionState;
use serde::Serialize;
use tokio::sync::watch;

#[derive(Serialize)]
struct DeployReport<'a> {
    project: &'a str,
    url: &'a str,
}

/// Deploy the workspace and block until it succeeds, fails, times out, or is cancelled.
pub async fn deploy(app: &App, mut output: Output) -> Result<()> {
    output.start_timer();
    output.progress("Deploying workspace...");

    app.start_deploy().await?;

    let mut states = app.state();
    let finished = tokio::select! {
        state = settled(&mut states) => state,
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("Interrupted, cancelling deploy");
            app.cancel_deploy();
            settled(&mut states).await
        }
    };
    // The coordinator owns the sender, so this only happens while shutting down.
    let Some(outcome) = finished else {
        return Err(Error::DeployCancelled);
    };

    match outcome {
        SessionState::Succeeded { project, url } => {
            output.success(&format!("{project} is live at {url}"));
            if output.mode() == OutputMode::Json {
                output.data(&DeployReport {
                    project: project.as_str(),
                    url: &url,
                });
            }
            Ok(())
        }
        SessionState::Failed { project } => {
            // Failure carries no details; the latest deploy record has them.
            let detail = match app.project_view(&project).await {
                Ok(view) => view.latest_deploy().and_then(|d| d.error.clone()),
                Err(e) => {
                    tracing::debug!("Could not load failure details: {}", e);
                    None
                }
            };
            Err(Error::DeployFailed {
                project: project.to_string(),
                detail,
            })
        }
        SessionState::TimedOut => Err(Error::DeployTimedOut(app.settings().tick_ceiling)),
        _ => Err(Error::DeployCancelled),
    }
}

async fn settled(states: &mut watch::Receiver<SessionState>) -> Option<SessionState> {
    states
        .wait_for(SessionState::is_terminal)
        .await
        .ok()
        .map(|state| state.clone())
}
