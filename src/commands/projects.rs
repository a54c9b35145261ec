// ABOUTME: Per-project commands: open-url, logs, stop, restart, destroy.
// ABOUTME: The project defaults to the one matching the workspace folder.

use super::{App, wait_for};
use deckhand::error::Result;
use deckhand::output::{Output, OutputMode};
use serde::Serialize;

#[derive(Serialize)]
struct UrlReport<'a> {
    project: &'a str,
    url: &'a str,
}

pub async fn open_url(app: &App, project: Option<&str>, output: Output) -> Result<()> {
    let name = app.resolve_project(project).await?;
    let url = app.open_url(&name).await?;
    if output.mode() == OutputMode::Json {
        output.data(&UrlReport {
            project: name.as_str(),
            url: &url,
        });
    } else {
        output.success(&url);
    }
    Ok(())
}

pub async fn logs(app: &App, project: Option<&str>, output: Output) -> Result<()> {
    let name = app.resolve_project(project).await?;
    let text = app.view_logs(&name).await;
    output.text(&text);
    if !text.ends_with('\n') && output.mode() != OutputMode::Json {
        println!();
    }
    Ok(())
}

pub async fn stop(app: &App, project: Option<&str>, output: Output) -> Result<()> {
    let name = app.resolve_project(project).await?;
    let terminal = app.stop_project(&name)?;
    wait_for(&terminal).await?;
    output.success(&format!("Stopped {name}"));
    Ok(())
}

pub async fn restart(app: &App, project: Option<&str>, output: Output) -> Result<()> {
    let name = app.resolve_project(project).await?;
    let terminal = app.restart_project(&name)?;
    wait_for(&terminal).await?;
    output.success(&format!("Restarted {name}"));
    Ok(())
}

pub async fn destroy(app: &App, project: Option<&str>, output: Output) -> Result<()> {
    let name = app.resolve_project(project).await?;
    match app.destroy_project(&name).await? {
        Some(terminal) => {
            wait_for(&terminal).await?;
            output.success(&format!("Destroyed {name}"));
        }
        None => output.info("Destroy cancelled"),
    }
    Ok(())
}
