// ABOUTME: Account and workspace commands: login, logout, install-cli, init, link.
// ABOUTME: Each runs the deploy CLI interactively in the foreground.

use super::{App, wait_for};
use deckhand::error::{Error, Result};
use deckhand::output::Output;

pub async fn login(app: &App, output: Output) -> Result<()> {
    if app.login().await? {
        output.success("Logged in");
        Ok(())
    } else {
        Err(Error::NotAuthenticated)
    }
}

pub async fn logout(app: &App, output: Output) -> Result<()> {
    if app.logout().await? {
        output.warning("Still logged in after logout");
    } else {
        output.success("Logged out");
    }
    Ok(())
}

pub async fn install_cli(app: &App, output: Output) -> Result<()> {
    match app.install_cli()? {
        Some(terminal) => {
            wait_for(&terminal).await?;
            output.success("Deploy CLI installed");
            Ok(())
        }
        None => Err(Error::CliNotInstalled),
    }
}

pub async fn init(app: &App, output: Output) -> Result<()> {
    let terminal = app.init()?;
    wait_for(&terminal).await?;
    output.success("Project initialised");
    Ok(())
}

pub async fn link(app: &App, output: Output) -> Result<()> {
    let terminal = app.link()?;
    wait_for(&terminal).await?;
    output.success("Project linked");
    Ok(())
}
