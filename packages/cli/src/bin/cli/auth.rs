// ABOUTME: Login, logout, and identity commands
// ABOUTME: Login runs the loopback OAuth callback and hands the redirect to the dashboard's callback flow

use anyhow::{bail, Result};
use colored::*;
use revdash_auth::{CallbackServer, CallbackState};
use revdash_cli::TerminalNavigator;
use revdash_dashboard::Dashboard;
use std::sync::Arc;
use tracing::warn;

pub async fn login(dashboard: &Dashboard, no_browser: bool) -> Result<()> {
    if let Some(user) = dashboard.auth_status().user {
        println!(
            "{} Already signed in as {}",
            "✓".green().bold(),
            user.username.bold()
        );
        return Ok(());
    }

    let url = dashboard.login_url()?;
    let server = CallbackServer::from_redirect_uri(&dashboard.config().redirect_uri)?;
    let listener = server.listen().await?;

    println!("{}", "🔐 Sign in with GitHub".bold().cyan());
    println!();
    if no_browser {
        println!("Open this URL to continue:");
    } else {
        println!("Opening your browser. If nothing happens, open this URL:");
        if let Err(e) = open::that(&url) {
            warn!("Could not open a browser: {}", e);
        }
    }
    println!("  {}", url.underline());
    println!();
    println!("{}", format!("Waiting for GitHub on {} ...", server.callback_url()).dimmed());

    let params = listener.accept_callback().await?;
    let flow = dashboard.callback_flow(Arc::new(TerminalNavigator));

    match flow.handle(params).await {
        CallbackState::Success(user) => {
            println!(
                "{} Signed in as {}",
                "✓".green().bold(),
                user.display_name().bold()
            );
            Ok(())
        }
        CallbackState::Failed(message) => bail!(message),
        state => bail!("Sign-in did not finish ({:?})", state),
    }
}

pub async fn logout(dashboard: &Dashboard) -> Result<()> {
    if !dashboard.auth_status().is_authenticated {
        println!("{}", "Not signed in".yellow());
        return Ok(());
    }
    dashboard.logout().await?;
    println!("{} Signed out", "✓".green().bold());
    Ok(())
}

pub fn whoami(dashboard: &Dashboard) -> Result<()> {
    match dashboard.auth_status().user {
        Some(user) => {
            println!("{}", user.display_name().bold());
            println!("  {} {}", "Username:".dimmed(), user.username);
            if let Some(email) = &user.email {
                println!("  {} {}", "Email:".dimmed(), email);
            }
        }
        None => println!("{}", "Not signed in".yellow()),
    }
    Ok(())
}
