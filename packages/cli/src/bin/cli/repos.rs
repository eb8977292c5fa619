// ABOUTME: Repository, statistics, and health commands

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use revdash_cli::output::{repository_table, stats_table};
use revdash_dashboard::Dashboard;

use super::{explain, require_login};

#[derive(Subcommand)]
pub enum ReposCommands {
    /// Repositories imported for your account
    List,
    /// Import your repositories from GitHub
    Sync,
}

pub async fn handle_repos_command(dashboard: &Dashboard, command: ReposCommands) -> Result<()> {
    require_login(dashboard)?;
    match command {
        ReposCommands::List => list_repositories(dashboard).await,
        ReposCommands::Sync => sync_repositories(dashboard).await,
    }
}

async fn list_repositories(dashboard: &Dashboard) -> Result<()> {
    let repositories = dashboard.user_repositories().await.map_err(explain)?;
    if repositories.is_empty() {
        println!("{}", "No repositories yet".yellow());
        println!("{}", "Use 'revdash repos sync' to import them from GitHub".dimmed());
        return Ok(());
    }
    println!("{}", repository_table(&repositories));
    println!("Total: {} repositories", repositories.len().to_string().cyan());
    Ok(())
}

async fn sync_repositories(dashboard: &Dashboard) -> Result<()> {
    println!("{}", "Syncing repositories from GitHub...".cyan());
    let report = dashboard.sync_repositories().await.map_err(explain)?;
    println!("{} {}", "✓".green().bold(), report.message);
    for name in &report.repositories {
        println!("  {}", name);
    }
    Ok(())
}

pub async fn stats(dashboard: &Dashboard) -> Result<()> {
    require_login(dashboard)?;
    let stats = dashboard.user_stats().await.map_err(explain)?;
    println!("{}", stats_table(&stats));
    Ok(())
}

pub async fn health(dashboard: &Dashboard) -> Result<()> {
    let health = dashboard.system_health().await.map_err(explain)?;
    if health.is_healthy() {
        println!("{} Backend is {}", "✓".green().bold(), health.status);
    } else {
        println!("{} Backend reports {}", "✗".red().bold(), health.status.red());
    }
    if let Some(db) = &health.db {
        println!("  {} {}", "Database:".dimmed(), db);
    }
    Ok(())
}
