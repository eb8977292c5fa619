use clap::{Parser, Subcommand};
use colored::*;
use revdash_config::ClientConfig;
use revdash_dashboard::Dashboard;
use std::process;

mod cli;

use cli::repos::ReposCommands;
use cli::reviews::ReviewsCommands;

#[derive(Parser)]
#[command(name = "revdash")]
#[command(about = "Revdash - pull-request review dashboard in your terminal")]
#[command(version)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with GitHub
    Login {
        /// Print the authorization URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse and update reviews
    #[command(subcommand)]
    Reviews(ReviewsCommands),
    /// Your GitHub repositories
    #[command(subcommand)]
    Repos(ReposCommands),
    /// Review counts for your repositories
    Stats,
    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    revdash_cli::logging::init(cli.verbose);

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    let dashboard = Dashboard::from_config(config)?;
    dashboard.bootstrap().await?;

    let result = match command {
        Commands::Login { no_browser } => cli::auth::login(&dashboard, no_browser).await,
        Commands::Logout => cli::auth::logout(&dashboard).await,
        Commands::Whoami => cli::auth::whoami(&dashboard),
        Commands::Reviews(command) => {
            cli::reviews::handle_reviews_command(&dashboard, command).await
        }
        Commands::Repos(command) => cli::repos::handle_repos_command(&dashboard, command).await,
        Commands::Stats => cli::repos::stats(&dashboard).await,
        Commands::Health => cli::repos::health(&dashboard).await,
    };

    dashboard.shutdown().await;
    result
}
