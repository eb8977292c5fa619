// ABOUTME: Review list and review update commands
// ABOUTME: `list --watch` keeps a live subscription open and redraws on every refresh

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::*;
use revdash_cli::{output::review_table, RefreshTracker};
use revdash_core::{ReviewFilter, ReviewPage, ReviewStatus, ReviewUpdate};
use revdash_dashboard::Dashboard;

use super::explain;

#[derive(Subcommand)]
pub enum ReviewsCommands {
    /// List reviews, newest first
    List {
        /// Only reviews for this repository ID
        #[arg(long)]
        repo: Option<i64>,
        /// Only reviews in this state (pending, processing, done, failed)
        #[arg(long)]
        status: Option<ReviewStatus>,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u32,
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Change a review's status or summary
    Update {
        id: i64,
        #[arg(long)]
        status: Option<ReviewStatus>,
        #[arg(long)]
        summary: Option<String>,
    },
}

pub async fn handle_reviews_command(dashboard: &Dashboard, command: ReviewsCommands) -> Result<()> {
    match command {
        ReviewsCommands::List {
            repo,
            status,
            page,
            watch,
        } => {
            let filter = ReviewFilter {
                repo_id: repo,
                status,
                page,
            };
            if watch {
                watch_reviews(dashboard, &filter).await
            } else {
                list_reviews(dashboard, &filter).await
            }
        }
        ReviewsCommands::Update {
            id,
            status,
            summary,
        } => update_review(dashboard, id, ReviewUpdate { status, summary }).await,
    }
}

async fn list_reviews(dashboard: &Dashboard, filter: &ReviewFilter) -> Result<()> {
    let page = dashboard.reviews(filter).await.map_err(explain)?;
    print_page(filter, &page);
    Ok(())
}

async fn watch_reviews(dashboard: &Dashboard, filter: &ReviewFilter) -> Result<()> {
    let mut subscription = dashboard.watch_reviews(filter, true);
    let mut tracker = RefreshTracker::new();

    loop {
        tokio::select! {
            state = subscription.changed() => {
                let Some(state) = state else {
                    bail!("Review cache was cleared; the session may have ended");
                };
                if !tracker.is_new_outcome(&state) {
                    continue;
                }

                // Clear screen and home the cursor
                print!("\x1B[2J\x1B[H");
                if let Some(page) = state.data_as::<ReviewPage>()? {
                    print_page(filter, &page);
                }
                if let Some(error) = &state.error {
                    eprintln!("{} {}", "Refresh failed:".red(), error);
                }
                println!("{}", "Watching for changes, Ctrl-C to stop".dimmed());
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

async fn update_review(dashboard: &Dashboard, id: i64, update: ReviewUpdate) -> Result<()> {
    if update.is_empty() {
        bail!("Nothing to update. Pass --status and/or --summary");
    }

    let review = dashboard
        .update_review(id, update)
        .await
        .map_err(explain)?;
    println!(
        "{} Review {} is now {}",
        "✓".green().bold(),
        review.id,
        review.status.to_string().bold()
    );
    Ok(())
}

fn print_page(filter: &ReviewFilter, page: &ReviewPage) {
    if page.items.is_empty() {
        println!("{}", "No reviews found".yellow());
        return;
    }
    println!("{}", review_table(&page.items));
    println!(
        "Page {} · {} reviews total",
        filter.page_number(),
        page.total.to_string().cyan()
    );
}
