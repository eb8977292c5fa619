// ABOUTME: Table and text rendering for dashboard data
// ABOUTME: Keeps formatting out of the command handlers so it can be tested without a backend

use chrono::{DateTime, Utc};
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, ContentArrangement, Table,
};
use revdash_core::{DashboardStats, Repository, Review, ReviewStatus};

const EMPTY: &str = "-";

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn status_cell(status: ReviewStatus) -> Cell {
    let color = match status {
        ReviewStatus::Pending => Color::Yellow,
        ReviewStatus::Processing => Color::Cyan,
        ReviewStatus::Done => Color::Green,
        ReviewStatus::Failed => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

pub fn review_table(reviews: &[Review]) -> Table {
    let mut table = new_table(vec!["ID", "PR", "Title", "Author", "Repo", "Status", "Created"]);
    for review in reviews {
        table.add_row(vec![
            Cell::new(review.id),
            Cell::new(format!("#{}", review.pr_number)),
            Cell::new(truncate(review.title.as_deref().unwrap_or(EMPTY), 40)),
            Cell::new(review.author.as_deref().unwrap_or(EMPTY)),
            Cell::new(review.repo_id),
            status_cell(review.status),
            Cell::new(format_date(review.created_at)),
        ]);
    }
    table
}

pub fn repository_table(repositories: &[Repository]) -> Table {
    let mut table = new_table(vec!["ID", "Repository", "Branch", "Visibility", "Description"]);
    for repo in repositories {
        table.add_row(vec![
            Cell::new(repo.id),
            Cell::new(&repo.full_name),
            Cell::new(repo.default_branch.as_deref().unwrap_or(EMPTY)),
            Cell::new(if repo.is_private { "private" } else { "public" }),
            Cell::new(truncate(repo.description.as_deref().unwrap_or(EMPTY), 50)),
        ]);
    }
    table
}

pub fn stats_table(stats: &DashboardStats) -> Table {
    let mut table = new_table(vec!["Metric", "Count"]);
    table.add_row(vec![
        Cell::new("Repositories"),
        Cell::new(stats.total_repositories),
    ]);
    table.add_row(vec![Cell::new("Reviews"), Cell::new(stats.total_reviews)]);
    for (status, count) in &stats.reviews_by_status {
        table.add_row(vec![Cell::new(format!("  {}", status)), Cell::new(count)]);
    }
    table
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub fn format_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| EMPTY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn review() -> Review {
        Review {
            id: 7,
            pr_number: 42,
            title: Some("Teach the cache about pagination".to_string()),
            author: None,
            repo_id: 3,
            status: ReviewStatus::Done,
            summary: None,
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()),
            updated_at: None,
        }
    }

    #[rstest]
    #[case("short", 10, "short")]
    #[case("exactly10!", 10, "exactly10!")]
    #[case("a bit too long", 10, "a bit too…")]
    #[case("ünïcödé wörds", 5, "ünïc…")]
    fn test_truncate(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(truncate(input, max), expected);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(review().created_at), "2024-05-01 10:30");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_review_table_rows() {
        let rendered = review_table(&[review()]).to_string();
        assert!(rendered.contains("#42"));
        assert!(rendered.contains("Teach the cache about pagination"));
        assert!(rendered.contains("done"));
    }

    #[test]
    fn test_stats_table_lists_statuses() {
        let stats = DashboardStats {
            total_repositories: 2,
            total_reviews: 5,
            reviews_by_status: [("done".to_string(), 4), ("failed".to_string(), 1)]
                .into_iter()
                .collect(),
            extra: Default::default(),
        };
        let rendered = stats_table(&stats).to_string();
        assert!(rendered.contains("Repositories"));
        assert!(rendered.contains("failed"));
    }
}
