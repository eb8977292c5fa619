// ABOUTME: Cache scopes and key builders for every dashboard query

use revdash_core::ReviewFilter;
use revdash_query::QueryKey;

pub const REVIEWS: &str = "reviews";
pub const USER_REPOSITORIES: &str = "user-repositories";
pub const USER_REVIEWS: &str = "user-reviews";
pub const USER_STATS: &str = "user-stats";
pub const SYSTEM_HEALTH: &str = "system-health";

/// Scopes refreshed after a repository sync
pub const SYNC_AFFECTED: [&str; 3] = [USER_REPOSITORIES, USER_STATS, USER_REVIEWS];

pub fn reviews(filter: &ReviewFilter) -> QueryKey {
    QueryKey::new(REVIEWS)
        .with_optional_param("repo_id", filter.repo_id)
        .with_optional_param("status", filter.status)
        .with_param("page", filter.page_number())
}

pub fn user_repositories() -> QueryKey {
    QueryKey::new(USER_REPOSITORIES)
}

pub fn user_reviews() -> QueryKey {
    QueryKey::new(USER_REVIEWS)
}

pub fn user_stats() -> QueryKey {
    QueryKey::new(USER_STATS)
}

pub fn system_health() -> QueryKey {
    QueryKey::new(SYSTEM_HEALTH)
}
