// ABOUTME: Cache policy per data type; freshness windows are tunable rather than fixed
// ABOUTME: Defaults mirror how often each kind of dashboard data actually changes

use std::time::Duration;

use revdash_config::ClientConfig;
use revdash_query::QueryOptions;

const SECOND: Duration = Duration::from_secs(1);
const MINUTE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPolicy {
    pub reviews: QueryOptions,
    pub user_repositories: QueryOptions,
    pub user_reviews: QueryOptions,
    pub user_stats: QueryOptions,
    pub system_health: QueryOptions,
    /// Period used when review auto-refresh is on
    pub poll_interval: Duration,
    /// How often idle entries are checked against their gc window
    pub gc_period: Duration,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            reviews: QueryOptions::default()
                .with_stale_time(30 * SECOND)
                .with_gc_time(5 * MINUTE),
            user_repositories: QueryOptions::default()
                .with_stale_time(5 * MINUTE)
                .with_gc_time(10 * MINUTE),
            user_reviews: QueryOptions::default()
                .with_stale_time(30 * SECOND)
                .with_gc_time(5 * MINUTE),
            user_stats: QueryOptions::default()
                .with_stale_time(MINUTE)
                .with_gc_time(5 * MINUTE),
            system_health: QueryOptions::default()
                .with_stale_time(10 * SECOND)
                .with_gc_time(MINUTE),
            poll_interval: 10 * SECOND,
            gc_period: MINUTE,
        }
    }
}

impl QueryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            ..Self::default()
        }
    }

    /// Review options with polling switched on or off
    pub fn reviews(&self, auto_refresh: bool) -> QueryOptions {
        self.reviews
            .clone()
            .with_refetch_interval(auto_refresh.then_some(self.poll_interval))
    }
}
