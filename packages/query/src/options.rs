// ABOUTME: Per-query cache policy: freshness window, idle eviction, retries, and polling
// ABOUTME: Defaults match the dashboard's general-purpose queries

use std::time::Duration;

const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);
const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);
const DEFAULT_RETRY: u32 = 1;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Cached data younger than this is served without a network call
    pub stale_time: Duration,
    /// Unobserved entries idle for this long are evicted
    pub gc_time: Duration,
    /// Extra attempts after a failed fetch
    pub retry: u32,
    /// Background refresh period while a subscription is alive
    pub refetch_interval: Option<Duration>,
    /// Disabled queries never touch the network
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
            retry: DEFAULT_RETRY,
            refetch_interval: None,
            enabled: true,
        }
    }
}

impl QueryOptions {
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_refetch_interval(mut self, interval: Option<Duration>) -> Self {
        self.refetch_interval = interval;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Backoff before retry number `attempt` (0-based): 1s, 2s, 4s, ... capped at 30s
pub fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY
        .checked_mul(2u32.saturating_pow(attempt))
        .map_or(RETRY_MAX_DELAY, |delay| delay.min(RETRY_MAX_DELAY))
}
