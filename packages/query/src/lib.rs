// ABOUTME: Revdash query cache: one entry per (scope, params) key with de-duplicated fetches
// ABOUTME: Freshness windows, polling subscriptions, retries, garbage collection, and optimistic writes

pub mod client;
pub mod error;
pub mod key;
pub mod mutation;
pub mod options;
pub mod state;
pub mod subscription;

pub use client::{fetcher, Fetcher, QueryClient};
pub use error::{QueryError, QueryResult};
pub use key::QueryKey;
pub use mutation::MutationLog;
pub use options::{retry_delay, QueryOptions};
pub use state::QueryState;
pub use subscription::QuerySubscription;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode cached JSON into a typed value
pub fn decode<T: DeserializeOwned>(value: Value) -> QueryResult<T> {
    serde_json::from_value(value).map_err(|e| QueryError::Decode(e.to_string()))
}
