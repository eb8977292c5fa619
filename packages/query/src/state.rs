use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{QueryError, QueryResult};

/// Observable state of one cache entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub data: Option<Value>,
    /// Error from the most recent fetch; cleared by the next success
    pub error: Option<QueryError>,
    pub is_fetching: bool,
    /// When `data` was last written
    pub updated_at: Option<Instant>,
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_fetching
    }

    /// Typed view of the cached data
    pub fn data_as<T: DeserializeOwned>(&self) -> QueryResult<Option<T>> {
        self.data.clone().map(crate::decode).transpose()
    }
}
