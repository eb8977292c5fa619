// ABOUTME: Decides which query state changes a live view should redraw for
// ABOUTME: A finished refresh counts whether it brought new data or a new failure

use revdash_query::{QueryError, QueryState};
use tokio::time::Instant;

/// Tracks the last finished refresh a view has shown
#[derive(Debug, Default)]
pub struct RefreshTracker {
    last: Option<(Option<Instant>, Option<QueryError>)>,
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `state` is a settled outcome the view hasn't shown yet
    pub fn is_new_outcome(&mut self, state: &QueryState) -> bool {
        if state.is_fetching {
            return false;
        }
        let outcome = (state.updated_at, state.error.clone());
        if self.last.as_ref() == Some(&outcome) {
            return false;
        }
        self.last = Some(outcome);
        true
    }
}
