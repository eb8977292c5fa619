// ABOUTME: Live view of one cache entry with optional background polling
// ABOUTME: Dropping the subscription stops polling and aborts the read once nobody observes the key

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::{
    client::{Entry, Fetcher, QueryClient},
    error::QueryResult,
    key::QueryKey,
    options::QueryOptions,
    state::QueryState,
};

pub struct QuerySubscription {
    client: QueryClient,
    key: QueryKey,
    receiver: watch::Receiver<QueryState>,
    task: JoinHandle<()>,
}

impl QueryClient {
    /// Observe `key`: fetch it now (unless fresh) and, with a refetch
    /// interval, keep re-reading it until the subscription is dropped.
    pub fn watch(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: Fetcher,
    ) -> QuerySubscription {
        let receiver = {
            let mut entries = self.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(options.clone()));
            entry.observers += 1;
            entry.touch();
            entry.subscribe()
        };

        let client = self.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            if !options.enabled {
                debug!("Subscription to {} is disabled; not fetching", task_key);
                return;
            }
            if let Err(e) = client
                .fetch_query(task_key.clone(), options.clone(), fetcher)
                .await
            {
                debug!("Initial fetch for {} failed: {}", task_key, e);
            }

            let Some(period) = options.refetch_interval else {
                return;
            };
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                debug!("Polling {}", task_key);
                if let Err(e) = client.refetch(&task_key).await {
                    debug!("Polling fetch for {} failed: {}", task_key, e);
                }
            }
        });

        QuerySubscription {
            client: self.clone(),
            key,
            receiver,
            task,
        }
    }
}

impl QuerySubscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Latest state, marking it seen
    pub fn state(&mut self) -> QueryState {
        self.receiver.borrow_and_update().clone()
    }

    /// Wait for the next state change. `None` once the entry is gone.
    pub async fn changed(&mut self) -> Option<QueryState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Typed view of the current data
    pub fn data<T: DeserializeOwned>(&self) -> QueryResult<Option<T>> {
        self.receiver.borrow().data_as()
    }

    pub async fn refetch(&self) -> QueryResult<serde_json::Value> {
        self.client.refetch(&self.key).await
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        self.task.abort();

        let mut entries = self.client.lock();
        if let Some(entry) = entries.get_mut(&self.key) {
            entry.observers = entry.observers.saturating_sub(1);
            entry.touch();
            if entry.observers == 0 && entry.cancel() {
                debug!("Last observer of {} left; aborted in-flight read", self.key);
            }
        }
    }
}
