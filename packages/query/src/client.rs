// ABOUTME: QueryClient: shared keyed cache over backend reads
// ABOUTME: Joins concurrent fetches per key, serves fresh data locally, and retries transient failures

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use revdash_core::ApiResult;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    error::{QueryError, QueryResult},
    key::QueryKey,
    mutation::MutationLog,
    options::{retry_delay, QueryOptions},
    state::QueryState,
};

/// Produces a fresh backend read for one key
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, ApiResult<Value>> + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, QueryResult<Value>>>;

/// Wrap an async closure as a `Fetcher`
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<Value>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

struct InFlight {
    id: u64,
    future: SharedFetch,
    abort: AbortHandle,
}

pub(crate) struct Entry {
    state: watch::Sender<QueryState>,
    in_flight: Option<InFlight>,
    fetcher: Option<Fetcher>,
    options: QueryOptions,
    /// Live subscriptions; entries with observers are never collected
    pub(crate) observers: usize,
    /// Set by invalidation; the next read refetches regardless of age
    invalidated: bool,
    last_access: Instant,
}

impl Entry {
    pub(crate) fn new(options: QueryOptions) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            state,
            in_flight: None,
            fetcher: None,
            options,
            observers: 0,
            invalidated: false,
            last_access: Instant::now(),
        }
    }

    fn is_fresh(&self) -> bool {
        let state = self.state.borrow();
        !self.invalidated
            && state.data.is_some()
            && state
                .updated_at
                .is_some_and(|at| at.elapsed() < self.options.stale_time)
    }

    pub(crate) fn data(&self) -> Option<Value> {
        self.state.borrow().data.clone()
    }

    pub(crate) fn set_data(&mut self, data: Value) {
        self.state.send_modify(|state| {
            state.data = Some(data);
            state.error = None;
            state.updated_at = Some(Instant::now());
        });
        self.last_access = Instant::now();
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }

    /// Abort the outstanding fetch; joined callers observe `Cancelled`
    pub(crate) fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.abort.abort();
                self.state.send_modify(|state| state.is_fetching = false);
                true
            }
            None => false,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_access = Instant::now();
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    next_fetch_id: AtomicU64,
    defaults: QueryOptions,
}

/// Cheap to clone; clones share one cache
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl QueryClient {
    pub fn new(defaults: QueryOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(1),
                defaults,
            }),
        }
    }

    /// Options applied where a caller doesn't supply its own
    pub fn defaults(&self) -> &QueryOptions {
        &self.inner.defaults
    }

    /// Read `key` through the cache.
    ///
    /// Fresh data is returned without a network call. If a fetch for the key is
    /// already in flight the caller joins it instead of issuing another.
    pub async fn fetch_query(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: Fetcher,
    ) -> QueryResult<Value> {
        if !options.enabled {
            return Err(QueryError::Disabled);
        }

        let pending = {
            let mut entries = self.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(options.clone()));
            entry.fetcher = Some(fetcher);
            entry.options = options;
            entry.touch();

            if let Some(in_flight) = &entry.in_flight {
                debug!("Joining in-flight fetch for {}", key);
                in_flight.future.clone()
            } else if entry.is_fresh() {
                if let Some(data) = entry.data() {
                    debug!("Serving fresh cache entry for {}", key);
                    return Ok(data);
                }
                self.start_fetch(&key, entry)
            } else {
                self.start_fetch(&key, entry)
            }
        };

        pending.await
    }

    /// Force a new read with the stored fetcher, joining one already in flight
    pub async fn refetch(&self, key: &QueryKey) -> QueryResult<Value> {
        let pending = {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(key) else {
                return Err(QueryError::Cancelled);
            };
            if !entry.options.enabled || entry.fetcher.is_none() {
                return Err(QueryError::Disabled);
            }
            entry.touch();
            if let Some(in_flight) = &entry.in_flight {
                in_flight.future.clone()
            } else {
                self.start_fetch(key, entry)
            }
        };
        pending.await
    }

    pub fn get_query_data(&self, key: &QueryKey) -> Option<Value> {
        self.lock().get(key).and_then(Entry::data)
    }

    /// Every cached value in `scope`
    pub fn get_queries_data(&self, scope: &str) -> Vec<(QueryKey, Value)> {
        let entries = self.lock();
        let mut found: Vec<(QueryKey, Value)> = entries
            .iter()
            .filter(|(key, _)| key.in_scope(scope))
            .filter_map(|(key, entry)| entry.data().map(|data| (key.clone(), data)))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }

    pub fn query_state(&self, key: &QueryKey) -> Option<QueryState> {
        self.lock().get(key).map(|entry| entry.state.borrow().clone())
    }

    /// Write `data` for `key` directly, creating the entry if needed
    pub fn set_query_data(&self, key: QueryKey, data: Value) {
        let mut entries = self.lock();
        entries
            .entry(key)
            .or_insert_with(|| Entry::new(self.inner.defaults.clone()))
            .set_data(data);
    }

    /// Abort in-flight reads in `scope`. Returns how many were cancelled.
    pub fn cancel_queries(&self, scope: &str) -> usize {
        let mut entries = self.lock();
        let mut cancelled = 0;
        for (_, entry) in entries.iter_mut().filter(|(key, _)| key.in_scope(scope)) {
            if entry.cancel() {
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            debug!("Cancelled {} in-flight queries in {}", cancelled, scope);
        }
        cancelled
    }

    /// Mark every entry in `scope` stale and refetch those that can be.
    ///
    /// Outstanding reads are replaced so the refetch reflects any write that
    /// happened after they were issued. Refetch failures stay in entry state.
    pub async fn invalidate_queries(&self, scope: &str) {
        let refetches: Vec<(QueryKey, SharedFetch)> = {
            let mut entries = self.lock();
            entries
                .iter_mut()
                .filter(|(key, _)| key.in_scope(scope))
                .filter_map(|(key, entry)| {
                    entry.invalidated = true;
                    if entry.fetcher.is_none() || !entry.options.enabled {
                        return None;
                    }
                    entry.cancel();
                    Some((key.clone(), self.start_fetch(key, entry)))
                })
                .collect()
        };

        debug!("Invalidated {} ({} refetches)", scope, refetches.len());
        let results = join_all(refetches.into_iter().map(|(key, fetch)| async move {
            (key, fetch.await)
        }))
        .await;
        for (key, result) in results {
            if let Err(e) = result {
                warn!("Refetch after invalidation failed for {}: {}", key, e);
            }
        }
    }

    /// Run a write, then return its result. Mutations are never retried.
    pub async fn mutate<T, F>(&self, request: F) -> QueryResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        request.await.map_err(QueryError::from)
    }

    /// Optimistic write over every cached entry in `scope`.
    ///
    /// In order: cancel in-flight reads, snapshot and patch affected entries,
    /// send the request. A failure restores the snapshot verbatim. Either way
    /// the scope is refetched before returning. `patch` returns `None` for
    /// entries the write doesn't touch.
    pub async fn mutate_optimistic<T, P, F>(
        &self,
        scope: &str,
        patch: P,
        request: F,
    ) -> QueryResult<T>
    where
        P: Fn(&Value) -> Option<Value>,
        F: Future<Output = ApiResult<T>>,
    {
        self.cancel_queries(scope);
        let log = self.apply_patch(scope, &patch);
        if log.is_empty() {
            debug!("No cached entries in {} affected by optimistic patch", scope);
        } else {
            debug!("Applied optimistic patch to {} entries in {}", log.len(), scope);
        }

        let result = request.await;
        if let Err(e) = &result {
            warn!("Mutation failed, rolling back {}: {}", scope, e);
            log.rollback(self);
        }

        self.invalidate_queries(scope).await;
        result.map_err(QueryError::from)
    }

    /// Drop every entry and abort outstanding reads
    pub fn clear(&self) {
        let mut entries = self.lock();
        for entry in entries.values_mut() {
            entry.cancel();
        }
        let count = entries.len();
        entries.clear();
        info!("Cleared query cache ({} entries)", count);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Evict unobserved, idle entries past their gc window. Returns how many were removed.
    pub fn collect_garbage(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.observers > 0
                || entry.in_flight.is_some()
                || entry.last_access.elapsed() < entry.options.gc_time
        });
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Evicted {} idle query entries", removed);
        }
        removed
    }

    /// Run garbage collection every `period` until the client is dropped
    pub fn start_gc_task(&self, period: Duration) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    debug!("Query client dropped; stopping garbage collection");
                    break;
                };
                QueryClient { inner }.collect_garbage();
            }
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot then patch, in one critical section
    fn apply_patch<P>(&self, scope: &str, patch: &P) -> MutationLog
    where
        P: Fn(&Value) -> Option<Value>,
    {
        let mut log = MutationLog::default();
        let mut entries = self.lock();
        for (key, entry) in entries.iter_mut().filter(|(key, _)| key.in_scope(scope)) {
            let Some(current) = entry.data() else {
                continue;
            };
            if let Some(next) = patch(&current) {
                log.record(key.clone(), current);
                entry.set_data(next);
            }
        }
        log
    }

    /// Spawn a fetch for `key` and register it as the entry's in-flight read.
    ///
    /// Must be called with the entries lock held; the spawned task settles
    /// only if it is still the registered fetch when it completes.
    fn start_fetch(&self, key: &QueryKey, entry: &mut Entry) -> SharedFetch {
        let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let Some(fetcher) = entry.fetcher.clone() else {
            return futures::future::ready(Err(QueryError::Disabled))
                .boxed()
                .shared();
        };
        let retries = entry.options.retry;
        let client = self.clone();
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let result = fetch_with_retry(&task_key, fetcher, retries)
                .await
                .map_err(QueryError::from);
            client.settle(&task_key, id, &result);
            result
        });
        let abort = handle.abort_handle();

        let future = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Err(QueryError::Cancelled),
                Err(e) => Err(QueryError::TaskFailed(e.to_string())),
            }
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            id,
            future: future.clone(),
            abort,
        });
        entry.invalidated = false;
        entry.state.send_modify(|state| state.is_fetching = true);
        debug!("Started fetch {} for {}", id, key);
        future
    }

    fn settle(&self, key: &QueryKey, id: u64, result: &QueryResult<Value>) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
            debug!("Discarding superseded fetch {} for {}", id, key);
            return;
        }
        entry.in_flight = None;
        match result {
            Ok(data) => {
                entry.state.send_modify(|state| {
                    state.data = Some(data.clone());
                    state.error = None;
                    state.updated_at = Some(Instant::now());
                    state.is_fetching = false;
                });
                entry.touch();
            }
            Err(e) => entry.state.send_modify(|state| {
                state.error = Some(e.clone());
                state.is_fetching = false;
            }),
        }
    }
}

async fn fetch_with_retry(key: &QueryKey, fetcher: Fetcher, retries: u32) -> ApiResult<Value> {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(data) => return Ok(data),
            Err(e) if attempt < retries && !e.is_auth_rejection() => {
                let delay = retry_delay(attempt);
                warn!(
                    "Fetch for {} failed (attempt {}), retrying in {:?}: {}",
                    key,
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
