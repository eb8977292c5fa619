#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use revdash_core::ApiResult;
use revdash_query::{fetcher, Fetcher};
use serde_json::{json, Value};

/// Stand-in for the backend: a shared value read with latency
#[derive(Clone)]
pub struct FakeServer {
    state: Arc<Mutex<Value>>,
    failures: Arc<Mutex<Vec<revdash_core::ApiError>>>,
    calls: Arc<AtomicUsize>,
    latency: Duration,
}

impl FakeServer {
    pub fn new(initial: Value) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
            failures: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            latency: Duration::from_millis(50),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set(&self, value: Value) {
        *self.state.lock().unwrap() = value;
    }

    pub fn get(&self) -> Value {
        self.state.lock().unwrap().clone()
    }

    /// Fail the next reads, in order, before serving data again
    pub fn fail_next(&self, errors: Vec<revdash_core::ApiError>) {
        *self.failures.lock().unwrap() = errors;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Reads the value when the request starts, like a response in flight
    pub fn fetcher(&self) -> Fetcher {
        let server = self.clone();
        fetcher(move || {
            let server = server.clone();
            async move { server.read().await }
        })
    }

    async fn read(&self) -> ApiResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.get();
        let failure = {
            let mut failures = self.failures.lock().unwrap();
            (!failures.is_empty()).then(|| failures.remove(0))
        };
        tokio::time::sleep(self.latency).await;
        match failure {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }
}

pub fn review_page(status: &str) -> Value {
    json!({"total": 1, "items": [{"id": 1, "status": status}]})
}

/// Patch that sets `status` on the review with `id`, if the page holds it
pub fn set_status(id: i64, status: &'static str) -> impl Fn(&Value) -> Option<Value> {
    move |page: &Value| {
        let mut page = page.clone();
        let items = page.get_mut("items")?.as_array_mut()?;
        let mut touched = false;
        for item in items.iter_mut().filter(|item| item["id"] == id) {
            item["status"] = json!(status);
            touched = true;
        }
        touched.then_some(page)
    }
}
