// ABOUTME: Optimistic mutation tests: visibility before send, rollback, and reconciliation
// ABOUTME: The fake server holds authoritative state so refetches reveal what the cache settles on

mod common;

use std::time::Duration;

use common::{review_page, set_status, FakeServer};
use pretty_assertions::assert_eq;
use revdash_core::ApiError;
use revdash_query::{QueryClient, QueryError, QueryKey, QueryOptions};
use serde_json::json;

fn key() -> QueryKey {
    QueryKey::new("reviews").with_param("page", 1)
}

async fn primed(server: &FakeServer) -> QueryClient {
    let client = QueryClient::default();
    client
        .fetch_query(key(), QueryOptions::default().with_retry(0), server.fetcher())
        .await
        .unwrap();
    client
}

#[tokio::test(start_paused = true)]
async fn test_optimistic_patch_is_visible_before_request_resolves() {
    let server = FakeServer::new(review_page("pending"));
    let client = primed(&server).await;

    let observer = client.clone();
    let backend = server.clone();
    let request = async move {
        // Runs only after the optimistic write
        assert_eq!(observer.get_query_data(&key()), Some(review_page("processing")));
        backend.set(review_page("processing"));
        Ok::<_, ApiError>(json!({"id": 1, "status": "processing"}))
    };

    let updated = client
        .mutate_optimistic("reviews", set_status(1, "processing"), request)
        .await
        .unwrap();

    assert_eq!(updated["status"], "processing");
    assert_eq!(client.get_query_data(&key()), Some(review_page("processing")));
}

#[tokio::test(start_paused = true)]
async fn test_failed_mutation_rolls_back_to_snapshot() {
    let server = FakeServer::new(review_page("pending"));
    let client = primed(&server).await;
    let calls_before = server.calls();

    let err = client
        .mutate_optimistic("reviews", set_status(1, "processing"), async {
            Err::<serde_json::Value, _>(ApiError::transport("connection reset"))
        })
        .await
        .unwrap_err();

    assert_eq!(err, QueryError::Api(ApiError::transport("connection reset")));
    assert_eq!(client.get_query_data(&key()), Some(review_page("pending")));
    // Reconciliation refetch ran even though the write failed
    assert_eq!(server.calls(), calls_before + 1);
}

#[tokio::test(start_paused = true)]
async fn test_rollback_restores_when_reconcile_also_fails() {
    let server = FakeServer::new(review_page("pending"));
    let client = primed(&server).await;
    server.fail_next(vec![ApiError::transport("still offline")]);

    let result = client
        .mutate_optimistic("reviews", set_status(1, "done"), async {
            Err::<(), _>(ApiError::transport("offline"))
        })
        .await;

    assert!(result.is_err());
    assert_eq!(client.get_query_data(&key()), Some(review_page("pending")));
}

#[tokio::test(start_paused = true)]
async fn test_unaffected_entries_are_untouched() {
    let page = json!({"total": 1, "items": [{"id": 2, "status": "pending"}]});
    let server = FakeServer::new(page.clone());
    let client = primed(&server).await;

    let observer = client.clone();
    let expected = page.clone();
    client
        .mutate_optimistic("reviews", set_status(1, "done"), async move {
            // Nothing cached holds review 1
            assert_eq!(observer.get_query_data(&key()), Some(expected));
            Ok::<_, ApiError>(())
        })
        .await
        .unwrap();

    assert_eq!(client.get_query_data(&key()), Some(page));
}

#[tokio::test(start_paused = true)]
async fn test_stale_in_flight_read_cannot_clobber_optimistic_write() {
    let server = FakeServer::new(review_page("pending")).with_latency(Duration::from_secs(5));
    let client = primed(&server).await;

    // A background refetch starts while the server still says pending
    let stale_read = tokio::spawn({
        let client = client.clone();
        async move { client.refetch(&key()).await }
    });
    while !client.query_state(&key()).unwrap().is_fetching {
        tokio::task::yield_now().await;
    }

    let backend = server.clone();
    client
        .mutate_optimistic("reviews", set_status(1, "done"), async move {
            backend.set(review_page("done"));
            Ok::<_, ApiError>(())
        })
        .await
        .unwrap();

    assert_eq!(stale_read.await.unwrap(), Err(QueryError::Cancelled));
    assert_eq!(client.get_query_data(&key()), Some(review_page("done")));
}

#[tokio::test(start_paused = true)]
async fn test_plain_mutation_is_not_retried() {
    let client = QueryClient::default();
    let mut attempts = 0;

    let result = client
        .mutate(async {
            attempts += 1;
            Err::<(), _>(ApiError::application(500, ""))
        })
        .await;

    assert!(result.is_err());
    assert_eq!(attempts, 1);
}
