// ABOUTME: ApiGateway tests against a mock backend
// ABOUTME: Covers credential injection, error normalization, and the auth-rejection cascade

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use revdash_api::ApiGateway;
use revdash_auth::{HttpAuthBackend, MemoryStorage, SessionEvent, SessionStore};
use revdash_core::{
    constants::{TOKEN_STORAGE_KEY, USER_STORAGE_KEY},
    ApiError, ReviewFilter, ReviewStatus, ReviewUpdate,
};
use rstest::rstest;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_JSON: &str = r#"{"id":1,"username":"octocat"}"#;

async fn gateway(server: &MockServer, token: Option<&str>) -> (ApiGateway, Arc<MemoryStorage>) {
    let storage = Arc::new(match token {
        Some(token) => MemoryStorage::with_entries([
            (TOKEN_STORAGE_KEY, token),
            (USER_STORAGE_KEY, USER_JSON),
        ]),
        None => MemoryStorage::new(),
    });
    let backend = HttpAuthBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
    let session = Arc::new(SessionStore::new(storage.clone(), Arc::new(backend)));
    session.init().await.unwrap();

    let gateway = ApiGateway::new(server.uri(), Duration::from_secs(5), session).unwrap();
    (gateway, storage)
}

#[tokio::test]
async fn test_attaches_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/repositories"))
        .and(header("authorization", "Bearer gho_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "full_name": "octocat/hello-world", "is_private": false}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&server, Some("gho_token")).await;
    let repos = gateway.user_repositories().await.unwrap();

    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].full_name, "octocat/hello-world");
}

#[tokio::test]
async fn test_no_credentials_when_logged_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "db": "connected"})),
        )
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&server, None).await;
    let health = gateway.health().await.unwrap();

    assert!(health.is_healthy());
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_auth_rejection_logs_out_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/dashboard"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Could not validate credentials"})),
        )
        .mount(&server)
        .await;

    let (gateway, storage) = gateway(&server, Some("revoked")).await;
    let mut events = gateway.session().subscribe();

    let err = gateway.dashboard_stats().await.unwrap_err();

    assert!(err.is_auth_rejection());
    assert_eq!(err.message(), "Could not validate credentials");
    assert!(!gateway.session().is_authenticated());
    assert!(storage.is_empty());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
}

/// Serves one 401 whose body is cut off after the first byte.
async fn truncated_rejection_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream
            .write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 100\r\n\r\n{")
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_auth_rejection_with_unreadable_body_still_logs_out() {
    let base_url = truncated_rejection_server().await;
    let storage = Arc::new(MemoryStorage::with_entries([
        (TOKEN_STORAGE_KEY, "revoked"),
        (USER_STORAGE_KEY, USER_JSON),
    ]));
    let backend = HttpAuthBackend::new(base_url.clone(), Duration::from_secs(5)).unwrap();
    let session = Arc::new(SessionStore::new(storage.clone(), Arc::new(backend)));
    session.init().await.unwrap();
    let gateway = ApiGateway::new(base_url, Duration::from_secs(5), session).unwrap();
    let mut events = gateway.session().subscribe();

    let err = gateway.dashboard_stats().await.unwrap_err();

    assert!(err.is_auth_rejection());
    assert_eq!(err.status(), 401);
    assert_eq!(err.message(), "Request failed with status code 401");
    assert!(!gateway.session().is_authenticated());
    assert!(storage.is_empty());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
}

#[rstest]
#[case(400, r#"{"detail":"Invalid status"}"#, "Invalid status")]
#[case(404, r#"{"detail":"Review not found"}"#, "Review not found")]
#[case(422, r#"{"detail":[{"msg":"field required"}]}"#, r#"[{"msg":"field required"}]"#)]
#[case(500, "Internal Server Error", "Request failed with status code 500")]
#[case(503, "", "Request failed with status code 503")]
#[tokio::test]
async fn test_application_errors_keep_session(
    #[case] status: u16,
    #[case] body: &str,
    #[case] message: &str,
) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/reviews"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&server, Some("gho_token")).await;
    let err = gateway.user_reviews().await.unwrap_err();

    assert_eq!(err.status(), status);
    assert_eq!(err.message(), message);
    assert!(gateway.session().is_authenticated());
}

#[tokio::test]
async fn test_error_body_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/reviews/9"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Invalid status", "allowed": ["pending"]})),
        )
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&server, Some("gho_token")).await;
    let err = gateway
        .update_review(9, &ReviewUpdate::status(ReviewStatus::Done))
        .await
        .unwrap_err();

    assert_eq!(
        err.body(),
        Some(&json!({"detail": "Invalid status", "allowed": ["pending"]}))
    );
}

#[tokio::test]
async fn test_transport_failure_has_status_zero() {
    let storage = Arc::new(MemoryStorage::with_entries([
        (TOKEN_STORAGE_KEY, "gho_token"),
        (USER_STORAGE_KEY, USER_JSON),
    ]));
    let backend = HttpAuthBackend::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let session = Arc::new(SessionStore::new(storage, Arc::new(backend)));
    session.init().await.unwrap();
    let gateway = ApiGateway::new("http://127.0.0.1:9", Duration::from_secs(2), session).unwrap();

    let err = gateway.health().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(err.status(), 0);
    assert!(gateway.session().is_authenticated());
}

#[tokio::test]
async fn test_list_reviews_sends_paging_and_set_filters_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "20"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 21,
            "items": [{
                "id": 21, "pr_number": 7, "title": "Fix flaky test", "author": "hubot",
                "repo_id": 3, "status": "pending", "summary": null,
                "created_at": "2024-05-01T10:00:00"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&server, Some("gho_token")).await;
    let filter = ReviewFilter {
        repo_id: None,
        status: Some(ReviewStatus::Pending),
        page: 2,
    };
    let page = gateway.list_reviews(&filter).await.unwrap();

    assert_eq!(page.total, 21);
    assert_eq!(page.items[0].status, ReviewStatus::Pending);

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("repo_id"));
}

#[tokio::test]
async fn test_update_review_sends_only_set_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/reviews/1"))
        .and(body_json(json!({"status": "processing"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "pr_number": 1, "title": "t", "author": "a",
            "repo_id": 3, "status": "processing"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&server, Some("gho_token")).await;
    let review = gateway
        .update_review(1, &ReviewUpdate::status(ReviewStatus::Processing))
        .await
        .unwrap();

    assert_eq!(review.status, ReviewStatus::Processing);
}

#[tokio::test]
async fn test_sync_repositories_posts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/sync-repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Synced 2 repositories",
            "repositories": ["octocat/a", "octocat/b"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&server, Some("gho_token")).await;
    let report = gateway.sync_repositories().await.unwrap();

    assert_eq!(report.repositories, vec!["octocat/a", "octocat/b"]);
}

#[tokio::test]
async fn test_generic_get_returns_body_unmodified() {
    let server = MockServer::start().await;
    let payload = json!({"total_reviews": 4, "custom": {"nested": true}});
    Mock::given(method("GET"))
        .and(path("/api/auth/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&server, Some("gho_token")).await;
    let body: Value = gateway.get("/api/auth/dashboard").await.unwrap();

    assert_eq!(body, payload);
}
