// ABOUTME: FileStorage tests against a temporary directory
// ABOUTME: Session data must survive a new store instance and be removable

use std::sync::Arc;
use std::time::Duration;

use revdash_auth::{FileStorage, HttpAuthBackend, SessionStorage, SessionStore};
use revdash_core::{
    constants::{TOKEN_STORAGE_KEY, USER_STORAGE_KEY},
    User,
};
use serde_json::Map;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> SessionStore {
    let backend = HttpAuthBackend::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    SessionStore::new(Arc::new(FileStorage::new(dir.path())), Arc::new(backend))
}

#[tokio::test]
async fn test_file_storage_roundtrip() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path().join("nested"));

    assert_eq!(storage.get(TOKEN_STORAGE_KEY).await.unwrap(), None);
    storage.set(TOKEN_STORAGE_KEY, "gho_token").await.unwrap();
    assert_eq!(
        storage.get(TOKEN_STORAGE_KEY).await.unwrap().as_deref(),
        Some("gho_token")
    );

    storage.remove(TOKEN_STORAGE_KEY).await.unwrap();
    storage.remove(TOKEN_STORAGE_KEY).await.unwrap();
    assert_eq!(storage.get(TOKEN_STORAGE_KEY).await.unwrap(), None);
}

#[cfg(unix)]
#[tokio::test]
async fn test_file_storage_restricts_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path());
    storage.set(TOKEN_STORAGE_KEY, "secret").await.unwrap();

    let mode = std::fs::metadata(dir.path().join(TOKEN_STORAGE_KEY))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    let user = User {
        id: 1,
        username: "octocat".to_string(),
        full_name: None,
        avatar_url: None,
        email: Some("octocat@example.com".to_string()),
        extra: Map::new(),
    };

    let first = store_in(&dir);
    first.init().await.unwrap();
    first
        .set_auth_data("gho_token".to_string(), user.clone())
        .await
        .unwrap();
    drop(first);

    let second = store_in(&dir);
    second.init().await.unwrap();
    assert_eq!(second.token().as_deref(), Some("gho_token"));
    assert_eq!(second.user(), Some(user));

    second.logout().await.unwrap();
    assert!(!dir.path().join(TOKEN_STORAGE_KEY).exists());
    assert!(!dir.path().join(USER_STORAGE_KEY).exists());
}
