// ABOUTME: Session store: single source of truth for the current token and user profile
// ABOUTME: Explicit init/teardown lifecycle, durable persistence, and session change broadcasts

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use revdash_core::{
    constants::{TOKEN_STORAGE_KEY, USER_STORAGE_KEY},
    User,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    backend::AuthBackend,
    error::AuthResult,
    storage::SessionStorage,
};

const SESSION_EVENT_CHANNEL_SIZE: usize = 16;

/// Snapshot of the in-memory session.
///
/// `user` is only ever set while `token` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

/// Session changes observed by the rest of the client
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(User),
    /// Explicit logout
    SignedOut,
    /// The backend rejected the session; client state must be reset
    Expired,
}

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    backend: Arc<dyn AuthBackend>,
    state: RwLock<Session>,
    /// Guards `init`; holds whether the store has been initialized
    initialized: Mutex<bool>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, backend: Arc<dyn AuthBackend>) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CHANNEL_SIZE);
        Self {
            storage,
            backend,
            state: RwLock::new(Session::default()),
            initialized: Mutex::new(false),
            events,
        }
    }

    /// Load the persisted token and profile. No network I/O.
    ///
    /// Later calls are no-ops until `teardown` runs.
    pub async fn init(&self) -> AuthResult<()> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            debug!("Session store already initialized");
            return Ok(());
        }

        let token = self.storage.get(TOKEN_STORAGE_KEY).await?;
        let mut user = match self.storage.get(USER_STORAGE_KEY).await? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Discarding unreadable stored profile: {}", e);
                    self.storage.remove(USER_STORAGE_KEY).await?;
                    None
                }
            },
            None => None,
        };

        if token.is_none() && user.is_some() {
            warn!("Discarding stored profile without a token");
            self.storage.remove(USER_STORAGE_KEY).await?;
            user = None;
        }

        debug!(
            "Restored session: has_token={} has_user={}",
            token.is_some(),
            user.is_some()
        );
        *self.write_state() = Session { token, user };
        *initialized = true;
        Ok(())
    }

    /// Drop the in-memory session without touching durable storage
    pub async fn teardown(&self) {
        let mut initialized = self.initialized.lock().await;
        *self.write_state() = Session::default();
        *initialized = false;
        debug!("Session store torn down");
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().token.is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.read_state().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read_state().user.clone()
    }

    pub fn session(&self) -> Session {
        self.read_state().clone()
    }

    /// Authorization header for the current token; empty when logged out
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value; sending no credentials"),
            }
        }
        headers
    }

    /// Set token and profile together and persist both.
    ///
    /// Readers see either the previous session or the new one. If persisting
    /// fails the previous session is restored.
    pub async fn set_auth_data(&self, token: String, user: User) -> AuthResult<()> {
        let previous = std::mem::replace(
            &mut *self.write_state(),
            Session {
                token: Some(token.clone()),
                user: Some(user.clone()),
            },
        );

        if let Err(e) = self.persist(&token, &user).await {
            error!("Failed to persist session: {}", e);
            *self.write_state() = previous;
            self.clear_storage().await;
            return Err(e);
        }

        info!("Signed in as {}", user.username);
        let _ = self.events.send(SessionEvent::SignedIn(user));
        Ok(())
    }

    /// Re-validate the held token against the backend.
    ///
    /// Returns `None` without a network call when logged out. An explicit
    /// rejection logs the session out; any other failure leaves it intact.
    pub async fn get_current_user(&self) -> AuthResult<Option<User>> {
        let Some(token) = self.token() else {
            return Ok(None);
        };

        match self.backend.fetch_profile(&token).await {
            Ok(user) => {
                {
                    let mut state = self.write_state();
                    // A logout or re-login may have happened while the request was in flight
                    if state.token.as_deref() != Some(token.as_str()) {
                        debug!("Session changed during profile fetch; discarding result");
                        return Ok(state.user.clone());
                    }
                    state.user = Some(user.clone());
                }
                self.storage
                    .set(USER_STORAGE_KEY, &serde_json::to_string(&user)?)
                    .await?;
                Ok(Some(user))
            }
            Err(e) if e.is_auth_rejection() => {
                warn!("Session rejected by backend; logging out");
                self.logout().await?;
                Err(e.into())
            }
            Err(e) => {
                warn!("Failed to get current user: {}", e);
                Err(e.into())
            }
        }
    }

    /// Clear the session in memory and in durable storage. Safe when already logged out.
    pub async fn logout(&self) -> AuthResult<()> {
        self.clear(SessionEvent::SignedOut).await
    }

    /// Log out because the backend rejected the session, asking listeners to reset
    pub async fn expire(&self) -> AuthResult<()> {
        self.clear(SessionEvent::Expired).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn backend(&self) -> Arc<dyn AuthBackend> {
        Arc::clone(&self.backend)
    }

    async fn clear(&self, event: SessionEvent) -> AuthResult<()> {
        let previous = std::mem::take(&mut *self.write_state());

        self.storage.remove(TOKEN_STORAGE_KEY).await?;
        self.storage.remove(USER_STORAGE_KEY).await?;

        if previous.token.is_some() || event == SessionEvent::Expired {
            info!("Session cleared ({:?})", event);
            let _ = self.events.send(event);
        }
        Ok(())
    }

    async fn persist(&self, token: &str, user: &User) -> AuthResult<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set(TOKEN_STORAGE_KEY, token).await?;
        self.storage.set(USER_STORAGE_KEY, &user_json).await?;
        Ok(())
    }

    async fn clear_storage(&self) {
        for key in [TOKEN_STORAGE_KEY, USER_STORAGE_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                error!("Failed to remove {} after persistence failure: {}", key, e);
            }
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Session> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Session> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
