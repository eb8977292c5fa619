// ABOUTME: Composition root owning the session store, API gateway, and query cache
// ABOUTME: Bootstraps auth on startup and clears cached data whenever the session ends

use std::sync::{Arc, Mutex, MutexGuard};

use revdash_api::ApiGateway;
use revdash_auth::{
    authorize_url, AuthBackend, CallbackFlow, CallbackFlowOptions, CodeExchanger, FileStorage,
    HttpAuthBackend, Navigator, SessionEvent, SessionStorage, SessionStore,
};
use revdash_config::ClientConfig;
use revdash_core::{ApiError, User};
use revdash_query::QueryClient;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    error::{DashboardError, DashboardResult},
    policy::QueryPolicy,
};

/// Who, if anyone, is signed in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthStatus {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

pub struct Dashboard {
    config: ClientConfig,
    session: Arc<SessionStore>,
    gateway: ApiGateway,
    queries: QueryClient,
    policy: QueryPolicy,
    exchanger: Arc<CodeExchanger>,
    session_listener: Mutex<Option<JoinHandle<()>>>,
    gc_task: Mutex<Option<JoinHandle<()>>>,
}

impl Dashboard {
    /// Production wiring: file-backed session and the HTTP backend from `config`
    pub fn from_config(config: ClientConfig) -> DashboardResult<Self> {
        let storage = Arc::new(FileStorage::new(config.storage_dir.clone()));
        let backend = Arc::new(HttpAuthBackend::new(
            config.api_base_url.clone(),
            config.http_timeout,
        )?);
        Self::new(config, storage, backend)
    }

    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
        backend: Arc<dyn AuthBackend>,
    ) -> DashboardResult<Self> {
        let session = Arc::new(SessionStore::new(storage, backend));
        let gateway = ApiGateway::from_config(&config, session.clone())?;
        let policy = QueryPolicy::from_config(&config);
        let queries = QueryClient::default();
        let exchanger = Arc::new(CodeExchanger::new(session.clone()));

        Ok(Self {
            config,
            session,
            gateway,
            queries,
            policy,
            exchanger,
            session_listener: Mutex::new(None),
            gc_task: Mutex::new(None),
        })
    }

    pub fn with_policy(mut self, policy: QueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    /// Restore the persisted session and re-validate it with the backend.
    ///
    /// A rejected token ends signed out. A transient failure keeps the cached
    /// session so a flaky network doesn't log anyone out.
    pub async fn bootstrap(&self) -> DashboardResult<AuthStatus> {
        self.session.init().await?;
        self.start_session_listener();
        self.start_gc();

        if !self.session.is_authenticated() {
            debug!("No stored session");
            return Ok(self.auth_status());
        }

        match self.session.get_current_user().await {
            Ok(Some(user)) => info!("Restored session for {}", user.username),
            Ok(None) => debug!("Session ended during bootstrap"),
            Err(e) if e.is_auth_rejection() => info!("Stored session was rejected; signed out"),
            Err(e) if e.api_error().is_some_and(ApiError::is_transient) => {
                warn!("Backend unreachable, keeping cached session: {}", e)
            }
            Err(e) => warn!("Could not re-validate session, keeping cached profile: {}", e),
        }
        Ok(self.auth_status())
    }

    pub fn auth_status(&self) -> AuthStatus {
        let session = self.session.session();
        AuthStatus {
            is_authenticated: session.token.is_some(),
            user: session.user,
        }
    }

    /// GitHub consent page for the configured OAuth app
    pub fn login_url(&self) -> DashboardResult<String> {
        let client_id = self
            .config
            .github_client_id
            .as_deref()
            .ok_or(DashboardError::LoginUnavailable)?;
        Ok(authorize_url(client_id, &self.config.redirect_uri)?)
    }

    /// A fresh callback flow for one provider redirect.
    ///
    /// Flows share the dashboard's exchanger, so two flows can't redeem codes at once.
    pub fn callback_flow(&self, navigator: Arc<dyn Navigator>) -> CallbackFlow {
        CallbackFlow::new(
            self.exchanger.clone(),
            self.session.clone(),
            navigator,
            CallbackFlowOptions::from(&self.config),
        )
    }

    pub async fn logout(&self) -> DashboardResult<()> {
        self.session.logout().await?;
        // The listener does this too, but callers expect an empty cache on return
        self.queries.clear();
        Ok(())
    }

    /// Stop background work and drop in-memory state. Durable storage is kept.
    pub async fn shutdown(&self) {
        for slot in [&self.session_listener, &self.gc_task] {
            if let Some(task) = lock_task(slot).take() {
                task.abort();
            }
        }
        self.queries.clear();
        self.session.teardown().await;
    }

    fn start_session_listener(&self) {
        let mut slot = lock_task(&self.session_listener);
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let events = self.session.subscribe();
        let queries = self.queries.clone();
        *slot = Some(tokio::spawn(clear_cache_on_session_end(events, queries)));
    }

    /// Evict idle cache entries for as long as the dashboard runs
    fn start_gc(&self) {
        let mut slot = lock_task(&self.gc_task);
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        *slot = Some(self.queries.start_gc_task(self.policy.gc_period));
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        for slot in [&mut self.session_listener, &mut self.gc_task] {
            let task = slot
                .get_mut()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

fn lock_task(slot: &Mutex<Option<JoinHandle<()>>>) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cached data belongs to one identity; drop all of it when that identity goes away
async fn clear_cache_on_session_end(
    mut events: broadcast::Receiver<SessionEvent>,
    queries: QueryClient,
) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::SignedIn(user)) => debug!("Session started for {}", user.username),
            Ok(SessionEvent::SignedOut) => {
                info!("Signed out; clearing cached data");
                queries.clear();
            }
            Ok(SessionEvent::Expired) => {
                warn!("Session expired; resetting client state");
                queries.clear();
            }
            Err(RecvError::Lagged(skipped)) => {
                // Missed events may have included a sign-out
                error!("Session listener lagged by {} events; clearing cache", skipped);
                queries.clear();
            }
            Err(RecvError::Closed) => break,
        }
    }
}
