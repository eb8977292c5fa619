// ABOUTME: OAuth callback state machine: Idle -> Processing -> {Success, Failed}
// ABOUTME: Terminal states absorb repeated redirects; failures send the user home after a delay

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use revdash_config::ClientConfig;
use revdash_core::{constants::LANDING_ROUTE, User};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    error::{AuthError, AuthResult},
    oauth::exchange::CodeExchanger,
    session::SessionStore,
};

const NO_CODE_MESSAGE: &str = "No authorization code received from GitHub";
const GENERIC_FAILURE_MESSAGE: &str = "Failed to complete authentication. Please try again.";

/// Where the front end should go next
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackState {
    Idle,
    Processing,
    Success(User),
    /// User-visible failure message
    Failed(String),
}

impl CallbackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failed(_))
    }
}

/// Query parameters of the provider redirect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            code: None,
            error: Some(error.into()),
        }
    }

    /// Parse from a full redirect URL
    pub fn from_url(url: &str) -> AuthResult<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| AuthError::Configuration(format!("Invalid callback URL: {}", e)))?;
        Ok(Self::from_pairs(parsed.query_pairs().into_owned()))
    }

    /// Parse from a raw query string (with or without the leading `?`)
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    fn from_pairs(pairs: impl Iterator<Item = (String, String)>) -> Self {
        let params: HashMap<String, String> = pairs.filter(|(_, v)| !v.is_empty()).collect();
        Self {
            code: params.get("code").cloned(),
            error: params.get("error").cloned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallbackFlowOptions {
    /// How long a failure stays on screen before returning home
    pub redirect_delay: Duration,
    /// Pause after storing the session before reporting success
    pub settle_delay: Duration,
    pub landing_route: String,
}

impl Default for CallbackFlowOptions {
    fn default() -> Self {
        Self {
            redirect_delay: Duration::from_secs(3),
            settle_delay: Duration::from_millis(100),
            landing_route: LANDING_ROUTE.to_string(),
        }
    }
}

impl From<&ClientConfig> for CallbackFlowOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            redirect_delay: config.redirect_delay,
            settle_delay: config.settle_delay,
            ..Self::default()
        }
    }
}

/// Processes one provider redirect.
///
/// Owns its re-entrancy guard: only the first `handle` call on an idle flow
/// does any work, regardless of how many times the front end invokes it.
pub struct CallbackFlow {
    exchanger: Arc<CodeExchanger>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    options: CallbackFlowOptions,
    state: watch::Sender<CallbackState>,
    pending_redirect: Mutex<Option<JoinHandle<()>>>,
}

impl CallbackFlow {
    pub fn new(
        exchanger: Arc<CodeExchanger>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        options: CallbackFlowOptions,
    ) -> Self {
        let (state, _) = watch::channel(CallbackState::Idle);
        Self {
            exchanger,
            session,
            navigator,
            options,
            state,
            pending_redirect: Mutex::new(None),
        }
    }

    pub fn state(&self) -> CallbackState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallbackState> {
        self.state.subscribe()
    }

    /// Handle a redirect and return the state the flow ends up in.
    ///
    /// Calls made while processing or after a terminal state are ignored and
    /// return the current state.
    pub async fn handle(&self, params: CallbackParams) -> CallbackState {
        let mut entered = None;
        self.state.send_if_modified(|state| {
            if *state != CallbackState::Idle {
                return false;
            }
            let next = Self::initial_transition(&params);
            *state = next.clone();
            entered = Some(next);
            true
        });

        let code = match (entered, params.code) {
            (None, _) => {
                debug!("Ignoring OAuth redirect: flow is {:?}", self.state());
                return self.state();
            }
            (Some(CallbackState::Failed(message)), _) => {
                warn!("OAuth callback failed before exchange: {}", message);
                self.schedule_redirect();
                return CallbackState::Failed(message);
            }
            (Some(_), Some(code)) => code,
            (Some(_), None) => {
                // initial_transition only enters Processing with a code present
                return self.fail(NO_CODE_MESSAGE.to_string());
            }
        };

        match self.exchanger.exchange(&code).await {
            Ok(user) => {
                // Let dependent readers observe the persisted token before anyone reacts to success
                tokio::time::sleep(self.options.settle_delay).await;
                info!("Authentication completed for {}", user.username);
                let done = CallbackState::Success(user);
                self.state.send_replace(done.clone());
                self.navigator.navigate(&self.options.landing_route);
                done
            }
            Err(e) => {
                error!("OAuth callback error: {}", e);
                if !e.is_reentrancy() {
                    // Never leave a half-authenticated session behind
                    if let Err(clear_err) = self.session.logout().await {
                        error!("Failed to clear session after callback failure: {}", clear_err);
                    }
                }
                self.fail(GENERIC_FAILURE_MESSAGE.to_string())
            }
        }
    }

    fn initial_transition(params: &CallbackParams) -> CallbackState {
        if let Some(error) = &params.error {
            return CallbackState::Failed(format!("GitHub OAuth error: {}", error));
        }
        if params.code.is_none() {
            return CallbackState::Failed(NO_CODE_MESSAGE.to_string());
        }
        CallbackState::Processing
    }

    fn fail(&self, message: String) -> CallbackState {
        let failed = CallbackState::Failed(message);
        self.state.send_replace(failed.clone());
        self.schedule_redirect();
        failed
    }

    fn schedule_redirect(&self) {
        let navigator = Arc::clone(&self.navigator);
        let route = self.options.landing_route.clone();
        let delay = self.options.redirect_delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Redirecting to {} after failed callback", route);
            navigator.navigate(&route);
        });

        let mut pending = self
            .pending_redirect
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for CallbackFlow {
    fn drop(&mut self) {
        let pending = self
            .pending_redirect
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}
