// ABOUTME: Single-flight exchange of a one-time authorization code for a session
// ABOUTME: A second exchange while one is outstanding fails fast instead of redeeming the code twice

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use revdash_core::{code_preview, ApiError, User};
use tracing::{debug, error, info};

use crate::{
    error::AuthResult,
    session::SessionStore,
};

/// Redeems authorization codes and stores the resulting session
pub struct CodeExchanger {
    session: Arc<SessionStore>,
    in_progress: AtomicBool,
}

/// Clears the in-progress flag when the exchange finishes or is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CodeExchanger {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            session,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Exchange `code` for a token and profile and store them.
    ///
    /// The guard spans the whole exchange, network round-trip included.
    pub async fn exchange(&self, code: &str) -> AuthResult<User> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_progress) else {
            debug!("OAuth callback already in progress, skipping duplicate request");
            return Err(ApiError::Reentrancy.into());
        };

        info!("Handling OAuth callback with code: {}", code_preview(code));

        let response = self.session.backend().exchange_code(code).await.map_err(|e| {
            error!("OAuth code exchange failed: {}", e);
            e
        })?;

        let (token, user) = response.into_session()?;
        self.session.set_auth_data(token, user.clone()).await?;

        info!("OAuth callback completed for {}", user.username);
        Ok(user)
    }
}
