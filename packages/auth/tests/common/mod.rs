#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use revdash_auth::{AuthBackend, Navigator};
use revdash_core::{ApiResult, OAuthCallbackResponse, User};
use serde_json::Map;
use tokio::sync::Notify;

pub fn user(name: &str) -> User {
    User {
        id: 42,
        username: name.to_string(),
        full_name: Some("The Octocat".to_string()),
        avatar_url: None,
        email: None,
        extra: Map::new(),
    }
}

pub fn callback_response(token: &str, user: User) -> OAuthCallbackResponse {
    OAuthCallbackResponse {
        access_token: Some(token.to_string()),
        token_type: Some("bearer".to_string()),
        user: Some(user),
    }
}

/// Backend with a scripted exchange result and an optional gate to hold exchanges open
pub struct ScriptedBackend {
    exchange: Mutex<ApiResult<OAuthCallbackResponse>>,
    profile: Mutex<ApiResult<User>>,
    gate: Option<Arc<Notify>>,
    pub exchange_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(exchange: ApiResult<OAuthCallbackResponse>) -> Self {
        Self {
            exchange: Mutex::new(exchange),
            profile: Mutex::new(Ok(user("octocat"))),
            gate: None,
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(exchange: ApiResult<OAuthCallbackResponse>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(exchange)
        }
    }

    pub fn calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for ScriptedBackend {
    async fn exchange_code(&self, _code: &str) -> ApiResult<OAuthCallbackResponse> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.exchange.lock().unwrap().clone()
    }

    async fn fetch_profile(&self, _token: &str) -> ApiResult<User> {
        self.profile.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}
