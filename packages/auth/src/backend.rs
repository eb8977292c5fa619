// ABOUTME: Backend calls the session layer needs: code exchange and profile re-validation
// ABOUTME: Trait seam so the session store and callback flow can run against any backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use revdash_core::{
    constants::{CURRENT_USER_PATH, OAUTH_CALLBACK_PATH},
    ApiError, ApiResult, OAuthCallbackResponse, User,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::{AuthError, AuthResult};

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Redeem a one-time authorization code for a token and profile
    async fn exchange_code(&self, code: &str) -> ApiResult<OAuthCallbackResponse>;

    /// Fetch the profile behind `token`; a 401 means the token is no longer valid
    async fn fetch_profile(&self, token: &str) -> ApiResult<User>;
}

/// `AuthBackend` over the review backend's HTTP API
pub struct HttpAuthBackend {
    client: Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn exchange_code(&self, code: &str) -> ApiResult<OAuthCallbackResponse> {
        let url = self.url(OAUTH_CALLBACK_PATH);
        debug!("Exchanging authorization code at {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("code", code)])
            .send()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let status = response.status();
        let result = read_json::<OAuthCallbackResponse>(response).await;
        match &result {
            Ok(data) => debug!(
                "OAuth callback response: status={} has_token={} has_user={} token_type={:?}",
                status,
                data.access_token.is_some(),
                data.user.is_some(),
                data.token_type
            ),
            // Don't leak the response body - only log status
            Err(_) => error!("OAuth callback failed with status {}", status),
        }
        result
    }

    async fn fetch_profile(&self, token: &str) -> ApiResult<User> {
        let response = self
            .client
            .get(self.url(CURRENT_USER_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;

        read_json(response).await
    }
}

/// Decode a response, normalizing failures into `ApiError`
async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::transport(e.to_string()))?;

    if !status.is_success() {
        return Err(ApiError::application(status.as_u16(), &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| ApiError::protocol(format!("Invalid response body: {}", e)))
}
