// ABOUTME: Uniform request dispatch with bearer credentials from the session store
// ABOUTME: Transport failures become status 0; a 401 expires the session before the error is returned

use std::sync::Arc;
use std::time::Duration;

use reqwest::{
    header::{HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method, RequestBuilder,
};
use revdash_auth::SessionStore;
use revdash_config::ClientConfig;
use revdash_core::{ApiError, ApiResult};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

/// The single HTTP client for backend calls
#[derive(Clone)]
pub struct ApiGateway {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiGateway {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> ApiResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn from_config(config: &ClientConfig, session: Arc<SessionStore>) -> ApiResult<Self> {
        Self::new(config.api_base_url.clone(), config.http_timeout, session)
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    /// POST without a body
    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::POST, path)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        // Credentials are read per request so a login or logout applies to the next call
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .headers(self.session.auth_headers())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await.map_err(|e| {
            warn!("Request failed before a response arrived: {}", e);
            ApiError::transport(e.to_string())
        })?;

        let status = response.status();
        let url = response.url().path().to_string();

        if !status.is_success() {
            // The status alone decides the outcome; an unreadable body only loses the detail
            let body = response.text().await.unwrap_or_else(|e| {
                warn!("Could not read error body from {}: {}", url, e);
                String::new()
            });
            let err = ApiError::application(status.as_u16(), &body);
            error!(
                "API Error: {} {} - {}",
                status.as_u16(),
                url,
                err.message()
            );
            if err.is_auth_rejection() {
                self.reset_session().await;
            }
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;
        debug!("{} {}", status.as_u16(), url);
        serde_json::from_str(&body)
            .map_err(|e| ApiError::protocol(format!("Invalid response body from {}: {}", url, e)))
    }

    async fn reset_session(&self) {
        warn!("Backend rejected the session; resetting client state");
        if let Err(e) = self.session.expire().await {
            error!("Failed to clear rejected session: {}", e);
        }
    }
}
