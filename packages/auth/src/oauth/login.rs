// ABOUTME: Builds the GitHub authorization URL that starts the login flow
// ABOUTME: The provider redirects back to the configured callback route with `code` or `error`

use revdash_core::constants::{GITHUB_AUTHORIZE_URL, GITHUB_OAUTH_SCOPE};
use url::Url;

use crate::error::{AuthError, AuthResult};

/// URL the user must visit to grant access
pub fn authorize_url(client_id: &str, redirect_uri: &str) -> AuthResult<String> {
    if client_id.trim().is_empty() {
        return Err(AuthError::Configuration(
            "GitHub client id is not configured".to_string(),
        ));
    }

    let mut url = Url::parse(GITHUB_AUTHORIZE_URL)
        .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", GITHUB_OAUTH_SCOPE);

    Ok(url.to_string())
}
