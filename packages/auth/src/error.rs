// ABOUTME: Error types for session persistence and OAuth operations
// ABOUTME: Backend failures stay in the shared ApiError shape; local failures get their own variants

use revdash_core::ApiError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Callback server error: {0}")]
    CallbackServer(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// The backend rejected the session (401)
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth_rejection())
    }

    /// A code exchange was already outstanding
    pub fn is_reentrancy(&self) -> bool {
        matches!(self, Self::Api(ApiError::Reentrancy))
    }

    /// Backend error carried by this failure, if any
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}
