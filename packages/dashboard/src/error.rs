use revdash_auth::AuthError;
use revdash_config::ConfigError;
use revdash_core::ApiError;
use revdash_query::QueryError;
use thiserror::Error;

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("GitHub login is not configured: set REVDASH_GITHUB_CLIENT_ID")]
    LoginUnavailable,
}

impl DashboardError {
    /// Backend error behind this failure, wherever it surfaced
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Auth(e) => e.api_error(),
            Self::Query(e) => e.api_error(),
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_auth_rejection(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_auth_rejection)
    }
}
