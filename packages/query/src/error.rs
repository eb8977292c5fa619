use revdash_core::ApiError;
use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

/// Cloneable so one fetch result can be handed to every joined caller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Query was cancelled")]
    Cancelled,

    #[error("Query is disabled")]
    Disabled,

    #[error("Query task failed: {0}")]
    TaskFailed(String),

    #[error("Failed to decode query data: {0}")]
    Decode(String),
}

impl QueryError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_auth_rejection(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_auth_rejection)
    }
}
