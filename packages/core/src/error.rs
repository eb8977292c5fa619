// ABOUTME: The single tagged error shape for every backend interaction
// ABOUTME: Built once at the HTTP boundary; callers match on the variant instead of probing fields

use serde_json::Value;
use thiserror::Error;

use crate::constants::AUTH_REJECTION_STATUS;

pub type ApiResult<T> = Result<T, ApiError>;

/// Normalized failure of a backend call.
///
/// `Clone` so a single de-duplicated request can hand the same failure to
/// every caller that joined it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response reached the client
    #[error("Network error: {message}")]
    Transport { message: String },

    /// The server answered with a non-success status
    #[error("{message}")]
    Application {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// The server answered successfully but the payload broke the contract
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// An OAuth code exchange was attempted while another one is outstanding
    #[error("OAuth callback already in progress")]
    Reentrancy,
}

impl ApiError {
    /// Create a transport error (status 0)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a protocol violation error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation(message.into())
    }

    /// Normalize a non-success response.
    ///
    /// The body is kept as JSON when it parses, otherwise as a raw string. The
    /// message comes from the body's `detail` field when present, otherwise
    /// from the generic status text.
    pub fn application(status: u16, raw_body: &str) -> Self {
        let body = match serde_json::from_str::<Value>(raw_body) {
            Ok(value) => Some(value),
            Err(_) if raw_body.trim().is_empty() => None,
            Err(_) => Some(Value::String(raw_body.to_string())),
        };

        let message = body
            .as_ref()
            .and_then(|b| b.get("detail"))
            .map(|detail| match detail {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("Request failed with status code {}", status));

        Self::Application {
            status,
            message,
            body,
        }
    }

    /// HTTP status carried by the error; 0 when no response was received
    pub fn status(&self) -> u16 {
        match self {
            Self::Application { status, .. } => *status,
            _ => 0,
        }
    }

    /// Raw response body, if the server sent one
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Application { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Self::Transport { message } | Self::Application { message, .. } => message.clone(),
            Self::ProtocolViolation(message) => message.clone(),
            Self::Reentrancy => self.to_string(),
        }
    }

    /// Whether the server explicitly rejected the session
    pub fn is_auth_rejection(&self) -> bool {
        self.status() == AUTH_REJECTION_STATUS
    }

    /// Whether the failure may go away on its own (nothing reached the server)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_application_error_uses_detail() {
        let err = ApiError::application(404, r#"{"detail":"Review not found"}"#);
        assert_eq!(err.status(), 404);
        assert_eq!(err.message(), "Review not found");
        assert_eq!(err.body(), Some(&json!({"detail": "Review not found"})));
    }

    #[test]
    fn test_application_error_falls_back_to_status_text() {
        let err = ApiError::application(502, "<html>Bad Gateway</html>");
        assert_eq!(err.message(), "Request failed with status code 502");
        assert_eq!(
            err.body(),
            Some(&Value::String("<html>Bad Gateway</html>".to_string()))
        );
    }

    #[test]
    fn test_application_error_structured_detail() {
        let err = ApiError::application(422, r#"{"detail":[{"loc":["body","status"]}]}"#);
        assert_eq!(err.message(), r#"[{"loc":["body","status"]}]"#);
    }

    #[test]
    fn test_empty_body_is_absent() {
        let err = ApiError::application(500, "  ");
        assert!(err.body().is_none());
    }

    #[test]
    fn test_transport_error_has_status_zero() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.status(), 0);
        assert!(err.is_transient());
        assert!(!err.is_auth_rejection());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[rstest]
    #[case(401, true)]
    #[case(403, false)]
    #[case(404, false)]
    #[case(500, false)]
    fn test_auth_rejection_classification(#[case] status: u16, #[case] rejected: bool) {
        let err = ApiError::application(status, "");
        assert_eq!(err.is_auth_rejection(), rejected);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_reentrancy_display() {
        assert_eq!(
            ApiError::Reentrancy.to_string(),
            "OAuth callback already in progress"
        );
        assert_eq!(ApiError::Reentrancy.status(), 0);
    }
}
