use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the ProdFlow client and cache.
///
/// Every variant is terminal for the operation that produced it; nothing in this
/// crate retries on its own.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, DNS, broken body).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Http { status: u16, detail: Option<String> },

    /// A payload was rejected before it was sent.
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The server answered with a body we could not understand.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// A background fetch task did not run to completion.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Builds an HTTP error from a status and the raw response body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        Self::Http {
            status: status.as_u16(),
            detail: extract_detail(body),
        }
    }

    /// HTTP status code, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// One human-readable line suitable for a notification.
    ///
    /// HTTP failures render as `[status] detail`; everything else renders its message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { status, detail } => {
                let detail = detail.clone().unwrap_or_else(|| {
                    StatusCode::from_u16(*status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("Request failed")
                        .to_string()
                });
                format!("[{status}] {detail}")
            }
            Self::Validation { field, message } => format!("{field}: {message}"),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Pulls the `detail` out of a FastAPI-style error body.
///
/// `detail` is either a plain string or a list of validation entries carrying `msg`.
fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return Some(body.to_string());
    };

    match json.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                Some(body.to_string())
            } else {
                Some(msgs.join("; "))
            }
        }
        Some(other) => Some(other.to_string()),
        None => Some(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail() {
        let err = ClientError::from_response(
            StatusCode::CONFLICT,
            r#"{"detail":"User with this username already exists"}"#,
        );
        assert_eq!(err.status(), Some(409));
        assert_eq!(
            err.user_message(),
            "[409] User with this username already exists"
        );
    }

    #[test]
    fn test_list_detail_joins_messages() {
        let body = r#"{"detail":[
            {"loc":["body","password"],"msg":"Value error, Password must be at least 8 characters long.","type":"value_error"},
            {"loc":["body","username"],"msg":"Field required","type":"missing"}
        ]}"#;
        let err = ClientError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(
            err.user_message(),
            "[422] Value error, Password must be at least 8 characters long.; Field required"
        );
    }

    #[test]
    fn test_missing_detail_uses_reason() {
        let err = ClientError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.user_message(), "[500] Internal Server Error");
        assert_eq!(err.to_string(), "HTTP 500: no detail");
    }

    #[test]
    fn test_plain_text_body_is_kept() {
        let err = ClientError::from_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.user_message(), "[502] upstream down");
    }

    #[test]
    fn test_unauthorized() {
        let err = ClientError::from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"detail":"Could not validate credentials"}"#,
        );
        assert!(err.is_unauthorized());
        assert!(!ClientError::Network("refused".into()).is_unauthorized());
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
        assert_eq!(err.user_message(), "Network error: connection refused");

        let err = ClientError::validation("username", "must not be empty");
        assert_eq!(err.to_string(), "Invalid username: must not be empty");
        assert_eq!(err.user_message(), "username: must not be empty");
    }
}
