//! Error taxonomy for the login flow.
//!
//! Every failure the user can see collapses to a single display string, but the
//! kind is kept so callers can log or branch on it.

use std::fmt;

use serde_json::Value;

use crate::validation::ValidationError;

/// Shown when the server could not be reached at all.
pub const TRANSPORT_MESSAGE: &str = "Something went wrong. Please try again.";

/// Shown when the request exceeded the configured timeout.
pub const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";

/// Categories of login errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Client-side check failed before any request was sent.
    Validation,
    /// Network failure, timeout, or unreadable response.
    Transport,
    /// Non-2xx status or an explicit `{"success": false}` body.
    Server,
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorKind::Validation => write!(f, "validation"),
            AuthErrorKind::Transport => write!(f, "transport"),
            AuthErrorKind::Server => write!(f, "server"),
        }
    }
}

/// A user-facing login error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub kind: AuthErrorKind,
    /// One-line message suitable for display next to the input.
    pub message: String,
    /// HTTP status, for server errors.
    pub status: Option<u16>,
    /// Extra detail for logs (underlying error, raw body).
    pub details: Option<String>,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Validation, message)
    }

    /// Creates a transport error from an underlying request failure.
    pub fn transport(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            TIMEOUT_MESSAGE
        } else {
            TRANSPORT_MESSAGE
        };
        Self {
            kind: AuthErrorKind::Transport,
            message: message.to_string(),
            status: None,
            details: Some(source_chain(err)),
        }
    }

    /// Creates a server error, preferring the message the server sent.
    pub fn server(status: u16, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| server_message(&json))
            .unwrap_or_else(|| fallback.to_string());
        Self {
            kind: AuthErrorKind::Server,
            message,
            status: Some(status),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind == AuthErrorKind::Validation
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthError {}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

/// Extracts a human-readable message from a JSON response body.
///
/// Looks at `message`, then `error` (string or `{message}`), at the top level
/// and under `data`.
pub fn server_message(json: &Value) -> Option<String> {
    let direct = |obj: &Value| -> Option<String> {
        if let Some(msg) = obj.get("message").and_then(Value::as_str) {
            return Some(msg.to_string());
        }
        match obj.get("error") {
            Some(Value::String(msg)) => Some(msg.clone()),
            Some(err) => err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            None => None,
        }
    };

    direct(json)
        .or_else(|| json.get("data").and_then(direct))
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty())
}

/// Formats the source chain of a request error, leaving out the URL that
/// carries the mobile number.
fn source_chain(err: &reqwest::Error) -> String {
    let mut chain = String::new();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if !chain.is_empty() {
            chain.push_str(": ");
        }
        chain.push_str(&inner.to_string());
        source = inner.source();
    }
    if chain.is_empty() {
        "request failed".to_string()
    } else {
        chain
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_server_error_prefers_body_message() {
        let err = AuthError::server(400, r#"{"message":"Number not registered"}"#, "fallback");
        assert_eq!(err.kind, AuthErrorKind::Server);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.to_string(), "Number not registered");
    }

    #[test]
    fn test_server_error_reads_error_field_variants() {
        let err = AuthError::server(200, r#"{"success":false,"error":"Invalid OTP"}"#, "x");
        assert_eq!(err.message, "Invalid OTP");

        let err = AuthError::server(500, r#"{"error":{"message":"Upstream down"}}"#, "x");
        assert_eq!(err.message, "Upstream down");
    }

    #[test]
    fn test_server_error_falls_back_on_plain_body() {
        let err = AuthError::server(502, "<html>Bad gateway</html>", "Failed to send OTP.");
        assert_eq!(err.message, "Failed to send OTP.");
        assert_eq!(err.details.as_deref(), Some("<html>Bad gateway</html>"));
    }

    #[test]
    fn test_server_message_looks_under_data() {
        let body = json!({"success": false, "data": {"message": "Try later"}});
        assert_eq!(server_message(&body).as_deref(), Some("Try later"));
        assert_eq!(server_message(&json!({"message": "   "})), None);
    }

    #[test]
    fn test_validation_error_converts() {
        let err: AuthError = ValidationError::MobileEmpty.into();
        assert!(err.is_validation());
        assert_eq!(err.message, "Please enter your mobile number");
    }
}
