//! HTTP client for the OTP service.
//!
//! Two endpoints: request an OTP for a number, and verify the code the user
//! typed. Both pass their parameters in the query string.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::Instrument;
use url::Url;

use crate::config::ApiConfig;
use crate::error::AuthError;
use crate::validation::mask_mobile;

/// Which call a response belongs to. Picks the fallback error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RequestOtp,
    ResendOtp,
    VerifyOtp,
}

impl Operation {
    pub fn default_message(self) -> &'static str {
        match self {
            Operation::RequestOtp => "Failed to send OTP. Please try again.",
            Operation::ResendOtp => "Failed to resend OTP. Please try again.",
            Operation::VerifyOtp => "Invalid OTP. Please try again.",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Operation::RequestOtp => "request_otp",
            Operation::ResendOtp => "resend_otp",
            Operation::VerifyOtp => "verify_otp",
        }
    }
}

/// Payload of a successful verification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verification {
    pub token: Option<String>,
    pub user: Option<Map<String, Value>>,
}

/// Client for the request/verify OTP endpoints.
#[derive(Debug, Clone)]
pub struct OtpClient {
    http: reqwest::Client,
    request_url: Url,
    verify_url: Url,
    workshop_id: String,
}

impl OtpClient {
    /// Builds a client from config. `OTPGATE_API_BASE_URL` overrides the base URL.
    ///
    /// # Errors
    /// Returns an error if the endpoint URLs are malformed or the HTTP client
    /// cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config.effective_base_url();
        Self::with_base_url(config, &base_url)
    }

    /// Builds a client against an explicit base URL.
    ///
    /// # Errors
    /// Returns an error if the endpoint URLs are malformed or the HTTP client
    /// cannot be built.
    pub fn with_base_url(config: &ApiConfig, base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        let request_url = endpoint_url(base_url, &config.request_otp_path)?;
        let verify_url = endpoint_url(base_url, &config.verify_otp_path)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            request_url,
            verify_url,
            workshop_id: config.workshop_id.clone(),
        })
    }

    /// Asks the server to send an OTP to `mobile`.
    ///
    /// # Errors
    /// Returns a transport error if the server can't be reached, or a server
    /// error for a non-2xx status or `{"success": false}` body.
    pub async fn request_otp(&self, mobile: &str) -> Result<(), AuthError> {
        self.send_otp(mobile, Operation::RequestOtp).await
    }

    /// Same call as [`OtpClient::request_otp`], reported as a resend.
    ///
    /// # Errors
    /// See [`OtpClient::request_otp`].
    pub async fn resend_otp(&self, mobile: &str) -> Result<(), AuthError> {
        self.send_otp(mobile, Operation::ResendOtp).await
    }

    /// Verifies `otp` for `mobile`.
    ///
    /// # Errors
    /// Returns a transport error if the server can't be reached, or a server
    /// error when the code is rejected.
    pub async fn verify_otp(&self, mobile: &str, otp: &str) -> Result<Verification, AuthError> {
        let mut url = self.verify_url.clone();
        url.query_pairs_mut()
            .append_pair("mobile_number", mobile)
            .append_pair("otp", otp)
            .append_pair("workshop_id", &self.workshop_id);

        let op = Operation::VerifyOtp;
        tracing::info!(op = op.name(), mobile = %mask_mobile(mobile), "sending request");
        let body = execute(self.http.post(url), op, self.verify_url.path()).await?;
        let verification = body.as_ref().map(extract_verification).unwrap_or_default();
        tracing::info!(
            op = op.name(),
            has_token = verification.token.is_some(),
            "otp verified"
        );
        Ok(verification)
    }

    async fn send_otp(&self, mobile: &str, op: Operation) -> Result<(), AuthError> {
        let mut url = self.request_url.clone();
        url.query_pairs_mut().append_pair("mobile_number", mobile);

        tracing::info!(op = op.name(), mobile = %mask_mobile(mobile), "sending request");
        execute(self.http.get(url), op, self.request_url.path()).await?;
        tracing::info!(op = op.name(), "otp sent");
        Ok(())
    }
}

/// Sends the request inside a span naming the endpoint path (never the
/// query, which carries the number).
async fn execute(
    request: reqwest::RequestBuilder,
    op: Operation,
    endpoint: &str,
) -> Result<Option<Value>, AuthError> {
    let span = tracing::info_span!("otp_api", op = op.name(), endpoint);
    async move {
        let response = request.send().await.map_err(|e| {
            let err = AuthError::transport(&e);
            tracing::warn!(details = ?err.details, "request failed");
            err
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            let err = AuthError::transport(&e);
            tracing::warn!(status, details = ?err.details, "failed to read body");
            err
        })?;

        interpret_response(status, &body, op).inspect_err(|err| {
            tracing::warn!(status, message = %err.message, "request rejected");
        })
    }
    .instrument(span)
    .await
}

fn endpoint_url(base_url: &str, path: &str) -> Result<Url> {
    let path = if path.starts_with('/') || path.is_empty() {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let raw = format!("{base_url}{path}");
    Url::parse(&raw).with_context(|| format!("Invalid API endpoint URL '{raw}'"))
}

/// Decides whether a response counts as success.
///
/// Success is a 2xx status whose body is not a JSON object with
/// `"success": false`. Empty and non-JSON bodies on 2xx succeed. Returns the
/// parsed body when it is JSON.
///
/// # Errors
/// Returns a server error carrying the server's message or the operation's
/// default message.
pub fn interpret_response(
    status: u16,
    body: &str,
    op: Operation,
) -> Result<Option<Value>, AuthError> {
    if !(200..300).contains(&status) {
        return Err(AuthError::server(status, body, op.default_message()));
    }
    let json = serde_json::from_str::<Value>(body).ok();
    if json
        .as_ref()
        .and_then(|v| v.get("success"))
        .and_then(Value::as_bool)
        == Some(false)
    {
        return Err(AuthError::server(status, body, op.default_message()));
    }
    Ok(json)
}

/// Pulls the token and user object out of a verify response, checking the top
/// level first and then `data`.
fn extract_verification(body: &Value) -> Verification {
    let token = ["token", "access_token"]
        .iter()
        .find_map(|key| lookup(body, key).and_then(Value::as_str))
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let user = lookup(body, "user").and_then(Value::as_object).cloned();

    Verification { token, user }
}

fn lookup<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key)
        .or_else(|| body.get("data").and_then(|d| d.get(key)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::{AuthErrorKind, TRANSPORT_MESSAGE};

    fn client_for(server: &MockServer) -> OtpClient {
        OtpClient::with_base_url(&ApiConfig::default(), &server.uri()).unwrap()
    }

    #[test]
    fn test_interpret_response_success_rules() {
        let op = Operation::RequestOtp;
        assert!(interpret_response(200, "", op).unwrap().is_none());
        assert!(interpret_response(200, "OTP sent", op).unwrap().is_none());
        assert!(interpret_response(204, r#"{"success":true}"#, op).is_ok());
        assert!(interpret_response(200, r#"{"status":"ok"}"#, op).is_ok());

        let err = interpret_response(200, r#"{"success":false}"#, op).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::Server);
        assert_eq!(err.message, "Failed to send OTP. Please try again.");

        let err = interpret_response(500, "", Operation::VerifyOtp).unwrap_err();
        assert_eq!(err.status, Some(500));
        assert_eq!(err.message, "Invalid OTP. Please try again.");
    }

    #[test]
    fn test_extract_verification_top_level_and_nested() {
        let v = extract_verification(&json!({"token": "t1", "user": {"id": 1}}));
        assert_eq!(v.token.as_deref(), Some("t1"));
        assert_eq!(v.user.unwrap()["id"], 1);

        let v = extract_verification(&json!({"data": {"access_token": "t2"}}));
        assert_eq!(v.token.as_deref(), Some("t2"));
        assert!(v.user.is_none());

        let v = extract_verification(&json!({"success": true, "token": ""}));
        assert_eq!(v, Verification::default());
    }

    #[test]
    fn test_endpoint_url_joins_paths() {
        let url = endpoint_url("http://localhost:8080/api", "auth/getotpend").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/auth/getotpend");
        assert!(endpoint_url("not a url", "/x").is_err());
    }

    #[tokio::test]
    async fn test_request_otp_sends_mobile_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/getotpend"))
            .and(query_param("mobile_number", "9876543210"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).request_otp("9876543210").await.unwrap();
    }

    #[tokio::test]
    async fn test_request_otp_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/getotpend"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "Number not registered"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request_otp("9876543210")
            .await
            .unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::Server);
        assert_eq!(err.to_string(), "Number not registered");
    }

    #[tokio::test]
    async fn test_resend_uses_resend_default_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/getotpend"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .resend_otp("9876543210")
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(503));
        assert_eq!(err.message, "Failed to resend OTP. Please try again.");
    }

    #[tokio::test]
    async fn test_verify_otp_posts_query_and_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify_otp_end"))
            .and(query_param("mobile_number", "9876543210"))
            .and(query_param("otp", "1234"))
            .and(query_param("workshop_id", "4317"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "token": "tok-123",
                "user": {"name": "Asha"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let verification = client_for(&server)
            .verify_otp("9876543210", "1234")
            .await
            .unwrap();
        assert_eq!(verification.token.as_deref(), Some("tok-123"));
        assert_eq!(verification.user.unwrap()["name"], "Asha");
    }

    #[tokio::test]
    async fn test_verify_otp_rejected_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify_otp_end"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid OTP"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .verify_otp("9876543210", "0000")
            .await
            .unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::Server);
        assert_eq!(err.message, "Invalid OTP");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = OtpClient::with_base_url(&ApiConfig::default(), &uri).unwrap();
        let err = client.request_otp("9876543210").await.unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::Transport);
        assert_eq!(err.message, TRANSPORT_MESSAGE);
        assert!(err.details.is_some());
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = ApiConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let client = OtpClient::with_base_url(&config, &server.uri()).unwrap();
        let err = client.request_otp("9876543210").await.unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::Transport);
        assert_eq!(err.message, crate::error::TIMEOUT_MESSAGE);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_request_logs_endpoint_span_without_number() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/getotpend"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let err = client_for(&server).request_otp("9876543210").await.unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::Server);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("otp_api{"), "{output}");
        assert!(output.contains("request_otp"), "{output}");
        assert!(output.contains("/auth/getotpend"), "{output}");
        assert!(output.contains("request rejected"), "{output}");
        assert!(!output.contains("9876543210"), "{output}");
        assert!(!output.contains("mobile_number"), "{output}");
    }
}
