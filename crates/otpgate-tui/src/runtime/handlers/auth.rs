//! OTP requests and session persistence.

use std::future::Future;

use otpgate_core::api::OtpClient;
use otpgate_core::error::{AuthError, AuthErrorKind};
use otpgate_core::session::{Session, SessionStore};
use tokio_util::sync::CancellationToken;

use crate::events::UiEvent;

const CANCELLED_MESSAGE: &str = "Request cancelled.";

pub async fn request_otp(
    client: OtpClient,
    mobile: String,
    cancel: Option<CancellationToken>,
) -> UiEvent {
    let result = cancellable(cancel, client.request_otp(&mobile)).await;
    UiEvent::OtpRequested { result }
}

pub async fn resend_otp(
    client: OtpClient,
    mobile: String,
    cancel: Option<CancellationToken>,
) -> UiEvent {
    let result = cancellable(cancel, client.resend_otp(&mobile)).await;
    UiEvent::OtpResent { result }
}

pub async fn verify_otp(
    client: OtpClient,
    mobile: String,
    otp: String,
    cancel: Option<CancellationToken>,
) -> UiEvent {
    let result = cancellable(cancel, client.verify_otp(&mobile, &otp)).await;
    UiEvent::OtpVerified { result }
}

/// Writes the session file. Runs inline; the write is small and local.
pub fn persist_session(store: &SessionStore, session: &Session) -> UiEvent {
    let result = store.save(session).map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "failed to save session");
        format!("{e:#}")
    });
    UiEvent::SessionSaved { result }
}

pub fn clear_session(store: &SessionStore) -> UiEvent {
    let result = store.clear().map(|_| ()).map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "failed to clear session");
        format!("{e:#}")
    });
    UiEvent::SessionCleared { result }
}

async fn cancellable<T, F>(cancel: Option<CancellationToken>, fut: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    let Some(token) = cancel else {
        return fut.await;
    };
    tokio::select! {
        () = token.cancelled() => {
            tracing::info!("request cancelled");
            Err(AuthError::new(AuthErrorKind::Transport, CANCELLED_MESSAGE))
        }
        result = fut => result,
    }
}
