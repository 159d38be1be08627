//! Login, logout, and status.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use otpgate_core::api::OtpClient;
use otpgate_core::config::Config;
use otpgate_core::flow::{FlowEffect, LoginFlow, Screen};
use otpgate_core::session::{Session, SessionStore};
use otpgate_core::validation::{self, format_mobile, mask_mobile};

pub async fn login_interactive(config: &Config) -> Result<()> {
    let store = SessionStore::default_location();
    if let Some(session) = otpgate_tui::run_login(config, store).await? {
        println!("Logged in as {}", format_mobile(&session.mobile, &config.country_code));
    }
    Ok(())
}

/// Runs the login flow without a UI.
///
/// The code comes from `otp`, or from one line of stdin.
pub async fn login_scripted(config: &Config, mobile: &str, otp: Option<String>) -> Result<()> {
    let mobile = mobile.trim();
    validation::validate_mobile(mobile)?;

    let client = OtpClient::new(&config.api)?;
    let mut flow = LoginFlow::resume(None).with_allowed_mobiles(config.allowed_mobiles.clone());
    flow.set_mobile_input(mobile);

    let Some(FlowEffect::RequestOtp { mobile }) = flow.submit_mobile().into_iter().next() else {
        anyhow::bail!("{}", flow_error(&flow));
    };
    tracing::info!(mobile = %mask_mobile(&mobile), "scripted login: requesting otp");
    flow.otp_requested(client.request_otp(&mobile).await);
    if flow.screen() != Screen::Otp {
        anyhow::bail!("{}", flow_error(&flow));
    }
    eprintln!(
        "OTP sent to {}",
        format_mobile(&mobile, &config.country_code)
    );

    let code = match otp {
        Some(code) => code,
        None => read_otp_line()?,
    };
    let code = code.trim();
    validation::validate_otp(code)?;
    flow.paste(code);

    let Some(FlowEffect::VerifyOtp { mobile, otp }) = flow.submit_otp().into_iter().next() else {
        anyhow::bail!("{}", flow_error(&flow));
    };
    let effects = flow.otp_verified(client.verify_otp(&mobile, &otp).await);

    let store = SessionStore::default_location();
    for effect in effects {
        if let FlowEffect::PersistSession(session) = effect {
            store
                .save(&session)
                .with_context(|| format!("save session to {}", store.path().display()))?;
        }
    }

    let session = flow.session().with_context(|| flow_error(&flow))?;
    println!(
        "Logged in as {}",
        format_mobile(&session.mobile, &config.country_code)
    );
    Ok(())
}

pub fn logout() -> Result<()> {
    let store = SessionStore::default_location();
    let removed = store
        .clear()
        .with_context(|| format!("clear session at {}", store.path().display()))?;
    if removed {
        tracing::info!("logged out");
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn status(config: &Config) -> Result<()> {
    let store = SessionStore::default_location();
    match store.load()? {
        Some(session) => println!("{}", describe_session(&session, &config.country_code)),
        None => println!("Not logged in."),
    }
    Ok(())
}

fn describe_session(session: &Session, country_code: &str) -> String {
    let mut line = format!(
        "Logged in as {}",
        format_mobile(&session.mobile, country_code)
    );
    if let Some(name) = session.display_name() {
        line.push_str(&format!(" ({name})"));
    }
    let token = if session.has_token() {
        "token stored"
    } else {
        "no token"
    };
    line.push_str(&format!("\nSince: {}\nToken: {token}", session.created_at.to_rfc3339()));
    line
}

fn flow_error(flow: &LoginFlow) -> String {
    flow.error().unwrap_or("Login failed").to_string()
}

fn read_otp_line() -> Result<String> {
    eprint!("Enter OTP: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read OTP from stdin")?;
    if read == 0 {
        anyhow::bail!("No OTP provided on stdin");
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_describe_session_with_token_and_name() {
        let user = json!({"name": "Asha"}).as_object().cloned();
        let session = Session::new("9876543210")
            .with_token(Some("tok".to_string()))
            .with_user(user);
        let text = describe_session(&session, "+91");
        assert!(text.starts_with("Logged in as +91 98765 43210 (Asha)"));
        assert!(text.contains("Token: token stored"));
    }

    #[test]
    fn test_describe_session_without_token() {
        let text = describe_session(&Session::new("9876543210"), "+91");
        assert!(text.contains("Token: no token"));
    }
}
