//! Full-screen login UI for otpgate.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stdout};

use anyhow::Result;
pub use features::auth;
use otpgate_core::api::OtpClient;
use otpgate_core::config::Config;
use otpgate_core::session::{Session, SessionStore};
pub use runtime::TuiRuntime;

/// Runs the interactive login and returns the session held on exit.
///
/// A stored session opens straight on the logged-in screen. An unreadable
/// session file is logged and ignored.
///
/// # Errors
/// Returns an error if stdout is not a terminal, the HTTP client can't be
/// built, or terminal I/O fails.
pub async fn run_login(config: &Config, store: SessionStore) -> Result<Option<Session>> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "Interactive login requires a terminal.\n\
             Use `otpgate login --mobile <NUMBER>` for non-interactive login."
        );
    }

    let session = match store.load() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable session file");
            None
        }
    };
    let client = OtpClient::new(&config.api)?;

    let mut runtime = TuiRuntime::new(config, client, store, session)?;
    runtime.run()?;
    let session = runtime.session().cloned();
    drop(runtime);

    Ok(session)
}
