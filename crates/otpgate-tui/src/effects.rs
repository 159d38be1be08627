//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They cover I/O and task spawning only, so the reducer never touches the
//! network or the filesystem.

use otpgate_core::session::Session;
use tokio_util::sync::CancellationToken;

use crate::common::{TaskId, TaskKind};

#[derive(Debug)]
pub enum UiEffect {
    Quit,

    /// Spawn the request-OTP call.
    RequestOtp { task: TaskId, mobile: String },

    /// Spawn the resend call.
    ResendOtp { task: TaskId, mobile: String },

    /// Spawn the verify call.
    VerifyOtp {
        task: TaskId,
        mobile: String,
        otp: String,
    },

    /// Write the session file.
    PersistSession { session: Session },

    /// Remove the session file.
    ClearSession,

    /// Cancel an in-flight task. The runtime calls `cancel()` on the token.
    CancelTask {
        kind: TaskKind,
        token: Option<CancellationToken>,
    },
}
