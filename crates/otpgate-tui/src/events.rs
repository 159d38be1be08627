//! UI events consumed by the reducer.

use crossterm::event::Event;
use otpgate_core::api::Verification;
use otpgate_core::error::AuthError;

use crate::common::{TaskCompleted, TaskKind, TaskStarted};

#[derive(Debug)]
pub enum UiEvent {
    /// Animation tick (spinner).
    Tick,
    /// Raw terminal input.
    Terminal(Event),

    TaskStarted {
        kind: TaskKind,
        started: TaskStarted,
    },
    /// Wraps a handler result; dropped unless the task is still the active one.
    TaskCompleted {
        kind: TaskKind,
        completed: TaskCompleted<Box<UiEvent>>,
    },

    OtpRequested {
        result: Result<(), AuthError>,
    },
    OtpResent {
        result: Result<(), AuthError>,
    },
    OtpVerified {
        result: Result<Verification, AuthError>,
    },

    /// Outcome of writing the session file.
    SessionSaved {
        result: Result<(), String>,
    },
    /// Outcome of removing the session file.
    SessionCleared {
        result: Result<(), String>,
    },
}
