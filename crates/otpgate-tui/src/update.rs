//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::Event;
use otpgate_core::flow::FlowEffect;

use crate::auth::{self, AuthAction};
use crate::common::{TaskId, TaskKind};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            if app.auth.flow.is_pending() {
                app.spinner_frame = app.spinner_frame.wrapping_add(1);
            }
            vec![]
        }
        UiEvent::Terminal(Event::Key(key)) => {
            let action = auth::handle_key(&mut app.auth, key);
            apply_auth_action(app, action)
        }
        UiEvent::Terminal(Event::Paste(text)) => {
            app.auth.flow.paste(&text);
            vec![]
        }
        UiEvent::Terminal(_) => vec![],
        UiEvent::TaskStarted { kind, started } => {
            app.tasks.state_mut(kind).on_started(&started);
            vec![]
        }
        UiEvent::TaskCompleted { kind, completed } => {
            if app.tasks.state_mut(kind).finish_if_active(completed.id) {
                update(app, *completed.result)
            } else {
                tracing::debug!(?kind, "dropping result of inactive task");
                vec![]
            }
        }
        UiEvent::OtpRequested { result } => {
            let effects = app.auth.flow.otp_requested(result);
            flow_effects(app, effects)
        }
        UiEvent::OtpResent { result } => {
            let effects = app.auth.flow.otp_resent(result);
            flow_effects(app, effects)
        }
        UiEvent::OtpVerified { result } => {
            let effects = app.auth.flow.otp_verified(result);
            flow_effects(app, effects)
        }
        UiEvent::SessionSaved { result } => {
            if let Err(err) = result {
                app.auth
                    .flow
                    .set_error(format!("Logged in, but the session was not saved: {err}"));
            }
            vec![]
        }
        UiEvent::SessionCleared { result } => {
            if let Err(err) = result {
                app.auth
                    .flow
                    .set_error(format!("Could not remove the saved session: {err}"));
            }
            vec![]
        }
    }
}

fn apply_auth_action(app: &mut AppState, action: AuthAction) -> Vec<UiEffect> {
    match action {
        AuthAction::Flow(effects) => flow_effects(app, effects),
        AuthAction::Cancelled(pending) => {
            let kind = TaskKind::from(pending);
            let state = app.tasks.state_mut(kind);
            let token = state.cancel.take();
            state.clear();
            vec![UiEffect::CancelTask { kind, token }]
        }
        AuthAction::Quit => {
            let mut effects: Vec<UiEffect> = TaskKind::ALL
                .into_iter()
                .filter_map(|kind| {
                    let state = app.tasks.state_mut(kind);
                    let token = state.cancel.take()?;
                    state.clear();
                    Some(UiEffect::CancelTask {
                        kind,
                        token: Some(token),
                    })
                })
                .collect();
            effects.push(UiEffect::Quit);
            effects
        }
    }
}

/// Translates flow effects into runtime effects, registering a task for each
/// request so late results can be matched or dropped.
fn flow_effects(app: &mut AppState, effects: Vec<FlowEffect>) -> Vec<UiEffect> {
    effects
        .into_iter()
        .map(|effect| match effect {
            FlowEffect::RequestOtp { mobile } => UiEffect::RequestOtp {
                task: begin_task(app, TaskKind::OtpRequest),
                mobile,
            },
            FlowEffect::ResendOtp { mobile } => UiEffect::ResendOtp {
                task: begin_task(app, TaskKind::OtpResend),
                mobile,
            },
            FlowEffect::VerifyOtp { mobile, otp } => UiEffect::VerifyOtp {
                task: begin_task(app, TaskKind::OtpVerify),
                mobile,
                otp,
            },
            FlowEffect::PersistSession(session) => UiEffect::PersistSession { session },
            FlowEffect::ClearSession => UiEffect::ClearSession,
        })
        .collect()
}

fn begin_task(app: &mut AppState, kind: TaskKind) -> TaskId {
    let id = app.task_seq.next_id();
    app.tasks.state_mut(kind).begin(id);
    id
}
