//! Auth feature reducer.
//!
//! Maps key presses on each screen to login flow actions.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use otpgate_core::flow::{FlowEffect, Pending, Screen};

use crate::auth::AuthState;

/// What the root reducer must do after a key press.
#[derive(Debug, PartialEq)]
pub enum AuthAction {
    /// Flow effects to translate into UI effects (possibly none).
    Flow(Vec<FlowEffect>),
    /// The in-flight request was abandoned; its task should be cancelled.
    Cancelled(Pending),
    Quit,
}

impl AuthAction {
    fn none() -> Self {
        AuthAction::Flow(Vec::new())
    }
}

pub fn handle_key(auth: &mut AuthState, key: KeyEvent) -> AuthAction {
    if key.kind != KeyEventKind::Press {
        return AuthAction::none();
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let flow = &mut auth.flow;

    if ctrl && key.code == KeyCode::Char('c') {
        return AuthAction::Quit;
    }
    if key.code == KeyCode::Esc {
        if let Some(pending) = flow.cancel_pending() {
            return AuthAction::Cancelled(pending);
        }
        if flow.screen() == Screen::Otp {
            flow.back();
            return AuthAction::none();
        }
        return AuthAction::Quit;
    }

    match flow.screen() {
        Screen::Entry => match key.code {
            KeyCode::Char(c) if !ctrl => {
                flow.push_mobile_char(c);
                AuthAction::none()
            }
            KeyCode::Backspace => {
                flow.pop_mobile_char();
                AuthAction::none()
            }
            KeyCode::Enter => AuthAction::Flow(flow.submit_mobile()),
            _ => AuthAction::none(),
        },
        Screen::Otp => match key.code {
            KeyCode::Char('r') if ctrl => AuthAction::Flow(flow.resend()),
            KeyCode::Char('n') if ctrl => {
                flow.change_number();
                AuthAction::none()
            }
            KeyCode::Char(c) if !ctrl => {
                flow.input_otp_char(c);
                AuthAction::none()
            }
            KeyCode::Backspace => {
                flow.otp_backspace();
                AuthAction::none()
            }
            KeyCode::Left => {
                flow.otp_focus_left();
                AuthAction::none()
            }
            KeyCode::Right => {
                flow.otp_focus_right();
                AuthAction::none()
            }
            KeyCode::Enter => AuthAction::Flow(flow.submit_otp()),
            _ => AuthAction::none(),
        },
        Screen::Authenticated => match key.code {
            KeyCode::Char('l') => AuthAction::Flow(flow.logout()),
            KeyCode::Char('q') if !ctrl => AuthAction::Quit,
            _ => AuthAction::none(),
        },
    }
}

#[cfg(test)]
mod tests {
    use otpgate_core::flow::LoginFlow;
    use otpgate_core::session::Session;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn auth(session: Option<Session>) -> AuthState {
        AuthState::new(LoginFlow::resume(session), "+91".to_string())
    }

    #[test]
    fn test_typing_and_enter_requests_otp() {
        let mut auth = auth(None);
        for c in "98765x43210".chars() {
            handle_key(&mut auth, key(KeyCode::Char(c)));
        }
        assert_eq!(auth.flow.mobile(), "9876543210");

        let action = handle_key(&mut auth, key(KeyCode::Enter));
        assert_eq!(
            action,
            AuthAction::Flow(vec![FlowEffect::RequestOtp {
                mobile: "9876543210".to_string()
            }])
        );
    }

    #[test]
    fn test_esc_cancels_pending_before_anything_else() {
        let mut auth = auth(None);
        auth.flow.set_mobile_input("9876543210");
        handle_key(&mut auth, key(KeyCode::Enter));

        assert_eq!(
            handle_key(&mut auth, key(KeyCode::Esc)),
            AuthAction::Cancelled(Pending::RequestOtp)
        );
        assert_eq!(handle_key(&mut auth, key(KeyCode::Esc)), AuthAction::Quit);
    }

    #[test]
    fn test_otp_screen_shortcuts() {
        let mut auth = auth(None);
        auth.flow.set_mobile_input("9876543210");
        auth.flow.submit_mobile();
        auth.flow.otp_requested(Ok(()));

        handle_key(&mut auth, key(KeyCode::Char('4')));
        handle_key(&mut auth, key(KeyCode::Left));
        handle_key(&mut auth, key(KeyCode::Char('7')));
        assert_eq!(auth.flow.otp().slots()[0], Some('7'));

        assert_eq!(
            handle_key(&mut auth, ctrl('r')),
            AuthAction::Flow(vec![FlowEffect::ResendOtp {
                mobile: "9876543210".to_string()
            }])
        );
        auth.flow.otp_resent(Ok(()));

        handle_key(&mut auth, key(KeyCode::Esc));
        assert_eq!(auth.flow.screen(), Screen::Entry);
        assert_eq!(auth.flow.mobile(), "9876543210");
    }

    #[test]
    fn test_ctrl_n_changes_number() {
        let mut auth = auth(None);
        auth.flow.set_mobile_input("9876543210");
        auth.flow.submit_mobile();
        auth.flow.otp_requested(Ok(()));

        handle_key(&mut auth, ctrl('n'));
        assert_eq!(auth.flow.screen(), Screen::Entry);
        assert_eq!(auth.flow.mobile(), "");
    }

    #[test]
    fn test_home_logout_and_quit() {
        let mut auth = auth(Some(Session::new("9876543210")));
        assert_eq!(handle_key(&mut auth, key(KeyCode::Char('q'))), AuthAction::Quit);
        assert_eq!(
            handle_key(&mut auth, ctrl('l')),
            AuthAction::Flow(vec![FlowEffect::ClearSession])
        );
        assert_eq!(auth.flow.screen(), Screen::Entry);
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let mut auth = auth(None);
        assert_eq!(handle_key(&mut auth, ctrl('c')), AuthAction::Quit);
    }
}
