//! Auth feature view.
//!
//! One centered card per screen.

use otpgate_core::flow::{Pending, Screen};
use otpgate_core::otp::OTP_LENGTH;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::auth::AuthState;
use crate::common::render_utils::{InputHint, centered_area, render_card, render_hints};

const CARD_WIDTH: u16 = 60;
const CARD_HEIGHT: u16 = 14;
const ACCENT: Color = Color::Cyan;

/// Renders the card for the current screen.
pub fn render_auth(frame: &mut Frame, auth: &AuthState, spinner: &str, area: Rect) {
    let card = centered_area(area, CARD_WIDTH, CARD_HEIGHT);
    let (title, lines, hints) = match auth.flow.screen() {
        Screen::Entry => ("Get Started", entry_lines(auth, spinner), ENTRY_HINTS),
        Screen::Otp => ("Verify OTP", otp_lines(auth, spinner), OTP_HINTS),
        Screen::Authenticated => ("Welcome", home_lines(auth), HOME_HINTS),
    };

    let inner = render_card(frame, card, title, ACCENT);
    let body = Rect::new(
        inner.x,
        inner.y,
        inner.width,
        inner.height.saturating_sub(1),
    );
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false }),
        body,
    );

    let hints: Vec<InputHint> = hints
        .iter()
        .map(|&(key, action)| InputHint::new(key, action))
        .collect();
    render_hints(frame, inner, &hints, ACCENT);
}

const ENTRY_HINTS: &[(&str, &str)] = &[("Enter", "request OTP"), ("Esc", "quit")];
const OTP_HINTS: &[(&str, &str)] = &[
    ("Enter", "verify"),
    ("Ctrl+R", "resend"),
    ("Ctrl+N", "change number"),
    ("Esc", "back"),
];
const HOME_HINTS: &[(&str, &str)] = &[("Ctrl+L", "logout"), ("q", "quit")];

pub(crate) fn pending_label(pending: Pending) -> &'static str {
    match pending {
        Pending::RequestOtp => "Sending OTP...",
        Pending::ResendOtp => "Resending OTP...",
        Pending::VerifyOtp => "Verifying...",
    }
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn message_line(auth: &AuthState) -> Line<'static> {
    if let Some(error) = auth.flow.error() {
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red)))
    } else if let Some(notice) = auth.flow.notice() {
        Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from("")
    }
}

fn button_line(auth: &AuthState, label: &str, spinner: &str) -> Line<'static> {
    match auth.flow.pending() {
        Some(pending) => Line::from(Span::styled(
            format!("{spinner} {}", pending_label(pending)),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            format!("[ {label} ]"),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
    }
}

pub(crate) fn entry_lines(auth: &AuthState, spinner: &str) -> Vec<Line<'static>> {
    let mobile = auth.flow.mobile();
    let input = if mobile.is_empty() {
        vec![
            Span::styled("█", Style::default().fg(ACCENT)),
            Span::styled("10-digit mobile number", dim()),
        ]
    } else {
        vec![
            Span::raw(mobile.to_string()),
            Span::styled("█", Style::default().fg(ACCENT)),
        ]
    };
    let mut input_line = vec![
        Span::styled(
            format!("{} ", auth.country_code),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", dim()),
    ];
    input_line.extend(input);

    vec![
        Line::from(Span::styled("Enter your mobile number to continue", dim())),
        Line::from(""),
        Line::from(input_line),
        Line::from(""),
        message_line(auth),
        Line::from(""),
        button_line(auth, "Request OTP", spinner),
    ]
}

pub(crate) fn otp_lines(auth: &AuthState, spinner: &str) -> Vec<Line<'static>> {
    let otp = auth.flow.otp();
    let mut boxes = Vec::with_capacity(OTP_LENGTH * 2);
    for (index, slot) in otp.slots().iter().enumerate() {
        if index > 0 {
            boxes.push(Span::raw("  "));
        }
        let digit = slot.unwrap_or('_');
        let style = if index == otp.focus() && auth.flow.pending().is_none() {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else if slot.is_some() {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            dim()
        };
        boxes.push(Span::styled(format!("[ {digit} ]"), style));
    }

    vec![
        Line::from(Span::styled(
            format!("Enter the 4-digit code sent to {}", auth.display_mobile()),
            dim(),
        )),
        Line::from(""),
        Line::from(boxes),
        Line::from(""),
        message_line(auth),
        Line::from(""),
        button_line(auth, "Verify OTP", spinner),
    ]
}

pub(crate) fn home_lines(auth: &AuthState) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "✓ Verified",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("You are logged in with {}", auth.display_mobile())),
    ];
    if let Some(name) = auth.flow.session().and_then(|s| s.display_name()) {
        lines.push(Line::from(Span::styled(format!("Hello, {name}"), dim())));
    }
    lines.push(Line::from(""));
    lines.push(message_line(auth));
    lines
}

#[cfg(test)]
mod tests {
    use otpgate_core::error::AuthError;
    use otpgate_core::flow::LoginFlow;
    use otpgate_core::session::Session;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn auth(session: Option<Session>) -> AuthState {
        AuthState::new(LoginFlow::resume(session), "+91".to_string())
    }

    #[test]
    fn test_entry_shows_placeholder_then_input() {
        let mut auth = auth(None);
        assert!(text(&entry_lines(&auth, "◐")).contains("10-digit mobile number"));

        auth.flow.set_mobile_input("98765");
        let rendered = text(&entry_lines(&auth, "◐"));
        assert!(rendered.contains("+91 │ 98765█"));
        assert!(rendered.contains("[ Request OTP ]"));
    }

    #[test]
    fn test_entry_pending_shows_spinner_label() {
        let mut auth = auth(None);
        auth.flow.set_mobile_input("9876543210");
        auth.flow.submit_mobile();
        let rendered = text(&entry_lines(&auth, "◓"));
        assert!(rendered.contains("◓ Sending OTP..."));
        assert!(!rendered.contains("Request OTP"));
    }

    #[test]
    fn test_otp_lines_show_number_boxes_and_error() {
        let mut auth = auth(None);
        auth.flow.set_mobile_input("9876543210");
        auth.flow.submit_mobile();
        auth.flow.otp_requested(Ok(()));
        auth.flow.input_otp_char('1');
        auth.flow.input_otp_char('2');
        auth.flow.submit_otp();

        let rendered = text(&otp_lines(&auth, "◐"));
        assert!(rendered.contains("sent to +91 98765 43210"));
        assert!(rendered.contains("[ 1 ]  [ 2 ]  [ _ ]  [ _ ]"));
        assert!(rendered.contains("Please enter all 4 digits of OTP"));
    }

    #[test]
    fn test_home_shows_number_and_name() {
        let user = serde_json::json!({"name": "Asha"});
        let session = Session::new("9876543210").with_user(user.as_object().cloned());
        let rendered = text(&home_lines(&auth(Some(session))));
        assert!(rendered.contains("You are logged in with +91 98765 43210"));
        assert!(rendered.contains("Hello, Asha"));
    }

    #[test]
    fn test_render_auth_draws_card_title_and_hints() {
        let mut auth = auth(None);
        auth.flow.set_mobile_input("9876543210");
        auth.flow.submit_mobile();
        auth.flow
            .otp_requested(Err(AuthError::validation("Number not registered")));

        let mut terminal = Terminal::new(TestBackend::new(70, 20)).unwrap();
        terminal
            .draw(|frame| render_auth(frame, &auth, "◐", frame.area()))
            .unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("Get Started"));
        assert!(screen.contains("Number not registered"));
        assert!(screen.contains("Enter request OTP"));
    }
}
