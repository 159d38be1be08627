//! Pure view functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui Frame, and never mutate
//! state or return effects.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::auth;
use crate::state::AppState;

/// Height of the status line at the bottom of the screen.
const STATUS_HEIGHT: u16 = 1;

/// Spinner frames for pending requests.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

pub fn spinner(frame_index: usize) -> &'static str {
    SPINNER_FRAMES[frame_index % SPINNER_FRAMES.len()]
}

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)])
        .split(frame.area());

    let spinner = spinner(app.spinner_frame);
    auth::render_auth(frame, &app.auth, spinner, chunks[0]);
    frame.render_widget(Paragraph::new(status_line(app, spinner)), chunks[1]);
}

fn status_line(app: &AppState, spinner: &str) -> Line<'static> {
    let mut spans = vec![Span::styled(" otpgate", Style::default().fg(Color::Cyan))];
    if let Some(pending) = app.auth.flow.pending() {
        spans.push(Span::styled(
            format!("  {spinner} {}", auth::pending_label(pending)),
            Style::default().fg(Color::Yellow),
        ));
    } else if let Some(session) = app.auth.flow.session() {
        let token = if session.has_token() {
            "token stored"
        } else {
            "no token"
        };
        spans.push(Span::styled(
            format!("  session: {token}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        "  Ctrl+C quit",
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}
