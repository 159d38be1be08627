//! Login step sequencer: mobile entry, OTP entry, authenticated.
//!
//! `LoginFlow` owns the state and never does I/O. Actions return the side
//! effects the caller must run (HTTP calls, session writes), and the caller
//! feeds results back through the `otp_*` methods.

use crate::api::Verification;
use crate::error::AuthError;
use crate::otp::OtpBuffer;
use crate::session::Session;
use crate::validation::{self, MOBILE_LENGTH, ValidationError};

pub const OTP_SENT_NOTICE: &str = "OTP sent successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Entry,
    Otp,
    Authenticated,
}

/// The single request that may be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    RequestOtp,
    ResendOtp,
    VerifyOtp,
}

/// Work the caller must perform on behalf of the flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEffect {
    RequestOtp { mobile: String },
    ResendOtp { mobile: String },
    VerifyOtp { mobile: String, otp: String },
    PersistSession(Session),
    ClearSession,
}

#[derive(Debug, Clone)]
pub struct LoginFlow {
    screen: Screen,
    mobile: String,
    otp: OtpBuffer,
    error: Option<String>,
    notice: Option<String>,
    pending: Option<Pending>,
    session: Option<Session>,
    allowed_mobiles: Vec<String>,
}

impl LoginFlow {
    /// Starts on `Authenticated` when a stored session exists, else on `Entry`.
    pub fn resume(session: Option<Session>) -> Self {
        let (screen, mobile) = match &session {
            Some(s) => (Screen::Authenticated, s.mobile.clone()),
            None => (Screen::Entry, String::new()),
        };
        Self {
            screen,
            mobile,
            otp: OtpBuffer::new(),
            error: None,
            notice: None,
            pending: None,
            session,
            allowed_mobiles: Vec::new(),
        }
    }

    /// Restricts login to registered numbers. An empty list allows any number.
    #[must_use]
    pub fn with_allowed_mobiles(mut self, allowed: Vec<String>) -> Self {
        self.allowed_mobiles = allowed
            .iter()
            .map(|m| validation::sanitize_mobile_input(m))
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    pub fn otp(&self) -> &OtpBuffer {
        &self.otp
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Shows an error that didn't come from a request (e.g. a failed save).
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.notice = None;
    }

    // ------------------------------------------------------------------
    // Input editing
    // ------------------------------------------------------------------

    fn can_edit(&self, screen: Screen) -> bool {
        self.screen == screen && self.pending.is_none()
    }

    pub fn push_mobile_char(&mut self, c: char) {
        if !self.can_edit(Screen::Entry) || !c.is_ascii_digit() {
            return;
        }
        if self.mobile.len() < MOBILE_LENGTH {
            self.mobile.push(c);
            self.error = None;
        }
    }

    pub fn pop_mobile_char(&mut self) {
        if self.can_edit(Screen::Entry) && self.mobile.pop().is_some() {
            self.error = None;
        }
    }

    /// Replaces the mobile input, keeping only digits (max 10).
    pub fn set_mobile_input(&mut self, raw: &str) {
        if self.can_edit(Screen::Entry) {
            self.mobile = validation::sanitize_mobile_input(raw);
            self.error = None;
        }
    }

    pub fn input_otp_char(&mut self, c: char) {
        if self.can_edit(Screen::Otp) && self.otp.input_char(c) {
            self.error = None;
            self.notice = None;
        }
    }

    pub fn otp_backspace(&mut self) {
        if self.can_edit(Screen::Otp) {
            self.otp.backspace();
            self.error = None;
        }
    }

    pub fn otp_focus_left(&mut self) {
        if self.screen == Screen::Otp {
            self.otp.focus_left();
        }
    }

    pub fn otp_focus_right(&mut self) {
        if self.screen == Screen::Otp {
            self.otp.focus_right();
        }
    }

    /// Pastes text into whichever input the current screen shows.
    pub fn paste(&mut self, text: &str) {
        match self.screen {
            Screen::Entry => self.set_mobile_input(text),
            Screen::Otp => {
                if self.can_edit(Screen::Otp) && self.otp.fill(text) > 0 {
                    self.error = None;
                    self.notice = None;
                }
            }
            Screen::Authenticated => {}
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Validates the number and asks for an OTP.
    pub fn submit_mobile(&mut self) -> Vec<FlowEffect> {
        if !self.can_edit(Screen::Entry) {
            return Vec::new();
        }
        if let Err(err) = self.check_mobile() {
            self.error = Some(err.to_string());
            return Vec::new();
        }
        self.error = None;
        self.notice = None;
        self.pending = Some(Pending::RequestOtp);
        vec![FlowEffect::RequestOtp {
            mobile: self.mobile.clone(),
        }]
    }

    fn check_mobile(&self) -> Result<(), ValidationError> {
        validation::validate_mobile(&self.mobile)?;
        if !self.allowed_mobiles.is_empty() && !self.allowed_mobiles.contains(&self.mobile) {
            return Err(ValidationError::MobileNotRegistered);
        }
        Ok(())
    }

    /// Result of the request started by [`LoginFlow::submit_mobile`].
    pub fn otp_requested(&mut self, result: Result<(), AuthError>) -> Vec<FlowEffect> {
        if !self.take_pending(Pending::RequestOtp) {
            return Vec::new();
        }
        match result {
            Ok(()) => {
                self.screen = Screen::Otp;
                self.otp.clear();
                self.error = None;
            }
            Err(err) => self.error = Some(err.message),
        }
        Vec::new()
    }

    /// Verifies the entered code. Requires all four digits.
    pub fn submit_otp(&mut self) -> Vec<FlowEffect> {
        if !self.can_edit(Screen::Otp) {
            return Vec::new();
        }
        let Some(code) = self.otp.code() else {
            self.error = Some(ValidationError::OtpIncomplete.to_string());
            return Vec::new();
        };
        if let Err(err) = validation::validate_otp(&code) {
            self.error = Some(err.to_string());
            return Vec::new();
        }
        self.error = None;
        self.notice = None;
        self.pending = Some(Pending::VerifyOtp);
        vec![FlowEffect::VerifyOtp {
            mobile: self.mobile.clone(),
            otp: code,
        }]
    }

    /// Result of the request started by [`LoginFlow::submit_otp`].
    pub fn otp_verified(&mut self, result: Result<Verification, AuthError>) -> Vec<FlowEffect> {
        if !self.take_pending(Pending::VerifyOtp) {
            return Vec::new();
        }
        match result {
            Ok(verification) => {
                let session = Session::new(self.mobile.clone())
                    .with_token(verification.token)
                    .with_user(verification.user);
                self.session = Some(session.clone());
                self.screen = Screen::Authenticated;
                self.otp.clear();
                self.error = None;
                vec![FlowEffect::PersistSession(session)]
            }
            Err(err) => {
                self.error = Some(err.message);
                Vec::new()
            }
        }
    }

    /// Sends another OTP to the same number.
    pub fn resend(&mut self) -> Vec<FlowEffect> {
        if !self.can_edit(Screen::Otp) {
            return Vec::new();
        }
        self.error = None;
        self.notice = None;
        self.pending = Some(Pending::ResendOtp);
        vec![FlowEffect::ResendOtp {
            mobile: self.mobile.clone(),
        }]
    }

    /// Result of the request started by [`LoginFlow::resend`].
    pub fn otp_resent(&mut self, result: Result<(), AuthError>) -> Vec<FlowEffect> {
        if !self.take_pending(Pending::ResendOtp) {
            return Vec::new();
        }
        match result {
            Ok(()) => {
                self.otp.clear();
                self.error = None;
                self.notice = Some(OTP_SENT_NOTICE.to_string());
            }
            Err(err) => self.error = Some(err.message),
        }
        Vec::new()
    }

    /// Returns to the entry screen with an empty number.
    pub fn change_number(&mut self) {
        if self.can_edit(Screen::Otp) {
            self.back();
            self.mobile.clear();
        }
    }

    /// Returns to the entry screen, keeping the number for editing.
    pub fn back(&mut self) {
        if self.screen != Screen::Otp {
            return;
        }
        self.screen = Screen::Entry;
        self.pending = None;
        self.otp.clear();
        self.error = None;
        self.notice = None;
    }

    /// Forgets the session and returns to the entry screen.
    pub fn logout(&mut self) -> Vec<FlowEffect> {
        *self = Self {
            allowed_mobiles: std::mem::take(&mut self.allowed_mobiles),
            ..Self::resume(None)
        };
        vec![FlowEffect::ClearSession]
    }

    /// Drops the outstanding request. Its result will be ignored.
    pub fn cancel_pending(&mut self) -> Option<Pending> {
        self.pending.take()
    }

    fn take_pending(&mut self, expected: Pending) -> bool {
        if self.pending == Some(expected) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}
