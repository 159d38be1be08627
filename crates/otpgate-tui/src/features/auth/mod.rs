//! Login screens: mobile entry, OTP entry, and the logged-in home.

mod render;
mod update;

use otpgate_core::flow::LoginFlow;
use otpgate_core::validation::format_mobile;
pub(crate) use render::pending_label;
pub use render::render_auth;
pub use update::{AuthAction, handle_key};

pub struct AuthState {
    pub flow: LoginFlow,
    pub country_code: String,
}

impl AuthState {
    pub fn new(flow: LoginFlow, country_code: String) -> Self {
        Self { flow, country_code }
    }

    /// The current number as `+91 98765 43210`.
    pub fn display_mobile(&self) -> String {
        format_mobile(self.flow.mobile(), &self.country_code)
    }
}
