//! Core library for otpgate: mobile-number OTP login.
//!
//! Everything here is UI-agnostic. The terminal UI and the CLI both drive
//! [`flow::LoginFlow`] and execute the effects it returns.

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod logging;
pub mod otp;
pub mod session;
pub mod validation;
