//! Effect handlers for the TUI runtime.
//!
//! Handlers perform I/O and return a `UiEvent` describing the outcome. They
//! never mutate state; the runtime spawns them and routes results to the inbox.

pub mod auth;

pub use auth::*;
