//! Application state.
//!
//! ```text
//! AppState
//! ├── auth: AuthState     (login flow + display settings)
//! ├── task_seq: TaskSeq   (async task id generator)
//! ├── tasks: Tasks        (task lifecycle state)
//! ├── spinner_frame       (animation counter)
//! └── should_quit
//! ```

use otpgate_core::config::Config;
use otpgate_core::flow::LoginFlow;
use otpgate_core::session::Session;

use crate::auth::AuthState;
use crate::common::{TaskSeq, Tasks};

pub struct AppState {
    pub auth: AuthState,
    pub task_seq: TaskSeq,
    pub tasks: Tasks,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    /// Builds state from config, resuming `session` if one was stored.
    pub fn new(config: &Config, session: Option<Session>) -> Self {
        let flow = LoginFlow::resume(session).with_allowed_mobiles(config.allowed_mobiles.clone());
        Self {
            auth: AuthState::new(flow, config.country_code.clone()),
            task_seq: TaskSeq::default(),
            tasks: Tasks::default(),
            spinner_frame: 0,
            should_quit: false,
        }
    }
}
