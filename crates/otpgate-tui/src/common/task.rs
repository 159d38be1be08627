use otpgate_core::flow::Pending;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    OtpRequest,
    OtpResend,
    OtpVerify,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [
        TaskKind::OtpRequest,
        TaskKind::OtpResend,
        TaskKind::OtpVerify,
    ];
}

impl From<Pending> for TaskKind {
    fn from(pending: Pending) -> Self {
        match pending {
            Pending::RequestOtp => TaskKind::OtpRequest,
            Pending::ResendOtp => TaskKind::OtpResend,
            Pending::VerifyOtp => TaskKind::OtpVerify,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskStarted {
    pub id: TaskId,
    pub cancel: Option<CancellationToken>,
}

#[derive(Debug)]
pub struct TaskCompleted<E> {
    pub id: TaskId,
    pub result: E,
}

/// Task lifecycle state (mutated only by the reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
    pub cancel: Option<CancellationToken>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Marks `id` as the active task when the reducer emits its effect.
    pub fn begin(&mut self, id: TaskId) {
        self.active = Some(id);
        self.cancel = None;
    }

    /// Attaches the cancel token, unless the task was dropped in the meantime.
    pub fn on_started(&mut self, started: &TaskStarted) {
        if self.active == Some(started.id) {
            self.cancel = started.cancel.clone();
        }
    }

    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.clear();
        }
        ok
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.cancel = None;
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    pub otp_request: TaskState,
    pub otp_resend: TaskState,
    pub otp_verify: TaskState,
}

impl Tasks {
    pub fn state(&self, kind: TaskKind) -> &TaskState {
        match kind {
            TaskKind::OtpRequest => &self.otp_request,
            TaskKind::OtpResend => &self.otp_resend,
            TaskKind::OtpVerify => &self.otp_verify,
        }
    }

    pub fn state_mut(&mut self, kind: TaskKind) -> &mut TaskState {
        match kind {
            TaskKind::OtpRequest => &mut self.otp_request,
            TaskKind::OtpResend => &mut self.otp_resend,
            TaskKind::OtpVerify => &mut self.otp_verify,
        }
    }

    pub fn is_any_running(&self) -> bool {
        TaskKind::ALL
            .into_iter()
            .any(|kind| self.state(kind).is_running())
    }
}
