//! Shared building blocks: task lifecycle tracking and card rendering helpers.

pub mod render_utils;
mod task;

pub use task::{TaskCompleted, TaskId, TaskKind, TaskSeq, TaskStarted, TaskState, Tasks};
