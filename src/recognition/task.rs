use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a server-side recognition task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    New,
    Running,
    Done,
    Error,
    #[serde(alias = "CANCELED")]
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "NEW",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Done => "DONE",
            TaskStatus::Error => "ERROR",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    /// DONE, ERROR and CANCELLED never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Done | TaskStatus::Error | TaskStatus::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a task as reported by `speech:async_recognize` or `task:get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionTask {
    pub id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Present once the task is DONE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_file_id: Option<String>,
    #[serde(
        default,
        alias = "error",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
}

impl RecognitionTask {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Service-supplied failure text, or a generic one.
    pub fn failure_message(&self) -> String {
        self.error_message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Task finished with status {}", self.status))
    }
}
