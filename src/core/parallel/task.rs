//! Task definition for batch processing.
use async_trait::async_trait;
use std::fmt;

/// A unit of batch work (one whole merge job).
#[async_trait]
pub trait Task: Send + Sync {
    /// Run the task to completion.
    async fn execute(&self) -> TaskResult;
    /// Stable identifier for logs and summaries.
    fn task_id(&self) -> String;
    /// Short human description (usually the input file name).
    fn description(&self) -> String {
        self.task_id()
    }
}

/// Result of task execution; one summary line per input.
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Completed cleanly.
    Success(String),
    /// Completed, but with findings the user should read.
    Warning(String, Vec<String>),
    /// Failed with a reason.
    Failed(String),
    /// Never ran because the batch was cancelled.
    Cancelled,
}

impl TaskResult {
    /// Whether the input produced an output file.
    pub fn is_ok(&self) -> bool {
        matches!(self, TaskResult::Success(_) | TaskResult::Warning(..))
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskResult::Success(msg) => write!(f, "ok: {}", msg),
            TaskResult::Warning(msg, warnings) => {
                write!(f, "warning: {} ({})", msg, warnings.join("; "))
            }
            TaskResult::Failed(msg) => write!(f, "failed: {}", msg),
            TaskResult::Cancelled => write!(f, "cancelled"),
        }
    }
}
