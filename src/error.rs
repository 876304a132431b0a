/// Pipeline-level errors
///
/// Only `Synchronization` and `Submission` are surfaced to the invoking
/// scheduler as run failures. Everything else is either recovered where it
/// occurs (per-column schema issues, transient poll failures) or reported as
/// a non-failure outcome (`MissingJobHandle`, `Cancelled`).
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema evolution error: {0}")]
    SchemaEvolution(String),

    #[error("Synchronization failed: {0}")]
    Synchronization(String),

    #[error("Training submission failed: {0}")]
    Submission(String),

    #[error("No training job handle on record")]
    MissingJobHandle,

    #[error("Cancelled while polling")]
    Cancelled,
}

impl TaskError {
    /// Whether this error should fail the whole run when reported to the
    /// invoking scheduler.
    pub fn is_run_failure(&self) -> bool {
        matches!(
            self,
            TaskError::Synchronization(_)
                | TaskError::Submission(_)
                | TaskError::Database(_)
                | TaskError::Io(_)
        )
    }
}

pub type TaskResult<T> = Result<T, TaskError>;
