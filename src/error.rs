use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("multi-agent orchestration is disabled")]
    Disabled,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No active plan for session: {0}")]
    NoActivePlan(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid task transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Model call failed: {0}")]
    Model(String),

    #[error("Model call timed out after {0:?}")]
    ModelTimeout(std::time::Duration),

    #[error("Tool execution failed: {0}")]
    Tool(String),

    /// Returned by collaborator implementations whose in-flight call was
    /// aborted by cancellation.
    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
