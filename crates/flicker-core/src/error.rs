pub type FlickerResult<T> = Result<T, FlickerError>;

/// Faults the engine can observe at its boundaries.
///
/// None of these are fatal: callers log them and fall back to defaults.
#[derive(thiserror::Error, Debug)]
pub enum FlickerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("message error: {0}")]
    Message(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FlickerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}
