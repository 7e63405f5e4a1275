use thiserror::Error;

use crate::bridge::BridgeError;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// The backend answered with `success: false`.
    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("instance lock error: {0}")]
    InstanceLock(String),
}

impl ShellError {
    /// Message suitable for an inline failure indicator.
    pub fn user_message(&self) -> String {
        match self {
            ShellError::Backend(message) | ShellError::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
