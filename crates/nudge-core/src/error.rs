//! Unified error types for nudge.

use thiserror::Error;

/// Result type alias using NudgeError.
pub type Result<T> = std::result::Result<T, NudgeError>;

#[derive(Error, Debug)]
pub enum NudgeError {
    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bot token not configured")]
    TokenMissing,

    // Delivery errors
    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl NudgeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
