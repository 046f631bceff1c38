//! Error types used throughout the traffic generator

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for LoadLab
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LoadLabError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Dependency error: {0}")]
    Dependency(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for LoadLab operations
pub type Result<T> = std::result::Result<T, LoadLabError>;
