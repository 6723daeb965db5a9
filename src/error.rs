//! Error types for the beacon client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RecorderError>;
