use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SprinklerError {
    #[error("no valid private keys found in {}", .0.display())]
    NoKeys(PathBuf),

    #[error("no recipient addresses found in {}", .0.display())]
    NoRecipients(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SprinklerError>;
