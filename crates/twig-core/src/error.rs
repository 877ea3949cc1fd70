//! Error types for twig

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Todo not found: {0}")]
    NotFound(String),

    #[error("Invalid filter: {0} (expected all, pending or completed)")]
    InvalidFilter(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
