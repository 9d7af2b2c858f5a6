//! Error types for sarana-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Complaint not found: {0}")]
    NotFound(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Transition failed: {0}")]
    Transition(String),

    #[error("Transition left complaint {id} inconsistent: {detail}")]
    InconsistentTransition { id: String, detail: String },

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
