//! Prodibot error types.

use thiserror::Error;

/// Errors surfaced by Prodibot crates.
#[derive(Error, Debug)]
pub enum ProdibotError {
    /// Message text was empty or whitespace-only after trimming.
    #[error("message is empty")]
    EmptyInput,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Feedback rating outside the accepted 1–5 range.
    #[error("invalid rating {0}, expected 1..=5")]
    InvalidRating(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProdibotError {
    /// Whether this error is the caller's fault (maps to a 4xx response).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::NotFound(_) | Self::InvalidRating(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProdibotError>;
