//! Error types for Notekeeper
//!
//! All errors use thiserror for structured error handling.
//! The web layer maps each variant to an HTTP status via `status_code`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// HTTP status code this error surfaces as
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::UnsupportedFormat(_) => 400,
            AppError::Auth(_) => 401,
            AppError::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// True when the underlying database error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
