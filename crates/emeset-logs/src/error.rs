use thiserror::Error;

/// Errors raised while writing log records.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to write log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("the log subscriber dropped the record")]
    Dropped,
}
