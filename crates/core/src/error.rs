//! Unified error types for squall.

use tokio_rusqlite::rusqlite;

/// Unified error types for the squall gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty submission id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Outbox database operation failed.
    #[error("OUTBOX_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("OUTBOX_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network-level fetch failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Fetch response exceeded the configured size limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// A precache manifest entry could not be installed.
    #[error("PRECACHE_FAILED: {0}")]
    PrecacheFailed(String),

    /// Delivery to the submission endpoint failed.
    #[error("SUBMIT_FAILED: {0}")]
    SubmitFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SubmitFailed("endpoint unreachable".to_string());
        assert!(err.to_string().contains("SUBMIT_FAILED"));
        assert!(err.to_string().contains("endpoint unreachable"));
    }

    #[test]
    fn test_error_display_invalid_url() {
        let err = Error::InvalidUrl("not-a-url".to_string());
        assert!(err.to_string().starts_with("INVALID_URL"));
    }
}
