use std::io;

use axum::http::StatusCode;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of account, session and file operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Password mismatch")]
    PasswordMismatch,

    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("File '{0}' does not exist")]
    FileNotFound(String),

    #[error("File '{0}' already exists")]
    FileAlreadyExists(String),

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("Metadata store failure: {0}")]
    Store(BoxError),

    #[error("Password hashing failure: {0}")]
    Hasher(String),

    #[error("Unable to generate unique {0}")]
    Exhausted(&'static str),
}

impl ServiceError {
    pub fn store<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(e))
    }

    /// Status code the HTTP boundary replies with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UserNotFound(_)
            | Self::PasswordMismatch
            | Self::UserAlreadyExists(_)
            | Self::FileNotFound(_)
            | Self::FileAlreadyExists(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) | Self::Store(_) | Self::Hasher(_) | Self::Exhausted(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
