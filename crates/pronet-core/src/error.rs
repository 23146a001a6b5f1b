use thiserror::Error;

/// One variant per refusal the core can hand back — callers always learn the
/// specific reason, never a generic failure.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("a connection between these users is already pending or accepted")]
    DuplicateRequest,
    #[error("connection capacity reached and target is out of reach")]
    CapacityExceeded,
    #[error("not found")]
    NotFound,
    #[error("caller has no rights over this record")]
    Forbidden,
    #[error("message body exceeds the 500 character limit")]
    MessageTooLong,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("data store unavailable: {0}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
