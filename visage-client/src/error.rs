//! Error taxonomy shared by the gateway and every coordinator operation.

/// Result alias used throughout the orchestration core.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure categories surfaced by gateway calls and coordinator operations.
///
/// None of these are fatal to the caller; each one is also converted into a
/// dismissible [`Notice`](crate::notice::Notice) at the coordinator boundary.
/// Local state is never left partially mutated when one of these is returned
/// (batch download excepted, which is per-item best-effort by design).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A precondition was unmet locally; no network call was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Transport-level failure: connection refused, timeout, malformed body.
    #[error("network error: {0}")]
    Network(String),

    /// The entity vanished server-side since the last fetch.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server accepted the request but failed to act on it.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A local filesystem operation failed after the transfer itself
    /// succeeded, e.g. writing a downloaded file to its destination.
    #[error("local io error: {0}")]
    Io(String),

    /// The forwarded credential was rejected. The coordinator hands this to
    /// the caller-supplied handler instead of performing any navigation.
    #[error("authorization expired")]
    AuthExpired,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Io(_) => ErrorKind::Io,
            ApiError::AuthExpired => ErrorKind::AuthExpired,
        }
    }
}

/// Discriminant of [`ApiError`], used in per-item batch outcomes and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Network,
    NotFound,
    Server,
    Io,
    AuthExpired,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}
