use thiserror::Error;

/// Failures surfaced by the remote store and the local guards in front of it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Network(String),

    #[error("entry already exists: {0}")]
    Conflict(String),

    #[error("sign in required")]
    AuthRequired,

    #[error("unexpected store error: {0}")]
    Unknown(String),
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Network(_) => "network",
            StoreError::Conflict(_) => "conflict",
            StoreError::AuthRequired => "auth_required",
            StoreError::Unknown(_) => "unknown",
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            StoreError::Network(err.to_string())
        } else {
            StoreError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Unknown(format!("malformed response: {}", err))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("session file error: {0}")]
    SessionFile(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
