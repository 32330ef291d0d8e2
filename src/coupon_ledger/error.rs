use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Coupon already exists: {0}")]
    AlreadyExists(String),

    #[error("Coupon not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Coarse classification of a [`LedgerError`], used by callers that map
/// failures onto a transport (HTTP status, exit code) without caring about
/// the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    AlreadyExists,
    NotFound,
    /// I/O or (de)serialization failure on the persisted form.
    StorageFailure,
    Config,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Io(_) | LedgerError::Serialization(_) => ErrorKind::StorageFailure,
            LedgerError::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
