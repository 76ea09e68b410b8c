use cadence_core::error::CoreError;
use cadence_db::error::DbError;
use thiserror::Error;

/// Service layer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The request is well-formed but not allowed in the current state.
    #[error("Domain rule violated: {0}")]
    DomainRule(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

/// Stable classification of a [`ServiceError`] for caller-facing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    DomainRule,
    Persistence,
    Cancelled,
}

impl ServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DomainRule(_) => ErrorKind::DomainRule,
            Self::DatabaseError(_) | Self::InvariantViolation(_) => ErrorKind::Persistence,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) | CoreError::ConfigError(msg) => {
                Self::ValidationError(msg)
            }
            CoreError::NotFound(msg) => Self::NotFound(msg),
            CoreError::InvariantViolation(msg) => Self::InvariantViolation(msg),
            CoreError::Cancelled => Self::Cancelled,
            CoreError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
