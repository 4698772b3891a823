//! Store error taxonomy.
//!
//! Every failure surfaced to the orchestration layer carries one
//! [`ErrorKind`]. Backing-store failures are classified structurally from
//! the driver error (unique / foreign-key violation codes), never by
//! matching on message text.

use std::time::Duration;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Coarse error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing id, foreign ownership, or disallowed state (deliberately conflated).
    NotFound,
    /// Concurrent double-completion or a uniqueness violation.
    Conflict,
    /// Malformed or logically invalid request value.
    InvalidInput,
    /// Requester does not own the referenced resource.
    Forbidden,
    /// Backing-store failure or cross-entity integrity violation.
    Internal,
}

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} not found: {key}")]
    NotFoundBy { entity: &'static str, key: String },

    #[error("Recharge transaction {transaction_id} is not pending for user {user_id}")]
    RechargeNotPending { transaction_id: i64, user_id: i64 },

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Operation exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Shorthand for an `InvalidInput` error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidInput(msg.into())
    }

    /// Classify this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } | StoreError::NotFoundBy { .. } => ErrorKind::NotFound,
            StoreError::RechargeNotPending { .. } | StoreError::UniqueViolation(_) => {
                ErrorKind::Conflict
            }
            StoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            StoreError::Forbidden(_) => ErrorKind::Forbidden,
            StoreError::Integrity(_)
            | StoreError::DeadlineExceeded(_)
            | StoreError::Database(_)
            | StoreError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::InvalidInput(format!(
                    "referenced record does not exist: {}",
                    db_err.message()
                ));
            }
        }
        StoreError::Database(err)
    }
}
