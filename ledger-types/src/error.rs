//! Error types for the invoice ledger.
//!
//! Every error carries an [`ErrorKind`]; the HTTP adapter and the settlement
//! retry loop switch on it instead of on message text.

use crate::domain::{InvoiceId, InvoiceStatus, Money, UserId};

/// Coarse classification shared by all error layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or business-rule-violating input. Client fault, never retried.
    Validation,
    /// Connectivity loss, timeout or serialization conflict. Retryable.
    Transient,
    /// Any other server-side failure.
    Internal,
    /// Unrecoverable startup failure.
    Fatal,
}

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("bad {field} {value}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("user {0} does not exist")]
    UserNotFound(UserId),

    #[error("unusable invoice {invoice_id} for amount {amount}")]
    UnusableInvoice { invoice_id: InvoiceId, amount: Money },

    #[error("invoice cannot move from {from} to {to}")]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    #[error("amount mismatch: expected {expected}, got {got}")]
    AmountMismatch { expected: Money, got: Money },

    #[error("integrity check failed: {0}")]
    Integrity(String),
}

impl DomainError {
    /// Shorthand for a field-level validation failure.
    pub fn invalid(
        field: &'static str,
        value: impl std::fmt::Display,
        reason: &'static str,
    ) -> Self {
        DomainError::InvalidField {
            field,
            value: value.to_string(),
            reason,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Transient storage error: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::Domain(e) => e.kind(),
            RepoError::Transient(_) => ErrorKind::Transient,
            RepoError::Database(_) | RepoError::Transaction(_) => ErrorKind::Internal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    Validation(String),

    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Transient(_) => ErrorKind::Transient,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => AppError::Validation(e.to_string()),
            RepoError::Transient(e) => AppError::Transient(e),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_kinds() {
        let domain: RepoError = DomainError::UserNotFound(UserId::new(3)).into();
        assert_eq!(domain.kind(), ErrorKind::Validation);
        assert!(RepoError::Transient("40001".into()).is_transient());
        assert_eq!(RepoError::Database("boom".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError =
            RepoError::Domain(DomainError::invalid("label", "\"\"", "must not be empty")).into();
        assert!(matches!(app, AppError::Validation(ref msg) if msg.contains("label")));

        let app: AppError = RepoError::Transient("busy".into()).into();
        assert_eq!(app.kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_invalid_field_message_names_field_and_value() {
        let err = DomainError::invalid("user_id", -4, "must be positive");
        assert_eq!(err.to_string(), "bad user_id -4: must be positive");
    }
}
