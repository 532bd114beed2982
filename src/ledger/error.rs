//! Ledger Error Types

use crate::core_types::{Points, UserId};
use thiserror::Error;

/// Ledger error types
///
/// Error codes are stable strings for API responses and reconciliation logs.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Insufficient funds: account {account} needs {needed}, has {available}")]
    InsufficientFunds {
        account: UserId,
        needed: Points,
        available: Points,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(UserId),

    #[error("Account is frozen: {0}")]
    AccountFrozen(UserId),

    #[error("Account is disabled: {0}")]
    AccountDisabled(UserId),

    #[error(
        "Conservation violated: sum before {before_total} != sum after {after_total} (accounts {sender}, {receiver})"
    )]
    IntegrityViolation {
        sender: UserId,
        receiver: UserId,
        before_total: u128,
        after_total: u128,
    },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Ledger entry not found: {0}")]
    EntryNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::AccountFrozen(_) => "ACCOUNT_FROZEN",
            LedgerError::AccountDisabled(_) => "ACCOUNT_DISABLED",
            LedgerError::IntegrityViolation { .. } => "INTEGRITY_VIOLATION",
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            LedgerError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidAmount => 400,
            LedgerError::AccountNotFound(_) | LedgerError::EntryNotFound(_) => 404,
            LedgerError::InsufficientFunds { .. }
            | LedgerError::AccountFrozen(_)
            | LedgerError::AccountDisabled(_) => 422,
            LedgerError::IntegrityViolation { .. } | LedgerError::Database(_) => 500,
        }
    }

    /// Fatal errors abort the enclosing transaction and must alert operators
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::IntegrityViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = LedgerError::InsufficientFunds {
            account: 7,
            needed: 100,
            available: 10,
        };
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(err.http_status(), 422);
        assert!(!err.is_fatal());

        assert_eq!(LedgerError::AccountNotFound(1).code(), "ACCOUNT_NOT_FOUND");
        assert_eq!(LedgerError::AccountNotFound(1).http_status(), 404);
    }

    #[test]
    fn test_integrity_violation_is_fatal() {
        let err = LedgerError::IntegrityViolation {
            sender: 1,
            receiver: 2,
            before_total: 1200,
            after_total: 1100,
        };
        assert!(err.is_fatal());
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_display_names_account() {
        let err = LedgerError::InsufficientFunds {
            account: 42,
            needed: 500,
            available: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("500"));
    }
}
