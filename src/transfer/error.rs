//! Transfer Error Types

use thiserror::Error;

use crate::idempotency::IdempotencyError;
use crate::ledger::LedgerError;

/// Transfer error types
///
/// Error codes are stable strings for API responses. Callers see either a
/// definitive success or one of these; never an ambiguous "maybe" state.
#[derive(Error, Debug)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Sender and receiver cannot be the same account")]
    SelfTransfer,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    // === Idempotency ===
    /// Another worker is executing this key; retryable with the same key.
    #[error("Operation in progress for key: {0}")]
    OperationInProgress(String),

    /// A recorded outcome could not be decoded on replay
    #[error("Failed to decode recorded outcome: {0}")]
    OutcomeDecode(#[from] serde_json::Error),

    // === Storage ===
    /// Transient storage conflict (serialization failure / deadlock).
    /// Recovered internally by the retry loop; never surfaced directly.
    #[error("Transient storage conflict: {0}")]
    Transient(String),

    /// Retry budget exhausted; terminal from the caller's perspective.
    #[error("Transfer failed after {attempts} attempts due to transient conflicts")]
    TransientConflict { attempts: u32 },

    #[error("Database error: {0}")]
    Database(String),

    // === Delegated ===
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Idempotency(#[from] IdempotencyError),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::SelfTransfer => "UNAUTHORIZED",
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::OperationInProgress(_) => "OPERATION_IN_PROGRESS",
            TransferError::OutcomeDecode(_) => "SYSTEM_ERROR",
            TransferError::Transient(_) | TransferError::TransientConflict { .. } => {
                "TRANSIENT_CONFLICT"
            }
            TransferError::Database(_) => "DATABASE_ERROR",
            TransferError::Ledger(e) => e.code(),
            TransferError::Idempotency(e) => e.code(),
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount => 400,
            TransferError::SelfTransfer => 403,
            TransferError::OperationInProgress(_) => 409,
            TransferError::Transient(_) | TransferError::TransientConflict { .. } => 503,
            TransferError::OutcomeDecode(_) | TransferError::Database(_) => 500,
            TransferError::Ledger(e) => e.http_status(),
            TransferError::Idempotency(_) => 500,
        }
    }

    /// Whether the retry loop may re-attempt this failure
    pub fn is_transient(&self) -> bool {
        match self {
            TransferError::Transient(_) => true,
            TransferError::Ledger(LedgerError::Database(e)) => is_transient_sqlx(e),
            _ => false,
        }
    }

    /// Classify an sqlx error at the orchestration boundary
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if is_transient_sqlx(&e) {
            TransferError::Transient(e.to_string())
        } else {
            TransferError::Database(e.to_string())
        }
    }
}

/// Retryable transaction error class: serialization failure or deadlock
pub fn is_transient_sqlx(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_transfer_codes_unauthorized() {
        assert_eq!(TransferError::SelfTransfer.code(), "UNAUTHORIZED");
        assert_eq!(TransferError::SelfTransfer.http_status(), 403);
    }

    #[test]
    fn test_transient_classification() {
        assert!(TransferError::Transient("40001".into()).is_transient());
        assert!(!TransferError::TransientConflict { attempts: 3 }.is_transient());
        assert!(!TransferError::InvalidAmount.is_transient());
    }

    #[test]
    fn test_ledger_codes_delegate() {
        let err = TransferError::Ledger(LedgerError::InsufficientFunds {
            account: 1,
            needed: 10,
            available: 5,
        });
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(err.http_status(), 422);
    }
}
