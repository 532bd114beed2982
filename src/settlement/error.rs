//! Settlement Error Types

use thiserror::Error;

use crate::draw::DrawError;
use crate::ledger::LedgerError;

/// Settlement errors
///
/// Reversal failures carry the bet involved so operators can reconcile
/// manually; the enclosing transaction is rolled back.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Failed to reverse credited winnings for bet {bet_id}: {source}")]
    ReversalFailed {
        bet_id: String,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SettlementError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            SettlementError::ReversalFailed { .. } => "REVERSAL_FAILED",
            SettlementError::Draw(e) => e.code(),
            SettlementError::Ledger(e) => e.code(),
            SettlementError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            SettlementError::ReversalFailed { .. } => 500,
            SettlementError::Draw(e) => e.http_status(),
            SettlementError::Ledger(e) => e.http_status(),
            SettlementError::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversal_failure_names_bet() {
        let err = SettlementError::ReversalFailed {
            bet_id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".into(),
            source: LedgerError::InsufficientFunds {
                account: 1,
                needed: 700_000,
                available: 100,
            },
        };
        assert_eq!(err.code(), "REVERSAL_FAILED");
        assert!(err.to_string().contains("01ARZ3NDEKTSV4RRFFQ69G5FAV"));
    }
}
