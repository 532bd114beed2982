//! Payout Error Types

use thiserror::Error;

use crate::core_types::AdminId;
use crate::ledger::LedgerError;

/// Payout approval errors
#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("Invalid state transition for bet {bet_id}: cannot {action} from {from}")]
    InvalidStateTransition {
        bet_id: String,
        from: &'static str,
        action: &'static str,
    },

    #[error("Admin {admin} cannot double-confirm bet {bet_id}: approver must differ")]
    Unauthorized { bet_id: String, admin: AdminId },

    #[error("A note is required to reject a payout")]
    NoteRequired,

    #[error("Bet not found: {0}")]
    BetNotFound(String),

    #[error("Payout request not found: {0}")]
    RequestNotFound(String),

    #[error("Invalid payout request state: cannot {action} from {from}")]
    InvalidRequestState {
        action: &'static str,
        from: &'static str,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Failed to encode bet id list: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PayoutError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PayoutError::InvalidStateTransition { .. } | PayoutError::InvalidRequestState { .. } => {
                "INVALID_STATE_TRANSITION"
            }
            PayoutError::Unauthorized { .. } => "UNAUTHORIZED",
            PayoutError::NoteRequired => "NOTE_REQUIRED",
            PayoutError::BetNotFound(_) => "BET_NOT_FOUND",
            PayoutError::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            PayoutError::Ledger(e) => e.code(),
            PayoutError::Encode(_) => "SYSTEM_ERROR",
            PayoutError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            PayoutError::InvalidStateTransition { .. }
            | PayoutError::InvalidRequestState { .. } => 409,
            PayoutError::Unauthorized { .. } => 403,
            PayoutError::NoteRequired => 400,
            PayoutError::BetNotFound(_) | PayoutError::RequestNotFound(_) => 404,
            PayoutError::Ledger(e) => e.http_status(),
            PayoutError::Encode(_) | PayoutError::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = PayoutError::InvalidStateTransition {
            bet_id: "b1".into(),
            from: "APPROVED",
            action: "approve",
        };
        assert_eq!(err.code(), "INVALID_STATE_TRANSITION");
        assert_eq!(err.http_status(), 409);

        let err = PayoutError::Unauthorized {
            bet_id: "b1".into(),
            admin: 7,
        };
        assert_eq!(err.code(), "UNAUTHORIZED");
        assert_eq!(err.http_status(), 403);
        assert!(err.to_string().contains("approver must differ"));
    }
}
