//! Funding Error Types

use thiserror::Error;

use crate::core_types::{AdminId, Points};
use crate::ledger::LedgerError;

/// Funding request / point mint errors
#[derive(Error, Debug)]
pub enum FundingError {
    #[error("Daily point creation cap exceeded for admin {admin}: cap {cap}, minted today {minted}")]
    DailyLimitExceeded {
        admin: AdminId,
        cap: Points,
        minted: Points,
    },

    #[error("Request {entry_id} cannot be processed from status {from}")]
    InvalidStateTransition { entry_id: String, from: &'static str },

    #[error("Entry {entry_id} is not a deposit/withdraw request")]
    NotARequest { entry_id: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl FundingError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            FundingError::DailyLimitExceeded { .. } => "DAILY_LIMIT_EXCEEDED",
            FundingError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            FundingError::NotARequest { .. } => "NOT_A_REQUEST",
            FundingError::Ledger(e) => e.code(),
            FundingError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            FundingError::DailyLimitExceeded { .. } => 422,
            FundingError::InvalidStateTransition { .. } => 409,
            FundingError::NotARequest { .. } => 400,
            FundingError::Ledger(e) => e.http_status(),
            FundingError::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = FundingError::DailyLimitExceeded {
            admin: 3,
            cap: 1_000_000,
            minted: 990_000,
        };
        assert_eq!(err.code(), "DAILY_LIMIT_EXCEEDED");
        assert_eq!(err.http_status(), 422);
        assert!(err.to_string().contains("990000"));
    }
}
