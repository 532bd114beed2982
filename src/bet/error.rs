//! Bet Error Types

use thiserror::Error;

use crate::ledger::LedgerError;

/// Bet placement errors
#[derive(Error, Debug)]
pub enum BetError {
    #[error("Numbers '{numbers}' invalid for category {category}: expected {expected} digits")]
    InvalidNumbers {
        numbers: String,
        category: &'static str,
        expected: usize,
    },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Bet not found: {0}")]
    BetNotFound(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BetError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            BetError::InvalidNumbers { .. } => "INVALID_NUMBERS",
            BetError::InvalidAmount => "INVALID_AMOUNT",
            BetError::BetNotFound(_) => "BET_NOT_FOUND",
            BetError::Ledger(e) => e.code(),
            BetError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            BetError::InvalidNumbers { .. } | BetError::InvalidAmount => 400,
            BetError::BetNotFound(_) => 404,
            BetError::Ledger(e) => e.http_status(),
            BetError::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = BetError::InvalidNumbers {
            numbers: "4a7".into(),
            category: "3D",
            expected: 3,
        };
        assert_eq!(err.code(), "INVALID_NUMBERS");
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains("4a7"));
    }
}
