//! Idempotency Error Types

use thiserror::Error;

/// Idempotency guard errors
#[derive(Error, Debug)]
pub enum IdempotencyError {
    /// Another worker is still executing the operation for this key.
    /// Retryable; callers should back off and resubmit with the same key.
    #[error("Operation in progress for key: {0}")]
    OperationInProgress(String),

    #[error("Failed to serialize outcome: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal system error: {0}")]
    System(String),
}

impl IdempotencyError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            IdempotencyError::OperationInProgress(_) => "OPERATION_IN_PROGRESS",
            IdempotencyError::Serialization(_) => "SERIALIZATION_ERROR",
            IdempotencyError::Database(_) => "DATABASE_ERROR",
            IdempotencyError::System(_) => "SYSTEM_ERROR",
        }
    }

    /// Whether the caller should retry with the same key
    pub fn is_retryable(&self) -> bool {
        matches!(self, IdempotencyError::OperationInProgress(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_is_retryable() {
        let err = IdempotencyError::OperationInProgress("key-1".to_string());
        assert!(err.is_retryable());
        assert_eq!(err.code(), "OPERATION_IN_PROGRESS");
        assert!(err.to_string().contains("key-1"));
    }

    #[test]
    fn test_system_error_not_retryable() {
        assert!(!IdempotencyError::System("boom".into()).is_retryable());
    }
}
