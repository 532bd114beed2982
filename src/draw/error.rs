//! Draw Error Types

use thiserror::Error;

/// Draw result errors
#[derive(Error, Debug)]
pub enum DrawError {
    #[error("Malformed tier '{tier}' in province {province}: expected {expected} digits, got '{value}'")]
    MalformedTier {
        province: String,
        tier: &'static str,
        expected: usize,
        value: String,
    },

    #[error("Result has no provinces")]
    EmptyResult,

    #[error("Duplicate province in result: {0}")]
    DuplicateProvince(String),

    #[error("Result not found: {0}")]
    ResultNotFound(String),

    #[error("Failed to decode stored result payload: {0}")]
    PayloadDecode(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DrawError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            DrawError::MalformedTier { .. } => "MALFORMED_RESULT",
            DrawError::EmptyResult => "EMPTY_RESULT",
            DrawError::DuplicateProvince(_) => "DUPLICATE_PROVINCE",
            DrawError::ResultNotFound(_) => "RESULT_NOT_FOUND",
            DrawError::PayloadDecode(_) => "SYSTEM_ERROR",
            DrawError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            DrawError::MalformedTier { .. }
            | DrawError::EmptyResult
            | DrawError::DuplicateProvince(_) => 400,
            DrawError::ResultNotFound(_) => 404,
            DrawError::PayloadDecode(_) | DrawError::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = DrawError::MalformedTier {
            province: "HCM".into(),
            tier: "special",
            expected: 6,
            value: "1234".into(),
        };
        assert_eq!(err.code(), "MALFORMED_RESULT");
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains("HCM"));
    }
}
