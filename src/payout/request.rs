//! Batched payout requests

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core_types::{AdminId, BetId};

/// Request-level status
///
/// Status IDs stored as SMALLINT in `payout_requests_tb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum PayoutRequestStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
    Cancelled = 3,
}

impl PayoutRequestStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(PayoutRequestStatus::Pending),
            1 => Some(PayoutRequestStatus::Approved),
            2 => Some(PayoutRequestStatus::Rejected),
            3 => Some(PayoutRequestStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutRequestStatus::Pending => "PENDING",
            PayoutRequestStatus::Approved => "APPROVED",
            PayoutRequestStatus::Rejected => "REJECTED",
            PayoutRequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for PayoutRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A batch of bets awaiting one admin decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub request_id: Uuid,
    pub bet_ids: Vec<BetId>,
    pub status: PayoutRequestStatus,
    pub processed_by: Option<AdminId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PayoutRequest {
    pub fn new(bet_ids: Vec<BetId>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            bet_ids,
            status: PayoutRequestStatus::Pending,
            processed_by: None,
            processed_at: None,
            note: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for s in [
            PayoutRequestStatus::Pending,
            PayoutRequestStatus::Approved,
            PayoutRequestStatus::Rejected,
            PayoutRequestStatus::Cancelled,
        ] {
            assert_eq!(PayoutRequestStatus::from_id(s.id()), Some(s));
        }
        assert_eq!(PayoutRequestStatus::from_id(4), None);
    }

    #[test]
    fn test_new_request_pending() {
        let request = PayoutRequest::new(vec![BetId::new(), BetId::new()]);
        assert_eq!(request.status, PayoutRequestStatus::Pending);
        assert_eq!(request.bet_ids.len(), 2);
        assert!(request.processed_by.is_none());
    }
}
