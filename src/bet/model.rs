//! Bet data model
//!
//! Constructed only through [`Bet::place`], which validates the numbers
//! against the category and computes the integrity hash; invariants hold at
//! the type level, not via storage hooks.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::BetCategory;
use super::error::BetError;
use crate::core_types::{AdminId, BetId, DrawId, Points, UserId};

/// Settlement status of a bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum BetStatus {
    Pending = 0,
    Won = 1,
    Lost = 2,
}

impl BetStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(BetStatus::Pending),
            1 => Some(BetStatus::Won),
            2 => Some(BetStatus::Lost),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "PENDING",
            BetStatus::Won => "WON",
            BetStatus::Lost => "LOST",
        }
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payout approval status of a bet
///
/// Advanced only by the payout approval state machine; `Approved` is the
/// single point where the ledger is credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum PaymentStatus {
    Pending = 0,
    PendingApproval = 1,
    Approved = 2,
    Rejected = 3,
    /// Second-admin attestation after approval; moves no funds
    DoubleConfirmed = 4,
}

impl PaymentStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(PaymentStatus::Pending),
            1 => Some(PaymentStatus::PendingApproval),
            2 => Some(PaymentStatus::Approved),
            3 => Some(PaymentStatus::Rejected),
            4 => Some(PaymentStatus::DoubleConfirmed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::PendingApproval => "PENDING_APPROVAL",
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::DoubleConfirmed => "DOUBLE_CONFIRMED",
        }
    }

    /// No further transition leaves these states
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Rejected | PaymentStatus::DoubleConfirmed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A placed bet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub bet_id: BetId,
    pub user_id: UserId,
    pub numbers: String,
    pub category: BetCategory,
    pub amount: Points,
    /// None means a spread bet across all provinces in the draw
    pub province_code: Option<String>,
    pub status: BetStatus,
    pub win_amount: Points,
    pub payment_status: PaymentStatus,
    pub approved_by: Option<AdminId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_note: Option<String>,
    pub confirmed_by: Option<AdminId>,
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Set once by settlement, cleared by a correction reversal
    pub result_id: Option<DrawId>,
    pub integrity_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Bet {
    /// Validate and construct a new pending bet.
    ///
    /// `numbers` must be exactly the category's digit width, all ASCII
    /// digits. The ledger debit happens in [`super::BetService::place_bet`];
    /// this factory only builds the validated value.
    pub fn place(
        user_id: UserId,
        numbers: &str,
        category: BetCategory,
        amount: Points,
        province_code: Option<String>,
    ) -> Result<Self, BetError> {
        if amount == 0 {
            return Err(BetError::InvalidAmount);
        }
        if numbers.len() != category.digits() || !numbers.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BetError::InvalidNumbers {
                numbers: numbers.to_string(),
                category: category.as_str(),
                expected: category.digits(),
            });
        }

        let bet_id = BetId::new();
        let created_at = Utc::now();
        let integrity_hash = Self::compute_hash(
            bet_id,
            user_id,
            numbers,
            category,
            amount,
            province_code.as_deref(),
            created_at,
        );

        Ok(Self {
            bet_id,
            user_id,
            numbers: numbers.to_string(),
            category,
            amount,
            province_code,
            status: BetStatus::Pending,
            win_amount: 0,
            payment_status: PaymentStatus::Pending,
            approved_by: None,
            approved_at: None,
            approval_note: None,
            confirmed_by: None,
            confirmed_at: None,
            result_id: None,
            integrity_hash,
            created_at,
        })
    }

    fn compute_hash(
        bet_id: BetId,
        user_id: UserId,
        numbers: &str,
        category: BetCategory,
        amount: Points,
        province_code: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> String {
        let payload = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            bet_id,
            user_id,
            numbers,
            category.id(),
            amount,
            province_code.unwrap_or_default(),
            created_at.timestamp_millis(),
        );
        format!("{:x}", md5::compute(payload))
    }

    /// Recompute the hash over the defining fields and compare
    pub fn verify_integrity(&self) -> bool {
        let expected = Self::compute_hash(
            self.bet_id,
            self.user_id,
            &self.numbers,
            self.category,
            self.amount,
            self.province_code.as_deref(),
            self.created_at,
        );
        expected == self.integrity_hash
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bet[{}] user={} {} '{}' amount={} status={} payment={}",
            self.bet_id,
            self.user_id,
            self.category,
            self.numbers,
            self.amount,
            self.status,
            self.payment_status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_valid() {
        let bet = Bet::place(1001, "47", BetCategory::Direct2, 10_000, Some("HCM".into()))
            .unwrap();
        assert_eq!(bet.status, BetStatus::Pending);
        assert_eq!(bet.payment_status, PaymentStatus::Pending);
        assert_eq!(bet.win_amount, 0);
        assert!(bet.result_id.is_none());
        assert!(bet.verify_integrity());
    }

    #[test]
    fn test_place_wrong_width_rejected() {
        let err = Bet::place(1001, "473", BetCategory::Direct2, 10_000, None).unwrap_err();
        assert!(matches!(err, BetError::InvalidNumbers { expected: 2, .. }));

        let err = Bet::place(1001, "47", BetCategory::Spread3, 10_000, None).unwrap_err();
        assert!(matches!(err, BetError::InvalidNumbers { expected: 3, .. }));
    }

    #[test]
    fn test_place_non_digits_rejected() {
        assert!(Bet::place(1001, "4a", BetCategory::Direct2, 10_000, None).is_err());
        assert!(Bet::place(1001, "４７", BetCategory::Direct2, 10_000, None).is_err());
    }

    #[test]
    fn test_place_zero_amount_rejected() {
        assert!(matches!(
            Bet::place(1001, "47", BetCategory::Direct2, 0, None),
            Err(BetError::InvalidAmount)
        ));
    }

    #[test]
    fn test_tampered_bet_fails_verification() {
        let mut bet = Bet::place(1001, "47", BetCategory::Direct2, 10_000, None).unwrap();
        bet.numbers = "48".to_string();
        assert!(!bet.verify_integrity());
    }

    #[test]
    fn test_status_roundtrips() {
        for s in [BetStatus::Pending, BetStatus::Won, BetStatus::Lost] {
            assert_eq!(BetStatus::from_id(s.id()), Some(s));
        }
        for p in [
            PaymentStatus::Pending,
            PaymentStatus::PendingApproval,
            PaymentStatus::Approved,
            PaymentStatus::Rejected,
            PaymentStatus::DoubleConfirmed,
        ] {
            assert_eq!(PaymentStatus::from_id(p.id()), Some(p));
        }
        assert_eq!(PaymentStatus::from_id(9), None);
    }

    #[test]
    fn test_terminal_payment_states() {
        assert!(PaymentStatus::Rejected.is_terminal());
        assert!(PaymentStatus::DoubleConfirmed.is_terminal());
        assert!(!PaymentStatus::Approved.is_terminal());
        assert!(!PaymentStatus::PendingApproval.is_terminal());
    }
}
