//! Ledger entry: immutable record of a money movement
//!
//! Entries are constructed through validating factories that compute the
//! integrity hash before the value exists; there is no way to build one with
//! a stale or missing hash.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use crate::core_types::{AdminId, EntryId, Points, UserId};

/// Movement type
///
/// Type IDs stored as SMALLINT in `ledger_entries_tb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum EntryType {
    Deposit = 1,
    Withdraw = 2,
    Transfer = 3,
    Bet = 4,
    Win = 5,
    PointCreation = 6,
}

impl EntryType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(EntryType::Deposit),
            2 => Some(EntryType::Withdraw),
            3 => Some(EntryType::Transfer),
            4 => Some(EntryType::Bet),
            5 => Some(EntryType::Win),
            6 => Some(EntryType::PointCreation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Deposit => "DEPOSIT",
            EntryType::Withdraw => "WITHDRAW",
            EntryType::Transfer => "TRANSFER",
            EntryType::Bet => "BET",
            EntryType::Win => "WIN",
            EntryType::PointCreation => "POINT_CREATION",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entry status
///
/// `Completed` entries are immutable. `Pending` exists only for deposit and
/// withdraw requests awaiting admin processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum EntryStatus {
    Pending = 0,
    Completed = 1,
    Failed = 2,
    Cancelled = 3,
}

impl EntryStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(EntryStatus::Pending),
            1 => Some(EntryStatus::Completed),
            2 => Some(EntryStatus::Failed),
            3 => Some(EntryStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "PENDING",
            EntryStatus::Completed => "COMPLETED",
            EntryStatus::Failed => "FAILED",
            EntryStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pre/post balances of the two parties of a committed movement
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PartyBalances {
    pub sender_before: Option<Points>,
    pub sender_after: Option<Points>,
    pub receiver_before: Option<Points>,
    pub receiver_after: Option<Points>,
}

/// Immutable record of a money movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub entry_type: EntryType,
    pub amount: Points,
    pub status: EntryStatus,
    pub sender_id: Option<UserId>,
    pub receiver_id: Option<UserId>,
    pub balances: PartyBalances,
    /// Client- or system-generated key; at most one committed effect per key
    pub idempotency_key: Option<String>,
    /// md5 over the defining fields, computed at construction
    pub integrity_hash: String,
    /// Admin annotation, set only while a deposit/withdraw request is pending
    pub processed_by: Option<AdminId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Construct an entry, validating the amount and computing the hash.
    ///
    /// Callers use the purpose-specific factories below; this is the single
    /// point where an entry comes into existence.
    pub fn new(
        entry_type: EntryType,
        amount: Points,
        status: EntryStatus,
        sender_id: Option<UserId>,
        receiver_id: Option<UserId>,
        balances: PartyBalances,
        idempotency_key: Option<String>,
    ) -> Result<Self, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let entry_id = EntryId::new();
        let created_at = Utc::now();
        let integrity_hash =
            Self::compute_hash(entry_id, entry_type, amount, sender_id, receiver_id, created_at);

        Ok(Self {
            entry_id,
            entry_type,
            amount,
            status,
            sender_id,
            receiver_id,
            balances,
            idempotency_key,
            integrity_hash,
            processed_by: None,
            processed_at: None,
            created_at,
        })
    }

    /// A committed peer-to-peer transfer with pre/post balances on both sides
    pub fn completed_transfer(
        sender: UserId,
        receiver: UserId,
        amount: Points,
        balances: PartyBalances,
        idempotency_key: String,
    ) -> Result<Self, LedgerError> {
        Self::new(
            EntryType::Transfer,
            amount,
            EntryStatus::Completed,
            Some(sender),
            Some(receiver),
            balances,
            Some(idempotency_key),
        )
    }

    /// A committed bet stake debit
    pub fn completed_bet(
        owner: UserId,
        amount: Points,
        balances: PartyBalances,
    ) -> Result<Self, LedgerError> {
        Self::new(
            EntryType::Bet,
            amount,
            EntryStatus::Completed,
            Some(owner),
            None,
            balances,
            None,
        )
    }

    /// A committed winnings credit, keyed so a replayed approval is detectable
    pub fn completed_win(
        winner: UserId,
        amount: Points,
        balances: PartyBalances,
        idempotency_key: String,
    ) -> Result<Self, LedgerError> {
        Self::new(
            EntryType::Win,
            amount,
            EntryStatus::Completed,
            None,
            Some(winner),
            balances,
            Some(idempotency_key),
        )
    }

    /// A deposit/withdraw request awaiting admin processing
    pub fn pending_request(
        entry_type: EntryType,
        user: UserId,
        amount: Points,
    ) -> Result<Self, LedgerError> {
        let (sender, receiver) = match entry_type {
            EntryType::Withdraw => (Some(user), None),
            _ => (None, Some(user)),
        };
        Self::new(
            entry_type,
            amount,
            EntryStatus::Pending,
            sender,
            receiver,
            PartyBalances::default(),
            None,
        )
    }

    fn compute_hash(
        entry_id: EntryId,
        entry_type: EntryType,
        amount: Points,
        sender_id: Option<UserId>,
        receiver_id: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> String {
        let payload = format!(
            "{}|{}|{}|{}|{}|{}",
            entry_id,
            entry_type.id(),
            amount,
            sender_id.map(|u| u.to_string()).unwrap_or_default(),
            receiver_id.map(|u| u.to_string()).unwrap_or_default(),
            created_at.timestamp_millis(),
        );
        format!("{:x}", md5::compute(payload))
    }

    /// Recompute the hash and compare; false means the record was tampered
    /// with or corrupted after construction.
    pub fn verify_integrity(&self) -> bool {
        let expected = Self::compute_hash(
            self.entry_id,
            self.entry_type,
            self.amount,
            self.sender_id,
            self.receiver_id,
            self.created_at,
        );
        expected == self.integrity_hash
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entry[{}] {} amount={} status={} sender={:?} receiver={:?}",
            self.entry_id, self.entry_type, self.amount, self.status, self.sender_id,
            self.receiver_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_status_roundtrip() {
        for t in [
            EntryType::Deposit,
            EntryType::Withdraw,
            EntryType::Transfer,
            EntryType::Bet,
            EntryType::Win,
            EntryType::PointCreation,
        ] {
            assert_eq!(EntryType::from_id(t.id()), Some(t));
        }
        assert_eq!(EntryType::from_id(0), None);

        for s in [
            EntryStatus::Pending,
            EntryStatus::Completed,
            EntryStatus::Failed,
            EntryStatus::Cancelled,
        ] {
            assert_eq!(EntryStatus::from_id(s.id()), Some(s));
        }
        assert_eq!(EntryStatus::from_id(9), None);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let result = LedgerEntry::new(
            EntryType::Transfer,
            0,
            EntryStatus::Completed,
            Some(1),
            Some(2),
            PartyBalances::default(),
            None,
        );
        assert!(matches!(result, Err(LedgerError::InvalidAmount)));
    }

    #[test]
    fn test_integrity_hash_verifies() {
        let entry = LedgerEntry::completed_transfer(
            1,
            2,
            500,
            PartyBalances {
                sender_before: Some(1000),
                sender_after: Some(500),
                receiver_before: Some(200),
                receiver_after: Some(700),
            },
            "key-1".to_string(),
        )
        .unwrap();

        assert!(entry.verify_integrity());
    }

    #[test]
    fn test_tampered_entry_fails_verification() {
        let mut entry =
            LedgerEntry::completed_bet(1, 10_000, PartyBalances::default()).unwrap();
        entry.amount = 20_000;
        assert!(!entry.verify_integrity());
    }

    #[test]
    fn test_pending_withdraw_debits_owner_side() {
        let entry = LedgerEntry::pending_request(EntryType::Withdraw, 9, 100).unwrap();
        assert_eq!(entry.sender_id, Some(9));
        assert_eq!(entry.receiver_id, None);
        assert_eq!(entry.status, EntryStatus::Pending);

        let entry = LedgerEntry::pending_request(EntryType::Deposit, 9, 100).unwrap();
        assert_eq!(entry.sender_id, None);
        assert_eq!(entry.receiver_id, Some(9));
    }
}
