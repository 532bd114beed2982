//! Account data models

use crate::core_types::{Points, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account status
///
/// Status codes stored as SMALLINT in `accounts_tb`.
/// Frozen accounts reject debits; disabled accounts reject all movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum AccountStatus {
    Active = 1,
    Frozen = 2,
    Disabled = 3,
}

impl AccountStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(AccountStatus::Active),
            2 => Some(AccountStatus::Frozen),
            3 => Some(AccountStatus::Disabled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Frozen => "FROZEN",
            AccountStatus::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A points account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    /// Never negative; enforced by conditional updates and a CHECK constraint
    pub balance: Points,
    pub status: AccountStatus,
    /// Bumped on every balance mutation
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Account {
    /// Whether the account may be debited
    pub fn can_debit(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Whether the account may be credited
    pub fn can_credit(&self) -> bool {
        self.status != AccountStatus::Disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            AccountStatus::Active,
            AccountStatus::Frozen,
            AccountStatus::Disabled,
        ] {
            assert_eq!(AccountStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(AccountStatus::from_id(0), None);
        assert_eq!(AccountStatus::from_id(4), None);
    }

    #[test]
    fn test_debit_credit_permissions() {
        let mut account = Account {
            user_id: 1,
            balance: 100,
            status: AccountStatus::Active,
            version: 1,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert!(account.can_debit());
        assert!(account.can_credit());

        account.status = AccountStatus::Frozen;
        assert!(!account.can_debit());
        assert!(account.can_credit());

        account.status = AccountStatus::Disabled;
        assert!(!account.can_debit());
        assert!(!account.can_credit());
    }
}
