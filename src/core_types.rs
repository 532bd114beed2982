//! Core types used throughout the system
//!
//! Fundamental type aliases and id newtypes used by all modules.
//! They provide semantic meaning and enable future type evolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User ID - globally unique, immutable after assignment.
///
/// Primary key for accounts; owner reference on bets and ledger entries.
pub type UserId = u64;

/// Admin ID - identity of a back-office operator.
///
/// Approval, rejection and double-confirmation record which admin acted.
pub type AdminId = u64;

/// Points - the platform's integral monetary unit.
///
/// Balances and amounts are whole points; there are no fractional points.
pub type Points = u64;

/// Ledger entry ID - ULID-based unique identifier.
///
/// ULID gives monotonic, sortable ids with no coordination (no machine_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(ulid::Ulid);

impl EntryId {
    /// Generate a new unique EntryId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Bet ID - ULID-based unique identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BetId(ulid::Ulid);

impl BetId {
    /// Generate a new unique BetId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for BetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BetId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Draw result ID - ULID-based unique identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawId(ulid::Ulid);

impl DrawId {
    /// Generate a new unique DrawId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for DrawId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DrawId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique() {
        assert_ne!(EntryId::new(), EntryId::new());
        assert_ne!(BetId::new(), BetId::new());
        assert_ne!(DrawId::new(), DrawId::new());
    }

    #[test]
    fn test_id_string_roundtrip() {
        let id = BetId::new();
        let parsed: BetId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        assert!("not-a-ulid".parse::<EntryId>().is_err());
    }
}
