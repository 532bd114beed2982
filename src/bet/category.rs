//! Bet categories
//!
//! The closed set of playable categories. Each carries its digit width,
//! matching scope and base payout ratio; there is no string-keyed dispatch
//! anywhere downstream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which prize tiers a category is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// Direct categories: only the trailing digits of the special tier
    SpecialOnly,
    /// Spread ("Bao lô") categories: the trailing digits of every tier
    AllTiers,
}

/// Bet category
///
/// Category IDs stored as SMALLINT in `bets_tb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum BetCategory {
    /// 2-digit direct against the special tier
    Direct2 = 1,
    /// 3-digit direct against the special tier
    Direct3 = 2,
    /// 4-digit direct against the special tier
    Direct4 = 3,
    /// 2-digit spread across all tiers ("bao lô 2")
    Spread2 = 4,
    /// 3-digit spread across all tiers ("bao lô 3")
    Spread3 = 5,
    /// 4-digit spread across all tiers ("bao lô 4")
    Spread4 = 6,
}

impl BetCategory {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(BetCategory::Direct2),
            2 => Some(BetCategory::Direct3),
            3 => Some(BetCategory::Direct4),
            4 => Some(BetCategory::Spread2),
            5 => Some(BetCategory::Spread3),
            6 => Some(BetCategory::Spread4),
            _ => None,
        }
    }

    /// Number of trailing digits matched
    #[inline]
    pub fn digits(&self) -> usize {
        match self {
            BetCategory::Direct2 | BetCategory::Spread2 => 2,
            BetCategory::Direct3 | BetCategory::Spread3 => 3,
            BetCategory::Direct4 | BetCategory::Spread4 => 4,
        }
    }

    /// Matching scope
    #[inline]
    pub fn scope(&self) -> MatchScope {
        match self {
            BetCategory::Direct2 | BetCategory::Direct3 | BetCategory::Direct4 => {
                MatchScope::SpecialOnly
            }
            BetCategory::Spread2 | BetCategory::Spread3 | BetCategory::Spread4 => {
                MatchScope::AllTiers
            }
        }
    }

    #[inline]
    pub fn is_spread(&self) -> bool {
        self.scope() == MatchScope::AllTiers
    }

    /// Base payout ratio applied by the fallback reward calculation
    #[inline]
    pub fn base_ratio(&self) -> u64 {
        match self.digits() {
            2 => 70,
            3 => 600,
            _ => 5000,
        }
    }

    /// Tier values in scope for a spread category of this width (tiers wide
    /// enough to contain the digits); 1 for direct categories.
    ///
    /// The fallback reward pro-rates spread wins by this count so the ratio
    /// can never disagree with the matching scope.
    #[inline]
    pub fn spread_count(&self) -> u64 {
        if !self.is_spread() {
            return 1;
        }
        match self.digits() {
            2 => 9, // all eight ranked tiers plus special
            3 => 8, // all but the 2-digit eighth tier
            _ => 7, // 4-digit and wider tiers only
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BetCategory::Direct2 => "2D",
            BetCategory::Direct3 => "3D",
            BetCategory::Direct4 => "4D",
            BetCategory::Spread2 => "LO2",
            BetCategory::Spread3 => "LO3",
            BetCategory::Spread4 => "LO4",
        }
    }
}

impl fmt::Display for BetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BetCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2D" => Ok(BetCategory::Direct2),
            "3D" => Ok(BetCategory::Direct3),
            "4D" => Ok(BetCategory::Direct4),
            "LO2" => Ok(BetCategory::Spread2),
            "LO3" => Ok(BetCategory::Spread3),
            "LO4" => Ok(BetCategory::Spread4),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BetCategory; 6] = [
        BetCategory::Direct2,
        BetCategory::Direct3,
        BetCategory::Direct4,
        BetCategory::Spread2,
        BetCategory::Spread3,
        BetCategory::Spread4,
    ];

    #[test]
    fn test_id_roundtrip() {
        for category in ALL {
            assert_eq!(BetCategory::from_id(category.id()), Some(category));
        }
        assert_eq!(BetCategory::from_id(0), None);
        assert_eq!(BetCategory::from_id(7), None);
    }

    #[test]
    fn test_str_roundtrip() {
        for category in ALL {
            assert_eq!(category.as_str().parse::<BetCategory>(), Ok(category));
        }
        assert!("5D".parse::<BetCategory>().is_err());
        assert!("bao lo".parse::<BetCategory>().is_err());
    }

    #[test]
    fn test_digit_widths() {
        assert_eq!(BetCategory::Direct2.digits(), 2);
        assert_eq!(BetCategory::Direct3.digits(), 3);
        assert_eq!(BetCategory::Direct4.digits(), 4);
        assert_eq!(BetCategory::Spread2.digits(), 2);
    }

    #[test]
    fn test_base_ratios() {
        assert_eq!(BetCategory::Direct2.base_ratio(), 70);
        assert_eq!(BetCategory::Direct3.base_ratio(), 600);
        assert_eq!(BetCategory::Direct4.base_ratio(), 5000);
        assert_eq!(BetCategory::Spread2.base_ratio(), 70);
    }

    #[test]
    fn test_scopes() {
        assert_eq!(BetCategory::Direct2.scope(), MatchScope::SpecialOnly);
        assert_eq!(BetCategory::Spread4.scope(), MatchScope::AllTiers);
        assert!(!BetCategory::Direct4.is_spread());
        assert!(BetCategory::Spread3.is_spread());
    }

    #[test]
    fn test_spread_counts() {
        assert_eq!(BetCategory::Direct2.spread_count(), 1);
        assert_eq!(BetCategory::Spread2.spread_count(), 9);
        assert_eq!(BetCategory::Spread3.spread_count(), 8);
        assert_eq!(BetCategory::Spread4.spread_count(), 7);
    }
}
