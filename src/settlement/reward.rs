//! Reward calculation seam
//!
//! The settlement engine delegates payout math to a [`RewardCalculator`]
//! collaborator; the only math the engine owns is the base-ratio fallback
//! implemented by [`BaseRatioCalculator`]. Dynamic odds, tier bonuses and
//! jackpots plug in behind the trait.

use serde::{Deserialize, Serialize};

use crate::bet::Bet;
use crate::core_types::Points;

/// Inputs the engine hands to the calculator alongside the bet
#[derive(Debug, Clone, Copy)]
pub struct RewardContext {
    /// Base payout ratio for the bet's category
    pub base_ratio: u64,
    /// Tier values in scope for spread categories; 1 for direct
    pub spread_count: u64,
}

impl RewardContext {
    pub fn for_bet(bet: &Bet) -> Self {
        Self {
            base_ratio: bet.category.base_ratio(),
            spread_count: bet.category.spread_count(),
        }
    }
}

/// A named bonus on top of the base win amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bonus {
    pub label: String,
    pub amount: Points,
}

/// Computed reward for a winning bet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub win_amount: Points,
    pub bonuses: Vec<Bonus>,
}

impl Reward {
    /// Base amount plus all bonuses
    pub fn total(&self) -> Points {
        self.win_amount + self.bonuses.iter().map(|b| b.amount).sum::<Points>()
    }
}

/// Pure payout computation for a winning bet
pub trait RewardCalculator: Send + Sync {
    fn compute(&self, bet: &Bet, ctx: &RewardContext) -> Reward;
}

/// Fallback: stake times base ratio, pro-rated by the spread count
pub struct BaseRatioCalculator;

impl RewardCalculator for BaseRatioCalculator {
    fn compute(&self, bet: &Bet, ctx: &RewardContext) -> Reward {
        let win_amount = bet
            .amount
            .saturating_mul(ctx.base_ratio)
            .checked_div(ctx.spread_count)
            .unwrap_or(0);

        Reward {
            win_amount,
            bonuses: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bet::BetCategory;

    #[test]
    fn test_direct2_fallback() {
        // 10,000 on 2D at 70x = 700,000 before any bonus
        let bet = Bet::place(1, "47", BetCategory::Direct2, 10_000, None).unwrap();
        let reward = BaseRatioCalculator.compute(&bet, &RewardContext::for_bet(&bet));
        assert_eq!(reward.win_amount, 700_000);
        assert!(reward.bonuses.is_empty());
        assert_eq!(reward.total(), 700_000);
    }

    #[test]
    fn test_direct3_and_direct4_ratios() {
        let bet = Bet::place(1, "447", BetCategory::Direct3, 1_000, None).unwrap();
        let reward = BaseRatioCalculator.compute(&bet, &RewardContext::for_bet(&bet));
        assert_eq!(reward.win_amount, 600_000);

        let bet = Bet::place(1, "3447", BetCategory::Direct4, 1_000, None).unwrap();
        let reward = BaseRatioCalculator.compute(&bet, &RewardContext::for_bet(&bet));
        assert_eq!(reward.win_amount, 5_000_000);
    }

    #[test]
    fn test_spread_pro_rated() {
        // Spread 2-digit: 70x over 9 tier values
        let bet = Bet::place(1, "47", BetCategory::Spread2, 9_000, None).unwrap();
        let reward = BaseRatioCalculator.compute(&bet, &RewardContext::for_bet(&bet));
        assert_eq!(reward.win_amount, 9_000 * 70 / 9);
    }

    #[test]
    fn test_reward_total_includes_bonuses() {
        let reward = Reward {
            win_amount: 700_000,
            bonuses: vec![
                Bonus {
                    label: "tier".into(),
                    amount: 50_000,
                },
                Bonus {
                    label: "streak".into(),
                    amount: 10_000,
                },
            ],
        };
        assert_eq!(reward.total(), 760_000);
    }
}
