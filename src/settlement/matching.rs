//! Pure matching logic
//!
//! Direct categories match only the trailing digits of the special tier;
//! spread categories match the trailing digits of every tier wide enough.
//! A bet with no province is matched across all provinces in the result.

use crate::bet::{Bet, BetCategory, MatchScope};
use crate::draw::{DrawResult, PrizeTiers};

/// Whether `numbers` equals the trailing `numbers.len()` digits of `value`
fn trailing_match(numbers: &str, value: &str) -> bool {
    value.len() >= numbers.len() && value.ends_with(numbers)
}

/// Match one category's numbers against one province's tiers
pub fn matches_province(category: BetCategory, numbers: &str, tiers: &PrizeTiers) -> bool {
    match category.scope() {
        MatchScope::SpecialOnly => trailing_match(numbers, &tiers.special),
        MatchScope::AllTiers => tiers
            .all_values()
            .iter()
            .any(|value| trailing_match(numbers, value)),
    }
}

/// Whether a bet wins against a result.
///
/// The caller guarantees the bet's province (when set) is covered by the
/// result; an uncovered province simply never reaches this function.
pub fn bet_matches(bet: &Bet, result: &DrawResult) -> bool {
    match bet.province_code.as_deref() {
        Some(code) => result
            .province(code)
            .map(|tiers| matches_province(bet.category, &bet.numbers, tiers))
            .unwrap_or(false),
        None => result
            .provinces
            .iter()
            .any(|p| matches_province(bet.category, &bet.numbers, &p.tiers)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::model::sample_tiers;
    use crate::draw::ProvinceResult;
    use chrono::NaiveDate;

    fn result_with(province: &str, special: &str) -> DrawResult {
        DrawResult::new(
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            "south",
            vec![ProvinceResult {
                province_code: province.into(),
                tiers: sample_tiers(special),
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_direct2_wins_on_special_tail() {
        // Special tier ends in "47"
        let result = result_with("HCM", "123447");
        let bet = Bet::place(1, "47", BetCategory::Direct2, 10_000, Some("HCM".into())).unwrap();
        assert!(bet_matches(&bet, &result));
    }

    #[test]
    fn test_direct2_loses_on_other_tail() {
        let result = result_with("HCM", "123412");
        let bet = Bet::place(1, "47", BetCategory::Direct2, 10_000, Some("HCM".into())).unwrap();
        assert!(!bet_matches(&bet, &result));
    }

    #[test]
    fn test_direct_ignores_ranked_tiers() {
        // Eighth tier is "12" but direct only looks at the special tier
        let result = result_with("HCM", "123447");
        let bet = Bet::place(1, "12", BetCategory::Direct2, 10_000, Some("HCM".into())).unwrap();
        assert!(!bet_matches(&bet, &result));
    }

    #[test]
    fn test_spread2_wins_on_any_tier() {
        // "12" is the eighth tier; spread matches it, special does not end in 12
        let result = result_with("HCM", "123447");
        let bet = Bet::place(1, "12", BetCategory::Spread2, 10_000, Some("HCM".into())).unwrap();
        assert!(bet_matches(&bet, &result));
    }

    #[test]
    fn test_spread3_matches_wide_tiers_only() {
        let result = result_with("HCM", "123447");

        // Matches the special tail; the 2-digit eighth tier is too narrow
        // to ever satisfy a 3-digit spread
        let bet = Bet::place(1, "447", BetCategory::Spread3, 10_000, Some("HCM".into())).unwrap();
        assert!(bet_matches(&bet, &result));

        let bet = Bet::place(1, "999", BetCategory::Spread3, 10_000, Some("HCM".into())).unwrap();
        assert!(!bet_matches(&bet, &result));
    }

    #[test]
    fn test_no_province_spreads_across_all() {
        let result = DrawResult::new(
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            "south",
            vec![
                ProvinceResult {
                    province_code: "HCM".into(),
                    tiers: sample_tiers("111111"),
                },
                ProvinceResult {
                    province_code: "DN".into(),
                    tiers: sample_tiers("123447"),
                },
            ],
        )
        .unwrap();

        // Matches only in DN; the bet named no province so it still wins
        let bet = Bet::place(1, "47", BetCategory::Direct2, 10_000, None).unwrap();
        assert!(bet_matches(&bet, &result));
    }

    #[test]
    fn test_uncovered_province_never_matches() {
        let result = result_with("HCM", "123447");
        let bet = Bet::place(1, "47", BetCategory::Direct2, 10_000, Some("CT".into())).unwrap();
        assert!(!bet_matches(&bet, &result));
    }

    #[test]
    fn test_trailing_match_widths() {
        assert!(trailing_match("47", "123447"));
        assert!(trailing_match("3447", "123447"));
        assert!(!trailing_match("1234", "34"));
        assert!(!trailing_match("47", "4712"));
    }
}
