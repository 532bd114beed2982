//! Draw result data model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::DrawError;
use crate::core_types::DrawId;

/// One province's prize tiers: eight ranked tiers plus the special tier,
/// each a fixed-width numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeTiers {
    /// 2 digits
    pub eighth: String,
    /// 3 digits
    pub seventh: String,
    /// 4 digits
    pub sixth: String,
    /// 4 digits
    pub fifth: String,
    /// 5 digits
    pub fourth: String,
    /// 5 digits
    pub third: String,
    /// 5 digits
    pub second: String,
    /// 5 digits
    pub first: String,
    /// 6 digits
    pub special: String,
}

impl PrizeTiers {
    /// (name, expected width, value) for every tier, eighth through special
    pub fn tiers(&self) -> [(&'static str, usize, &str); 9] {
        [
            ("eighth", 2, &self.eighth),
            ("seventh", 3, &self.seventh),
            ("sixth", 4, &self.sixth),
            ("fifth", 4, &self.fifth),
            ("fourth", 5, &self.fourth),
            ("third", 5, &self.third),
            ("second", 5, &self.second),
            ("first", 5, &self.first),
            ("special", 6, &self.special),
        ]
    }

    /// All tier values in rank order
    pub fn all_values(&self) -> [&str; 9] {
        self.tiers().map(|(_, _, value)| value)
    }

    fn validate(&self, province: &str) -> Result<(), DrawError> {
        for (tier, expected, value) in self.tiers() {
            if value.len() != expected || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DrawError::MalformedTier {
                    province: province.to_string(),
                    tier,
                    expected,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// One province's slice of a published result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceResult {
    pub province_code: String,
    pub tiers: PrizeTiers,
}

/// A published draw result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawResult {
    pub result_id: DrawId,
    pub draw_date: NaiveDate,
    pub region: String,
    pub provinces: Vec<ProvinceResult>,
    /// Set once a settlement pass has run; corrections must reverse first
    pub settled: bool,
    pub created_at: DateTime<Utc>,
}

impl DrawResult {
    /// Validate tier widths across every province and construct the result.
    /// Malformed results never reach settlement.
    pub fn new(
        draw_date: NaiveDate,
        region: &str,
        provinces: Vec<ProvinceResult>,
    ) -> Result<Self, DrawError> {
        if provinces.is_empty() {
            return Err(DrawError::EmptyResult);
        }

        let mut seen = std::collections::HashSet::new();
        for province in &provinces {
            if !seen.insert(province.province_code.as_str()) {
                return Err(DrawError::DuplicateProvince(province.province_code.clone()));
            }
            province.tiers.validate(&province.province_code)?;
        }

        Ok(Self {
            result_id: DrawId::new(),
            draw_date,
            region: region.to_string(),
            provinces,
            settled: false,
            created_at: Utc::now(),
        })
    }

    /// The tiers for one province, if covered by this result
    pub fn province(&self, province_code: &str) -> Option<&PrizeTiers> {
        self.provinces
            .iter()
            .find(|p| p.province_code == province_code)
            .map(|p| &p.tiers)
    }
}

#[cfg(test)]
pub(crate) fn sample_tiers(special: &str) -> PrizeTiers {
    PrizeTiers {
        eighth: "12".into(),
        seventh: "345".into(),
        sixth: "6789".into(),
        fifth: "0123".into(),
        fourth: "45678".into(),
        third: "90123".into(),
        second: "45670".into(),
        first: "89012".into(),
        special: special.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_result() {
        let result = DrawResult::new(
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            "south",
            vec![ProvinceResult {
                province_code: "HCM".into(),
                tiers: sample_tiers("123447"),
            }],
        )
        .unwrap();

        assert!(!result.settled);
        assert!(result.province("HCM").is_some());
        assert!(result.province("DN").is_none());
    }

    #[test]
    fn test_wrong_width_rejected() {
        let mut tiers = sample_tiers("123447");
        tiers.eighth = "123".into(); // 3 digits where 2 expected

        let err = DrawResult::new(
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            "south",
            vec![ProvinceResult {
                province_code: "HCM".into(),
                tiers,
            }],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DrawError::MalformedTier {
                tier: "eighth",
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_non_numeric_tier_rejected() {
        let mut tiers = sample_tiers("123447");
        tiers.special = "12E447".into();

        let err = DrawResult::new(
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            "south",
            vec![ProvinceResult {
                province_code: "HCM".into(),
                tiers,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, DrawError::MalformedTier { tier: "special", .. }));
    }

    #[test]
    fn test_empty_and_duplicate_provinces_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert!(matches!(
            DrawResult::new(date, "south", vec![]),
            Err(DrawError::EmptyResult)
        ));

        let err = DrawResult::new(
            date,
            "south",
            vec![
                ProvinceResult {
                    province_code: "HCM".into(),
                    tiers: sample_tiers("123447"),
                },
                ProvinceResult {
                    province_code: "HCM".into(),
                    tiers: sample_tiers("654321"),
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, DrawError::DuplicateProvince(p) if p == "HCM"));
    }

    #[test]
    fn test_all_values_rank_order() {
        let tiers = sample_tiers("123447");
        let values = tiers.all_values();
        assert_eq!(values[0], "12");
        assert_eq!(values[8], "123447");
    }
}
