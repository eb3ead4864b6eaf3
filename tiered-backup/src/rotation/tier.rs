//! Rotation tiers and the date classifier.
//!
//! Every run falls into exactly one tier:
//! - the first day of a month is always `Monthly`
//! - any other Sunday is `Weekly`
//! - everything else is `Daily`

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rotation class of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationTier {
    Monthly,
    Weekly,
    Daily,
}

impl RotationTier {
    /// All tiers, in the order retention reports them.
    pub const ALL: [RotationTier; 3] = [
        RotationTier::Monthly,
        RotationTier::Weekly,
        RotationTier::Daily,
    ];

    /// Token used in archive filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationTier::Monthly => "monthly",
            RotationTier::Weekly => "weekly",
            RotationTier::Daily => "daily",
        }
    }

    /// Default number of archives kept for this tier.
    pub fn default_quota(&self) -> usize {
        match self {
            RotationTier::Monthly => 2,
            RotationTier::Weekly => 6,
            RotationTier::Daily => 14,
        }
    }
}

impl fmt::Display for RotationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(RotationTier::Monthly),
            "weekly" => Ok(RotationTier::Weekly),
            "daily" => Ok(RotationTier::Daily),
            _ => Err(()),
        }
    }
}

/// Assign a calendar date to its rotation tier.
///
/// Precedence is fixed: day-of-month 1 wins over the weekday check, so a
/// Sunday that starts a month is `Monthly`, not `Weekly`.
pub fn classify(date: NaiveDate) -> RotationTier {
    if date.day() == 1 {
        RotationTier::Monthly
    } else if date.weekday() != Weekday::Sun {
        RotationTier::Daily
    } else {
        RotationTier::Weekly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_of_month_is_monthly() {
        // 2023-10-01 is a Sunday, 2023-11-01 a Wednesday
        assert_eq!(classify(date(2023, 10, 1)), RotationTier::Monthly);
        assert_eq!(classify(date(2023, 11, 1)), RotationTier::Monthly);
    }

    #[test]
    fn test_sunday_is_weekly() {
        assert_eq!(classify(date(2023, 10, 8)), RotationTier::Weekly);
        assert_eq!(classify(date(2024, 2, 25)), RotationTier::Weekly);
    }

    #[test]
    fn test_other_days_are_daily() {
        // Monday through Saturday of one week
        for day in 9..=14 {
            assert_eq!(classify(date(2023, 10, day)), RotationTier::Daily);
        }
    }

    #[test]
    fn test_tier_tokens() {
        for tier in RotationTier::ALL {
            assert_eq!(tier.as_str().parse::<RotationTier>(), Ok(tier));
        }
        assert!("Monthly".parse::<RotationTier>().is_err());
        assert!("yearly".parse::<RotationTier>().is_err());
    }

    #[test]
    fn test_default_quotas() {
        assert_eq!(RotationTier::Monthly.default_quota(), 2);
        assert_eq!(RotationTier::Weekly.default_quota(), 6);
        assert_eq!(RotationTier::Daily.default_quota(), 14);
    }

    proptest! {
        #[test]
        fn prop_classifier_precedence(days in 0i64..200_000) {
            let d = date(1900, 1, 1) + chrono::Duration::days(days);
            let expected = if d.day() == 1 {
                RotationTier::Monthly
            } else if d.weekday() == Weekday::Sun {
                RotationTier::Weekly
            } else {
                RotationTier::Daily
            };
            prop_assert_eq!(classify(d), expected);
        }
    }
}
