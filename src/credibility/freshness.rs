//! Publish-date freshness decay.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Freshness curve parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessSettings {
    /// Content younger than this scores 1.0.
    pub fresh_days: i64,
    /// Half-life of the decay after `fresh_days`.
    pub half_life_days: f64,
    /// Lower bound of the decay; old legal material stays usable.
    pub floor: f64,
    /// Content older than this is flagged as outdated.
    pub horizon_days: i64,
    /// Score given to undated content.
    pub undated: f64,
}

impl Default for FreshnessSettings {
    fn default() -> Self {
        Self {
            fresh_days: 30,
            half_life_days: 365.0,
            floor: 0.3,
            horizon_days: 730,
            undated: 0.5,
        }
    }
}

/// Freshness of content published on `published`, as of `today`.
///
/// Returns the score and the age in days (`None` when undated). Future
/// dates count as brand new.
pub fn freshness(
    published: Option<NaiveDate>,
    today: NaiveDate,
    settings: &FreshnessSettings,
) -> (f64, Option<i64>) {
    let Some(date) = published else {
        return (settings.undated, None);
    };
    let age = (today - date).num_days().max(0);
    if age <= settings.fresh_days {
        return (1.0, Some(age));
    }
    let overdue = (age - settings.fresh_days) as f64;
    let decay = 0.5_f64.powf(overdue / settings.half_life_days);
    (settings.floor + (1.0 - settings.floor) * decay, Some(age))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn recent_content_is_fully_fresh() {
        let s = FreshnessSettings::default();
        assert_eq!(freshness(Some(day(2025, 6, 1)), day(2025, 6, 20), &s), (1.0, Some(19)));
    }

    #[test]
    fn one_half_life_past_window_is_midway_to_floor() {
        let s = FreshnessSettings::default();
        let published = day(2024, 1, 1);
        let today = published + chrono::Duration::days(30 + 365);
        let (score, _) = freshness(Some(published), today, &s);
        assert!((score - (0.3 + 0.7 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn very_old_content_never_drops_below_floor() {
        let s = FreshnessSettings::default();
        let (score, age) = freshness(Some(day(1990, 1, 1)), day(2025, 1, 1), &s);
        assert!(score >= s.floor);
        assert!(score < 0.31);
        assert!(age.unwrap_or(0) > s.horizon_days);
    }

    #[test]
    fn undated_is_neutral_and_future_is_fresh() {
        let s = FreshnessSettings::default();
        assert_eq!(freshness(None, day(2025, 1, 1), &s), (0.5, None));
        assert_eq!(freshness(Some(day(2026, 1, 1)), day(2025, 1, 1), &s).0, 1.0);
    }
}
