//! Weekly aggregation over an already owner-scoped set of activities.
//! Pure functions only; safe to call concurrently.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};

use super::dto::format_date;
use super::repo::Activity;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WeeklyStats {
    pub week_start: String,
    pub week_end: String,
    /// ISO date -> category -> summed minutes. Only dates and categories
    /// present in the window appear; absent days are not zero-filled.
    pub daily_stats: BTreeMap<String, BTreeMap<String, i64>>,
    pub category_totals: BTreeMap<String, i64>,
    pub total_minutes: i64,
}

/// Monday-start week containing `today`: `week_start = today - days_from_monday`,
/// `week_end = week_start + 6`. Both bounds inclusive.
pub fn week_bounds(today: Date) -> (Date, Date) {
    let start = today - Duration::days(i64::from(today.weekday().number_days_from_monday()));
    (start, start + Duration::days(6))
}

/// Server-local calendar date, falling back to UTC when the local offset
/// cannot be determined.
pub fn today_local() -> Date {
    OffsetDateTime::now_local()
        .map(|t| t.date())
        .unwrap_or_else(|_| OffsetDateTime::now_utc().date())
}

/// Sums minutes per day/category and per category over `[week_start, week_end]`.
/// The optional category filter applies before any summation. An empty input
/// yields empty maps and a zero total.
pub fn aggregate(
    activities: &[Activity],
    week_start: Date,
    week_end: Date,
    category: Option<&str>,
) -> WeeklyStats {
    let mut daily_stats: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
    let mut category_totals: BTreeMap<String, i64> = BTreeMap::new();
    let mut total_minutes: i64 = 0;

    for activity in activities {
        if activity.date < week_start || activity.date > week_end {
            continue;
        }
        if let Some(wanted) = category {
            if activity.category != wanted {
                continue;
            }
        }
        *daily_stats
            .entry(format_date(activity.date))
            .or_default()
            .entry(activity.category.clone())
            .or_insert(0) += activity.minutes;
        *category_totals.entry(activity.category.clone()).or_insert(0) += activity.minutes;
        total_minutes += activity.minutes;
    }

    WeeklyStats {
        week_start: format_date(week_start),
        week_end: format_date(week_end),
        daily_stats,
        category_totals,
        total_minutes,
    }
}
