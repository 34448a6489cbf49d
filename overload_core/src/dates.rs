//! Calendar-day arithmetic over the workout log.
//!
//! Every function takes `today` explicitly so callers decide the local day
//! and tests stay deterministic.

use crate::LogEntry;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

/// Longest gap between two workout days that keeps a streak alive
pub const STREAK_MAX_GAP_DAYS: i64 = 3;

/// Distinct days with at least one logged entry
pub fn workout_days(log: &[LogEntry]) -> BTreeSet<NaiveDate> {
    log.iter().map(|e| e.date).collect()
}

/// Whole days from `earlier` to `later`
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Days since the most recent workout, `None` for an empty log
pub fn days_since_last_workout(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> Option<i64> {
    days.iter().next_back().map(|last| days_between(*last, today))
}

/// Gap-tolerant streak ending at the most recent workout day
///
/// Zero when the most recent workout is more than three days old.
pub fn streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    match days_since_last_workout(days, today) {
        None => return 0,
        Some(since) if since > STREAK_MAX_GAP_DAYS => return 0,
        Some(_) => {}
    }

    let mut count = 1;
    let mut newest_first = days.iter().rev();
    let mut later = match newest_first.next() {
        Some(day) => *day,
        None => return 0,
    };

    for earlier in newest_first {
        if days_between(*earlier, later) > STREAK_MAX_GAP_DAYS {
            break;
        }
        count += 1;
        later = *earlier;
    }

    count
}

/// True two or three days after the last workout, before the streak lapses
pub fn streak_at_risk(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> bool {
    matches!(days_since_last_workout(days, today), Some(2..=STREAK_MAX_GAP_DAYS))
}

/// Sunday that starts the week containing `today`
pub fn start_of_week(today: NaiveDate) -> NaiveDate {
    today - Duration::days(today.weekday().num_days_from_sunday() as i64)
}

/// Distinct workout days since the most recent Sunday (raw, uncapped)
pub fn weekly_count(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    days.range(start_of_week(today)..).count() as u32
}

/// Distinct calendar days present in the log
pub fn total_workouts(days: &BTreeSet<NaiveDate>) -> u32 {
    days.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn days_ago(today: NaiveDate, offsets: &[i64]) -> BTreeSet<NaiveDate> {
        offsets
            .iter()
            .map(|o| today - Duration::days(*o))
            .collect()
    }

    #[test]
    fn test_streak_tolerates_gaps_up_to_three_days() {
        let today = day(2024, 3, 20);
        // Gaps of 2 and 3 days
        assert_eq!(streak(&days_ago(today, &[0, 2, 5]), today), 3);
    }

    #[test]
    fn test_streak_breaks_at_first_large_gap() {
        let today = day(2024, 3, 20);
        // D-10 is 5 days before D-5
        assert_eq!(streak(&days_ago(today, &[0, 2, 5, 10]), today), 3);
    }

    #[test]
    fn test_streak_zero_after_lapse() {
        let today = day(2024, 3, 20);
        assert_eq!(streak(&days_ago(today, &[4, 5, 6]), today), 0);
        assert_eq!(streak(&days_ago(today, &[3, 5]), today), 2);
    }

    #[test]
    fn test_streak_empty_log() {
        assert_eq!(streak(&BTreeSet::new(), day(2024, 3, 20)), 0);
    }

    #[test]
    fn test_streak_counts_days_not_entries() {
        let today = day(2024, 3, 20);
        let days: BTreeSet<_> = [today, today, today - Duration::days(1)]
            .into_iter()
            .collect();
        assert_eq!(streak(&days, today), 2);
    }

    #[test]
    fn test_streak_at_risk_window() {
        let today = day(2024, 3, 20);
        assert!(!streak_at_risk(&days_ago(today, &[1]), today));
        assert!(streak_at_risk(&days_ago(today, &[2]), today));
        assert!(streak_at_risk(&days_ago(today, &[3]), today));
        assert!(!streak_at_risk(&days_ago(today, &[4]), today));
        assert!(!streak_at_risk(&BTreeSet::new(), today));
    }

    #[test]
    fn test_start_of_week_is_sunday() {
        // 2024-03-20 is a Wednesday
        assert_eq!(start_of_week(day(2024, 3, 20)), day(2024, 3, 17));
        assert_eq!(start_of_week(day(2024, 3, 17)), day(2024, 3, 17));
        assert_eq!(start_of_week(day(2024, 3, 23)), day(2024, 3, 17));
    }

    #[test]
    fn test_weekly_count_excludes_last_week() {
        let today = day(2024, 3, 20); // Wednesday
        let days: BTreeSet<_> = [
            day(2024, 3, 17), // Sunday
            day(2024, 3, 19), // Tuesday
            day(2024, 3, 16), // last Saturday
        ]
        .into_iter()
        .collect();
        assert_eq!(weekly_count(&days, today), 2);
    }

    #[test]
    fn test_weekly_count_is_uncapped() {
        let today = day(2024, 3, 23); // Saturday
        let days = days_ago(today, &[0, 1, 2, 3, 4]);
        assert_eq!(weekly_count(&days, today), 5);
    }

    #[test]
    fn test_total_workouts_distinct_days() {
        let days = days_ago(day(2024, 3, 20), &[0, 0, 1, 30]);
        assert_eq!(total_workouts(&days), 3);
    }
}
