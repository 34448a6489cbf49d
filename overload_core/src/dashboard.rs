//! Dashboard, history and progress aggregates derived from the log.

use crate::dates;
use crate::view::format_value;
use crate::{Catalog, ExerciseValues, LogEntry};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Days shown in the rolling calendar, today included
pub const CALENDAR_DAYS: i64 = 35;

/// Progression events shown on the dashboard
pub const RECENT_GAINS: usize = 5;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Gain {
    pub exercise_id: String,
    pub name: String,
    /// Value reached by the progression
    pub value_text: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub active: bool,
    pub today: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DashboardView {
    pub streak: u32,
    pub streak_at_risk: bool,
    /// Raw count; `weekly_dots` caps it at the goal for display
    pub weekly_count: u32,
    pub weekly_goal: u32,
    pub weekly_dots: Vec<bool>,
    pub total_weight_added: f64,
    pub total_workouts: u32,
    pub recent_gains: Vec<Gain>,
    pub calendar: Vec<CalendarDay>,
    pub start_label: &'static str,
}

/// Net weight added across weighted and bodyweight exercises
pub fn total_weight_added(catalog: &Catalog, values: &ExerciseValues) -> f64 {
    catalog
        .iter()
        .filter(|ex| ex.kind.tracks_weight())
        .map(|ex| values.current(ex) - ex.start_value)
        .sum()
}

/// Most recent progressions, newest first
pub fn recent_gains(catalog: &Catalog, log: &[LogEntry], limit: usize) -> Vec<Gain> {
    log.iter()
        .filter(|entry| entry.progressed)
        .rev()
        .filter_map(|entry| {
            let exercise = catalog.get(&entry.exercise_id)?;
            Some(Gain {
                exercise_id: exercise.id.clone(),
                name: exercise.name.clone(),
                value_text: format_value(entry.new_value.unwrap_or(entry.value), exercise),
            })
        })
        .take(limit)
        .collect()
}

/// Rolling calendar ending today, oldest first
pub fn calendar(log: &[LogEntry], today: NaiveDate) -> Vec<CalendarDay> {
    let days = dates::workout_days(log);
    (0..CALENDAR_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            CalendarDay {
                date,
                active: days.contains(&date),
                today: offset == 0,
            }
        })
        .collect()
}

/// Label for the start button
///
/// A partially logged day resumes rather than starting over.
pub fn start_label(catalog: &Catalog, log: &[LogEntry], today: NaiveDate) -> &'static str {
    let logged_today = log.iter().filter(|e| e.date == today).count();
    if logged_today > 0 && logged_today < catalog.len() {
        "CONTINUE WORKOUT"
    } else {
        "START WORKOUT"
    }
}

pub fn dashboard(
    catalog: &Catalog,
    values: &ExerciseValues,
    log: &[LogEntry],
    today: NaiveDate,
    weekly_goal: u32,
) -> DashboardView {
    let days = dates::workout_days(log);
    let weekly_count = dates::weekly_count(&days, today);

    DashboardView {
        streak: dates::streak(&days, today),
        streak_at_risk: dates::streak_at_risk(&days, today),
        weekly_count,
        weekly_goal,
        weekly_dots: (0..weekly_goal).map(|i| i < weekly_count).collect(),
        total_weight_added: total_weight_added(catalog, values),
        total_workouts: dates::total_workouts(&days),
        recent_gains: recent_gains(catalog, log, RECENT_GAINS),
        calendar: calendar(log, today),
        start_label: start_label(catalog, log, today),
    }
}

// ============================================================================
// History
// ============================================================================

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HistoryEntry {
    pub exercise_id: String,
    pub name: String,
    pub value_text: String,
    pub reps: u32,
    pub progressed: bool,
    pub notes: String,
}

impl HistoryEntry {
    /// `135 lbs × 20 ✓`
    pub fn summary(&self) -> String {
        format!(
            "{} × {}{}",
            self.value_text,
            self.reps,
            if self.progressed { " ✓" } else { "" }
        )
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub label: String,
    pub progressions: usize,
    pub entries: Vec<HistoryEntry>,
}

/// `Today`, `Yesterday`, else `Wed, Mar 20`
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if date == today - Duration::days(1) {
        "Yesterday".to_string()
    } else {
        date.format("%a, %b %-d").to_string()
    }
}

/// Log grouped by day, newest day first, entries in logged order
pub fn history(catalog: &Catalog, log: &[LogEntry], today: NaiveDate) -> Vec<HistoryDay> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&LogEntry>> = BTreeMap::new();
    for entry in log {
        by_date.entry(entry.date).or_default().push(entry);
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, entries)| HistoryDay {
            date,
            label: day_label(date, today),
            progressions: entries.iter().filter(|e| e.progressed).count(),
            entries: entries
                .into_iter()
                .map(|e| {
                    let exercise = catalog.get(&e.exercise_id);
                    HistoryEntry {
                        exercise_id: e.exercise_id.clone(),
                        name: exercise
                            .map(|ex| ex.name.clone())
                            .unwrap_or_else(|| e.exercise_id.clone()),
                        value_text: exercise
                            .map(|ex| format_value(e.value, ex))
                            .unwrap_or_else(|| e.value.to_string()),
                        reps: e.reps,
                        progressed: e.progressed,
                        notes: e.notes.clone(),
                    }
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// Progress
// ============================================================================

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProgressSeries {
    pub exercise_id: String,
    pub name: String,
    pub current_text: String,
    /// `(date, value)` in log order
    pub points: Vec<(NaiveDate, f64)>,
}

/// Value history of every weighted/bodyweight exercise that has entries
pub fn progress(catalog: &Catalog, values: &ExerciseValues, log: &[LogEntry]) -> Vec<ProgressSeries> {
    catalog
        .iter()
        .filter(|ex| ex.kind.tracks_weight())
        .filter_map(|ex| {
            let points: Vec<(NaiveDate, f64)> = log
                .iter()
                .filter(|e| e.exercise_id == ex.id)
                .map(|e| (e.date, e.value))
                .collect();
            if points.is_empty() {
                return None;
            }
            Some(ProgressSeries {
                exercise_id: ex.id.clone(),
                name: ex.name.clone(),
                current_text: format_value(values.current(ex), ex),
                points,
            })
        })
        .collect()
}
