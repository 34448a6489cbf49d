//! Display projections for the active exercise.
//!
//! Pure functions from state to strings; any front end can render them.

use crate::{ExerciseDefinition, ExerciseKind};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Human form of an exercise value
///
/// Bodyweight movements show added weight relative to bodyweight.
pub fn format_value(value: f64, exercise: &ExerciseDefinition) -> String {
    match exercise.kind {
        ExerciseKind::Bodyweight if value == 0.0 => "BW".to_string(),
        ExerciseKind::Bodyweight => format!("BW+{}", value),
        _ => format!("{} {}", value, exercise.unit),
    }
}

/// `mm:ss` since the workout started
pub fn format_elapsed(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - started_at).num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Everything shown while performing one exercise
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExerciseView {
    pub exercise_id: String,
    pub name: String,
    /// 1-based position, e.g. `4 / 10`
    pub progress: String,
    pub progress_fraction: f64,
    pub kind_label: &'static str,
    pub is_warmup: bool,
    pub value_text: String,
    pub unit_text: String,
    pub target_text: String,
    pub reps: u32,
    pub back_enabled: bool,
    pub workout_date: NaiveDate,
    pub elapsed: String,
}

/// Inputs for [`exercise_view`] that come from the session
#[derive(Clone, Copy, Debug)]
pub struct SessionCursor {
    pub index: usize,
    pub total: usize,
    pub reps: u32,
    pub back_enabled: bool,
    pub workout_date: NaiveDate,
    pub started_at: DateTime<Utc>,
}

pub fn exercise_view(
    exercise: &ExerciseDefinition,
    value: f64,
    cursor: SessionCursor,
    now: DateTime<Utc>,
) -> ExerciseView {
    let level_up_text = |target: Option<u32>| match target {
        Some(t) => format!("{} reps to level up", t),
        None => "Complete all reps".to_string(),
    };

    let (value_text, unit_text, target_text) = match exercise.kind {
        ExerciseKind::WarmupDistance => (
            value.to_string(),
            exercise.unit.clone(),
            "Row this distance".to_string(),
        ),
        ExerciseKind::WarmupReps => (
            value.to_string(),
            "reps".to_string(),
            // The stored value is the rep target for warm-ups
            match exercise.target_reps {
                Some(_) => format!("{} reps to level up", value),
                None => "Complete all reps".to_string(),
            },
        ),
        ExerciseKind::Bodyweight => (
            format_value(value, exercise),
            if value == 0.0 {
                String::new()
            } else {
                exercise.unit.clone()
            },
            level_up_text(exercise.target_reps),
        ),
        ExerciseKind::Weighted => (
            value.to_string(),
            exercise.unit.clone(),
            level_up_text(exercise.target_reps),
        ),
    };

    let position = cursor.index + 1;
    ExerciseView {
        exercise_id: exercise.id.clone(),
        name: exercise.name.to_uppercase(),
        progress: format!("{} / {}", position, cursor.total),
        progress_fraction: position as f64 / cursor.total.max(1) as f64,
        kind_label: exercise.kind.label(),
        is_warmup: exercise.kind.is_warmup(),
        value_text,
        unit_text,
        target_text,
        reps: cursor.reps,
        back_enabled: cursor.back_enabled,
        workout_date: cursor.workout_date,
        elapsed: format_elapsed(cursor.started_at, now),
    }
}
