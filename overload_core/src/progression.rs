//! Progression rule for raising an exercise's working value.
//!
//! One rule covers every exercise kind:
//! - Warm-ups log their stored value as the rep count
//! - Counted exercises log the session rep counter
//! - Hitting `target_reps` adds `increment` to the value

use crate::{ExerciseDefinition, ExerciseValues};

/// Result of evaluating one logged set
#[derive(Clone, Debug, PartialEq)]
pub struct SetOutcome {
    /// Value in effect when the set was performed
    pub value: f64,
    /// Reps recorded in the log entry
    pub reps: u32,
    /// Present iff progression fired
    pub new_value: Option<f64>,
}

impl SetOutcome {
    pub fn progressed(&self) -> bool {
        self.new_value.is_some()
    }
}

/// Reps recorded for a set
///
/// Warm-ups have no live counter; their stored value (distance or rep
/// target) is what gets logged.
pub fn logged_reps(exercise: &ExerciseDefinition, value: f64, counter: u32) -> u32 {
    if exercise.kind.is_warmup() {
        value.max(0.0).round() as u32
    } else {
        counter
    }
}

/// Evaluate a set without touching any state
pub fn evaluate_set(exercise: &ExerciseDefinition, value: f64, counter: u32) -> SetOutcome {
    let reps = logged_reps(exercise, value, counter);

    let new_value = match exercise.target_reps {
        Some(target) if reps >= target => Some(value + exercise.increment),
        _ => None,
    };

    SetOutcome {
        value,
        reps,
        new_value,
    }
}

/// Evaluate a set and apply any progression to `values`
pub fn apply_set(
    exercise: &ExerciseDefinition,
    values: &mut ExerciseValues,
    counter: u32,
) -> SetOutcome {
    let outcome = evaluate_set(exercise, values.current(exercise), counter);

    if let Some(new_value) = outcome.new_value {
        values.set(exercise.id.clone(), new_value);
        tracing::info!(
            "Progression for {}: {} -> {} ({} reps)",
            exercise.id,
            outcome.value,
            new_value,
            outcome.reps
        );
    } else {
        tracing::debug!(
            "No progression for {} at {} ({} reps)",
            exercise.id,
            outcome.value,
            outcome.reps
        );
    }

    outcome
}
