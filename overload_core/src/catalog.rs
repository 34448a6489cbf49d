//! Default catalog of exercises.
//!
//! The order of the catalog is the order of a workout.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(
    id: &str,
    name: &str,
    kind: ExerciseKind,
    start_value: f64,
    increment: f64,
    unit: &str,
    target_reps: Option<u32>,
) -> ExerciseDefinition {
    ExerciseDefinition {
        id: id.into(),
        name: name.into(),
        kind,
        start_value,
        increment,
        unit: unit.into(),
        target_reps,
    }
}

/// Builds the default catalog: two warm-ups, then the main lifts
pub fn build_default_catalog() -> Catalog {
    use ExerciseKind::*;

    Catalog {
        exercises: vec![
            // Warm-ups
            exercise("rower", "Rower", WarmupDistance, 500.0, 20.0, "m", None),
            exercise("pushups", "Pushups", WarmupReps, 25.0, 2.0, "reps", None),
            exercise("ab_wheel", "Ab Wheel", WarmupReps, 20.0, 5.0, "reps", Some(20)),
            // Main lifts
            exercise("squats", "Squats", Weighted, 135.0, 5.0, "lbs", Some(20)),
            exercise("military_press", "Military Press", Weighted, 45.0, 5.0, "lbs", Some(20)),
            exercise("bench_press", "Bench Press", Weighted, 135.0, 5.0, "lbs", Some(20)),
            exercise("db_rows", "DB Rows", Weighted, 45.0, 5.0, "lbs", Some(20)),
            exercise("pullups", "Pull-ups", Bodyweight, 0.0, 5.0, "lbs", Some(20)),
            exercise("dips", "Dips", Bodyweight, 0.0, 5.0, "lbs", Some(20)),
            exercise("curls", "EZ Bar Curls", Weighted, 50.0, 5.0, "lbs", Some(20)),
        ],
    }
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Exercise at a workout position
    pub fn at(&self, index: usize) -> Option<&ExerciseDefinition> {
        self.exercises.get(index)
    }

    pub fn get(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.exercises.iter().find(|e| e.id == id)
    }

    /// Workout position of an exercise id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.exercises.iter().position(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExerciseDefinition> {
        self.exercises.iter()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of human-readable problems; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        if self.exercises.is_empty() {
            errors.push("Catalog has no exercises".to_string());
        }

        for ex in &self.exercises {
            if ex.id.is_empty() {
                errors.push(format!("Exercise '{}' has empty id", ex.name));
            }
            if !seen.insert(ex.id.as_str()) {
                errors.push(format!("Duplicate exercise id '{}'", ex.id));
            }
            if ex.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", ex.id));
            }
            if !ex.start_value.is_finite() || ex.start_value < 0.0 {
                errors.push(format!(
                    "Exercise '{}': start value {} must be a non-negative number",
                    ex.id, ex.start_value
                ));
            }
            if !ex.increment.is_finite() || ex.increment <= 0.0 {
                errors.push(format!(
                    "Exercise '{}': increment {} must be positive",
                    ex.id, ex.increment
                ));
            }
            if ex.target_reps == Some(0) {
                errors.push(format!("Exercise '{}': target reps must be > 0", ex.id));
            }
        }

        errors
    }
}
