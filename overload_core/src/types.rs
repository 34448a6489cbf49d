//! Core domain types for the Overload workout tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise definitions and the ordered catalog
//! - Current exercise values (the progression state)
//! - Log entries and batched value updates
//! - Sync status reported to the UI

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Exercise Types
// ============================================================================

/// How an exercise is performed and displayed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    /// Warm-up measured in distance (e.g. rower meters)
    WarmupDistance,
    /// Warm-up measured in a fixed rep count
    WarmupReps,
    /// Loaded movement, value is the working weight
    Weighted,
    /// Bodyweight movement, value is the added weight
    Bodyweight,
}

impl ExerciseKind {
    /// Warm-ups log their stored value as the rep count
    pub fn is_warmup(&self) -> bool {
        matches!(self, ExerciseKind::WarmupDistance | ExerciseKind::WarmupReps)
    }

    /// Kinds whose value counts as "weight added" on the dashboard
    pub fn tracks_weight(&self) -> bool {
        matches!(self, ExerciseKind::Weighted | ExerciseKind::Bodyweight)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExerciseKind::WarmupDistance | ExerciseKind::WarmupReps => "Warm-up",
            ExerciseKind::Weighted => "Weighted",
            ExerciseKind::Bodyweight => "Bodyweight",
        }
    }
}

/// An exercise definition (e.g., "Squats, start at 135 lbs, +5 at 20 reps")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    pub kind: ExerciseKind,
    pub start_value: f64,
    pub increment: f64,
    pub unit: String,
    /// Rep count that triggers progression; `None` never progresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reps: Option<u32>,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The ordered list of exercises making up one workout
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: Vec<ExerciseDefinition>,
}

// ============================================================================
// Progression State
// ============================================================================

/// Current value per exercise id (weight, rep target, or distance)
///
/// Missing ids resolve to the catalog's `start_value`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ExerciseValues(pub HashMap<String, f64>);

impl ExerciseValues {
    /// Value in effect for an exercise, falling back to its start value
    pub fn current(&self, exercise: &ExerciseDefinition) -> f64 {
        self.0
            .get(&exercise.id)
            .copied()
            .unwrap_or(exercise.start_value)
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied()
    }

    pub fn set(&mut self, id: impl Into<String>, value: f64) {
        self.0.insert(id.into(), value);
    }

    /// Drop the stored value so the exercise reads as its start value again
    pub fn remove(&mut self, id: &str) -> Option<f64> {
        self.0.remove(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// One performed set
///
/// `value` is the exercise value in effect when the set was logged, before
/// any progression it triggered. `new_value` is set iff `progressed`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub exercise_id: String,
    pub value: f64,
    pub reps: u32,
    #[serde(default)]
    pub notes: String,
    pub progressed: bool,
    #[serde(default)]
    pub new_value: Option<f64>,
}

/// A single exercise value write, as sent in a batch update
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValueUpdate {
    pub exercise_id: String,
    pub new_value: f64,
}

/// Everything the store holds, as returned by a full load
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub exercise_values: ExerciseValues,
    pub log: Vec<LogEntry>,
}

/// Sync indicator shown next to every view
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Syncing,
    #[default]
    Synced,
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syncing => write!(f, "syncing"),
            Self::Synced => write!(f, "synced"),
            Self::Error => write!(f, "error"),
        }
    }
}
