//! Workout session state machine.
//!
//! A session walks the catalog in order. Each exercise is logged or
//! skipped; a progression pauses the walk until the level-up is
//! acknowledged; passing the last exercise completes the session.
//!
//! ```text
//! Active --log (no progression)--> Active (next exercise)
//! Active --log (progression)-----> LevelUp --acknowledge--> Active
//! Active --skip------------------> Active (next exercise)
//! any advance past the end ------> Complete
//! ```
//!
//! The session only owns its pointer, rep counter and session log. The
//! shared exercise values are passed in; the full log, pending updates
//! and persistence belong to [`crate::tracker::Tracker`].

use crate::progression;
use crate::view::format_value;
use crate::{Catalog, ExerciseValues, LogEntry};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// A progression waiting to be acknowledged
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LevelUp {
    pub exercise_id: String,
    pub old_value: f64,
    pub new_value: f64,
    /// `Squats: 135 lbs → 140 lbs`
    pub message: String,
}

/// Where the session is
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    /// Showing an exercise and accepting input
    Active,
    /// Logging is closed until the level-up is acknowledged
    LevelUp(LevelUp),
    /// Every exercise has been passed
    Complete,
}

/// Result of a transition that may move the exercise pointer
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// The action was not valid in the current phase
    Ignored,
    /// Now showing the next exercise
    Advanced,
    /// Paused on a progression
    LevelUp(LevelUp),
    /// Moved past the last exercise
    Completed,
}

/// A set that was written to the session log
#[derive(Clone, Debug, PartialEq)]
pub struct Logged {
    pub entry: LogEntry,
    pub step: Step,
}

/// Result of the back action
#[derive(Clone, Debug, PartialEq)]
pub enum Undo {
    Ignored,
    /// A skipped exercise was re-opened; nothing was logged for it
    Stepped,
    /// The last logged entry was removed from the session log
    Removed(LogEntry),
}

#[derive(Clone, Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    workout_date: NaiveDate,
    exercise_index: usize,
    reps: u32,
    phase: Phase,
    log: Vec<LogEntry>,
}

impl Session {
    /// Begin a session, resuming at the first exercise not yet logged on
    /// `today`; a fully logged day starts over from the top.
    pub fn start(
        catalog: &Catalog,
        full_log: &[LogEntry],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        let done_today: HashSet<&str> = full_log
            .iter()
            .filter(|e| e.date == today)
            .map(|e| e.exercise_id.as_str())
            .collect();

        let exercise_index = catalog
            .iter()
            .position(|ex| !done_today.contains(ex.id.as_str()))
            .unwrap_or(0);

        let session = Self {
            id: Uuid::new_v4(),
            started_at: now,
            workout_date: today,
            exercise_index,
            reps: 0,
            phase: if catalog.is_empty() {
                Phase::Complete
            } else {
                Phase::Active
            },
            log: Vec::new(),
        };

        tracing::info!(
            session = %session.id,
            "Starting workout at exercise {} of {}",
            exercise_index + 1,
            catalog.len()
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn workout_date(&self) -> NaiveDate {
        self.workout_date
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Entries logged in this session and not undone, oldest first
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    pub fn back_enabled(&self) -> bool {
        self.is_active() && (!self.log.is_empty() || self.exercise_index > 0)
    }

    /// `reps = max(0, reps + delta)`
    pub fn adjust_reps(&mut self, delta: i64) {
        if !self.is_active() {
            return;
        }
        self.reps = (self.reps as i64 + delta).clamp(0, u32::MAX as i64) as u32;
    }

    pub fn set_reps(&mut self, reps: u32) {
        if self.is_active() {
            self.reps = reps;
        }
    }

    /// Move the date stamped on new entries
    pub fn adjust_date(&mut self, days: i64) {
        if let Some(date) = self.workout_date.checked_add_signed(Duration::days(days)) {
            self.workout_date = date;
        }
    }

    /// Log the current exercise
    ///
    /// Returns `None` outside the `Active` phase, which is what keeps a
    /// second log from landing while a level-up is still on screen.
    pub fn log_set(
        &mut self,
        catalog: &Catalog,
        values: &mut ExerciseValues,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Option<Logged> {
        if !self.is_active() {
            tracing::debug!(session = %self.id, "Log ignored in phase {:?}", self.phase);
            return None;
        }
        let exercise = catalog.at(self.exercise_index)?;

        let outcome = progression::apply_set(exercise, values, self.reps);
        let entry = LogEntry {
            date: self.workout_date,
            timestamp: now,
            exercise_id: exercise.id.clone(),
            value: outcome.value,
            reps: outcome.reps,
            notes: notes.trim().to_string(),
            progressed: outcome.progressed(),
            new_value: outcome.new_value,
        };
        self.log.push(entry.clone());

        let step = match outcome.new_value {
            Some(new_value) => {
                let level_up = LevelUp {
                    exercise_id: exercise.id.clone(),
                    old_value: outcome.value,
                    new_value,
                    message: format!(
                        "{}: {} → {}",
                        exercise.name,
                        format_value(outcome.value, exercise),
                        format_value(new_value, exercise)
                    ),
                };
                self.phase = Phase::LevelUp(level_up.clone());
                Step::LevelUp(level_up)
            }
            None => self.advance(catalog),
        };

        Some(Logged { entry, step })
    }

    /// Dismiss a level-up and move on
    pub fn acknowledge(&mut self, catalog: &Catalog) -> Step {
        match self.phase {
            Phase::LevelUp(_) => {
                self.phase = Phase::Active;
                self.advance(catalog)
            }
            _ => Step::Ignored,
        }
    }

    /// Leave the current exercise unlogged and move on
    pub fn skip(&mut self, catalog: &Catalog) -> Step {
        if !self.is_active() {
            return Step::Ignored;
        }
        tracing::debug!(session = %self.id, "Skipping exercise {}", self.exercise_index);
        self.advance(catalog)
    }

    fn advance(&mut self, catalog: &Catalog) -> Step {
        self.exercise_index += 1;
        self.reps = 0;

        if self.exercise_index >= catalog.len() {
            self.phase = Phase::Complete;
            tracing::info!(session = %self.id, "Workout complete, {} entries", self.log.len());
            Step::Completed
        } else {
            Step::Advanced
        }
    }

    /// Undo the last logged entry, or re-open a skipped exercise
    ///
    /// The caller is responsible for removing the returned entry from the
    /// full log and reverting its progression.
    pub fn back(&mut self, catalog: &Catalog) -> Undo {
        if !self.back_enabled() {
            return Undo::Ignored;
        }

        match self.log.pop() {
            Some(entry) => {
                if let Some(index) = catalog.position(&entry.exercise_id) {
                    self.exercise_index = index;
                }
                self.reps = entry.reps;
                tracing::debug!(
                    session = %self.id,
                    "Undid {} ({} reps)",
                    entry.exercise_id,
                    entry.reps
                );
                Undo::Removed(entry)
            }
            None => {
                self.exercise_index -= 1;
                self.reps = 0;
                Undo::Stepped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_default_catalog;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 18, 0, 0).unwrap()
    }

    fn logged_today(ids: &[&str]) -> Vec<LogEntry> {
        ids.iter()
            .map(|id| LogEntry {
                date: today(),
                timestamp: now(),
                exercise_id: id.to_string(),
                value: 0.0,
                reps: 0,
                notes: String::new(),
                progressed: false,
                new_value: None,
            })
            .collect()
    }

    /// Session parked on the first main lift
    fn at_squats(catalog: &Catalog) -> Session {
        let log = logged_today(&["rower", "pushups", "ab_wheel"]);
        Session::start(catalog, &log, today(), now())
    }

    #[test]
    fn test_start_fresh_day() {
        let catalog = build_default_catalog();
        let session = Session::start(&catalog, &[], today(), now());
        assert_eq!(session.exercise_index(), 0);
        assert_eq!(session.reps(), 0);
        assert!(session.is_active());
        assert!(!session.back_enabled());
    }

    #[test]
    fn test_start_resumes_partial_day() {
        let catalog = build_default_catalog();
        // Squats done but ab wheel not: resume at the first gap
        let log = logged_today(&["rower", "pushups", "squats"]);
        let session = Session::start(&catalog, &log, today(), now());
        assert_eq!(session.exercise_index(), 2);
        assert!(session.back_enabled());
    }

    #[test]
    fn test_start_after_full_day_restarts() {
        let catalog = build_default_catalog();
        let ids: Vec<&str> = catalog.iter().map(|e| e.id.as_str()).collect();
        let session = Session::start(&catalog, &logged_today(&ids), today(), now());
        assert_eq!(session.exercise_index(), 0);
    }

    #[test]
    fn test_entries_from_other_days_do_not_resume() {
        let catalog = build_default_catalog();
        let mut log = logged_today(&["rower"]);
        log[0].date = today() - Duration::days(1);
        let session = Session::start(&catalog, &log, today(), now());
        assert_eq!(session.exercise_index(), 0);
    }

    #[test]
    fn test_adjust_reps_floors_at_zero() {
        let catalog = build_default_catalog();
        let mut session = at_squats(&catalog);
        session.adjust_reps(5);
        session.adjust_reps(-2);
        assert_eq!(session.reps(), 3);
        session.adjust_reps(-10);
        assert_eq!(session.reps(), 0);
        session.set_reps(15);
        assert_eq!(session.reps(), 15);
    }

    #[test]
    fn test_log_without_progression_advances() {
        let catalog = build_default_catalog();
        let mut values = ExerciseValues::default();
        let mut session = at_squats(&catalog);
        session.set_reps(19);

        let logged = session.log_set(&catalog, &mut values, " heavy ", now()).unwrap();
        assert_eq!(logged.step, Step::Advanced);
        assert_eq!(logged.entry.value, 135.0);
        assert_eq!(logged.entry.reps, 19);
        assert_eq!(logged.entry.notes, "heavy");
        assert!(!logged.entry.progressed);
        assert_eq!(session.exercise_index(), 4);
        assert_eq!(session.reps(), 0);
        assert_eq!(values.current(catalog.get("squats").unwrap()), 135.0);
    }

    #[test]
    fn test_log_with_progression_waits_for_ack() {
        let catalog = build_default_catalog();
        let mut values = ExerciseValues::default();
        let mut session = at_squats(&catalog);
        session.set_reps(20);

        let logged = session.log_set(&catalog, &mut values, "", now()).unwrap();
        let Step::LevelUp(level_up) = logged.step else {
            panic!("expected level-up");
        };
        assert_eq!(level_up.message, "Squats: 135 lbs → 140 lbs");
        assert_eq!(logged.entry.value, 135.0);
        assert_eq!(logged.entry.new_value, Some(140.0));
        assert_eq!(values.get("squats"), Some(140.0));

        // Pointer has not moved and further input is ignored
        assert_eq!(session.exercise_index(), 3);
        assert!(session.log_set(&catalog, &mut values, "", now()).is_none());
        assert_eq!(session.skip(&catalog), Step::Ignored);
        assert_eq!(session.back(&catalog), Undo::Ignored);
        assert_eq!(session.log().len(), 1);

        assert_eq!(session.acknowledge(&catalog), Step::Advanced);
        assert_eq!(session.exercise_index(), 4);
        assert_eq!(session.acknowledge(&catalog), Step::Ignored);
    }

    #[test]
    fn test_warmup_logs_value_not_counter() {
        let catalog = build_default_catalog();
        let mut values = ExerciseValues::default();
        let mut session = Session::start(&catalog, &[], today(), now());
        session.set_reps(3);

        let logged = session.log_set(&catalog, &mut values, "", now()).unwrap();
        assert_eq!(logged.entry.exercise_id, "rower");
        assert_eq!(logged.entry.reps, 500);
        assert_eq!(logged.step, Step::Advanced);
    }

    #[test]
    fn test_back_on_warmup_restores_logged_reps() {
        let catalog = build_default_catalog();
        let mut values = ExerciseValues::default();
        let mut session = Session::start(&catalog, &[], today(), now());
        session.log_set(&catalog, &mut values, "", now()).unwrap();

        let Undo::Removed(entry) = session.back(&catalog) else {
            panic!("expected removal");
        };
        assert_eq!(entry.exercise_id, "rower");
        assert_eq!(session.exercise_index(), 0);
        assert_eq!(session.reps(), 500);
    }

    #[test]
    fn test_skip_then_back_reopens_exercise() {
        let catalog = build_default_catalog();
        let mut session = Session::start(&catalog, &[], today(), now());
        assert_eq!(session.skip(&catalog), Step::Advanced);
        session.set_reps(4);

        assert_eq!(session.back(&catalog), Undo::Stepped);
        assert_eq!(session.exercise_index(), 0);
        assert_eq!(session.reps(), 0);
        assert_eq!(session.back(&catalog), Undo::Ignored);
    }

    #[test]
    fn test_back_restores_counter_for_counted_exercise() {
        let catalog = build_default_catalog();
        let mut values = ExerciseValues::default();
        let mut session = at_squats(&catalog);
        session.set_reps(17);
        session.log_set(&catalog, &mut values, "", now()).unwrap();
        session.skip(&catalog);

        // Pops the squats entry even though a skip came after it
        let Undo::Removed(entry) = session.back(&catalog) else {
            panic!("expected removal");
        };
        assert_eq!(entry.exercise_id, "squats");
        assert_eq!(session.exercise_index(), 3);
        assert_eq!(session.reps(), 17);
        assert!(session.log().is_empty());
    }

    #[test]
    fn test_completion_happens_once() {
        let catalog = build_default_catalog();
        let mut session = Session::start(&catalog, &[], today(), now());

        let mut completions = 0;
        for _ in 0..catalog.len() + 3 {
            if session.skip(&catalog) == Step::Completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(session.is_complete());
        assert!(!session.back_enabled());
    }

    #[test]
    fn test_adjust_date_backdates_entries() {
        let catalog = build_default_catalog();
        let mut values = ExerciseValues::default();
        let mut session = at_squats(&catalog);
        session.adjust_date(-2);
        session.set_reps(10);

        let logged = session.log_set(&catalog, &mut values, "", now()).unwrap();
        assert_eq!(logged.entry.date, today() - Duration::days(2));
    }
}
