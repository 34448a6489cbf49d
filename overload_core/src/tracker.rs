//! Application controller.
//!
//! [`Tracker`] owns everything the UI reads: exercise values, the full log,
//! queued value updates, the sync indicator and the active session. The
//! persistence gateway is injected, so tests run against
//! [`crate::gateway::MemoryGateway`].
//!
//! In-memory state is applied optimistically and stays the source of truth
//! for the process; a failed write only flips the sync indicator.

use crate::dashboard::{self, DashboardView, HistoryDay, ProgressSeries};
use crate::dates;
use crate::gateway::Gateway;
use crate::session::{LevelUp, Session, Step, Undo};
use crate::view::{self, ExerciseView, SessionCursor};
use crate::{Catalog, Error, ExerciseValues, LogEntry, Result, SyncStatus, ValueUpdate};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Tracker behaviour switches, usually taken from [`crate::Config`]
#[derive(Clone, Debug)]
pub struct TrackerOptions {
    pub save_on_progression: bool,
    pub weekly_goal: u32,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            save_on_progression: false,
            weekly_goal: 3,
        }
    }
}

impl From<&crate::Config> for TrackerOptions {
    fn from(config: &crate::Config) -> Self {
        Self {
            save_on_progression: config.sync.save_on_progression,
            weekly_goal: config.goals.weekly_goal,
        }
    }
}

/// How the end-of-workout save went
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum FlushOutcome {
    Saved,
    Failed(String),
}

impl FlushOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, FlushOutcome::Saved)
    }
}

/// Shown when the last exercise has been passed
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CompletionSummary {
    pub session_id: Uuid,
    pub exercises_completed: usize,
    pub progressions: usize,
    pub streak: u32,
    pub elapsed: String,
    pub flush: FlushOutcome,
}

/// What a user action led to
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// No session, or the action is not valid right now
    Ignored,
    /// Showing the next exercise
    Advanced,
    /// Waiting for the level-up to be acknowledged
    LevelUp(LevelUp),
    /// Workout finished and flushed
    Completed(CompletionSummary),
}

struct ActiveSession {
    session: Session,
    /// Set once the session entries reached the store
    entries_flushed: bool,
    /// Result of the most recent flush attempt
    flush: Option<FlushOutcome>,
    /// Stored value of each logged exercise before its entry, in log order
    prior_values: Vec<Option<f64>>,
}

pub struct Tracker<G: Gateway> {
    catalog: Catalog,
    gateway: G,
    options: TrackerOptions,
    values: ExerciseValues,
    /// Values the store is known to hold
    confirmed: ExerciseValues,
    log: Vec<LogEntry>,
    pending: BTreeMap<String, f64>,
    sync: SyncStatus,
    active: Option<ActiveSession>,
}

impl<G: Gateway> Tracker<G> {
    /// Build a tracker with catalog defaults; call [`Tracker::load`] next
    pub fn new(catalog: Catalog, gateway: G, options: TrackerOptions) -> Self {
        Self {
            catalog,
            gateway,
            options,
            values: ExerciseValues::default(),
            confirmed: ExerciseValues::default(),
            log: Vec::new(),
            pending: BTreeMap::new(),
            sync: SyncStatus::Synced,
            active: None,
        }
    }

    /// Fetch values and log from the store
    ///
    /// On failure the tracker falls back to catalog defaults with an empty
    /// log and the error is returned for display.
    pub fn load(&mut self) -> Result<()> {
        self.sync = SyncStatus::Syncing;
        match self.gateway.load_all() {
            Ok(snapshot) => {
                self.values = snapshot.exercise_values;
                self.confirmed = self.values.clone();
                self.log = snapshot.log;
                self.backfill_new_values();
                // Queued updates from before a reload still apply
                for (id, value) in &self.pending {
                    self.values.set(id.clone(), *value);
                }
                self.sync = SyncStatus::Synced;
                tracing::info!(
                    "Tracker loaded {} values, {} entries",
                    self.values.len(),
                    self.log.len()
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Load failed, using catalog defaults: {}", e);
                self.values = ExerciseValues::default();
                self.confirmed = ExerciseValues::default();
                self.log.clear();
                self.sync = SyncStatus::Error;
                Err(e)
            }
        }
    }

    /// Stores that only keep the progressed flag get `new_value` rebuilt
    fn backfill_new_values(&mut self) {
        for entry in self.log.iter_mut().filter(|e| e.progressed && e.new_value.is_none()) {
            if let Some(ex) = self.catalog.get(&entry.exercise_id) {
                entry.new_value = Some(entry.value + ex.increment);
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn values(&self) -> &ExerciseValues {
        &self.values
    }

    /// Value in effect for an exercise id
    pub fn current_value(&self, exercise_id: &str) -> Option<f64> {
        self.catalog
            .get(exercise_id)
            .map(|ex| self.values.current(ex))
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn pending_updates(&self) -> Vec<ValueUpdate> {
        self.pending
            .iter()
            .map(|(id, value)| ValueUpdate {
                exercise_id: id.clone(),
                new_value: *value,
            })
            .collect()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// Outcome of the active session's last flush, if it attempted one
    pub fn last_flush(&self) -> Option<&FlushOutcome> {
        self.active.as_ref().and_then(|a| a.flush.as_ref())
    }

    // ------------------------------------------------------------------
    // Session actions
    // ------------------------------------------------------------------

    /// Start (or restart) a workout
    pub fn start(&mut self, now: DateTime<Local>) -> &Session {
        if let Some(previous) = &self.active {
            if !previous.session.is_complete() && !previous.session.log().is_empty() {
                tracing::warn!(
                    session = %previous.session.id(),
                    "Abandoning unfinished session with {} unsaved entries",
                    previous.session.log().len()
                );
            }
        }

        let session = Session::start(
            &self.catalog,
            &self.log,
            now.date_naive(),
            now.with_timezone(&Utc),
        );
        let active = self.active.insert(ActiveSession {
            session,
            entries_flushed: false,
            flush: None,
            prior_values: Vec::new(),
        });
        &active.session
    }

    pub fn adjust_reps(&mut self, delta: i64) {
        if let Some(active) = self.active.as_mut() {
            active.session.adjust_reps(delta);
        }
    }

    pub fn set_reps(&mut self, reps: u32) {
        if let Some(active) = self.active.as_mut() {
            active.session.set_reps(reps);
        }
    }

    pub fn adjust_date(&mut self, days: i64) {
        if let Some(active) = self.active.as_mut() {
            active.session.adjust_date(days);
        }
    }

    /// Log the current exercise with optional notes
    pub fn log_current(&mut self, notes: &str, now: DateTime<Local>) -> Outcome {
        let Some(active) = self.active.as_mut() else {
            return Outcome::Ignored;
        };
        let prior = self
            .catalog
            .at(active.session.exercise_index())
            .and_then(|ex| self.values.get(&ex.id));
        let Some(logged) =
            active
                .session
                .log_set(&self.catalog, &mut self.values, notes, now.with_timezone(&Utc))
        else {
            return Outcome::Ignored;
        };
        active.prior_values.push(prior);

        self.log.push(logged.entry.clone());

        if let Some(new_value) = logged.entry.new_value {
            self.pending.insert(logged.entry.exercise_id.clone(), new_value);
            if self.options.save_on_progression {
                self.save_value_now(&logged.entry.exercise_id, new_value);
            }
        }

        self.after_step(logged.step, now)
    }

    /// Dismiss the level-up notification
    pub fn acknowledge_level_up(&mut self, now: DateTime<Local>) -> Outcome {
        let step = match self.active.as_mut() {
            Some(active) => active.session.acknowledge(&self.catalog),
            None => Step::Ignored,
        };
        self.after_step(step, now)
    }

    pub fn skip(&mut self, now: DateTime<Local>) -> Outcome {
        let step = match self.active.as_mut() {
            Some(active) => active.session.skip(&self.catalog),
            None => Step::Ignored,
        };
        self.after_step(step, now)
    }

    /// Undo the last logged set or re-open the last skipped exercise
    ///
    /// Returns false when there was nothing to go back to.
    pub fn back(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        match active.session.back(&self.catalog) {
            Undo::Ignored => false,
            Undo::Stepped => true,
            Undo::Removed(entry) => {
                let prior = active.prior_values.pop().flatten();
                if let Some(pos) = self.log.iter().rposition(|e| *e == entry) {
                    self.log.remove(pos);
                }
                if entry.progressed {
                    self.revert_progression(&entry, prior);
                }
                true
            }
        }
    }

    fn revert_progression(&mut self, entry: &LogEntry, prior: Option<f64>) {
        let Some(exercise) = self.catalog.get(&entry.exercise_id) else {
            return;
        };
        match prior {
            Some(value) => self.values.set(exercise.id.clone(), value),
            None => {
                self.values.remove(&exercise.id);
            }
        }

        // Only queue a write if the store holds something else by now
        if self.confirmed.current(exercise) == entry.value {
            self.pending.remove(&exercise.id);
        } else {
            self.pending.insert(exercise.id.clone(), entry.value);
        }
        tracing::info!(
            "Reverted progression for {} to {}",
            exercise.id,
            entry.value
        );
    }

    fn after_step(&mut self, step: Step, now: DateTime<Local>) -> Outcome {
        match step {
            Step::Ignored => Outcome::Ignored,
            Step::Advanced => Outcome::Advanced,
            Step::LevelUp(level_up) => Outcome::LevelUp(level_up),
            Step::Completed => {
                let flush = self.flush();
                Outcome::Completed(self.summary(flush, now))
            }
        }
    }

    fn summary(&self, flush: FlushOutcome, now: DateTime<Local>) -> CompletionSummary {
        let (session_id, entries, started_at) = match &self.active {
            Some(active) => (
                active.session.id(),
                active.session.log(),
                active.session.started_at(),
            ),
            None => (Uuid::nil(), &[][..], now.with_timezone(&Utc)),
        };

        CompletionSummary {
            session_id,
            exercises_completed: entries.len(),
            progressions: entries.iter().filter(|e| e.progressed).count(),
            streak: dates::streak(&dates::workout_days(&self.log), now.date_naive()),
            elapsed: view::format_elapsed(started_at, now.with_timezone(&Utc)),
            flush,
        }
    }

    /// End the session and return to the dashboard
    ///
    /// A session that never completed is flushed now; one whose completion
    /// flush failed gets one more attempt. The session ends either way.
    pub fn finish(&mut self) -> Option<FlushOutcome> {
        let needs_flush = match &self.active {
            None => return None,
            Some(active) => match &active.flush {
                None => !active.session.log().is_empty() || !self.pending.is_empty(),
                Some(FlushOutcome::Failed(_)) => true,
                Some(FlushOutcome::Saved) => false,
            },
        };

        let outcome = if needs_flush {
            Some(self.flush())
        } else {
            self.active.as_ref().and_then(|a| a.flush.clone())
        };

        if let Some(active) = self.active.take() {
            tracing::info!(session = %active.session.id(), "Session finished");
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn save_value_now(&mut self, exercise_id: &str, new_value: f64) {
        self.sync = SyncStatus::Syncing;
        match self.gateway.save_value(exercise_id, new_value) {
            Ok(()) => {
                self.confirmed.set(exercise_id, new_value);
                self.pending.remove(exercise_id);
                self.sync = SyncStatus::Synced;
            }
            Err(e) => {
                tracing::warn!("Saving {} failed, kept queued: {}", exercise_id, e);
                self.sync = SyncStatus::Error;
            }
        }
    }

    /// Write the session entries, then every queued value update
    fn flush(&mut self) -> FlushOutcome {
        self.sync = SyncStatus::Syncing;

        let result = flush_into(
            &mut self.gateway,
            self.active.as_mut(),
            &mut self.pending,
            &mut self.confirmed,
        );

        let outcome = match result {
            Ok(()) => {
                self.sync = SyncStatus::Synced;
                FlushOutcome::Saved
            }
            Err(e) => {
                tracing::warn!("Workout save failed: {}", e);
                self.sync = SyncStatus::Error;
                FlushOutcome::Failed(e.to_string())
            }
        };

        if let Some(active) = self.active.as_mut() {
            active.flush = Some(outcome.clone());
        }
        outcome
    }

    // ------------------------------------------------------------------
    // View models
    // ------------------------------------------------------------------

    /// The exercise on screen, if a session is showing one
    pub fn exercise_view(&self, now: DateTime<Local>) -> Option<ExerciseView> {
        let session = &self.active.as_ref()?.session;
        let exercise = self.catalog.at(session.exercise_index())?;

        Some(view::exercise_view(
            exercise,
            self.values.current(exercise),
            SessionCursor {
                index: session.exercise_index(),
                total: self.catalog.len(),
                reps: session.reps(),
                back_enabled: session.back_enabled(),
                workout_date: session.workout_date(),
                started_at: session.started_at(),
            },
            now.with_timezone(&Utc),
        ))
    }

    pub fn dashboard(&self, today: NaiveDate) -> DashboardView {
        dashboard::dashboard(
            &self.catalog,
            &self.values,
            &self.log,
            today,
            self.options.weekly_goal,
        )
    }

    pub fn history(&self, today: NaiveDate) -> Vec<HistoryDay> {
        dashboard::history(&self.catalog, &self.log, today)
    }

    pub fn progress(&self) -> Vec<ProgressSeries> {
        dashboard::progress(&self.catalog, &self.values, &self.log)
    }
}

fn flush_into<G: Gateway>(
    gateway: &mut G,
    active: Option<&mut ActiveSession>,
    pending: &mut BTreeMap<String, f64>,
    confirmed: &mut ExerciseValues,
) -> Result<()> {
    if let Some(active) = active {
        if !active.entries_flushed && !active.session.log().is_empty() {
            gateway.append_log_entries(active.session.log())?;
            active.entries_flushed = true;
        }
    }

    if pending.is_empty() {
        return Ok(());
    }

    let updates: Vec<ValueUpdate> = pending
        .iter()
        .map(|(id, value)| ValueUpdate {
            exercise_id: id.clone(),
            new_value: *value,
        })
        .collect();

    gateway
        .batch_update_values(&updates)
        .map_err(|e| match e {
            Error::Save(_) => e,
            other => Error::Save(other.to_string()),
        })?;

    for update in updates {
        confirmed.set(update.exercise_id, update.new_value);
    }
    pending.clear();
    Ok(())
}
