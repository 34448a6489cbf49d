//! File-backed gateway under the data directory.
//!
//! Layout:
//! - `<data_dir>/wal/log.wal`: JSONL log entries
//! - `<data_dir>/wal/exercises.json`: current value per exercise

use crate::gateway::Gateway;
use crate::wal::{self, EntrySink, JsonlSink};
use crate::{Error, ExerciseValues, LogEntry, Result, Snapshot, ValueUpdate};
use std::path::{Path, PathBuf};

/// Gateway over the local JSONL log and values file
pub struct LocalGateway {
    log_path: PathBuf,
    values_path: PathBuf,
}

impl LocalGateway {
    pub fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            log_path: wal_dir.join("log.wal"),
            values_path: wal_dir.join("exercises.json"),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn values_path(&self) -> &Path {
        &self.values_path
    }
}

/// Tag write failures as save errors, keeping the cause
fn save_err(e: Error) -> Error {
    match e {
        Error::Save(_) => e,
        other => Error::Save(other.to_string()),
    }
}

impl Gateway for LocalGateway {
    fn load_all(&mut self) -> Result<Snapshot> {
        let exercise_values = ExerciseValues::load(&self.values_path)?;
        let log = wal::read_entries(&self.log_path)
            .map_err(|e| Error::Load(format!("reading {:?}: {}", self.log_path, e)))?;

        tracing::info!(
            "Loaded {} values and {} log entries from {:?}",
            exercise_values.len(),
            log.len(),
            self.log_path.parent().unwrap_or(&self.log_path)
        );

        Ok(Snapshot {
            exercise_values,
            log,
        })
    }

    fn save_value(&mut self, exercise_id: &str, new_value: f64) -> Result<()> {
        ExerciseValues::update(&self.values_path, |values| {
            values.set(exercise_id, new_value)
        })
        .map_err(save_err)?;
        Ok(())
    }

    fn append_log_entries(&mut self, entries: &[LogEntry]) -> Result<()> {
        JsonlSink::new(&self.log_path)
            .append(entries)
            .map_err(save_err)
    }

    fn batch_update_values(&mut self, updates: &[ValueUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        ExerciseValues::update(&self.values_path, |values| {
            for update in updates {
                values.set(update.exercise_id.clone(), update.new_value);
            }
        })
        .map_err(save_err)?;
        tracing::debug!("Wrote {} value updates", updates.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn entry(exercise_id: &str, progressed: bool) -> LogEntry {
        LogEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            timestamp: Utc::now(),
            exercise_id: exercise_id.into(),
            value: 45.0,
            reps: if progressed { 20 } else { 15 },
            notes: "felt good".into(),
            progressed,
            new_value: progressed.then_some(50.0),
        }
    }

    #[test]
    fn test_fresh_directory_loads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut gateway = LocalGateway::new(temp_dir.path());

        let snapshot = gateway.load_all().unwrap();
        assert!(snapshot.exercise_values.is_empty());
        assert!(snapshot.log.is_empty());
    }

    #[test]
    fn test_writes_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();

        {
            let mut gateway = LocalGateway::new(temp_dir.path());
            gateway
                .append_log_entries(&[entry("db_rows", true), entry("curls", false)])
                .unwrap();
            gateway
                .batch_update_values(&[ValueUpdate {
                    exercise_id: "db_rows".into(),
                    new_value: 50.0,
                }])
                .unwrap();
            gateway.save_value("dips", 5.0).unwrap();
        }

        let mut reopened = LocalGateway::new(temp_dir.path());
        let snapshot = reopened.load_all().unwrap();
        assert_eq!(snapshot.log.len(), 2);
        assert_eq!(snapshot.log[0].new_value, Some(50.0));
        assert_eq!(snapshot.exercise_values.get("db_rows"), Some(50.0));
        assert_eq!(snapshot.exercise_values.get("dips"), Some(5.0));
    }

    #[test]
    fn test_corrupt_values_file_is_load_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut gateway = LocalGateway::new(temp_dir.path());
        std::fs::create_dir_all(gateway.values_path().parent().unwrap()).unwrap();
        std::fs::write(gateway.values_path(), "not json").unwrap();

        assert!(matches!(gateway.load_all(), Err(Error::Load(_))));
    }

    #[test]
    fn test_write_failure_is_save_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A file where the wal directory should be makes every write fail
        std::fs::write(temp_dir.path().join("wal"), "blocker").unwrap();
        let mut gateway = LocalGateway::new(temp_dir.path());

        assert!(matches!(
            gateway.append_log_entries(&[entry("squats", false)]),
            Err(Error::Save(_))
        ));
        assert!(matches!(
            gateway.save_value("squats", 140.0),
            Err(Error::Save(_))
        ));
    }
}
