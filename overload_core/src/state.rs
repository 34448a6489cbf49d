//! Exercise value persistence with file locking.
//!
//! This module handles saving and loading the current value of every
//! exercise with proper file locking to prevent concurrent access issues.

use crate::{Error, ExerciseValues, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl ExerciseValues {
    /// Load exercise values from a file with shared locking
    ///
    /// Returns empty values (every exercise at its start value) if the file
    /// doesn't exist. A file that exists but cannot be read or parsed is an
    /// error so callers can report the load failure.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No values file found, using catalog defaults");
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        read?;

        let values = serde_json::from_str::<ExerciseValues>(&contents).map_err(|e| {
            Error::Load(format!("Failed to parse values file {:?}: {}", path, e))
        })?;

        tracing::debug!("Loaded {} exercise values from {:?}", values.len(), path);
        Ok(values)
    }

    /// Save exercise values to a file with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Other(format!("values path {:?} missing parent", path)))?;
        std::fs::create_dir_all(parent)?;

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} exercise values to {:?}", self.len(), path);
        Ok(())
    }

    /// Load values, modify them, and save them back atomically
    ///
    /// A sidecar lock file serializes concurrent updaters so no write is
    /// lost between the load and the rename.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut ExerciseValues),
    {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock.lock_exclusive()?;

        let result = Self::load(path).and_then(|mut values| {
            f(&mut values);
            values.save(path)?;
            Ok(values)
        });

        let _ = lock.unlock();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        let mut values = ExerciseValues::default();
        values.set("squats", 145.0);
        values.set("pullups", 10.0);
        values.save(&path).unwrap();

        let loaded = ExerciseValues::load(&path).unwrap();
        assert_eq!(loaded, values);
    }

    #[test]
    fn test_file_is_plain_id_map() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        let mut values = ExerciseValues::default();
        values.set("squats", 145.0);
        values.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["squats"], 145.0);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let values = ExerciseValues::load(&temp_dir.path().join("missing.json")).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_corrupted_file_is_load_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        assert!(matches!(ExerciseValues::load(&path), Err(Error::Load(_))));
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        ExerciseValues::update(&path, |v| v.set("dips", 5.0)).unwrap();
        ExerciseValues::update(&path, |v| v.set("curls", 55.0)).unwrap();

        let loaded = ExerciseValues::load(&path).unwrap();
        assert_eq!(loaded.get("dips"), Some(5.0));
        assert_eq!(loaded.get("curls"), Some(55.0));
    }

    #[test]
    fn test_concurrent_updates_keep_every_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    ExerciseValues::update(&path, |v| v.set(format!("ex{}", i), i as f64))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = ExerciseValues::load(&path).unwrap();
        assert_eq!(loaded.len(), 8);
        assert_eq!(loaded.get("ex7"), Some(7.0));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        ExerciseValues::default().save(&path).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "exercises.json")
            .collect();
        assert!(extras.is_empty(), "Found extras: {:?}", extras);
    }
}
