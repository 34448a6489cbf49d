//! Append-only JSONL log of workout entries.
//!
//! Entries are appended to a JSON Lines file with file locking
//! to ensure safe concurrent access.

use crate::{LogEntry, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Entry sink trait for persisting log entries
pub trait EntrySink {
    fn append(&mut self, entries: &[LogEntry]) -> Result<()>;
}

/// JSONL-based entry sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl EntrySink for JsonlSink {
    fn append(&mut self, entries: &[LogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // One exclusive lock for the whole batch so rows stay contiguous
        file.lock_exclusive()?;
        let torn = ends_mid_line(&file)?;

        let mut writer = std::io::BufWriter::new(&file);
        if torn {
            tracing::warn!("Terminating partial line in {:?}", self.path);
            writer.write_all(b"\n")?;
        }
        for entry in entries {
            let line = serde_json::to_string(entry)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        drop(writer);

        file.sync_all()?;
        file.unlock()?;

        tracing::debug!("Appended {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

/// True if the file's last byte is not a newline (an interrupted write)
fn ends_mid_line(mut file: &File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Read all entries from a JSONL log file
///
/// Malformed lines are skipped with a warning.
pub fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse log entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from {:?}", entries.len(), path);
    Ok(entries)
}
