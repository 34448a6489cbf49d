//! CSV export of the workout log.
//!
//! Columns follow the remote Log table so an export can be pasted straight
//! back into the spreadsheet.

use crate::{LogEntry, Result};
use chrono::SecondsFormat;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    date: String,
    timestamp: String,
    exercise_id: &'a str,
    value: f64,
    reps: u32,
    notes: &'a str,
    progressed: &'static str,
}

impl<'a> From<&'a LogEntry> for CsvRow<'a> {
    fn from(entry: &'a LogEntry) -> Self {
        CsvRow {
            date: entry.date.format("%Y-%m-%d").to_string(),
            timestamp: entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            exercise_id: &entry.exercise_id,
            value: entry.value,
            reps: entry.reps,
            notes: &entry.notes,
            progressed: if entry.progressed { "TRUE" } else { "FALSE" },
        }
    }
}

/// Write `entries` to `path`, replacing any existing file
///
/// The header row is written even for an empty log. Returns the number of
/// entries written.
pub fn export_log_csv(entries: &[LogEntry], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    writer.write_record([
        "date",
        "timestamp",
        "exercise_id",
        "value",
        "reps",
        "notes",
        "progressed",
    ])?;
    for entry in entries {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} log entries to {:?}", entries.len(), path);
    Ok(entries.len())
}
