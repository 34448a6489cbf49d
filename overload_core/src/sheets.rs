//! Google Sheets gateway.
//!
//! Reads go through the Sheets values API; writes go through an Apps Script
//! web app that accepts `action=update|append|batchAppend|batchUpdate` as
//! query parameters and answers with JSON.
//!
//! Sheet layout:
//! - `Exercises`: column A = exercise id, column D = current value
//! - `Log`: date, timestamp, exercise id, value, reps, notes, progressed

use crate::config::SheetsConfig;
use crate::gateway::Gateway;
use crate::{Error, ExerciseValues, LogEntry, Result, Snapshot, ValueUpdate};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const EXERCISES_SHEET: &str = "Exercises";
pub const LOG_SHEET: &str = "Log";
pub const EXERCISES_RANGE: &str = "Exercises!A2:G20";
pub const EXERCISE_IDS_RANGE: &str = "Exercises!A2:A20";
pub const LOG_RANGE: &str = "Log!A2:G1000";

/// First data row of every sheet (row 1 is the header)
const FIRST_DATA_ROW: usize = 2;
const VALUE_COLUMN: &str = "D";
const VALUE_CELL_INDEX: usize = 3;

/// Body of a Sheets `values.get` response
#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

// ============================================================================
// Row codec
// ============================================================================

fn cell_str(row: &[Value], index: usize) -> String {
    match row.get(index) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "TRUE".into(),
        Some(Value::Bool(false)) => "FALSE".into(),
        _ => String::new(),
    }
}

fn cell_f64(row: &[Value], index: usize) -> Option<f64> {
    cell_str(row, index).parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whole-number prefix of a reps cell; unparsable cells count as zero
fn cell_reps(row: &[Value], index: usize) -> u32 {
    cell_f64(row, index)
        .map(|v| v.trunc().max(0.0) as u32)
        .unwrap_or(0)
}

/// Parse one `Log` row
///
/// Rows without a date are blank and yield `None`; other malformed cells
/// fall back to zero/empty values.
pub fn parse_log_row(row: &[Value]) -> Option<LogEntry> {
    let date_cell = cell_str(row, 0);
    if date_cell.is_empty() {
        return None;
    }

    let date = match NaiveDate::parse_from_str(&date_cell, "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            tracing::warn!("Skipping log row with bad date {:?}: {}", date_cell, e);
            return None;
        }
    };

    let timestamp = DateTime::parse_from_rfc3339(&cell_str(row, 1))
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());

    Some(LogEntry {
        date,
        timestamp,
        exercise_id: cell_str(row, 2),
        value: cell_f64(row, 3).unwrap_or(0.0),
        reps: cell_reps(row, 4),
        notes: cell_str(row, 5),
        progressed: cell_str(row, 6).eq_ignore_ascii_case("TRUE"),
        new_value: None,
    })
}

/// Serialize an entry into `Log` column order
pub fn log_row(entry: &LogEntry) -> Vec<Value> {
    vec![
        json!(entry.date.format("%Y-%m-%d").to_string()),
        json!(entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        json!(entry.exercise_id),
        json!(entry.value),
        json!(entry.reps),
        json!(entry.notes),
        json!(if entry.progressed { "TRUE" } else { "FALSE" }),
    ]
}

/// Current values from `Exercises` rows; blank value cells are skipped
pub fn parse_exercise_rows(rows: &[Vec<Value>]) -> ExerciseValues {
    let mut values = ExerciseValues::default();
    for row in rows {
        let id = cell_str(row, 0);
        if id.is_empty() {
            continue;
        }
        match cell_f64(row, VALUE_CELL_INDEX) {
            Some(value) => values.set(id, value),
            None => tracing::debug!("No stored value for {}, using start value", id),
        }
    }
    values
}

/// A1 reference of the value cell for an exercise id
pub fn value_cell(id_rows: &[Vec<Value>], exercise_id: &str) -> Option<String> {
    id_rows
        .iter()
        .position(|row| cell_str(row, 0) == exercise_id)
        .map(|index| format!("{}{}", VALUE_COLUMN, index + FIRST_DATA_ROW))
}

// ============================================================================
// Gateway
// ============================================================================

/// Gateway backed by a Google Sheet
pub struct SheetsGateway {
    client: Client,
    config: SheetsConfig,
}

impl SheetsGateway {
    pub fn new(config: SheetsConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn get_range(&self, range: &str) -> Result<ValueRange> {
        let url = format!(
            "{}/{}/values/{}",
            self.config.sheets_api.trim_end_matches('/'),
            self.config.sheet_id,
            range
        );

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .send()?;

        if !response.status().is_success() {
            return Err(Error::Load(format!(
                "Sheets API error: {}",
                response.status()
            )));
        }

        Ok(response.json()?)
    }

    fn script_call(&self, params: &[(&str, String)]) -> Result<Value> {
        let action = params
            .iter()
            .find(|(k, _)| *k == "action")
            .map(|(_, v)| v.as_str())
            .unwrap_or("?");

        let response = self
            .client
            .get(&self.config.script_url)
            .query(params)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        tracing::debug!("Script {} -> {}: {}", action, status, text);

        if !status.is_success() {
            return Err(Error::Save(format!("script {} failed: {}", action, status)));
        }

        let body: Value = serde_json::from_str(&text)?;
        if let Some(err) = body.get("error") {
            return Err(Error::Save(format!("script {} failed: {}", action, err)));
        }
        Ok(body)
    }

    fn load(&self) -> Result<Snapshot> {
        let exercises = self.get_range(EXERCISES_RANGE)?;
        let log_rows = self.get_range(LOG_RANGE)?;

        let log: Vec<LogEntry> = log_rows
            .values
            .iter()
            .filter_map(|row| parse_log_row(row))
            .collect();

        Ok(Snapshot {
            exercise_values: parse_exercise_rows(&exercises.values),
            log,
        })
    }

    fn append(&self, entries: &[LogEntry]) -> Result<()> {
        match entries {
            [] => Ok(()),
            [entry] => {
                self.script_call(&[
                    ("action", "append".into()),
                    ("sheet", LOG_SHEET.into()),
                    ("row", serde_json::to_string(&log_row(entry))?),
                ])?;
                Ok(())
            }
            _ => {
                let rows: Vec<Vec<Value>> = entries.iter().map(log_row).collect();
                self.script_call(&[
                    ("action", "batchAppend".into()),
                    ("sheet", LOG_SHEET.into()),
                    ("rows", serde_json::to_string(&rows)?),
                ])?;
                Ok(())
            }
        }
    }

    fn update_one(&self, exercise_id: &str, new_value: f64) -> Result<()> {
        let ids = self.get_range(EXERCISE_IDS_RANGE)?;
        let Some(cell) = value_cell(&ids.values, exercise_id) else {
            tracing::warn!("Exercise {} has no row in the sheet, not saved", exercise_id);
            return Ok(());
        };

        self.script_call(&[
            ("action", "update".into()),
            ("sheet", EXERCISES_SHEET.into()),
            ("range", cell),
            ("values", json!([[new_value]]).to_string()),
        ])?;
        Ok(())
    }

    fn update_many(&self, updates: &[ValueUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let ids = self.get_range(EXERCISE_IDS_RANGE)?;
        let cells: Vec<Value> = updates
            .iter()
            .filter_map(|u| match value_cell(&ids.values, &u.exercise_id) {
                Some(range) => Some(json!({ "range": range, "value": u.new_value })),
                None => {
                    tracing::warn!("Exercise {} has no row in the sheet, skipped", u.exercise_id);
                    None
                }
            })
            .collect();

        if cells.is_empty() {
            return Ok(());
        }

        self.script_call(&[
            ("action", "batchUpdate".into()),
            ("updates", Value::Array(cells).to_string()),
        ])?;
        Ok(())
    }
}

fn as_load_err(e: Error) -> Error {
    match e {
        Error::Load(_) => e,
        other => Error::Load(other.to_string()),
    }
}

fn as_save_err(e: Error) -> Error {
    match e {
        Error::Save(_) => e,
        other => Error::Save(other.to_string()),
    }
}

impl Gateway for SheetsGateway {
    fn load_all(&mut self) -> Result<Snapshot> {
        let snapshot = self.load().map_err(as_load_err)?;
        tracing::info!(
            "Loaded {} values and {} log rows from sheet",
            snapshot.exercise_values.len(),
            snapshot.log.len()
        );
        Ok(snapshot)
    }

    fn save_value(&mut self, exercise_id: &str, new_value: f64) -> Result<()> {
        self.update_one(exercise_id, new_value).map_err(as_save_err)
    }

    fn append_log_entries(&mut self, entries: &[LogEntry]) -> Result<()> {
        self.append(entries).map_err(as_save_err)
    }

    fn batch_update_values(&mut self, updates: &[ValueUpdate]) -> Result<()> {
        self.update_many(updates).map_err(as_save_err)
    }
}
