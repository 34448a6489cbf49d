//! Persistence gateway seam.
//!
//! The tracker never talks to a store directly; it goes through
//! [`Gateway`], which has a remote spreadsheet implementation
//! ([`crate::sheets::SheetsGateway`]), a file implementation
//! ([`crate::local::LocalGateway`]) and the in-memory [`MemoryGateway`].

use crate::{Error, ExerciseValues, LogEntry, Result, Snapshot, ValueUpdate};

/// Durable store for exercise values and log rows
///
/// Every call is blocking and settles before returning. Failures from
/// `load_all` are load errors; failures from the other calls are save
/// errors. None of them are retried here.
pub trait Gateway {
    fn load_all(&mut self) -> Result<Snapshot>;

    fn save_value(&mut self, exercise_id: &str, new_value: f64) -> Result<()>;

    fn append_log_entries(&mut self, entries: &[LogEntry]) -> Result<()>;

    fn batch_update_values(&mut self, updates: &[ValueUpdate]) -> Result<()>;
}

impl<G: Gateway + ?Sized> Gateway for Box<G> {
    fn load_all(&mut self) -> Result<Snapshot> {
        (**self).load_all()
    }

    fn save_value(&mut self, exercise_id: &str, new_value: f64) -> Result<()> {
        (**self).save_value(exercise_id, new_value)
    }

    fn append_log_entries(&mut self, entries: &[LogEntry]) -> Result<()> {
        (**self).append_log_entries(entries)
    }

    fn batch_update_values(&mut self, updates: &[ValueUpdate]) -> Result<()> {
        (**self).batch_update_values(updates)
    }
}

/// A recorded gateway call
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayCall {
    LoadAll,
    SaveValue(ValueUpdate),
    AppendLogEntries(Vec<LogEntry>),
    BatchUpdateValues(Vec<ValueUpdate>),
}

/// In-memory store that records every call
///
/// Failures can be switched on per operation to exercise the tracker's
/// error paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryGateway {
    pub values: ExerciseValues,
    pub log: Vec<LogEntry>,
    pub calls: Vec<GatewayCall>,
    pub fail_load: bool,
    pub fail_saves: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing snapshot
    pub fn with_snapshot(values: ExerciseValues, log: Vec<LogEntry>) -> Self {
        Self {
            values,
            log,
            ..Self::default()
        }
    }

    /// Calls that wrote something (everything except loads)
    pub fn writes(&self) -> Vec<&GatewayCall> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, GatewayCall::LoadAll))
            .collect()
    }

    fn check_save(&self) -> Result<()> {
        if self.fail_saves {
            Err(Error::Save("memory gateway configured to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl Gateway for MemoryGateway {
    fn load_all(&mut self) -> Result<Snapshot> {
        self.calls.push(GatewayCall::LoadAll);
        if self.fail_load {
            return Err(Error::Load("memory gateway configured to fail".into()));
        }
        Ok(Snapshot {
            exercise_values: self.values.clone(),
            log: self.log.clone(),
        })
    }

    fn save_value(&mut self, exercise_id: &str, new_value: f64) -> Result<()> {
        self.calls.push(GatewayCall::SaveValue(ValueUpdate {
            exercise_id: exercise_id.to_string(),
            new_value,
        }));
        self.check_save()?;
        self.values.set(exercise_id, new_value);
        Ok(())
    }

    fn append_log_entries(&mut self, entries: &[LogEntry]) -> Result<()> {
        self.calls
            .push(GatewayCall::AppendLogEntries(entries.to_vec()));
        self.check_save()?;
        self.log.extend_from_slice(entries);
        Ok(())
    }

    fn batch_update_values(&mut self, updates: &[ValueUpdate]) -> Result<()> {
        self.calls
            .push(GatewayCall::BatchUpdateValues(updates.to_vec()));
        self.check_save()?;
        for update in updates {
            self.values.set(update.exercise_id.clone(), update.new_value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_gateway_records_and_applies() {
        let mut gateway = MemoryGateway::new();
        gateway.save_value("squats", 140.0).unwrap();
        gateway
            .batch_update_values(&[ValueUpdate {
                exercise_id: "dips".into(),
                new_value: 5.0,
            }])
            .unwrap();

        let snapshot = gateway.load_all().unwrap();
        assert_eq!(snapshot.exercise_values.get("squats"), Some(140.0));
        assert_eq!(snapshot.exercise_values.get("dips"), Some(5.0));
        assert_eq!(gateway.calls.len(), 3);
        assert_eq!(gateway.writes().len(), 2);
    }

    #[test]
    fn test_memory_gateway_failures() {
        let mut gateway = MemoryGateway {
            fail_load: true,
            fail_saves: true,
            ..MemoryGateway::default()
        };

        assert!(matches!(gateway.load_all(), Err(Error::Load(_))));
        assert!(matches!(gateway.append_log_entries(&[]), Err(Error::Save(_))));
        // Failed calls are still recorded
        assert_eq!(gateway.calls.len(), 2);
    }

    #[test]
    fn test_boxed_gateway_delegates() {
        let mut boxed: Box<dyn Gateway> = Box::new(MemoryGateway::new());
        boxed.save_value("curls", 55.0).unwrap();
        let snapshot = boxed.load_all().unwrap();
        assert_eq!(snapshot.exercise_values.get("curls"), Some(55.0));
    }
}
