#![forbid(unsafe_code)]

//! Core domain model and business logic for the Overload strength tracker.
//!
//! This crate provides:
//! - Domain types (exercises, values, log entries)
//! - Catalog management
//! - Progression rule and workout session state machine
//! - Streak and weekly statistics
//! - Persistence gateways (spreadsheet, local WAL, in-memory)
//! - View models for dashboard, history and progress

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod dates;
pub mod progression;
pub mod wal;
pub mod state;
pub mod gateway;
pub mod local;
pub mod sheets;
pub mod csv_export;
pub mod view;
pub mod dashboard;
pub mod session;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::{Backend, Config};
pub use gateway::{Gateway, GatewayCall, MemoryGateway};
pub use local::LocalGateway;
pub use sheets::SheetsGateway;
pub use csv_export::export_log_csv;
pub use session::{LevelUp, Phase, Session};
pub use tracker::{CompletionSummary, FlushOutcome, Outcome, Tracker, TrackerOptions};
