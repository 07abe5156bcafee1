//! report_data: ingestion and normalization of HPC accounting usage reports.
//!
//! Different HPC centers emit usage reports with different field labels,
//! date formats and allocation cadences (one system allocates annually on a
//! fixed month, another monthly). This crate detects each file's label
//! dialect, extracts labeled fields with tolerant substring matching,
//! normalizes the date shapes into one calendar representation, infers
//! missing fields from per-machine cadence policy and hands downstream
//! consumers a uniform [`UsageRecord`] sequence plus per-file diagnostics.
//!
//! Per-file failures never abort a batch; only an unreadable input
//! directory or an entirely empty batch is fatal.

pub mod date;
pub mod dialect;
pub mod extract;
pub mod ingest;
pub mod record;
pub mod resolve;

pub use ingest::{Batch, BatchError, BatchIngestor, Diagnostic, FileFailure, ParseError};
pub use record::{AccountId, FieldKey, MachineId, RawFieldMap, UsageRecord};
pub use resolve::{CadencePolicy, MachinePolicies};
