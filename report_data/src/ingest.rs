//! Batch ingestion: walk a directory listing, run the per-file pipeline,
//! collect records and per-file diagnostics.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use itertools::Itertools as _;
use thiserror::Error;

use crate::date::{self, DateParseError};
use crate::dialect;
use crate::extract::extract_fields;
use crate::record::{AccountId, FieldKey, MachineId, RawFieldMap, UsageRecord};
use crate::resolve::{MachinePolicies, DEFAULT_FAIR_SHARE};

/// Extensions that mark a file as a candidate report. Anything else in the
/// listing is skipped without comment.
const REPORT_EXTENSIONS: &[&str] = &["txt", "log"];

/// Why one file could not become a record. Recoverable: the file is
/// dropped with a diagnostic and the batch continues.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no known report dialect matched")]
    UnrecognizedDialect,
    #[error("mandatory field `{0}` missing after extraction")]
    MissingField(FieldKey),
    #[error("unparseable date: {0}")]
    Date(#[from] DateParseError),
    #[error("field `{field}` has invalid numeric value `{value}`")]
    Numeric { field: FieldKey, value: String },
    #[error("period end {end} precedes period start {start}")]
    PeriodOrder { start: NaiveDate, end: NaiveDate },
}

/// Batch-fatal conditions. Everything per-file becomes a [`Diagnostic`]
/// instead.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot list input directory {}", dir.display())]
    InputAccess {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Zero records survived. Carries the per-file diagnostics so the
    /// caller can still say why nothing parsed.
    #[error("no usable usage reports found in {}", dir.display())]
    EmptyBatch {
        dir: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },
}

/// What went wrong with a single candidate file.
#[derive(Debug, Error)]
pub enum FileFailure {
    #[error("reading file: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Per-file failure carried alongside the batch result. The caller decides
/// how to surface these; the engine itself never prints.
#[derive(Debug)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub reason: FileFailure,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.reason)
    }
}

/// Result of ingesting one directory listing.
#[derive(Debug, Default)]
pub struct Batch {
    /// Records in the order the listing presented the files. Sorting, if
    /// wanted, belongs to the presentation layer.
    pub records: Vec<UsageRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the detect → extract → normalize → resolve pipeline over a batch
/// of report files. Holds only a reference to the (already final) policy
/// table, so the pipeline stays a pure function of each file's text.
#[derive(Debug, Clone, Copy)]
pub struct BatchIngestor<'a> {
    policies: &'a MachinePolicies,
}

impl<'a> BatchIngestor<'a> {
    pub fn new(policies: &'a MachinePolicies) -> Self {
        Self { policies }
    }

    /// List `dir` and ingest every candidate file in it.
    ///
    /// Fatal only when the directory itself cannot be read
    /// ([`BatchError::InputAccess`], before any per-file work) or when not
    /// a single record survives ([`BatchError::EmptyBatch`]).
    pub fn ingest_dir(&self, dir: &Path) -> Result<Batch, BatchError> {
        let listing = fs::read_dir(dir)
            .and_then(|entries| entries.map_ok(|entry| entry.path()).collect::<io::Result<Vec<_>>>())
            .map_err(|source| BatchError::InputAccess {
                dir: dir.to_path_buf(),
                source,
            })?;

        let batch = self.ingest_files(listing);
        if batch.records.is_empty() {
            return Err(BatchError::EmptyBatch {
                dir: dir.to_path_buf(),
                diagnostics: batch.diagnostics,
            });
        }
        Ok(batch)
    }

    /// Ingest an explicit listing, preserving its order.
    ///
    /// Files without a report extension are not failures; they are skipped
    /// silently. Every failure on a candidate file (unreadable, no
    /// dialect, missing mandatory field, bad date) lands in
    /// [`Batch::diagnostics`] and the loop keeps going.
    pub fn ingest_files(&self, files: impl IntoIterator<Item = PathBuf>) -> Batch {
        let mut batch = Batch::default();
        for path in files {
            if !is_candidate(&path) {
                log::debug!("skipping {}: not a report file", path.display());
                continue;
            }
            let outcome = fs::read_to_string(&path)
                .map_err(FileFailure::Io)
                .and_then(|text| self.parse_report(&text).map_err(FileFailure::Parse));
            match outcome {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    log::warn!("dropping {}: {reason}", path.display());
                    batch.diagnostics.push(Diagnostic { file: path, reason });
                }
            }
        }
        batch
    }

    /// The whole per-file pipeline on raw report text. Pure in the text
    /// and the policy table: the same content always yields the same
    /// record.
    pub fn parse_report(&self, text: &str) -> Result<UsageRecord, ParseError> {
        let dialect = dialect::detect(text).ok_or(ParseError::UnrecognizedDialect)?;
        let mut fields = extract_fields(text, dialect);
        self.assemble(&mut fields)
    }

    fn assemble(&self, fields: &mut RawFieldMap) -> Result<UsageRecord, ParseError> {
        let account = AccountId(take_mandatory(fields, FieldKey::Account)?);
        let machine = MachineId(take_mandatory(fields, FieldKey::Machine)?);
        let period_end = date::normalize(&take_mandatory(fields, FieldKey::PeriodEnd)?)?;
        let period_start = match fields.remove(&FieldKey::PeriodStart) {
            Some(raw) => date::normalize(&raw)?,
            None => self.policies.period_start(&machine, period_end),
        };
        if period_end < period_start {
            return Err(ParseError::PeriodOrder {
                start: period_start,
                end: period_end,
            });
        }

        let initial_alloc_hours = fields
            .remove(&FieldKey::InitialAlloc)
            .map(|raw| parse_hours(FieldKey::InitialAlloc, raw))
            .transpose()?;
        let adjusted_alloc_hours =
            parse_hours(FieldKey::AdjustedAlloc, take_mandatory(fields, FieldKey::AdjustedAlloc)?)?;
        let used_core_hours = parse_hours(FieldKey::UsedHours, take_mandatory(fields, FieldKey::UsedHours)?)?;
        let fair_share = fields
            .remove(&FieldKey::FairShare)
            .map(|raw| parse_score(FieldKey::FairShare, raw))
            .transpose()?
            .unwrap_or(DEFAULT_FAIR_SHARE);

        Ok(UsageRecord {
            account,
            machine,
            period_start,
            period_end,
            initial_alloc_hours,
            adjusted_alloc_hours,
            used_core_hours,
            fair_share,
        })
    }
}

fn take_mandatory(fields: &mut RawFieldMap, key: FieldKey) -> Result<String, ParseError> {
    fields.remove(&key).ok_or(ParseError::MissingField(key))
}

fn parse_hours(field: FieldKey, value: String) -> Result<u64, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::Numeric { field, value })
}

fn parse_score(field: FieldKey, value: String) -> Result<f64, ParseError> {
    let score: f64 = value
        .parse()
        .map_err(|_| ParseError::Numeric {
            field,
            value: value.clone(),
        })?;
    if score < 0.0 {
        return Err(ParseError::Numeric { field, value });
    }
    Ok(score)
}

fn is_candidate(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            REPORT_EXTENSIONS
                .iter()
                .any(|wanted| extension.eq_ignore_ascii_case(wanted))
        })
}
