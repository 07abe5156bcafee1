use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use derive_more::derive::{Deref, Display, From, Into};
use serde::Serialize;

/// Project/account identifier as printed in a report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display, From, Into, Serialize)]
pub struct AccountId(pub String);

/// HPC system/host identifier. Keys the cadence policy table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display, From, Into, Serialize)]
pub struct MachineId(pub String);

/// The semantic fields every dialect maps its labels onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Account,
    Machine,
    PeriodEnd,
    PeriodStart,
    InitialAlloc,
    AdjustedAlloc,
    UsedHours,
    FairShare,
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKey::Account => "account",
            FieldKey::Machine => "machine",
            FieldKey::PeriodEnd => "period end",
            FieldKey::PeriodStart => "period start",
            FieldKey::InitialAlloc => "initial allocation",
            FieldKey::AdjustedAlloc => "adjusted allocation",
            FieldKey::UsedHours => "used core hours",
            FieldKey::FairShare => "fair share",
        };
        write!(f, "{name}")
    }
}

/// Raw captures from one report file: trimmed strings keyed by semantic
/// field. Built by a single extractor pass, consumed immediately during
/// record assembly, never persisted.
pub type RawFieldMap = HashMap<FieldKey, String>;

/// One normalized accounting record, the canonical output unit.
///
/// Every emitted record has a non-empty account and machine, a valid
/// period with `period_end >= period_start`, and both allocation and usage
/// figures present. Dates serialize in the canonical zero-padded
/// `mm/dd/yyyy` form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub account: AccountId,
    pub machine: MachineId,
    /// Inclusive start of the accounting period.
    #[serde(with = "mdy")]
    pub period_start: NaiveDate,
    /// Inclusive end of the accounting period.
    #[serde(with = "mdy")]
    pub period_end: NaiveDate,
    /// Allocation before adjustments; absent in the host-style dialect.
    pub initial_alloc_hours: Option<u64>,
    /// Allocation after adjustments, the figure reporting runs on.
    pub adjusted_alloc_hours: u64,
    pub used_core_hours: u64,
    /// Relative scheduling priority; `0.0` when the report omits it.
    pub fair_share: f64,
}

/// Canonical date form for serialized records: zero-padded `mm/dd/yyyy`.
pub mod mdy {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub const FORMAT: &str = "%m/%d/%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }
}
