//! Per-machine inference for fields the raw reports leave out.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::record::MachineId;

/// Fair-share score to assume when a report has no fair-share line.
pub const DEFAULT_FAIR_SHARE: f64 = 0.0;

/// Accounting-period renewal pattern of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadencePolicy {
    /// One allocation per year, starting on the 1st of `start_month`.
    Annual { start_month: u32 },
    /// Allocation renews on the 1st of every month.
    Monthly,
}

/// Cadence lookup table keyed by machine identifier.
///
/// Machines not listed renew monthly, so adding a machine is a data
/// change, not a code change. Read-only once parsing starts: build it
/// fully, then share it with the ingestor by reference.
#[derive(Debug, Clone, Default)]
pub struct MachinePolicies {
    table: HashMap<String, CadencePolicy>,
}

impl MachinePolicies {
    /// Built-in table: Cheyenne allocates annually on an October cycle.
    pub fn with_defaults() -> Self {
        let mut policies = Self::default();
        policies.set("Cheyenne", CadencePolicy::Annual { start_month: 10 });
        policies
    }

    pub fn set(&mut self, machine: impl Into<String>, policy: CadencePolicy) {
        self.table.insert(machine.into(), policy);
    }

    pub fn policy_for(&self, machine: &MachineId) -> CadencePolicy {
        self.table
            .get(machine.as_str())
            .copied()
            .unwrap_or(CadencePolicy::Monthly)
    }

    /// Infer the inclusive start of the accounting period ending at
    /// `period_end`.
    ///
    /// Annual cadence: the cycle that was already running at `period_end`,
    /// so an end date before the start month belongs to the cycle begun the
    /// previous calendar year. Monthly cadence: the 1st of the end date's
    /// month. The result never falls after `period_end`.
    pub fn period_start(&self, machine: &MachineId, period_end: NaiveDate) -> NaiveDate {
        let (year, month) = match self.policy_for(machine) {
            CadencePolicy::Annual { start_month } if period_end.month() < start_month => {
                (period_end.year() - 1, start_month)
            }
            CadencePolicy::Annual { start_month } => (period_end.year(), start_month),
            CadencePolicy::Monthly => (period_end.year(), period_end.month()),
        };
        NaiveDate::from_ymd_opt(year, month, 1).expect("the 1st of a month in 1..=12 is a valid date")
    }
}
