//! Fixed-column usage table ingestion (spreadsheet exports).
//!
//! The simpler report shape is one header line plus `|`-separated rows.
//! The header decides which column holds what, so column order in the
//! export does not matter.

use anyhow::{anyhow, bail, Context, Result};
use itertools::Itertools as _;
use serde::Serialize;

use report_data::{date, AccountId, MachineId, UsageRecord};

const COL_MACHINE: &str = "Machine";
const COL_ACCOUNT: &str = "Project account";
const COL_PERIOD_START: &str = "Period start";
const COL_PERIOD_END: &str = "Period end";
const COL_ALLOCATED: &str = "Allocated core hours";
const COL_USED: &str = "Used core hours";
const COL_TESTING: &str = "Core hours used for UFS-WM RT";

/// One chart-ready row: the normalized record plus the testing-hours
/// figure only the spreadsheet exports carry. `None` when the source (a
/// report file, or an export without the column) has no such figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    #[serde(flatten)]
    pub record: UsageRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing_hours: Option<u64>,
}

impl From<UsageRecord> for UsageRow {
    fn from(record: UsageRecord) -> Self {
        Self {
            record,
            testing_hours: None,
        }
    }
}

/// Parse a whole usage table into rows.
///
/// Exports carry trailing comment rows; like the source spreadsheets, the
/// table ends at the first row with an empty or `N/A` account cell. The
/// regression-test hours column is optional: older exports predate it.
pub fn usage_table(input: &str) -> Result<Vec<UsageRow>> {
    let mut lines = input.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        bail!("usage table is empty");
    };
    let header = header.split('|').map(str::trim).collect_vec();
    let column = |name: &str| {
        header
            .iter()
            .position(|cell| *cell == name)
            .ok_or_else(|| anyhow!("usage table has no `{name}` column"))
    };
    let machine_col = column(COL_MACHINE)?;
    let account_col = column(COL_ACCOUNT)?;
    let start_col = column(COL_PERIOD_START)?;
    let end_col = column(COL_PERIOD_END)?;
    let allocated_col = column(COL_ALLOCATED)?;
    let used_col = column(COL_USED)?;
    let testing_col = header.iter().position(|cell| *cell == COL_TESTING);

    let mut rows = Vec::new();
    for (row, line) in lines.enumerate() {
        let cells = line.split('|').map(str::trim).collect_vec();
        let cell = |index: usize| {
            cells
                .get(index)
                .copied()
                .ok_or_else(|| anyhow!("row {row}: too few columns"))
        };

        let account = cell(account_col)?;
        if account.is_empty() || account == "N/A" {
            break;
        }

        let period_start = date::normalize(cell(start_col)?).with_context(|| format!("row {row}: period start"))?;
        let period_end = date::normalize(cell(end_col)?).with_context(|| format!("row {row}: period end"))?;
        if period_end < period_start {
            bail!("row {row}: period end {period_end} precedes period start {period_start}");
        }

        let testing_hours = testing_col
            .map(|index| hours(cell(index)?).with_context(|| format!("row {row}: testing hours")))
            .transpose()?;

        rows.push(UsageRow {
            record: UsageRecord {
                account: AccountId(account.to_string()),
                machine: MachineId(cell(machine_col)?.to_string()),
                period_start,
                period_end,
                initial_alloc_hours: None,
                adjusted_alloc_hours: hours(cell(allocated_col)?).with_context(|| format!("row {row}: allocated hours"))?,
                used_core_hours: hours(cell(used_col)?).with_context(|| format!("row {row}: used hours"))?,
                fair_share: 0.0,
            },
            testing_hours,
        });
    }
    Ok(rows)
}

/// Spreadsheet hour cells carry separators and the odd stray glyph; only
/// the digits count. Empty and `N/A` cells mean zero, as in the exports.
fn hours(cell: &str) -> Result<u64> {
    if cell.is_empty() || cell == "N/A" {
        return Ok(0);
    }
    let digits: String = cell.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        bail!("`{cell}` holds no digits");
    }
    digits.parse().context("core-hour cell out of range")
}
