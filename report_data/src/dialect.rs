//! Report label dialects and per-file dialect detection.
//!
//! Source reports carry no machine-readable schema; each generating system
//! has its own set of label markers. A dialect is a table of
//! (field, marker) rows consumed by the generic extractor in
//! [`crate::extract`], so supporting a new report generator means adding
//! table rows, not new control flow.

use crate::record::FieldKey;

/// One extraction rule: where a field's value starts on a matching line.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub key: FieldKey,
    /// Literal label substring; the value is the rest of the line after it.
    pub marker: &'static str,
    /// Characters to skip between marker and value. Host-style reports
    /// wedge a fixed-width program-name column in front of the
    /// allocation/usage figures.
    pub qualifier_width: usize,
    /// Numeric fields get their thousands separators stripped.
    pub numeric: bool,
}

const fn rule(key: FieldKey, marker: &'static str) -> FieldRule {
    FieldRule {
        key,
        marker,
        qualifier_width: 0,
        numeric: false,
    }
}

const fn numeric(key: FieldKey, marker: &'static str) -> FieldRule {
    FieldRule {
        key,
        marker,
        qualifier_width: 0,
        numeric: true,
    }
}

const fn qualified(key: FieldKey, marker: &'static str) -> FieldRule {
    FieldRule {
        key,
        marker,
        qualifier_width: HOST_QUALIFIER_WIDTH,
        numeric: true,
    }
}

/// Width of the program-name column between the host dialect's
/// allocation/usage markers and the value. Matches the reports we have;
/// recalibrate here if a generator pads its column differently.
const HOST_QUALIFIER_WIDTH: usize = 12;

const STANDARD_RULES: &[FieldRule] = &[
    rule(FieldKey::Account, "Project Report for:"),
    rule(FieldKey::Machine, "Machine:"),
    rule(FieldKey::PeriodStart, "Allocation start:"),
    rule(FieldKey::PeriodEnd, "Report date:"),
    numeric(FieldKey::InitialAlloc, "Initial allocation (core-hours):"),
    numeric(FieldKey::AdjustedAlloc, "Current allocation (core-hours):"),
    numeric(FieldKey::UsedHours, "Total core-hours used:"),
    numeric(FieldKey::FairShare, "Fair share score:"),
];

const HOST_RULES: &[FieldRule] = &[
    rule(FieldKey::Account, "Project:"),
    rule(FieldKey::Machine, "Host:"),
    rule(FieldKey::PeriodEnd, "Usage through:"),
    qualified(FieldKey::AdjustedAlloc, "Allocation:"),
    qualified(FieldKey::UsedHours, "Usage:"),
    numeric(FieldKey::FairShare, "Fair Share:"),
];

/// A distinct set of label markers used by one report-generating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Annual-style project report, marked by `Project Report for:`.
    Standard,
    /// Host-style monthly report, marked by `Project:`.
    Host,
}

impl Dialect {
    pub fn rules(self) -> &'static [FieldRule] {
        match self {
            Dialect::Standard => STANDARD_RULES,
            Dialect::Host => HOST_RULES,
        }
    }

    /// Markers whose presence identifies this dialect.
    fn identity_markers(self) -> [&'static str; 2] {
        match self {
            Dialect::Standard => ["Project Report for:", "Machine:"],
            Dialect::Host => ["Project:", "Host:"],
        }
    }
}

/// Decide which dialect a report uses.
///
/// When markers of several dialects show up in one file, the dialect whose
/// account/host marker appears earliest wins; ambiguous input must never
/// silently produce a hybrid record. `None` means no known marker is
/// present at all.
pub fn detect(text: &str) -> Option<Dialect> {
    [Dialect::Standard, Dialect::Host]
        .into_iter()
        .filter_map(|dialect| {
            dialect
                .identity_markers()
                .into_iter()
                .filter_map(|marker| text.find(marker))
                .min()
                .map(|offset| (offset, dialect))
        })
        .min_by_key(|&(offset, _)| offset)
        .map(|(_, dialect)| dialect)
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect__standard_marker() {
        let text = "Project Report for: UFSM0001\nMachine: Cheyenne\n";
        assert_eq!(detect(text), Some(Dialect::Standard));
    }

    #[test]
    fn detect__host_marker() {
        let text = "Project: ufs-wm\nHost: Gaea\n";
        assert_eq!(detect(text), Some(Dialect::Host));
    }

    // "Project Report for:" does not contain the substring "Project:", so a
    // plain standard report never reads as ambiguous.
    #[test]
    fn detect__standard_report_is_not_host() {
        let text = "Project Report for: UFSM0001\n";
        assert_eq!(detect(text), Some(Dialect::Standard));
    }

    #[test]
    fn detect__both_dialects__earliest_marker_wins() {
        let host_first = "Project: ufs-wm\nProject Report for: UFSM0001\n";
        assert_eq!(detect(host_first), Some(Dialect::Host));

        let standard_first = "Project Report for: UFSM0001\nHost: Gaea\n";
        assert_eq!(detect(standard_first), Some(Dialect::Standard));
    }

    #[test]
    fn detect__no_marker__none() {
        assert_eq!(detect("free text without any label\n"), None);
        assert_eq!(detect(""), None);
    }
}
