//! End-to-end batch ingestion over real directories.

use std::fs;
use std::path::PathBuf;

use report_data::{BatchError, BatchIngestor, MachinePolicies};
use tempfile::tempdir;

const CHEYENNE_REPORT: &str = "\
Project Report for: UFSM0001
Machine: Cheyenne
Report date: Thu 17 Mar 2022 09:14:02 MDT
Initial allocation (core-hours): 500,000
Current allocation (core-hours): 650,000
Total core-hours used: 312,456
Fair share score: 0.85
";

const GAEA_REPORT: &str = "\
Project: ufs-wm
Host: Gaea
Usage through: 2023-04-17
Allocation:  ufs-wm    1,200,000
Usage:  ufs-wm    845,210
Fair Share: 1.02
";

// Dialect matches, but the usage line is missing a mandatory field.
const BROKEN_REPORT: &str = "\
Project: ufs-wm
Host: Hera
Usage through: 2023-05-31
Allocation:  ufs-wm    900,000
";

#[test]
fn batch_continues_past_a_broken_file_and_keeps_listing_order() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.log");
    fs::write(&a, CHEYENNE_REPORT).unwrap();
    fs::write(&b, BROKEN_REPORT).unwrap();
    fs::write(&c, GAEA_REPORT).unwrap();

    let policies = MachinePolicies::with_defaults();
    let batch = BatchIngestor::new(&policies).ingest_files(vec![a, b.clone(), c]);

    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.records[0].machine.as_str(), "Cheyenne");
    assert_eq!(batch.records[1].machine.as_str(), "Gaea");

    assert_eq!(batch.diagnostics.len(), 1);
    assert_eq!(batch.diagnostics[0].file, b);
    let reason = batch.diagnostics[0].to_string();
    assert!(reason.contains("b.txt"), "diagnostic should name the file: {reason}");
}

#[test]
fn files_without_report_extension_are_skipped_silently() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("usage.log");
    let stray = dir.path().join("notes.csv");
    fs::write(&report, GAEA_REPORT).unwrap();
    fs::write(&stray, "not a report, not a failure either").unwrap();

    let policies = MachinePolicies::with_defaults();
    let batch = BatchIngestor::new(&policies).ingest_files(vec![stray, report]);

    assert_eq!(batch.records.len(), 1);
    assert!(batch.diagnostics.is_empty());
}

#[test]
fn unreadable_candidate_is_a_diagnostic_not_a_batch_failure() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("usage.txt");
    let missing = dir.path().join("gone.txt");
    fs::write(&present, CHEYENNE_REPORT).unwrap();

    let policies = MachinePolicies::with_defaults();
    let batch = BatchIngestor::new(&policies).ingest_files(vec![missing.clone(), present]);

    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.diagnostics.len(), 1);
    assert_eq!(batch.diagnostics[0].file, missing);
}

#[test]
fn ingest_dir_collects_all_candidates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("cheyenne.txt"), CHEYENNE_REPORT).unwrap();
    fs::write(dir.path().join("gaea.log"), GAEA_REPORT).unwrap();
    fs::write(dir.path().join("broken.txt"), BROKEN_REPORT).unwrap();
    fs::write(dir.path().join("ignored.json"), "{}").unwrap();

    let policies = MachinePolicies::with_defaults();
    let batch = BatchIngestor::new(&policies).ingest_dir(dir.path()).unwrap();

    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.diagnostics.len(), 1);
}

#[test]
fn empty_batch_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.txt"), BROKEN_REPORT).unwrap();
    fs::write(dir.path().join("unlabeled.log"), "no markers anywhere").unwrap();

    let policies = MachinePolicies::with_defaults();
    let result = BatchIngestor::new(&policies).ingest_dir(dir.path());

    match result {
        Err(BatchError::EmptyBatch { dir: reported, diagnostics }) => {
            assert_eq!(reported, dir.path());
            // The per-file reasons survive the fatal path; both candidates
            // failed, both are accounted for.
            assert_eq!(diagnostics.len(), 2);
            assert!(diagnostics
                .iter()
                .any(|diagnostic| diagnostic.file.ends_with("broken.txt")));
        }
        other => panic!("expected EmptyBatch, got {other:?}"),
    }
}

#[test]
fn unlistable_directory_is_fatal_before_any_per_file_work() {
    let missing = PathBuf::from("/definitely/not/a/real/reports/dir");
    let policies = MachinePolicies::with_defaults();
    let result = BatchIngestor::new(&policies).ingest_dir(&missing);

    assert!(matches!(result, Err(BatchError::InputAccess { .. })));
}
