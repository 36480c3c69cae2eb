use std::path::PathBuf;

use calamine::{open_workbook_auto, Data, Reader};

use clearpoint_io::{read_statement, read_table, ReportArtifact};
use clearpoint_recon::model::ReconInput;
use clearpoint_recon::report::FULL_SHEETS;
use clearpoint_recon::{build_report, compare_periods, run, ReconConfig};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
}

fn input() -> ReconInput {
    ReconInput {
        statement: read_statement(&fixture("statement.txt")).unwrap(),
        direct_debit: read_table(&fixture("direct_debits.csv")).unwrap(),
        eft: read_table(&fixture("efts.csv")).unwrap(),
        cheque: read_table(&fixture("cheques.csv")).unwrap(),
    }
}

#[test]
fn full_report_round_trips_through_calamine() {
    let config = ReconConfig::new("KES1020000010001");
    let result = run(&config, &input()).unwrap();
    let artifact = ReportArtifact::render(&build_report(&result)).unwrap();
    assert_eq!(artifact.file_name, "Recon.xlsx");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&artifact.file_name);
    artifact.publish(&path).unwrap();

    let mut wb = open_workbook_auto(&path).unwrap();
    let names = wb.sheet_names();
    assert_eq!(names, FULL_SHEETS.iter().map(|s| s.to_string()).collect::<Vec<_>>());

    let summary = wb.worksheet_range("Summary").unwrap();
    assert_eq!(summary.get((0, 0)), Some(&Data::String("DESCRIPTION".into())));
    assert_eq!(summary.get((7, 0)), Some(&Data::String("BALANCE AT THE END".into())));
    match summary.get((7, 1)) {
        Some(Data::Float(v)) => assert!((v - 4321.09).abs() < 1e-9),
        other => panic!("expected closing balance, got {other:?}"),
    }

    let cheques = wb.worksheet_range("CHQs").unwrap();
    assert_eq!(cheques.get((3, 1)), Some(&Data::String("BANQUE DU CAF\\xc9".into())));

    let dds = wb.worksheet_range("DDS").unwrap();
    assert_eq!(dds.height(), 3);
}

#[test]
fn period_report_has_two_sheets() {
    let config = ReconConfig::new("KES1020000010001");
    let current = read_statement(&fixture("statement.txt")).unwrap();
    let previous = read_statement(&fixture("previous_statement.txt")).unwrap();
    let result = compare_periods(&config, &current, &previous).unwrap();
    let artifact =
        ReportArtifact::render(&clearpoint_recon::build_period_report(&result)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&artifact.file_name);
    artifact.publish(&path).unwrap();

    let mut wb = open_workbook_auto(&path).unwrap();
    assert_eq!(wb.sheet_names(), vec!["T24 Exceptions".to_string(), "Summary".to_string()]);
    let exceptions = wb.worksheet_range("T24 Exceptions").unwrap();
    assert_eq!(exceptions.height(), 4);
}

#[test]
fn unsupported_extension() {
    let err = read_table(&fixture("recon.toml")).unwrap_err();
    assert_eq!(err.kind(), "io");
}
