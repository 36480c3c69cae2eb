//! Report assembly: every derived table laid out as named sheets in a fixed
//! order. Downstream tooling reads these by name and position, so names,
//! order and column headers are part of the output contract.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::{
    Channel, ClearingEntry, PeriodResult, PeriodSummary, ReconCounts, ReconMeta, ReconResult,
    StatementEntry, SummaryReport,
};
use crate::table::{Cell, Table};

pub const SHEET_STATEMENT: &str = "Statement";
pub const SHEET_CLEARED: &str = "Cleared";
pub const SHEET_STATEMENT_EXCEPTIONS: &str = "T24 Exceptions";
pub const SHEET_CLEARING_EXCEPTIONS: &str = "CP Exceptions";
pub const SHEET_SUMMARY: &str = "Summary";
pub const SHEET_DIRECT_DEBITS: &str = "DDS";
pub const SHEET_EFTS: &str = "EFTs";
pub const SHEET_CHEQUES: &str = "CHQs";
pub const SHEET_REVERSALS: &str = "REVERSALS FROM LIVE";
pub const SHEET_AMOUNT_CHECK: &str = "AMOUNT_CHECK";
pub const SHEET_CLEARED_DUPLICATES: &str = "CLEARED DUPLICATE";

/// Full reconciliation sheet order.
pub const FULL_SHEETS: [&str; 11] = [
    SHEET_STATEMENT,
    SHEET_CLEARED,
    SHEET_STATEMENT_EXCEPTIONS,
    SHEET_CLEARING_EXCEPTIONS,
    SHEET_SUMMARY,
    SHEET_DIRECT_DEBITS,
    SHEET_EFTS,
    SHEET_CHEQUES,
    SHEET_REVERSALS,
    SHEET_AMOUNT_CHECK,
    SHEET_CLEARED_DUPLICATES,
];

/// Period comparison sheet order.
pub const PERIOD_SHEETS: [&str; 2] = [SHEET_STATEMENT_EXCEPTIONS, SHEET_SUMMARY];

pub const RECON_FILE_NAME: &str = "Recon.xlsx";
pub const PERIOD_FILE_NAME: &str = "PeriodCompare.xlsx";

const STATEMENT_HEADERS: [&str; 3] = ["NARRATION", "FT", "AMOUNT"];
const CLEARED_HEADERS: [&str; 4] = ["CHANNEL", "SOURCE_ID", "FT", "AMOUNT"];
const SUMMARY_HEADERS: [&str; 2] = ["DESCRIPTION", "AMOUNT"];
const AMOUNT_CHECK_HEADERS: [&str; 6] = [
    "NARRATION",
    "FT",
    "STATEMENT_AMOUNT",
    "CHANNEL",
    "CLEARED_AMOUNT",
    "DIFF",
];
const PERIOD_SUMMARY_HEADERS: [&str; 4] = ["SNAPSHOT", "CREDITS", "DEBITS", "CLOSING_BALANCE"];

#[derive(Debug, Clone, PartialEq)]
pub enum ReportCell {
    Text(String),
    Amount(Decimal),
    /// Cell copied verbatim from a channel report.
    Raw(Cell),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<ReportCell>>,
    /// Escape non-ASCII text when rendering (cheque report).
    pub escape_non_ascii: bool,
}

impl SheetData {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            escape_non_ascii: false,
        }
    }

    fn from_table(name: &str, table: &Table) -> Self {
        Self {
            name: name.into(),
            headers: table.headers.clone(),
            rows: table
                .rows
                .iter()
                .map(|row| row.iter().cloned().map(ReportCell::Raw).collect())
                .collect(),
            escape_non_ascii: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportSummary {
    Full(SummaryReport),
    Period(PeriodSummary),
}

/// Everything the writer needs, plus run metadata for callers.
#[derive(Debug, Clone)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReportSummary,
    pub counts: ReconCounts,
    pub warnings: Vec<String>,
    pub sheets: Vec<SheetData>,
    /// Suggested download name.
    pub file_name: String,
}

impl ReconReport {
    pub fn sheet(&self, name: &str) -> Option<&SheetData> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Row builders
// ---------------------------------------------------------------------------

fn statement_row(e: &StatementEntry) -> Vec<ReportCell> {
    vec![
        ReportCell::Text(e.narration.clone()),
        ReportCell::Text(e.reference.clone()),
        ReportCell::Amount(e.amount),
    ]
}

fn cleared_row(e: &ClearingEntry) -> Vec<ReportCell> {
    vec![
        ReportCell::Text(e.channel.label().into()),
        ReportCell::Text(e.source_id.clone()),
        ReportCell::Text(e.reference.clone()),
        ReportCell::Amount(e.amount),
    ]
}

fn statement_sheet<'a>(name: &str, entries: impl IntoIterator<Item = &'a StatementEntry>) -> SheetData {
    let mut sheet = SheetData::new(name, &STATEMENT_HEADERS);
    sheet.rows.extend(entries.into_iter().map(statement_row));
    sheet
}

fn cleared_sheet<'a>(name: &str, entries: impl IntoIterator<Item = &'a ClearingEntry>) -> SheetData {
    let mut sheet = SheetData::new(name, &CLEARED_HEADERS);
    sheet.rows.extend(entries.into_iter().map(cleared_row));
    sheet
}

fn summary_sheet(summary: &SummaryReport) -> SheetData {
    let mut sheet = SheetData::new(SHEET_SUMMARY, &SUMMARY_HEADERS);
    for (label, amount) in summary.lines() {
        sheet
            .rows
            .push(vec![ReportCell::Text(label.into()), ReportCell::Amount(amount)]);
    }
    sheet
}

fn raw_sheet(result: &ReconResult, name: &str, channel: Channel) -> SheetData {
    match result.load(channel) {
        Some(load) => SheetData::from_table(name, &load.accepted),
        None => SheetData::new(name, &[]),
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Lay out a full reconciliation in `FULL_SHEETS` order.
pub fn build_report(result: &ReconResult) -> ReconReport {
    let mut sheets = Vec::with_capacity(FULL_SHEETS.len());

    sheets.push(statement_sheet(SHEET_STATEMENT, &result.statement.entries));
    sheets.push(cleared_sheet(SHEET_CLEARED, &result.cleared.entries));
    sheets.push(statement_sheet(
        SHEET_STATEMENT_EXCEPTIONS,
        result.outcome.statement_exceptions(),
    ));
    sheets.push(cleared_sheet(
        SHEET_CLEARING_EXCEPTIONS,
        result.outcome.clearing_exceptions(),
    ));
    sheets.push(summary_sheet(&result.summary));
    sheets.push(raw_sheet(result, SHEET_DIRECT_DEBITS, Channel::DirectDebit));
    sheets.push(raw_sheet(result, SHEET_EFTS, Channel::Eft));

    let mut cheques = raw_sheet(result, SHEET_CHEQUES, Channel::Cheque);
    cheques.escape_non_ascii = true;
    sheets.push(cheques);

    sheets.push(statement_sheet(
        SHEET_REVERSALS,
        result.exceptions.reversals.iter().flat_map(|g| &g.members),
    ));

    let mut amount_check = SheetData::new(SHEET_AMOUNT_CHECK, &AMOUNT_CHECK_HEADERS);
    for d in &result.exceptions.discrepancies {
        amount_check.rows.push(vec![
            ReportCell::Text(d.statement.narration.clone()),
            ReportCell::Text(d.statement.reference.clone()),
            ReportCell::Amount(d.statement.amount),
            ReportCell::Text(d.cleared.channel.label().into()),
            ReportCell::Amount(d.cleared.amount),
            ReportCell::Amount(d.diff),
        ]);
    }
    sheets.push(amount_check);

    sheets.push(cleared_sheet(
        SHEET_CLEARED_DUPLICATES,
        result.exceptions.cleared_duplicates.iter().flat_map(|g| &g.members),
    ));

    ReconReport {
        meta: result.meta.clone(),
        summary: ReportSummary::Full(result.summary.clone()),
        counts: result.counts(),
        warnings: result.statement.warnings.clone(),
        sheets,
        file_name: RECON_FILE_NAME.into(),
    }
}

/// Lay out a period comparison in `PERIOD_SHEETS` order.
pub fn build_period_report(result: &PeriodResult) -> ReconReport {
    let exceptions = statement_sheet(SHEET_STATEMENT_EXCEPTIONS, result.exceptions());

    let mut summary = SheetData::new(SHEET_SUMMARY, &PERIOD_SUMMARY_HEADERS);
    for (label, snap) in [
        ("PREVIOUS", &result.summary.previous),
        ("CURRENT", &result.summary.current),
    ] {
        summary.rows.push(vec![
            ReportCell::Text(label.into()),
            ReportCell::Amount(snap.credits),
            ReportCell::Amount(snap.debits),
            ReportCell::Amount(snap.closing_balance),
        ]);
    }

    let mut warnings = result.previous.warnings.clone();
    warnings.extend(result.current.warnings.iter().cloned());

    ReconReport {
        meta: result.meta.clone(),
        summary: ReportSummary::Period(result.summary.clone()),
        counts: result.counts(),
        warnings,
        sheets: vec![exceptions, summary],
        file_name: PERIOD_FILE_NAME.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconConfig;
    use crate::engine::{compare_periods, run};
    use crate::model::ReconInput;
    use rust_decimal::Decimal;

    fn line(fields: [&str; 6]) -> String {
        fields
            .iter()
            .zip([13usize, 20, 15, 9, 32, 16])
            .map(|(f, w)| format!("{f:<w$}"))
            .collect()
    }

    fn input() -> ReconInput {
        let statement = [
            line(["1", "DD COLLECTION", "FT1", "D", "100.00-", "ACC1"]),
            line(["2", "CHEQUE", "FT2", "D", "30.00-", "ACC1"]),
            line(["3", "REVERSAL", "FT2", "C", "30.00", "ACC1"]),
            line(["4", "BALANCE AT PERIOD EN", "", "C", "70.00", "ACC1"]),
        ]
        .join("\n");
        ReconInput {
            statement,
            direct_debit: Table::from_csv_str(
                "dd",
                "STATUSID,DESTBANK,POLICY1,FTREFERENCE,AMOUNT\n1,X,P1,FT1,101.00\n",
            )
            .unwrap(),
            eft: Table::from_csv_str("eft", "ACHBULKID,TRNREF,AMOUNT\nB1,FT9,5.00\n").unwrap(),
            cheque: Table::from_csv_str(
                "chq",
                "STATUSID,DESTBANK,STAGE,CHEQUENO,CBS_REJECT_REASON,AMOUNT\n\
                 1,X,COMPLETE,7,\"ERR,FT2\",30.00\n",
            )
            .unwrap(),
        }
    }

    #[test]
    fn full_report_has_every_sheet_in_order() {
        let result = run(&ReconConfig::new("ACC1"), &input()).unwrap();
        let report = build_report(&result);

        assert_eq!(report.sheet_names(), FULL_SHEETS.to_vec());
        assert_eq!(report.file_name, "Recon.xlsx");
        assert!(report.sheet(SHEET_CHEQUES).unwrap().escape_non_ascii);
        assert!(!report.sheet(SHEET_EFTS).unwrap().escape_non_ascii);
    }

    #[test]
    fn full_report_rows() {
        let result = run(&ReconConfig::new("ACC1"), &input()).unwrap();
        let report = build_report(&result);

        assert_eq!(report.sheet(SHEET_STATEMENT).unwrap().rows.len(), 3);
        assert_eq!(report.sheet(SHEET_CLEARED).unwrap().rows.len(), 3);
        assert!(report.sheet(SHEET_STATEMENT_EXCEPTIONS).unwrap().rows.is_empty());

        let cp = report.sheet(SHEET_CLEARING_EXCEPTIONS).unwrap();
        assert_eq!(cp.headers, vec!["CHANNEL", "SOURCE_ID", "FT", "AMOUNT"]);
        assert_eq!(cp.rows[0][0], ReportCell::Text("EFT".into()));
        assert_eq!(cp.rows[0][2], ReportCell::Text("FT9".into()));

        let summary = report.sheet(SHEET_SUMMARY).unwrap();
        assert_eq!(summary.rows.len(), 7);
        assert_eq!(summary.rows[6][1], ReportCell::Amount(Decimal::new(7000, 2)));

        assert_eq!(report.sheet(SHEET_REVERSALS).unwrap().rows.len(), 2);

        let check = report.sheet(SHEET_AMOUNT_CHECK).unwrap();
        assert_eq!(check.rows.len(), 1);
        assert_eq!(check.rows[0][1], ReportCell::Text("FT1".into()));
        assert_eq!(check.rows[0][5], ReportCell::Amount(Decimal::new(100, 2)));

        let dds = report.sheet(SHEET_DIRECT_DEBITS).unwrap();
        assert_eq!(dds.headers.len(), 5);
        assert_eq!(dds.rows.len(), 1);
    }

    #[test]
    fn period_report_has_two_sheets() {
        let current = input().statement;
        let previous = line(["1", "BALANCE AT PERIOD EN", "", "C", "0.00", "ACC1"]);
        let result = compare_periods(&ReconConfig::new("ACC1"), &current, &previous).unwrap();
        let report = build_period_report(&result);

        assert_eq!(report.sheet_names(), PERIOD_SHEETS.to_vec());
        assert_eq!(report.file_name, "PeriodCompare.xlsx");
        assert_eq!(report.sheet(SHEET_STATEMENT_EXCEPTIONS).unwrap().rows.len(), 3);

        let summary = report.sheet(SHEET_SUMMARY).unwrap();
        assert_eq!(summary.rows[0][0], ReportCell::Text("PREVIOUS".into()));
        assert_eq!(summary.rows[1][3], ReportCell::Amount(Decimal::new(7000, 2)));
    }
}
