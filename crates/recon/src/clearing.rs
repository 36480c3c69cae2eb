//! Channel report loaders: filter accepted rows and project each onto a
//! `(reference, amount)` clearing entry.

use rust_decimal::Decimal;

use crate::aggregate::checked_total;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{Channel, ChannelLoad, ClearingEntry};
use crate::normalize::{normalize_reference, ReasonSplitter, SplitGrammar};
use crate::table::{Cell, Table};

/// Load any channel report.
pub fn load_channel(
    channel: Channel,
    table: &Table,
    config: &ReconConfig,
) -> Result<ChannelLoad, ReconError> {
    match channel {
        Channel::DirectDebit => load_direct_debit(table, config),
        Channel::Eft => load_eft(table, config),
        Channel::Cheque => load_cheque(table, config),
    }
}

// ---------------------------------------------------------------------------
// Direct debits
// ---------------------------------------------------------------------------

/// Approved rows not destined for an excluded bank.
pub fn load_direct_debit(table: &Table, config: &ReconConfig) -> Result<ChannelLoad, ReconError> {
    let col = &config.columns.direct_debit;
    let status_idx = table.require(&col.status)?;
    let bank_idx = table.require(&col.bank)?;
    let source_idx = table.require(&col.source_id)?;
    let reference_idx = table.require(&col.reference)?;
    let amount_idx = table.require(&col.amount)?;

    let mut accepted = Vec::new();
    let mut entries = Vec::new();

    for row in 0..table.len() {
        if !table.cell(row, status_idx).matches_code(&config.approved_status) {
            continue;
        }
        if is_excluded_bank(table.cell(row, bank_idx), config) {
            continue;
        }

        let amount = cast_amount(Channel::DirectDebit, row, &col.amount, table.cell(row, amount_idx))?;
        entries.push(entry(Channel::DirectDebit, table, row, source_idx, reference_idx, &col.reference, amount)?);
        accepted.push(row);
    }

    finish(Channel::DirectDebit, table, &accepted, entries)
}

// ---------------------------------------------------------------------------
// EFTs
// ---------------------------------------------------------------------------

/// Every row is accepted; amounts are taken at their source type.
pub fn load_eft(table: &Table, config: &ReconConfig) -> Result<ChannelLoad, ReconError> {
    let col = &config.columns.eft;
    let source_idx = table.require(&col.source_id)?;
    let reference_idx = table.require(&col.reference)?;
    let amount_idx = table.require(&col.amount)?;

    let mut entries = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let amount = typed_amount(Channel::Eft, row, &col.amount, table.cell(row, amount_idx))?;
        entries.push(entry(Channel::Eft, table, row, source_idx, reference_idx, &col.reference, amount)?);
    }

    let all: Vec<usize> = (0..table.len()).collect();
    finish(Channel::Eft, table, &all, entries)
}

// ---------------------------------------------------------------------------
// Cheques
// ---------------------------------------------------------------------------

/// Row filter for a cheque batch, chosen once from the report's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChequeFilter {
    /// Report has a status column: approved, not excluded, stage in `cheque_stages`.
    WithStatus { status: usize },
    /// No status column: not excluded, stage in `cheque_stages_without_status`.
    StageOnly,
}

impl ChequeFilter {
    pub fn resolve(table: &Table, config: &ReconConfig) -> Self {
        match table.column(&config.columns.cheque.status) {
            Some(status) => Self::WithStatus { status },
            None => Self::StageOnly,
        }
    }

    fn accepts(&self, table: &Table, row: usize, bank: usize, stage: usize, config: &ReconConfig) -> bool {
        if is_excluded_bank(table.cell(row, bank), config) {
            return false;
        }
        let stage_text = table.cell(row, stage).as_text();
        match self {
            Self::WithStatus { status } => {
                table.cell(row, *status).matches_code(&config.approved_status)
                    && config.cheque_stages.iter().any(|s| *s == stage_text)
            }
            Self::StageOnly => config.cheque_stages_without_status.iter().any(|s| *s == stage_text),
        }
    }
}

/// Cheque rows carry their reference inside the reject-reason field; the
/// split grammar is decided once for the accepted batch.
pub fn load_cheque(table: &Table, config: &ReconConfig) -> Result<ChannelLoad, ReconError> {
    let col = &config.columns.cheque;
    let bank_idx = table.require(&col.bank)?;
    let stage_idx = table.require(&col.stage)?;
    let source_idx = table.require(&col.source_id)?;
    let reason_idx = table.require(&col.reason)?;
    let amount_idx = table.require(&col.amount)?;

    let filter = ChequeFilter::resolve(table, config);
    if filter == ChequeFilter::StageOnly {
        log::info!("cheque report has no '{}' column; filtering by stage only", col.status);
    }

    let accepted: Vec<usize> = (0..table.len())
        .filter(|&row| filter.accepts(table, row, bank_idx, stage_idx, config))
        .collect();

    let reasons: Vec<String> = accepted
        .iter()
        .map(|&row| table.cell(row, reason_idx).as_text())
        .collect();
    let grammar = SplitGrammar::detect(reasons.iter().map(String::as_str), &config.nocredit_marker);
    log::debug!("cheque batch: {} accepted rows, split grammar {:?}", accepted.len(), grammar);
    let splitter: ReasonSplitter = grammar.splitter();

    let mut entries = Vec::with_capacity(accepted.len());
    for (&row, reason) in accepted.iter().zip(&reasons) {
        let reference = splitter.reference(row + 1, reason)?;
        let amount = typed_amount(Channel::Cheque, row, &col.amount, table.cell(row, amount_idx))?;
        entries.push(ClearingEntry {
            channel: Channel::Cheque,
            source_id: table.cell(row, source_idx).as_text(),
            reference,
            amount,
            source_row: row + 1,
        });
    }

    finish(Channel::Cheque, table, &accepted, entries)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn is_excluded_bank(cell: &Cell, config: &ReconConfig) -> bool {
    let bank = cell.as_text();
    config.excluded_banks.iter().any(|b| *b == bank)
}

/// Explicit cast: numeric cells as-is, text with thousands separators stripped.
fn cast_amount(channel: Channel, row: usize, column: &str, cell: &Cell) -> Result<Decimal, ReconError> {
    let parsed = match cell {
        Cell::Text(s) => Decimal::from_str_exact(&s.trim().replace(',', "")).ok(),
        other => other.to_decimal(),
    };
    parsed.ok_or_else(|| amount_error(channel, row, column, cell))
}

/// Source typing trusted: numeric cells or plain numeric text only.
fn typed_amount(channel: Channel, row: usize, column: &str, cell: &Cell) -> Result<Decimal, ReconError> {
    cell.to_decimal().ok_or_else(|| amount_error(channel, row, column, cell))
}

fn amount_error(channel: Channel, row: usize, column: &str, cell: &Cell) -> ReconError {
    let reason = if cell.is_empty() { "empty amount" } else { "amount is not numeric" };
    ReconError::parse(&channel.to_string(), row + 1, column, &cell.as_text(), reason)
}

fn entry(
    channel: Channel,
    table: &Table,
    row: usize,
    source_idx: usize,
    reference_idx: usize,
    reference_column: &str,
    amount: Decimal,
) -> Result<ClearingEntry, ReconError> {
    let raw = table.cell(row, reference_idx).as_text();
    let reference = normalize_reference(&raw).ok_or_else(|| {
        ReconError::parse(&channel.to_string(), row + 1, reference_column, &raw, "empty reference")
    })?;
    Ok(ClearingEntry {
        channel,
        source_id: table.cell(row, source_idx).as_text(),
        reference,
        amount,
        source_row: row + 1,
    })
}

fn finish(
    channel: Channel,
    table: &Table,
    accepted: &[usize],
    entries: Vec<ClearingEntry>,
) -> Result<ChannelLoad, ReconError> {
    let sum = checked_total(
        &channel.to_string(),
        entries.iter().map(|e| (e.source_row, e.amount)),
    )?;
    log::info!(
        "{channel}: {} of {} rows accepted, sum {sum}",
        entries.len(),
        table.len()
    );
    Ok(ChannelLoad {
        channel,
        entries,
        sum,
        accepted: table.select(accepted),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReconConfig {
        ReconConfig::new("ACC1")
    }

    fn table(name: &str, csv: &str) -> Table {
        Table::from_csv_str(name, csv).unwrap()
    }

    #[test]
    fn direct_debit_filters_status_and_bank() {
        let t = table(
            "direct_debit",
            "\
STATUSID,DESTBANK,POLICY1,FTREFERENCE,AMOUNT
1,OTHER BANK,P1,REF1,200.00
2,OTHER BANK,P2,REF2,300.00
1,NIC BANK PLC,P3,REF3,400.00
1,NCBA BANK KENYA PLC,P4,REF4,500.00
1,ANOTHER BANK,P5,REF5,\"1,000.50\"
",
        );
        let load = load_direct_debit(&t, &config()).unwrap();
        let refs: Vec<&str> = load.entries.iter().map(|e| e.reference.as_str()).collect();
        assert_eq!(refs, vec!["REF1", "REF5"]);
        assert_eq!(load.entries[0].source_id, "P1");
        assert_eq!(load.entries[1].amount, Decimal::new(100050, 2));
        assert_eq!(load.sum, Decimal::new(120050, 2));
        assert_eq!(load.accepted.len(), 2);
        assert_eq!(load.entries[1].source_row, 5);
    }

    #[test]
    fn fractional_status_text_is_approved() {
        let t = Table::from_csv_str(
            "direct_debit",
            "STATUSID,DESTBANK,POLICY1,FTREFERENCE,AMOUNT\n1.0,OTHER BANK,P1,REF1,10.00\n2.0,OTHER BANK,P2,REF2,5.00\n",
        )
        .unwrap();
        let load = load_direct_debit(&t, &config()).unwrap();
        let refs: Vec<&str> = load.entries.iter().map(|e| e.reference.as_str()).collect();
        assert_eq!(refs, vec!["REF1"]);
    }

    #[test]
    fn numeric_status_cell_matches_approved_text() {
        let mut t = Table::new(
            "direct_debit",
            ["STATUSID", "DESTBANK", "POLICY1", "FTREFERENCE", "AMOUNT"]
                .map(String::from)
                .to_vec(),
        );
        t.rows.push(vec![
            Cell::Number(1.0),
            Cell::from("OTHER BANK"),
            Cell::Number(12345.0),
            Cell::from("REF1"),
            Cell::Number(200.0),
        ]);
        let load = load_direct_debit(&t, &config()).unwrap();
        assert_eq!(load.entries.len(), 1);
        assert_eq!(load.entries[0].source_id, "12345");
        assert_eq!(load.entries[0].amount, Decimal::from(200));
    }

    #[test]
    fn direct_debit_missing_column() {
        let t = table("direct_debit", "STATUSID,DESTBANK,POLICY1,AMOUNT\n1,X,P,1\n");
        let err = load_direct_debit(&t, &config()).unwrap_err();
        assert_eq!(
            err,
            ReconError::MissingColumn { report: "direct_debit".into(), column: "FTREFERENCE".into() }
        );
    }

    #[test]
    fn eft_accepts_every_row() {
        let t = table(
            "eft",
            "\
ACHBULKID,TRNREF,AMOUNT,STAGE
B1,FT500,10.00,REJECTED
B2,FT501,20.00,COMPLETE
",
        );
        let load = load_eft(&t, &config()).unwrap();
        assert_eq!(load.entries.len(), 2);
        assert_eq!(load.sum, Decimal::new(3000, 2));
        assert_eq!(load.accepted, t);
    }

    #[test]
    fn eft_amount_trusts_source_typing() {
        let t = table("eft", "ACHBULKID,TRNREF,AMOUNT\nB1,FT500,\"1,000.00\"\n");
        let err = load_eft(&t, &config()).unwrap_err();
        match err {
            ReconError::Parse { source, line, field, .. } => {
                assert_eq!(source, "eft");
                assert_eq!(line, 1);
                assert_eq!(field, "AMOUNT");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_reference_is_a_parse_error() {
        let t = table("eft", "ACHBULKID,TRNREF,AMOUNT\nB1,,10.00\n");
        let err = load_eft(&t, &config()).unwrap_err();
        assert!(err.to_string().contains("empty reference"));
    }

    #[test]
    fn cheque_with_status_column() {
        let t = table(
            "cheque",
            "\
STATUSID,DESTBANK,STAGE,CHEQUENO,CBS_REJECT_REASON,AMOUNT
1,OTHER BANK,ACH CREATION,100001,\"PAID,FT700\",50.00
1,OTHER BANK,COMPLETE,100002,\"PAID,FT701\",60.00
0,OTHER BANK,COMPLETE,100003,\"PAID,FT702\",70.00
1,OTHER BANK,PENDING,100004,\"PAID,FT703\",80.00
1,NIC BANK PLC,COMPLETE,100005,\"PAID,FT704\",90.00
",
        );
        assert_eq!(
            ChequeFilter::resolve(&t, &config()),
            ChequeFilter::WithStatus { status: 0 }
        );
        let load = load_cheque(&t, &config()).unwrap();
        let refs: Vec<&str> = load.entries.iter().map(|e| e.reference.as_str()).collect();
        assert_eq!(refs, vec!["FT700", "FT701"]);
        assert_eq!(load.entries[0].source_id, "100001");
        assert_eq!(load.sum, Decimal::new(11000, 2));
    }

    #[test]
    fn cheque_without_status_column_uses_stage_only() {
        let t = table(
            "cheque",
            "\
DESTBANK,STAGE,CHEQUENO,CBS_REJECT_REASON,AMOUNT
OTHER BANK,ACH CREATION,1,\"PAID,FT800\",5.00
OTHER BANK,COMPLETE,2,\"PAID,FT801\",6.00
",
        );
        assert_eq!(ChequeFilter::resolve(&t, &config()), ChequeFilter::StageOnly);
        let load = load_cheque(&t, &config()).unwrap();
        assert_eq!(load.entries.len(), 1);
        assert_eq!(load.entries[0].reference, "FT800");
    }

    #[test]
    fn nocredit_marker_switches_whole_batch_to_three_parts() {
        let t = table(
            "cheque",
            "\
DESTBANK,STAGE,CHEQUENO,CBS_REJECT_REASON,AMOUNT
OTHER BANK,ACH CREATION,1,\"NOCREDIT,FT100-FT101\",5.00
OTHER BANK,ACH CREATION,2,\"NOCREDIT,FT100-FT101\",5.00
OTHER BANK,ACH CREATION,3,\"PAID,FT300-X\",7.00
",
        );
        let load = load_cheque(&t, &config()).unwrap();
        let refs: Vec<&str> = load.entries.iter().map(|e| e.reference.as_str()).collect();
        assert_eq!(refs, vec!["FT100", "FT100", "FT300"]);
    }

    #[test]
    fn rejected_rows_do_not_select_the_grammar() {
        // The NOCREDIT row is filtered out by stage, so the batch stays two-part.
        let t = table(
            "cheque",
            "\
DESTBANK,STAGE,CHEQUENO,CBS_REJECT_REASON,AMOUNT
OTHER BANK,PENDING,1,\"NOCREDIT,FT100-FT101\",5.00
OTHER BANK,ACH CREATION,2,\"PAID,FT200\",7.00
",
        );
        let load = load_cheque(&t, &config()).unwrap();
        assert_eq!(load.entries[0].reference, "FT200");
    }

    #[test]
    fn cheque_split_mismatch_is_ambiguous() {
        let t = table(
            "cheque",
            "\
DESTBANK,STAGE,CHEQUENO,CBS_REJECT_REASON,AMOUNT
OTHER BANK,ACH CREATION,1,\"NOCREDIT,FT100-FT101\",5.00
OTHER BANK,ACH CREATION,2,\"PAID,FT200\",7.00
",
        );
        let err = load_cheque(&t, &config()).unwrap_err();
        assert_eq!(
            err,
            ReconError::AmbiguousSplit { row: 2, value: "PAID,FT200".into(), expected: 3, found: 2 }
        );
    }

    #[test]
    fn empty_cheque_batch() {
        let t = table("cheque", "DESTBANK,STAGE,CHEQUENO,CBS_REJECT_REASON,AMOUNT\n");
        let load = load_cheque(&t, &config()).unwrap();
        assert!(load.entries.is_empty());
        assert_eq!(load.sum, Decimal::ZERO);
    }
}
