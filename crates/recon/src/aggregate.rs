use rust_decimal::Decimal;

use crate::error::ReconError;
use crate::model::{
    Channel, ChannelLoad, ChannelSums, PeriodSummary, SnapshotSummary, StatementEntry,
    SummaryReport,
};

pub const LABEL_CREDITS: &str = "TOTAL STATEMENT CREDITS";
pub const LABEL_DEBITS: &str = "TOTAL STATEMENT DEBITS";
pub const LABEL_DIRECT_DEBITS: &str = "DIRECT DEBITS";
pub const LABEL_CHEQUES: &str = "CHEQUES";
pub const LABEL_EFTS: &str = "EFTs";
pub const LABEL_TOTAL_CLEARED: &str = "TOTAL DEBITS CLEARED";
pub const LABEL_CLOSING_BALANCE: &str = "BALANCE AT THE END";

/// Add `(line, amount)` pairs in order. The first addition that leaves the
/// decimal range fails, naming that line.
pub fn checked_total(
    source: &str,
    amounts: impl IntoIterator<Item = (usize, Decimal)>,
) -> Result<Decimal, ReconError> {
    amounts.into_iter().try_fold(Decimal::ZERO, |total, (line, amount)| {
        total
            .checked_add(amount)
            .ok_or_else(|| ReconError::overflow(source, line, amount))
    })
}

/// Sum of positive and of negative statement amounts.
pub fn statement_totals(entries: &[StatementEntry]) -> Result<(Decimal, Decimal), ReconError> {
    let signed = |keep: fn(&Decimal) -> bool| {
        entries
            .iter()
            .filter(move |e| keep(&e.amount))
            .map(|e| (e.source_order, e.amount))
    };
    let credits = checked_total("statement", signed(|a| *a > Decimal::ZERO))?;
    let debits = checked_total("statement", signed(|a| *a < Decimal::ZERO))?;
    Ok((credits, debits))
}

pub fn summarize(
    statement: &[StatementEntry],
    loads: &[ChannelLoad],
    closing_balance: Decimal,
) -> Result<SummaryReport, ReconError> {
    let (credits, debits) = statement_totals(statement)?;
    let channel_sum = |channel: Channel| {
        checked_total(
            "summary",
            loads.iter().filter(|l| l.channel == channel).map(|l| (0, l.sum)),
        )
    };
    let per_channel = ChannelSums {
        direct_debit: channel_sum(Channel::DirectDebit)?,
        eft: channel_sum(Channel::Eft)?,
        cheque: channel_sum(Channel::Cheque)?,
    };
    let total_cleared_debits = checked_total(
        "summary",
        [(0, per_channel.direct_debit), (0, per_channel.cheque)],
    )?;

    Ok(SummaryReport {
        total_statement_credits: credits,
        total_statement_debits: debits,
        total_cleared_debits,
        per_channel,
        closing_balance,
    })
}

impl SummaryReport {
    /// Labelled lines in presentation order.
    pub fn lines(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            (LABEL_CREDITS, self.total_statement_credits),
            (LABEL_DEBITS, self.total_statement_debits),
            (LABEL_DIRECT_DEBITS, self.per_channel.direct_debit),
            (LABEL_CHEQUES, self.per_channel.cheque),
            (LABEL_EFTS, self.per_channel.eft),
            (LABEL_TOTAL_CLEARED, self.total_cleared_debits),
            (LABEL_CLOSING_BALANCE, self.closing_balance),
        ]
    }
}

pub fn snapshot_summary(
    entries: &[StatementEntry],
    closing_balance: Decimal,
) -> Result<SnapshotSummary, ReconError> {
    let (credits, debits) = statement_totals(entries)?;
    Ok(SnapshotSummary {
        credits,
        debits,
        closing_balance,
    })
}

pub fn period_summary(previous: SnapshotSummary, current: SnapshotSummary) -> PeriodSummary {
    PeriodSummary { previous, current }
}
