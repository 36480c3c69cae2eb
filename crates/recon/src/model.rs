use rust_decimal::Decimal;
use serde::Serialize;

use crate::table::Table;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One ledger line of the target account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementEntry {
    pub narration: String,
    pub reference: String,
    pub amount: Decimal,
    /// 1-based line number in the statement file.
    pub source_order: usize,
}

#[derive(Debug, Clone)]
pub struct ParsedStatement {
    /// Sorted by amount ascending (stable on sequence order).
    pub entries: Vec<StatementEntry>,
    pub closing_balance: Decimal,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    DirectDebit,
    Eft,
    Cheque,
}

impl Channel {
    /// Load order; also the grouping order of the cleared union.
    pub const ALL: [Channel; 3] = [Channel::DirectDebit, Channel::Eft, Channel::Cheque];

    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectDebit => "DD",
            Self::Eft => "EFT",
            Self::Cheque => "CHQ",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectDebit => write!(f, "direct_debit"),
            Self::Eft => write!(f, "eft"),
            Self::Cheque => write!(f, "cheque"),
        }
    }
}

/// One accepted row of a channel report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearingEntry {
    pub channel: Channel,
    /// Policy number, ACH bulk id or cheque number, depending on channel.
    pub source_id: String,
    pub reference: String,
    pub amount: Decimal,
    /// 1-based data row in the channel report.
    pub source_row: usize,
}

/// Result of loading one channel report.
#[derive(Debug, Clone)]
pub struct ChannelLoad {
    pub channel: Channel,
    pub entries: Vec<ClearingEntry>,
    pub sum: Decimal,
    /// Raw rows the loader accepted, for the per-channel report sheets.
    pub accepted: Table,
}

/// Ordered union of all channel entries: direct debits, then EFTs, then cheques.
#[derive(Debug, Clone, Default)]
pub struct ClearedSet {
    pub entries: Vec<ClearingEntry>,
}

impl ClearedSet {
    pub fn from_loads(loads: &[ChannelLoad]) -> Self {
        let mut entries = Vec::new();
        for channel in Channel::ALL {
            for load in loads.iter().filter(|l| l.channel == channel) {
                entries.extend(load.entries.iter().cloned());
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_channel(&self, channel: Channel) -> impl Iterator<Item = &ClearingEntry> {
        self.entries.iter().filter(move |e| e.channel == channel)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Anything that takes part in the reference join.
pub trait Referenced {
    fn reference(&self) -> &str;
}

impl Referenced for StatementEntry {
    fn reference(&self) -> &str {
        &self.reference
    }
}

impl Referenced for ClearingEntry {
    fn reference(&self) -> &str {
        &self.reference
    }
}

/// One row of a one-sided outer join. `right` is `None` when the left row
/// had no partner.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRow<L, R> {
    pub left: L,
    pub right: Option<R>,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub statement_join: Vec<JoinRow<StatementEntry, ClearingEntry>>,
    pub cleared_join: Vec<JoinRow<ClearingEntry, StatementEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "side", content = "entry", rename_all = "snake_case")]
pub enum ExceptionRecord {
    StatementOnly(StatementEntry),
    ClearingOnly(ClearingEntry),
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Two or more entries from one source sharing a reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup<T> {
    pub reference: String,
    pub members: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscrepancyRecord {
    pub statement: StatementEntry,
    pub cleared: ClearingEntry,
    /// `cleared.amount - |statement.amount|`
    pub diff: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct Exceptions {
    pub reversals: Vec<DuplicateGroup<StatementEntry>>,
    pub cleared_duplicates: Vec<DuplicateGroup<ClearingEntry>>,
    pub discrepancies: Vec<DiscrepancyRecord>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSums {
    pub direct_debit: Decimal,
    pub eft: Decimal,
    pub cheque: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub total_statement_credits: Decimal,
    pub total_statement_debits: Decimal,
    pub per_channel: ChannelSums,
    /// Direct debits + cheques; EFTs are reported on their own line.
    pub total_cleared_debits: Decimal,
    pub closing_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub credits: Decimal,
    pub debits: Decimal,
    pub closing_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub previous: SnapshotSummary,
    pub current: SnapshotSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Full,
    Period,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub mode: RunMode,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconCounts {
    pub statement_entries: usize,
    pub cleared_entries: usize,
    pub statement_exceptions: usize,
    pub clearing_exceptions: usize,
    pub reversal_groups: usize,
    pub cleared_duplicate_groups: usize,
    pub discrepancies: usize,
}

// ---------------------------------------------------------------------------
// Pipeline input / output
// ---------------------------------------------------------------------------

/// Everything one reconciliation run reads, already in memory.
#[derive(Debug, Clone)]
pub struct ReconInput {
    pub statement: String,
    pub direct_debit: Table,
    pub eft: Table,
    pub cheque: Table,
}

impl ReconInput {
    pub fn report(&self, channel: Channel) -> &Table {
        match channel {
            Channel::DirectDebit => &self.direct_debit,
            Channel::Eft => &self.eft,
            Channel::Cheque => &self.cheque,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub statement: ParsedStatement,
    /// One load per channel, in `Channel::ALL` order.
    pub loads: Vec<ChannelLoad>,
    pub cleared: ClearedSet,
    pub outcome: MatchOutcome,
    pub exceptions: Exceptions,
    pub summary: SummaryReport,
}

impl ReconResult {
    pub fn load(&self, channel: Channel) -> Option<&ChannelLoad> {
        self.loads.iter().find(|l| l.channel == channel)
    }

    pub fn counts(&self) -> ReconCounts {
        ReconCounts {
            statement_entries: self.statement.entries.len(),
            cleared_entries: self.cleared.len(),
            statement_exceptions: self.outcome.statement_exceptions().count(),
            clearing_exceptions: self.outcome.clearing_exceptions().count(),
            reversal_groups: self.exceptions.reversals.len(),
            cleared_duplicate_groups: self.exceptions.cleared_duplicates.len(),
            discrepancies: self.exceptions.discrepancies.len(),
        }
    }
}

/// Period-over-period comparison of two statement snapshots.
#[derive(Debug, Clone)]
pub struct PeriodResult {
    pub meta: ReconMeta,
    pub current: ParsedStatement,
    pub previous: ParsedStatement,
    /// Current entries joined against previous entries by reference.
    pub join: Vec<JoinRow<StatementEntry, StatementEntry>>,
    pub summary: PeriodSummary,
}

impl PeriodResult {
    /// Current entries whose reference never appears in the previous snapshot.
    pub fn exceptions(&self) -> impl Iterator<Item = &StatementEntry> {
        self.join.iter().filter(|r| r.right.is_none()).map(|r| &r.left)
    }

    pub fn counts(&self) -> ReconCounts {
        ReconCounts {
            statement_entries: self.current.entries.len(),
            statement_exceptions: self.exceptions().count(),
            ..ReconCounts::default()
        }
    }
}
