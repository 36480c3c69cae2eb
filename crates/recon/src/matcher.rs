use std::collections::HashMap;

use crate::model::{
    ClearedSet, ClearingEntry, ExceptionRecord, JoinRow, MatchOutcome, Referenced, StatementEntry,
};

/// One-sided outer equality join on `reference`.
///
/// Every left row appears at least once: once per right row sharing its
/// reference, or once with `right: None`. Left order is preserved, and
/// right order within each left row.
pub fn outer_join<L, R>(left: &[L], right: &[R]) -> Vec<JoinRow<L, R>>
where
    L: Referenced + Clone,
    R: Referenced + Clone,
{
    let mut index: HashMap<&str, Vec<&R>> = HashMap::new();
    for r in right {
        index.entry(r.reference()).or_default().push(r);
    }

    let mut rows = Vec::with_capacity(left.len());
    for l in left {
        match index.get(l.reference()) {
            Some(partners) => {
                for r in partners {
                    rows.push(JoinRow {
                        left: l.clone(),
                        right: Some((*r).clone()),
                    });
                }
            }
            None => rows.push(JoinRow {
                left: l.clone(),
                right: None,
            }),
        }
    }
    rows
}

/// Join the statement against the cleared union in both directions.
pub fn match_statement(statement: &[StatementEntry], cleared: &ClearedSet) -> MatchOutcome {
    let outcome = MatchOutcome {
        statement_join: outer_join(statement, &cleared.entries),
        cleared_join: outer_join(&cleared.entries, statement),
    };
    log::info!(
        "matched: {} statement exceptions, {} clearing exceptions",
        outcome.statement_exceptions().count(),
        outcome.clearing_exceptions().count()
    );
    outcome
}

impl MatchOutcome {
    /// Statement entries with no cleared partner.
    pub fn statement_exceptions(&self) -> impl Iterator<Item = &StatementEntry> {
        self.statement_join
            .iter()
            .filter(|row| row.right.is_none())
            .map(|row| &row.left)
    }

    /// Cleared entries with no statement partner.
    pub fn clearing_exceptions(&self) -> impl Iterator<Item = &ClearingEntry> {
        self.cleared_join
            .iter()
            .filter(|row| row.right.is_none())
            .map(|row| &row.left)
    }

    /// Statement/cleared pairs from the statement-side join.
    pub fn matched_pairs(&self) -> impl Iterator<Item = (&StatementEntry, &ClearingEntry)> {
        self.statement_join
            .iter()
            .filter_map(|row| row.right.as_ref().map(|r| (&row.left, r)))
    }

    pub fn exceptions(&self) -> Vec<ExceptionRecord> {
        self.statement_exceptions()
            .cloned()
            .map(ExceptionRecord::StatementOnly)
            .chain(self.clearing_exceptions().cloned().map(ExceptionRecord::ClearingOnly))
            .collect()
    }
}
