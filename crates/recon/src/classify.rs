use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::ReconError;
use crate::model::{
    ClearedSet, ClearingEntry, DiscrepancyRecord, DuplicateGroup, Exceptions, MatchOutcome,
    Referenced, StatementEntry,
};

/// Group entries by reference, keeping groups with two or more members.
/// Groups are ordered by first appearance; members keep source order.
pub fn duplicate_groups<T>(entries: &[T]) -> Vec<DuplicateGroup<T>>
where
    T: Referenced + Clone,
{
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&T>> = HashMap::new();
    for entry in entries {
        let members = groups.entry(entry.reference()).or_default();
        if members.is_empty() {
            order.push(entry.reference());
        }
        members.push(entry);
    }

    order
        .into_iter()
        .filter_map(|reference| {
            let members = &groups[reference];
            (members.len() >= 2).then(|| DuplicateGroup {
                reference: reference.to_string(),
                members: members.iter().map(|m| (*m).clone()).collect(),
            })
        })
        .collect()
}

/// Statement references posted more than once.
pub fn detect_reversals(statement: &[StatementEntry]) -> Vec<DuplicateGroup<StatementEntry>> {
    duplicate_groups(statement)
}

/// Cleared references posted more than once, restricted to references
/// containing `marker` (policy numbers and the like are skipped).
pub fn detect_cleared_duplicates(
    cleared: &ClearedSet,
    marker: &str,
) -> Vec<DuplicateGroup<ClearingEntry>> {
    duplicate_groups(&cleared.entries)
        .into_iter()
        .filter(|g| g.reference.contains(marker))
        .collect()
}

/// Matched pairs whose `cleared - |statement|` exceeds `tolerance` (strictly).
pub fn detect_discrepancies(
    outcome: &MatchOutcome,
    tolerance: Decimal,
) -> Result<Vec<DiscrepancyRecord>, ReconError> {
    let mut flagged = Vec::new();
    for (statement, cleared) in outcome.matched_pairs() {
        let diff = cleared.amount.checked_sub(statement.amount.abs()).ok_or_else(|| {
            ReconError::overflow(&cleared.channel.to_string(), cleared.source_row, cleared.amount)
        })?;
        if diff.abs() > tolerance {
            flagged.push(DiscrepancyRecord {
                statement: statement.clone(),
                cleared: cleared.clone(),
                diff,
            });
        }
    }
    Ok(flagged)
}

pub fn classify(
    statement: &[StatementEntry],
    cleared: &ClearedSet,
    outcome: &MatchOutcome,
    tolerance: Decimal,
    marker: &str,
) -> Result<Exceptions, ReconError> {
    let exceptions = Exceptions {
        reversals: detect_reversals(statement),
        cleared_duplicates: detect_cleared_duplicates(cleared, marker),
        discrepancies: detect_discrepancies(outcome, tolerance)?,
    };
    log::info!(
        "classified: {} reversal groups, {} cleared duplicate groups, {} discrepancies",
        exceptions.reversals.len(),
        exceptions.cleared_duplicates.len(),
        exceptions.discrepancies.len()
    );
    Ok(exceptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::match_statement;
    use crate::model::Channel;
    use std::str::FromStr;

    fn stmt(reference: &str, amount: &str) -> StatementEntry {
        StatementEntry {
            narration: String::new(),
            reference: reference.into(),
            amount: Decimal::from_str(amount).unwrap(),
            source_order: 0,
        }
    }

    fn clr(reference: &str, amount: &str) -> ClearingEntry {
        ClearingEntry {
            channel: Channel::DirectDebit,
            source_id: String::new(),
            reference: reference.into(),
            amount: Decimal::from_str(amount).unwrap(),
            source_row: 1,
        }
    }

    #[test]
    fn reversal_groups_share_reference() {
        let statement = vec![
            stmt("FT1", "-10"),
            stmt("FT2", "5"),
            stmt("FT1", "10"),
            stmt("FT3", "1"),
            stmt("FT2", "-5"),
        ];
        let groups = detect_reversals(&statement);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].reference, "FT1");
        assert_eq!(groups[1].reference, "FT2");
        for g in &groups {
            assert!(g.members.len() >= 2);
            assert!(g.members.iter().all(|m| m.reference == g.reference));
        }
    }

    #[test]
    fn cleared_duplicates_require_marker() {
        let cleared = ClearedSet {
            entries: vec![
                clr("FT100", "5"),
                clr("POL9", "1"),
                clr("FT100", "5"),
                clr("POL9", "1"),
                clr("FT200", "3"),
            ],
        };
        let groups = detect_cleared_duplicates(&cleared, "FT");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].reference, "FT100");
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn tolerance_is_strict() {
        let statement = vec![
            stmt("EXACT", "-200.00"),
            stmt("EDGE", "-100.00"),
            stmt("OVER", "-100.00"),
        ];
        let cleared = ClearedSet {
            entries: vec![
                clr("EXACT", "200.00"),
                clr("EDGE", "100.50"),
                clr("OVER", "100.50001"),
            ],
        };
        let outcome = match_statement(&statement, &cleared);
        let flagged = detect_discrepancies(&outcome, Decimal::new(5, 1)).unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].statement.reference, "OVER");
        assert_eq!(flagged[0].diff, Decimal::from_str("0.50001").unwrap());
    }

    #[test]
    fn diff_uses_absolute_statement_amount() {
        let statement = vec![stmt("CR", "300.00")];
        let cleared = ClearedSet { entries: vec![clr("CR", "250.00")] };
        let outcome = match_statement(&statement, &cleared);
        let flagged = detect_discrepancies(&outcome, Decimal::new(5, 1)).unwrap();
        assert_eq!(flagged[0].diff, Decimal::from_str("-50.00").unwrap());
    }
}
