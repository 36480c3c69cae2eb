//! Fixed-width ledger statement parser.
//!
//! Each line carries six positional fields: sequence, narration, reference
//! code, flag, amount text and account reference. Widths come from config.

use rust_decimal::Decimal;

use crate::config::{BalancePolicy, ReconConfig};
use crate::error::ReconError;
use crate::model::{ParsedStatement, StatementEntry};
use crate::normalize::{normalize_amount, normalize_reference};

const SOURCE: &str = "statement";
const FIELD_NAMES: [&str; 6] = ["sequence", "narration", "code", "flag", "amount", "account"];

/// One decoded line before account filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub line: usize,
    pub fields: [String; 6],
}

impl RawLine {
    pub fn sequence(&self) -> &str {
        &self.fields[0]
    }

    pub fn narration(&self) -> &str {
        &self.fields[1]
    }

    pub fn code(&self) -> &str {
        &self.fields[2]
    }

    pub fn amount_text(&self) -> &str {
        &self.fields[4]
    }

    pub fn account(&self) -> &str {
        &self.fields[5]
    }

    fn amount(&self) -> Result<Decimal, ReconError> {
        normalize_amount(self.amount_text())
            .map_err(|reason| ReconError::parse(SOURCE, self.line, "amount", self.amount_text(), reason))
    }
}

/// Split one line into six trimmed fields by character offsets.
///
/// A line that stops early gets empty trailing fields; such a line has no
/// account reference and so never becomes an entry. Text past the last
/// field is a field-count mismatch.
pub fn decode_line(line_no: usize, line: &str, widths: &[usize]) -> Result<RawLine, ReconError> {
    let chars: Vec<char> = line.trim_end_matches(['\r', '\n']).chars().collect();
    let total: usize = widths.iter().sum();

    if chars.len() > total && chars[total..].iter().any(|c| !c.is_whitespace()) {
        let extra: String = chars[total..].iter().collect();
        return Err(ReconError::parse(
            SOURCE,
            line_no,
            "account",
            extra.trim(),
            "expected 6 fields, found trailing data",
        ));
    }

    let mut fields: [String; 6] = Default::default();
    let mut start = 0;
    for (i, width) in widths.iter().enumerate() {
        let begin = start.min(chars.len());
        let end = (start + width).min(chars.len());
        fields[i] = chars[begin..end].iter().collect::<String>().trim().to_string();
        start += width;
    }

    Ok(RawLine { line: line_no, fields })
}

/// Sort key for the sequence field: numbers first (numerically), then text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SequenceKey<'a> {
    Number(Decimal),
    Text(&'a str),
}

fn sequence_key(field: &str) -> SequenceKey<'_> {
    match field.parse::<Decimal>() {
        Ok(n) => SequenceKey::Number(n),
        Err(_) => SequenceKey::Text(field),
    }
}

/// Decode every non-blank line and order by sequence (stable).
pub fn decode(text: &str, widths: &[usize]) -> Result<Vec<RawLine>, ReconError> {
    let mut lines = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        lines.push(decode_line(idx + 1, line, widths)?);
    }
    lines.sort_by(|a, b| sequence_key(a.sequence()).cmp(&sequence_key(b.sequence())));
    Ok(lines)
}

/// Parse a statement: closing balance plus the target account's entries,
/// sorted by amount ascending. Sentinel rows are never entries.
pub fn parse_statement(text: &str, config: &ReconConfig) -> Result<ParsedStatement, ReconError> {
    let lines = decode(text, &config.statement.widths)?;
    let mut warnings = Vec::new();

    let balance_rows: Vec<&RawLine> = lines
        .iter()
        .filter(|l| l.narration() == config.balance_sentinel)
        .collect();

    let balance_row = match (balance_rows.as_slice(), config.balance_policy) {
        ([], _) => {
            return Err(ReconError::MissingBalanceRow {
                sentinel: config.balance_sentinel.clone(),
                found: 0,
            })
        }
        ([only], _) => *only,
        (many, BalancePolicy::Strict) => {
            return Err(ReconError::MissingBalanceRow {
                sentinel: config.balance_sentinel.clone(),
                found: many.len(),
            })
        }
        ([first, ..], BalancePolicy::First) => {
            let msg = format!(
                "{} '{}' rows in statement; using line {}",
                balance_rows.len(),
                config.balance_sentinel,
                first.line
            );
            log::warn!("{msg}");
            warnings.push(msg);
            *first
        }
    };
    let closing_balance = balance_row.amount()?;

    let mut entries = Vec::new();
    for line in lines
        .iter()
        .filter(|l| l.narration() != config.balance_sentinel)
        .filter(|l| l.account() == config.target_account)
    {
        let reference = normalize_reference(line.code()).ok_or_else(|| {
            ReconError::parse(SOURCE, line.line, "code", line.code(), "empty reference")
        })?;
        entries.push(StatementEntry {
            narration: line.narration().to_string(),
            reference,
            amount: line.amount()?,
            source_order: line.line,
        });
    }

    entries.sort_by(|a, b| a.amount.cmp(&b.amount));

    log::info!(
        "statement parsed: {} lines, {} entries for {}, closing balance {}",
        lines.len(),
        entries.len(),
        config.target_account,
        closing_balance
    );

    Ok(ParsedStatement {
        entries,
        closing_balance,
        warnings,
    })
}
