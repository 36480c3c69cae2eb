use std::fmt;

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// Malformed fixed-width row, non-numeric amount, or empty reference.
    Parse {
        /// Input the row came from ("statement", "direct_debit", ...).
        source: String,
        /// 1-based line (statement) or data row (reports); 0 for a
        /// summary-level total.
        line: usize,
        field: String,
        value: String,
        reason: String,
    },
    /// Balance sentinel row absent, or duplicated under the strict policy.
    MissingBalanceRow { sentinel: String, found: usize },
    /// Cheque reject reason did not split into the batch grammar's part count.
    AmbiguousSplit {
        row: usize,
        value: String,
        expected: usize,
        found: usize,
    },
    /// Required column absent from a clearing report.
    MissingColumn { report: String, column: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty account, bad widths, negative tolerance).
    ConfigValidation(String),
    /// IO error (file read, temp write, rename).
    Io(String),
    /// Workbook rendering error.
    Report(String),
}

impl ReconError {
    /// Stable label for diagnostics and machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse_error",
            Self::MissingBalanceRow { .. } => "missing_balance_row",
            Self::AmbiguousSplit { .. } => "ambiguous_split",
            Self::MissingColumn { .. } => "missing_column",
            Self::ConfigParse(_) => "config_parse",
            Self::ConfigValidation(_) => "config_validation",
            Self::Io(_) => "io",
            Self::Report(_) => "report",
        }
    }

    pub(crate) fn parse(
        source: &str,
        line: usize,
        field: &str,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            source: source.into(),
            line,
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Adding `amount` at `line` left the decimal range.
    pub(crate) fn overflow(source: &str, line: usize, amount: Decimal) -> Self {
        Self::parse(source, line, "amount", &amount.to_string(), "total exceeds decimal range")
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { source, line, field, value, reason } => {
                write!(f, "{source} line {line}, field '{field}': {reason} ('{value}')")
            }
            Self::MissingBalanceRow { sentinel, found: 0 } => {
                write!(f, "no '{sentinel}' row in statement")
            }
            Self::MissingBalanceRow { sentinel, found } => {
                write!(f, "expected one '{sentinel}' row in statement, found {found}")
            }
            Self::AmbiguousSplit { row, value, expected, found } => write!(
                f,
                "cheque row {row}: reject reason '{value}' split into {found} part(s), expected {expected}"
            ),
            Self::MissingColumn { report, column } => {
                write!(f, "report '{report}': missing column '{column}'")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Report(msg) => write!(f, "report error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        let err = ReconError::MissingColumn { report: "eft".into(), column: "TRNREF".into() };
        assert_eq!(err.kind(), "missing_column");
        assert_eq!(err.to_string(), "report 'eft': missing column 'TRNREF'");
    }

    #[test]
    fn missing_vs_duplicated_balance_row() {
        let none = ReconError::MissingBalanceRow { sentinel: "BAL".into(), found: 0 };
        let dup = ReconError::MissingBalanceRow { sentinel: "BAL".into(), found: 2 };
        assert!(none.to_string().contains("no 'BAL' row"));
        assert!(dup.to_string().contains("found 2"));
    }
}
