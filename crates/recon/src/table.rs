//! In-memory tabular report: named columns over typed cells.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ReconError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Text form used for comparisons. Integral numbers drop the fraction
    /// (`1.0` → `"1"`) so status codes read from a workbook compare equal to
    /// the same codes read from CSV.
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Exact decimal value of a numeric cell or plain numeric text.
    ///
    /// Never rounds: text with more precision than `Decimal` can hold fails.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) if n.is_finite() => Decimal::from_str_exact(&n.to_string()).ok(),
            Self::Text(s) => Decimal::from_str_exact(s.trim()).ok(),
            _ => None,
        }
    }

    /// Compare against a configured code: numerically when both sides are
    /// numbers (`"1.0"` matches `"1"`), otherwise as trimmed text.
    pub fn matches_code(&self, code: &str) -> bool {
        match (self.to_decimal(), Decimal::from_str_exact(code.trim())) {
            (Some(value), Ok(wanted)) => value == wanted,
            _ => self.as_text() == code.trim(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Parse CSV text with a header row. Short rows are padded with empty cells.
    pub fn from_csv_str(name: &str, data: &str) -> Result<Self, ReconError> {
        Self::from_delimited_str(name, data, b',')
    }

    pub fn from_delimited_str(name: &str, data: &str, delimiter: u8) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ReconError::Io(format!("{name}: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = Table::new(name, headers);
        for record in reader.records() {
            let record = record.map_err(|e| ReconError::Io(format!("{name}: {e}")))?;
            let row = (0..table.width())
                .map(|i| record.get(i).map(Cell::from).unwrap_or(Cell::Empty))
                .collect();
            table.rows.push(row);
        }
        Ok(table)
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a column that must be present.
    pub fn require(&self, name: &str) -> Result<usize, ReconError> {
        self.column(name).ok_or_else(|| ReconError::MissingColumn {
            report: self.name.clone(),
            column: name.into(),
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    /// Copy of this table restricted to the given rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows: rows.iter().filter_map(|&i| self.rows.get(i).cloned()).collect(),
        }
    }
}
