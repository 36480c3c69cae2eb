use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::error::ReconError;

pub const DEFAULT_WIDTHS: [usize; 6] = [13, 20, 15, 9, 32, 16];
pub const DEFAULT_BALANCE_SENTINEL: &str = "BALANCE AT PERIOD EN";
pub const DEFAULT_DUPLICATE_MARKER: &str = "FT";
pub const DEFAULT_NOCREDIT_MARKER: &str = "NOCREDIT";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub target_account: String,
    #[serde(default = "default_excluded_banks")]
    pub excluded_banks: Vec<String>,
    #[serde(default = "default_tolerance", deserialize_with = "deserialize_decimal")]
    pub tolerance: Decimal,
    #[serde(default = "default_balance_sentinel")]
    pub balance_sentinel: String,
    #[serde(default = "default_duplicate_marker")]
    pub duplicate_marker: String,
    #[serde(default = "default_nocredit_marker")]
    pub nocredit_marker: String,
    #[serde(default = "default_approved_status")]
    pub approved_status: String,
    #[serde(default = "default_cheque_stages")]
    pub cheque_stages: Vec<String>,
    #[serde(default = "default_cheque_stages_without_status")]
    pub cheque_stages_without_status: Vec<String>,
    #[serde(default)]
    pub balance_policy: BalancePolicy,
    #[serde(default)]
    pub statement: StatementLayout,
    #[serde(default)]
    pub columns: ColumnsConfig,
}

// ---------------------------------------------------------------------------
// Statement layout
// ---------------------------------------------------------------------------

/// What to do when the balance sentinel appears more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    /// Zero or several sentinel rows abort the run.
    #[default]
    Strict,
    /// Several sentinel rows: the first in sequence order wins, with a warning.
    First,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementLayout {
    #[serde(default = "default_widths")]
    pub widths: Vec<usize>,
}

impl Default for StatementLayout {
    fn default() -> Self {
        Self { widths: default_widths() }
    }
}

// ---------------------------------------------------------------------------
// Column mapping per channel report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub direct_debit: DirectDebitColumns,
    #[serde(default)]
    pub eft: EftColumns,
    #[serde(default)]
    pub cheque: ChequeColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectDebitColumns {
    pub status: String,
    pub bank: String,
    pub source_id: String,
    pub reference: String,
    pub amount: String,
}

impl Default for DirectDebitColumns {
    fn default() -> Self {
        Self {
            status: "STATUSID".into(),
            bank: "DESTBANK".into(),
            source_id: "POLICY1".into(),
            reference: "FTREFERENCE".into(),
            amount: "AMOUNT".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EftColumns {
    pub source_id: String,
    pub reference: String,
    pub amount: String,
}

impl Default for EftColumns {
    fn default() -> Self {
        Self {
            source_id: "ACHBULKID".into(),
            reference: "TRNREF".into(),
            amount: "AMOUNT".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChequeColumns {
    /// Optional in the report; its presence selects the stricter filter.
    pub status: String,
    pub bank: String,
    pub stage: String,
    pub source_id: String,
    pub reason: String,
    pub amount: String,
}

impl Default for ChequeColumns {
    fn default() -> Self {
        Self {
            status: "STATUSID".into(),
            bank: "DESTBANK".into(),
            stage: "STAGE".into(),
            source_id: "CHEQUENO".into(),
            reason: "CBS_REJECT_REASON".into(),
            amount: "AMOUNT".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_name() -> String {
    "Statement reconciliation".into()
}

fn default_excluded_banks() -> Vec<String> {
    vec!["NCBA BANK KENYA PLC".into(), "NIC BANK PLC".into()]
}

fn default_tolerance() -> Decimal {
    Decimal::new(5, 1)
}

fn default_balance_sentinel() -> String {
    DEFAULT_BALANCE_SENTINEL.into()
}

fn default_duplicate_marker() -> String {
    DEFAULT_DUPLICATE_MARKER.into()
}

fn default_nocredit_marker() -> String {
    DEFAULT_NOCREDIT_MARKER.into()
}

fn default_approved_status() -> String {
    "1".into()
}

fn default_cheque_stages() -> Vec<String> {
    vec!["ACH CREATION".into(), "COMPLETE".into()]
}

fn default_cheque_stages_without_status() -> Vec<String> {
    vec!["ACH CREATION".into()]
}

fn default_widths() -> Vec<usize> {
    DEFAULT_WIDTHS.to_vec()
}

/// TOML has no decimal type: accept `0.5`, `1` or `"0.5"`.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let text = match Repr::deserialize(deserializer)? {
        Repr::Int(n) => return Ok(Decimal::from(n)),
        Repr::Float(x) => x.to_string(),
        Repr::Text(s) => s,
    };
    Decimal::from_str(text.trim()).map_err(serde::de::Error::custom)
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    /// Default configuration for one target account.
    pub fn new(target_account: impl Into<String>) -> Self {
        Self {
            name: default_name(),
            target_account: target_account.into(),
            excluded_banks: default_excluded_banks(),
            tolerance: default_tolerance(),
            balance_sentinel: default_balance_sentinel(),
            duplicate_marker: default_duplicate_marker(),
            nocredit_marker: default_nocredit_marker(),
            approved_status: default_approved_status(),
            cheque_stages: default_cheque_stages(),
            cheque_stages_without_status: default_cheque_stages_without_status(),
            balance_policy: BalancePolicy::default(),
            statement: StatementLayout::default(),
            columns: ColumnsConfig::default(),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config, letting `account` provide or override `target_account`.
    pub fn from_toml_with_account(input: &str, account: Option<&str>) -> Result<Self, ReconError> {
        let mut table: toml::Table =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        if let Some(account) = account {
            table.insert("target_account".into(), toml::Value::String(account.into()));
        }
        let config: ReconConfig = table
            .try_into()
            .map_err(|e: toml::de::Error| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.target_account.trim().is_empty() {
            return Err(ReconError::ConfigValidation("target_account must not be empty".into()));
        }

        if self.statement.widths.len() != 6 {
            return Err(ReconError::ConfigValidation(format!(
                "statement.widths must list 6 widths, got {}",
                self.statement.widths.len()
            )));
        }
        if self.statement.widths.iter().any(|w| *w == 0) {
            return Err(ReconError::ConfigValidation(
                "statement.widths must all be positive".into(),
            ));
        }

        if self.tolerance.is_sign_negative() {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance must not be negative, got {}",
                self.tolerance
            )));
        }

        for (field, value) in [
            ("balance_sentinel", &self.balance_sentinel),
            ("duplicate_marker", &self.duplicate_marker),
            ("nocredit_marker", &self.nocredit_marker),
        ] {
            if value.is_empty() {
                return Err(ReconError::ConfigValidation(format!("{field} must not be empty")));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
