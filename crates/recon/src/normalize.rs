//! Amount and reference canonicalisation shared by the statement parser and
//! the channel loaders.

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ReconError;

/// Parse statement-convention amount text.
///
/// Thousands separators are dropped and a trailing minus (`"1,234.56-"`)
/// becomes a leading one. Returns the reason on failure; callers attach
/// source/line context.
pub fn normalize_amount(text: &str) -> Result<Decimal, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("empty amount".into());
    }

    let mut cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    if cleaned.ends_with('-') {
        let magnitude = cleaned.trim_matches(|c| c == '-' || c == ' ');
        cleaned = format!("-{magnitude}");
    }

    Decimal::from_str_exact(&cleaned).map_err(|_| "amount is not numeric".into())
}

/// Trim a join key. An empty key cannot match anything and is rejected.
pub fn normalize_reference(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// How a cheque batch's reject-reason field is split into a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitGrammar {
    /// `REASON,REF`
    TwoPart,
    /// `REASON,REF-REF2`, used when the batch carries a duplicate-credit marker.
    ThreePart,
}

impl SplitGrammar {
    /// Decide the grammar for a whole batch: one reason carrying `marker`
    /// switches every row to the three-part split.
    pub fn detect<'a>(reasons: impl IntoIterator<Item = &'a str>, marker: &str) -> Self {
        if reasons.into_iter().any(|r| r.contains(marker)) {
            Self::ThreePart
        } else {
            Self::TwoPart
        }
    }

    pub fn parts(&self) -> usize {
        match self {
            Self::TwoPart => 2,
            Self::ThreePart => 3,
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Self::TwoPart => "[,]",
            Self::ThreePart => "[,-]",
        }
    }

    pub fn splitter(&self) -> ReasonSplitter {
        ReasonSplitter {
            grammar: *self,
            // Literal character classes; cannot fail to compile.
            regex: Regex::new(self.pattern()).unwrap(),
        }
    }
}

/// Compiled splitter for one batch.
#[derive(Debug, Clone)]
pub struct ReasonSplitter {
    grammar: SplitGrammar,
    regex: Regex,
}

impl ReasonSplitter {
    pub fn grammar(&self) -> SplitGrammar {
        self.grammar
    }

    /// Reference embedded in a reject reason: the second part of the split.
    pub fn reference(&self, row: usize, reason: &str) -> Result<String, ReconError> {
        let parts: Vec<&str> = self.regex.split(reason).collect();
        let expected = self.grammar.parts();
        if parts.len() != expected {
            return Err(ReconError::AmbiguousSplit {
                row,
                value: reason.into(),
                expected,
                found: parts.len(),
            });
        }
        normalize_reference(parts[1]).ok_or_else(|| ReconError::AmbiguousSplit {
            row,
            value: reason.into(),
            expected,
            found: parts.iter().filter(|p| !p.trim().is_empty()).count(),
        })
    }
}
