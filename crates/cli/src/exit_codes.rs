//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 2    | CLI usage error (bad args, no account given)     |
//! | 3    | Malformed statement line or channel amount/ref   |
//! | 4    | Balance sentinel row missing (or duplicated)     |
//! | 5    | Cheque reject reason did not split cleanly       |
//! | 6    | Channel report lacks a required column           |
//! | 7    | Config file does not parse or validate           |
//! | 8    | Reading inputs or writing the report failed      |

use clearpoint_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Statement line or channel row could not be parsed.
pub const EXIT_PARSE: u8 = 3;

/// No usable closing-balance row in the statement.
pub const EXIT_MISSING_BALANCE: u8 = 4;

/// Cheque reject reason split into the wrong number of parts.
pub const EXIT_AMBIGUOUS_SPLIT: u8 = 5;

/// A channel report is missing a configured column.
pub const EXIT_MISSING_COLUMN: u8 = 6;

/// Config parse or validation failure.
pub const EXIT_INVALID_CONFIG: u8 = 7;

/// File read, report render or publish failure.
pub const EXIT_IO: u8 = 8;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Parse { .. } => EXIT_PARSE,
        ReconError::MissingBalanceRow { .. } => EXIT_MISSING_BALANCE,
        ReconError::AmbiguousSplit { .. } => EXIT_AMBIGUOUS_SPLIT,
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Io(_) | ReconError::Report(_) => EXIT_IO,
    }
}
