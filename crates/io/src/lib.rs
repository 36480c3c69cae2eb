// File boundary: statement text and channel reports in, xlsx report out

pub mod artifact;
pub mod csv;
pub mod escape;
pub mod xlsx;

use std::path::Path;

use clearpoint_recon::{ReconError, Table};

pub use artifact::ReportArtifact;
pub use escape::escape_non_ascii;

/// Read the fixed-width statement export.
pub fn read_statement(path: &Path) -> Result<String, ReconError> {
    csv::read_file_as_utf8(path)
}

/// Read a channel report, choosing the reader by file extension.
pub fn read_table(path: &Path) -> Result<Table, ReconError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => xlsx::import(path),
        "tsv" | "tab" => csv::import_tsv(path),
        "csv" | "txt" => csv::import(path),
        other => Err(ReconError::Io(format!(
            "{}: unsupported report format '{other}'",
            path.display()
        ))),
    }
}
