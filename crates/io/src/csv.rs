// CSV/TSV channel report import

use std::io::Read;
use std::path::Path;

use clearpoint_recon::{ReconError, Table};

/// Import a delimited report, sniffing the delimiter from the first lines.
pub fn import(path: &Path) -> Result<Table, ReconError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&report_name(path), &content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Table, ReconError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&report_name(path), &content, b'\t')
}

fn import_from_string(name: &str, content: &str, delimiter: u8) -> Result<Table, ReconError> {
    // Excel-exported CSVs often start with a UTF-8 BOM.
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let table = Table::from_delimited_str(name, content, delimiter)?;
    log::debug!(
        "imported {name}: {} columns, {} rows (delimiter {:?})",
        table.width(),
        table.len(),
        delimiter as char
    );
    Ok(table)
}

pub(crate) fn report_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Consistent lines weighted by field count; more columns breaks ties.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| ReconError::Io(format!("cannot open {}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (core banking exports)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::warn!("{} is not UTF-8; decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sniff_semicolon_delimiter() {
        let content = "ACHBULKID;TRNREF;AMOUNT\nB1;FT1;10.00\nB2;FT2;20.00\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn sniff_comma_with_quoted_amounts() {
        let content = "POLICY1,FTREFERENCE,AMOUNT\nP1,FT1,\"1,250.00\"\nP2,FT2,80.00\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn sniff_tab_delimiter() {
        let content = "CHEQUENO\tAMOUNT\n001\t5.00\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn import_semicolon_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("efts.csv");
        fs::write(&path, "\u{feff}ACHBULKID;TRNREF;AMOUNT\nB1;FT1;10.00\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.name, "efts.csv");
        assert_eq!(table.headers, vec!["ACHBULKID", "TRNREF", "AMOUNT"]);
        assert_eq!(table.cell(0, 1).as_text(), "FT1");
    }

    #[test]
    fn windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cheques.csv");
        // "CAFÉ" with É as the single byte 0xC9
        fs::write(&path, b"DESTBANK,AMOUNT\nCAF\xC9,1.00\n").unwrap();

        let text = read_file_as_utf8(&path).unwrap();
        assert!(text.contains("CAFÉ"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = import(&dir.path().join("nope.csv")).unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
