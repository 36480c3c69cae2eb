// Excel channel report import (xls, xlsx, xlsb, ods) and report export (xlsx only)
//
// Import: first worksheet only, first row is the header.
// Export: one worksheet per report sheet, in report order.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

use clearpoint_recon::report::{ReconReport, ReportCell, SheetData};
use clearpoint_recon::{Cell, ReconError, Table};

use crate::csv::report_name;
use crate::escape::escape_non_ascii;

/// Number format for amount cells.
pub const AMOUNT_FORMAT: &str = "#,##0.00";

/// Import the first worksheet of an Excel file as a table.
pub fn import(path: &Path) -> Result<Table, ReconError> {
    let name = report_name(path);
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| ReconError::Io(format!("Failed to open Excel file {}: {e}", path.display())))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| ReconError::Io(format!("{name}: Excel file contains no sheets")))?;
    let range = workbook
        .worksheet_range(first)
        .map_err(|e| ReconError::Io(format!("{name}: Failed to read sheet '{first}': {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|d| convert(d).as_text()).collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(name.as_str(), headers);
    let width = table.width();
    for row in rows {
        let mut cells: Vec<Cell> = row.iter().take(width).map(convert).collect();
        cells.resize(width, Cell::Empty);
        table.rows.push(cells);
    }

    log::debug!(
        "imported {name} (sheet '{first}'): {} columns, {} rows",
        table.width(),
        table.len()
    );
    Ok(table)
}

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(format!("#{e:?}")),
        // Serial number, 1900 date system.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Render a report to xlsx bytes.
pub fn export(report: &ReconReport) -> Result<Vec<u8>, ReconError> {
    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format(AMOUNT_FORMAT);

    let mut xlsx_workbook = XlsxWorkbook::new();
    for sheet in &report.sheets {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| ReconError::Report(format!("Failed to create sheet '{}': {e}", sheet.name)))?;
        export_sheet(worksheet, sheet, &header_format, &amount_format)
            .map_err(|e| ReconError::Report(format!("Failed to write sheet '{}': {e}", sheet.name)))?;
    }

    xlsx_workbook
        .save_to_buffer()
        .map_err(|e| ReconError::Report(format!("Failed to save XLSX: {e}")))
}

fn export_sheet(
    worksheet: &mut Worksheet,
    sheet: &SheetData,
    header_format: &Format,
    amount_format: &Format,
) -> Result<(), String> {
    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, header_format)
            .map_err(|e| e.to_string())?;
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        let row32 = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let col16 = c as u16;
            match cell {
                ReportCell::Text(s) => write_text(worksheet, row32, col16, s, sheet.escape_non_ascii)?,
                ReportCell::Amount(d) => {
                    worksheet
                        .write_number_with_format(row32, col16, to_f64(*d)?, amount_format)
                        .map_err(|e| e.to_string())?;
                }
                ReportCell::Raw(Cell::Empty) => {}
                ReportCell::Raw(Cell::Text(s)) => {
                    write_text(worksheet, row32, col16, s, sheet.escape_non_ascii)?
                }
                ReportCell::Raw(Cell::Number(n)) => {
                    worksheet.write_number(row32, col16, *n).map_err(|e| e.to_string())?;
                }
                ReportCell::Raw(Cell::Bool(b)) => {
                    worksheet.write_boolean(row32, col16, *b).map_err(|e| e.to_string())?;
                }
            }
        }
    }
    Ok(())
}

fn write_text(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
    escape: bool,
) -> Result<(), String> {
    let result = if escape {
        worksheet.write_string(row, col, escape_non_ascii(text))
    } else {
        worksheet.write_string(row, col, text)
    };
    result.map(|_| ()).map_err(|e| e.to_string())
}

fn to_f64(d: Decimal) -> Result<f64, String> {
    d.to_f64().ok_or_else(|| format!("amount {d} out of range"))
}
