// src/grid/xlsx.rs

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use super::{Cell, CellRef, Column, Grid, Sheet, Workbook};

const DATE_FORMAT: &str = "mm/dd/yyyy";

/// Read every sheet of the workbook at `path` (values and formulas) into memory.
///
/// The file handle lives only inside this function; it is released on every
/// return path, so later stages work purely on the in-memory copy.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    let mut reader = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {:?}", path))?;

    let mut sheets = Vec::new();
    for name in reader.sheet_names().to_vec() {
        let range = reader
            .worksheet_range(&name)
            .with_context(|| format!("failed to read sheet `{}` in {:?}", name, path))?;

        let mut sheet = Sheet::new(name.clone());
        let (row0, col0) = range.start().unwrap_or((0, 0));
        for (r, row) in range.rows().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let cell = from_calamine(value);
                if cell.is_empty() {
                    continue;
                }
                let at = cell_at(row0 as usize + r, col0 as usize + c)?;
                sheet.set_cell(at, cell)?;
            }
        }

        // formulas are optional: some formats don't expose them
        match reader.worksheet_formula(&name) {
            Ok(formulas) => {
                let (row0, col0) = formulas.start().unwrap_or((0, 0));
                for (r, row) in formulas.rows().enumerate() {
                    for (c, source) in row.iter().enumerate() {
                        if source.is_empty() {
                            continue;
                        }
                        let at = cell_at(row0 as usize + r, col0 as usize + c)?;
                        let cached = sheet.cell(at).clone();
                        let cached = (!cached.is_empty()).then(|| Box::new(cached));
                        sheet.set_cell(
                            at,
                            Cell::Formula {
                                source: source.trim_start_matches('=').to_string(),
                                cached,
                            },
                        )?;
                    }
                }
            }
            Err(e) => debug!(sheet = %name, error = %e, "no formulas read"),
        }

        debug!(sheet = %name, rows = sheet.row_count(), "loaded sheet");
        sheets.push(sheet);
    }
    // drop the reader (and its file handle) now that everything is buffered
    drop(reader);

    info!(sheets = sheets.len(), "workbook loaded");
    Ok(Workbook::from_sheets(sheets))
}

fn cell_at(row: usize, col: usize) -> Result<CellRef> {
    Ok(Column::from_index(col)?.at(row + 1))
}

fn from_calamine(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.clone()),
        Data::Error(e) => Cell::text(format!("#{:?}", e)),
    }
}

/// Write every sheet of `workbook` to a fresh `.xlsx` file at `path`.
#[instrument(level = "info", skip(workbook, path), fields(path = %path.as_ref().display()))]
pub fn save_workbook<P: AsRef<Path>>(workbook: &Workbook, path: P) -> Result<()> {
    let path = path.as_ref();
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let mut xlsx = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx
            .add_worksheet()
            .set_name(sheet.name())
            .with_context(|| format!("failed to create sheet `{}`", sheet.name()))?;

        let mut written = 0usize;
        for (row, cells) in sheet.rows() {
            for (col, cell) in cells.iter().enumerate() {
                let at = cell_at(row - 1, col)?;
                if write_cell(worksheet, at, cell, &date_format)
                    .with_context(|| format!("failed to write {}!{}", sheet.name(), at))?
                {
                    written += 1;
                }
            }
        }
        debug!(sheet = %sheet.name(), cells = written, "sheet written");
    }

    xlsx.save(path)
        .with_context(|| format!("failed to save workbook {:?}", path))?;
    info!("workbook saved");
    Ok(())
}

/// Returns whether anything was written.
fn write_cell(worksheet: &mut Worksheet, at: CellRef, cell: &Cell, date_format: &Format) -> Result<bool> {
    let row = (at.row - 1) as u32;
    let col = at.column.index() as u16;
    match cell {
        Cell::Empty => return Ok(false),
        Cell::Text(s) => {
            if s.is_empty() {
                return Ok(false);
            }
            worksheet.write_string(row, col, s)?;
        }
        Cell::Number(n) => {
            if !n.is_finite() {
                warn!(cell = %at, "non-finite number written as text");
                worksheet.write_string(row, col, n.to_string())?;
            } else {
                worksheet.write_number(row, col, *n)?;
            }
        }
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::Date(serial) => {
            worksheet.write_number_with_format(row, col, *serial, date_format)?;
        }
        Cell::Formula { source, cached } => {
            let mut formula = Formula::new(source);
            if let Some(cached) = cached {
                formula = formula.set_result(cached.as_text());
            }
            worksheet.write_formula(row, col, formula)?;
        }
    }
    Ok(true)
}
