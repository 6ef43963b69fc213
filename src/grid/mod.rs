// src/grid/mod.rs

//! In-memory sheets addressed the way a spreadsheet user addresses them:
//! column letters and 1-based row numbers.

pub mod address;
pub mod xlsx;

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate};

pub use address::{AddressError, CellRef, Column};
pub use xlsx::{load_workbook, save_workbook};

/// A single cell value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Spreadsheet date serial (days since 1899-12-30).
    Date(f64),
    /// Formula source without the leading `=`, plus the last computed value if known.
    Formula {
        source: String,
        cached: Option<Box<Cell>>,
    },
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The cell as a plain value: formulas collapse to their cached result.
    pub fn value(&self) -> Cell {
        match self {
            Cell::Formula { cached, .. } => cached
                .as_deref()
                .map(Cell::value)
                .unwrap_or(Cell::Empty),
            other => other.clone(),
        }
    }

    /// The text a spreadsheet user would see in the cell.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Cell::Date(serial) => format_date_serial(*serial),
            Cell::Formula { .. } => self.value().as_text(),
        }
    }
}

/// Integers print without decimals.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Serial of 9999-12-31, the last date a spreadsheet can hold.
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

fn format_date_serial(serial: f64) -> String {
    if !(0.0..=MAX_DATE_SERIAL + 1.0).contains(&serial) {
        return format_number(serial);
    }
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return format_number(serial);
    };
    let whole_days = serial.floor();
    let Some(date) = epoch.checked_add_signed(Duration::days(whole_days as i64)) else {
        return format_number(serial);
    };
    let seconds = ((serial - whole_days) * 86_400.0).round() as i64;
    if seconds == 0 {
        date.format("%m/%d/%Y").to_string()
    } else {
        match date.and_hms_opt(0, 0, 0) {
            Some(dt) => (dt + Duration::seconds(seconds))
                .format("%m/%d/%Y %H:%M:%S")
                .to_string(),
            None => date.format("%m/%d/%Y").to_string(),
        }
    }
}

/// Row/cell access over one named sheet.
pub trait Grid {
    fn name(&self) -> &str;

    /// Number of rows up to and including the last non-empty one.
    fn row_count(&self) -> usize;

    fn cell(&self, at: CellRef) -> &Cell;

    fn set_cell(&mut self, at: CellRef, value: Cell) -> Result<()>;

    /// Delete row `row`; every later row moves up by one.
    fn remove_row(&mut self, row: usize) -> Result<()>;

    fn text(&self, at: CellRef) -> String {
        self.cell(at).as_text()
    }
}

static EMPTY: Cell = Cell::Empty;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    name: String,
    /// `rows[0]` is spreadsheet row 1.
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Build a sheet from rows of text, starting at A1. Handy for fixtures.
    pub fn from_rows<R, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Cell::text).collect())
            .collect();
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Cells of row `row` (1-based); missing rows are empty.
    pub fn row(&self, row: usize) -> &[Cell] {
        row.checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate `(row number, cells)` over every stored row up to `row_count`.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[Cell])> {
        self.rows[..self.row_count()]
            .iter()
            .enumerate()
            .map(|(i, r)| (i + 1, r.as_slice()))
    }
}

impl Grid for Sheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> usize {
        self.rows
            .iter()
            .rposition(|r| r.iter().any(|c| !c.is_empty()))
            .map_or(0, |i| i + 1)
    }

    fn cell(&self, at: CellRef) -> &Cell {
        self.row(at.row).get(at.column.index()).unwrap_or(&EMPTY)
    }

    fn set_cell(&mut self, at: CellRef, value: Cell) -> Result<()> {
        if at.row == 0 || at.row > address::MAX_ROWS {
            bail!(AddressError::RowOutOfRange(at.row));
        }
        let (r, c) = (at.row - 1, at.column.index());
        if self.rows.len() <= r {
            if value.is_empty() {
                return Ok(());
            }
            self.rows.resize_with(r + 1, Vec::new);
        }
        let cells = &mut self.rows[r];
        if cells.len() <= c {
            if value.is_empty() {
                return Ok(());
            }
            cells.resize(c + 1, Cell::Empty);
        }
        cells[c] = value;
        Ok(())
    }

    fn remove_row(&mut self, row: usize) -> Result<()> {
        if row == 0 || row > address::MAX_ROWS {
            bail!(AddressError::RowOutOfRange(row));
        }
        if row <= self.rows.len() {
            self.rows.remove(row - 1);
        }
        Ok(())
    }
}

/// An ordered collection of sheets.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn first_sheet_name(&self) -> Option<&str> {
        self.sheets.first().map(|s| s.name.as_str())
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<()> {
        if self.sheet(&sheet.name).is_some() {
            bail!("sheet `{}` already exists", sheet.name);
        }
        self.sheets.push(sheet);
        Ok(())
    }

    /// Return the named sheet, appending an empty one if it is missing.
    pub fn ensure_sheet(&mut self, name: &str) -> &mut Sheet {
        let idx = match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> CellRef {
        CellRef::parse(s).unwrap()
    }

    #[test]
    fn test_as_text() {
        assert_eq!(Cell::Number(45.0).as_text(), "45");
        assert_eq!(Cell::Number(0.45).as_text(), "0.45");
        assert_eq!(Cell::Bool(true).as_text(), "TRUE");
        assert_eq!(Cell::Date(45292.0).as_text(), "01/01/2024");
        assert_eq!(Cell::Date(45292.5).as_text(), "01/01/2024 12:00:00");
        let f = Cell::Formula {
            source: "1+1".into(),
            cached: Some(Box::new(Cell::Number(2.0))),
        };
        assert_eq!(f.as_text(), "2");
        assert_eq!(f.value(), Cell::Number(2.0));
        assert_eq!(Cell::text(""), Cell::Empty);
    }

    #[test]
    fn test_set_and_get() -> Result<()> {
        let mut sheet = Sheet::new("s");
        assert_eq!(sheet.row_count(), 0);
        sheet.set_cell(at("C3"), Cell::text("x"))?;
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.text(at("C3")), "x");
        assert_eq!(sheet.text(at("ZZ99")), "");
        // blank writes never grow the sheet
        sheet.set_cell(at("A10"), Cell::Empty)?;
        assert_eq!(sheet.row_count(), 3);
        Ok(())
    }

    #[test]
    fn test_remove_row_renumbers() -> Result<()> {
        let mut sheet = Sheet::from_rows("s", vec![vec!["h"], vec!["a"], vec!["b"], vec!["c"]]);
        sheet.remove_row(2)?;
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.text(at("A2")), "b");
        assert_eq!(sheet.text(at("A3")), "c");
        // removing past the end is a no-op
        sheet.remove_row(50)?;
        assert_eq!(sheet.row_count(), 3);
        assert!(sheet.remove_row(0).is_err());
        Ok(())
    }

    #[test]
    fn test_trailing_blank_rows_not_counted() {
        let sheet = Sheet::from_rows("s", vec![vec!["h"], vec!["a"], vec![""], vec![""]]);
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.rows().count(), 2);
    }

    #[test]
    fn test_ensure_sheet_keeps_existing() -> Result<()> {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::from_rows("Data_Sh", vec![vec!["h"], vec!["old"]]))?;
        assert_eq!(wb.ensure_sheet("Data_Sh").row_count(), 2);
        assert_eq!(wb.ensure_sheet("Other").row_count(), 0);
        assert_eq!(wb.sheet_names(), vec!["Data_Sh", "Other"]);
        assert!(wb.add_sheet(Sheet::new("Other")).is_err());
        Ok(())
    }
}
