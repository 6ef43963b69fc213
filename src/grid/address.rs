// src/grid/address.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Excel's widest sheet ends at column XFD.
pub const MAX_COLUMNS: usize = 16_384;
/// Excel's tallest sheet.
pub const MAX_ROWS: usize = 1_048_576;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid column reference `{0}`")]
    InvalidColumn(String),
    #[error("invalid cell reference `{0}`")]
    InvalidCell(String),
    #[error("row {0} is outside the sheet")]
    RowOutOfRange(usize),
}

/// A sheet column, written and read as its letters ("A", "AB", ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Column(usize);

impl Column {
    /// Parse column letters, case-insensitively.
    pub fn parse(letters: &str) -> Result<Self, AddressError> {
        let trimmed = letters.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AddressError::InvalidColumn(letters.to_string()));
        }
        let mut n: usize = 0;
        for c in trimmed.chars() {
            let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            n = n * 26 + digit;
            if n > MAX_COLUMNS {
                return Err(AddressError::InvalidColumn(letters.to_string()));
            }
        }
        Ok(Column(n - 1))
    }

    pub fn from_index(index: usize) -> Result<Self, AddressError> {
        if index >= MAX_COLUMNS {
            return Err(AddressError::InvalidColumn(index.to_string()));
        }
        Ok(Column(index))
    }

    /// 0-based position (A = 0).
    pub fn index(self) -> usize {
        self.0
    }

    pub fn letters(self) -> String {
        let mut out = String::new();
        let mut n = self.0;
        loop {
            out.insert(0, (b'A' + (n % 26) as u8) as char);
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        out
    }

    pub fn at(self, row: usize) -> CellRef {
        CellRef { column: self, row }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

impl TryFrom<String> for Column {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Column::parse(&value)
    }
}

impl From<Column> for String {
    fn from(value: Column) -> Self {
        value.letters()
    }
}

/// An A1-style cell address. Rows are 1-based, as a spreadsheet user sees them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: Column,
    pub row: usize,
}

impl CellRef {
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| AddressError::InvalidCell(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        let column = Column::parse(letters).map_err(|_| AddressError::InvalidCell(s.to_string()))?;
        let row: usize = digits
            .parse()
            .map_err(|_| AddressError::InvalidCell(s.to_string()))?;
        if row == 0 || row > MAX_ROWS {
            return Err(AddressError::InvalidCell(s.to_string()));
        }
        Ok(CellRef { column, row })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}
