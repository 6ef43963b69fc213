// src/process/filter.rs

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::grid::{Column, Grid};

/// Data rows (row 2 onward) whose `key` column is blank after trimming.
pub fn rows_missing_key<G: Grid>(sheet: &G, key: Column) -> Vec<usize> {
    (2..=sheet.row_count())
        .filter(|&row| sheet.text(key.at(row)).trim().is_empty())
        .collect()
}

/// Remove every data row lacking a value in `key`, returning how many went.
///
/// The doomed rows are collected first, then deleted from the bottom up so
/// each deletion leaves the numbers of the rows still to delete intact.
#[instrument(level = "info", skip(sheet), fields(sheet = %sheet.name()))]
pub fn remove_rows_missing_key<G: Grid>(sheet: &mut G, key: Column) -> Result<usize> {
    let doomed = rows_missing_key(sheet, key);
    for &row in doomed.iter().rev() {
        debug!(row, "removing row without key");
        sheet
            .remove_row(row)
            .with_context(|| format!("failed to remove row {}", row))?;
    }
    info!(removed = doomed.len(), remaining = sheet.row_count(), "filtered source rows");
    Ok(doomed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellRef, Sheet};

    fn key() -> Column {
        Column::parse("C").unwrap()
    }

    fn sample() -> Sheet {
        Sheet::from_rows(
            "Statement",
            vec![
                vec!["date", "agent", "id"],
                vec!["1", "", "A1"],
                vec!["2", "", "   "],
                vec!["3", "", ""],
                vec!["4", "", "A4"],
                vec!["5", "", "\t"],
            ],
        )
    }

    #[test]
    fn test_blank_keys_removed() -> Result<()> {
        let mut sheet = sample();
        assert_eq!(rows_missing_key(&sheet, key()), vec![3, 4, 6]);

        let removed = remove_rows_missing_key(&mut sheet, key())?;
        assert_eq!(removed, 3);
        assert_eq!(sheet.row_count(), 3);
        let at = |s: &str| CellRef::parse(s).unwrap();
        assert_eq!(sheet.text(at("C1")), "id");
        assert_eq!(sheet.text(at("A2")), "1");
        assert_eq!(sheet.text(at("A3")), "4");
        Ok(())
    }

    #[test]
    fn test_header_never_removed() -> Result<()> {
        let mut sheet = Sheet::from_rows("s", vec![vec!["", "", ""]]);
        sheet.set_cell(CellRef::parse("A1").unwrap(), crate::grid::Cell::text("only"))?;
        assert_eq!(remove_rows_missing_key(&mut sheet, key())?, 0);
        assert_eq!(sheet.row_count(), 1);
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let mut once = sample();
        remove_rows_missing_key(&mut once, key())?;
        let mut twice = once.clone();
        assert_eq!(remove_rows_missing_key(&mut twice, key())?, 0);
        assert_eq!(once, twice);
        Ok(())
    }
}
