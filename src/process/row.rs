// src/process/row.rs

use anyhow::{Context, Result};

use super::classify::{classify, Classification};
use super::rate::rescale_percentage;
use crate::config::SourceLayout;
use crate::grid::{Cell, Column, Grid, Sheet};

/// One statement line item, snapshotted from the source sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceRow {
    /// 1-based row number in the (already filtered) source sheet.
    pub number: usize,
    pub cells: Vec<Cell>,
}

impl SourceRow {
    pub fn from_sheet(sheet: &Sheet, number: usize) -> Self {
        Self {
            number,
            cells: sheet.row(number).to_vec(),
        }
    }

    pub fn get(&self, col: Column) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.cells.get(col.index()).unwrap_or(&EMPTY)
    }

    pub fn text(&self, col: Column) -> String {
        self.get(col).as_text()
    }

    pub fn set(&mut self, col: Column, value: Cell) {
        let idx = col.index();
        if self.cells.len() <= idx {
            self.cells.resize(idx + 1, Cell::Empty);
        }
        self.cells[idx] = value;
    }
}

/// A source row after rate rescaling and classification, with the computed
/// carrier / sub-line already placed in its computed columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedRow {
    pub row: SourceRow,
    pub classification: Classification,
    /// The rescaled rate, when the rate cell was numeric.
    pub rate: Option<f64>,
}

impl ClassifiedRow {
    pub fn new(mut row: SourceRow, layout: &SourceLayout) -> Self {
        let rate = rescale_percentage(row.get(layout.rate));
        if let Some(rate) = rate {
            row.set(layout.rate, Cell::Number(rate));
        }

        let classification = classify(
            &row.text(layout.product),
            &row.text(layout.business_code),
            &row.text(layout.plan_type),
            &row.text(layout.commission_action),
        );
        row.set(layout.carrier_out, Cell::text(classification.carrier.clone()));
        // an unmatched sub-line leaves whatever the column already held
        if let Some(sub_line) = &classification.sub_line {
            row.set(layout.sub_line_out, Cell::text(sub_line.clone()));
        }

        Self {
            row,
            classification,
            rate,
        }
    }

    /// Mirror the rescaled rate and computed columns into the source sheet.
    pub fn write_back<G: Grid>(&self, sheet: &mut G, layout: &SourceLayout) -> Result<()> {
        let number = self.row.number;
        if let Some(rate) = self.rate {
            sheet
                .set_cell(layout.rate.at(number), Cell::Number(rate))
                .with_context(|| format!("failed to set adjusted value in {}", layout.rate.at(number)))?;
        }
        sheet
            .set_cell(
                layout.carrier_out.at(number),
                Cell::text(self.classification.carrier.clone()),
            )
            .with_context(|| format!("failed to set Carrier {}", layout.carrier_out.at(number)))?;
        if let Some(sub_line) = &self.classification.sub_line {
            sheet
                .set_cell(layout.sub_line_out.at(number), Cell::text(sub_line.clone()))
                .with_context(|| {
                    format!("failed to set Sub-line {}", layout.sub_line_out.at(number))
                })?;
        }
        Ok(())
    }
}
