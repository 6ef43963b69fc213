// src/process/mapper.rs

use anyhow::{Context, Result};
use std::path::Path;

use super::row::ClassifiedRow;
use super::schema::{CanonicalField, CanonicalSchema, FieldSource};
use crate::grid::{Cell, Column, Grid};

/// One row of the normalized table, as `(field, destination column, value)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalRow {
    pub values: Vec<(CanonicalField, Column, Cell)>,
}

impl CanonicalRow {
    pub fn get(&self, field: CanonicalField) -> Option<&Cell> {
        self.values
            .iter()
            .find(|(f, _, _)| *f == field)
            .map(|(_, _, v)| v)
    }

    /// Write every value into row `row` of `sheet`.
    pub fn write_to<G: Grid>(&self, sheet: &mut G, row: usize) -> Result<()> {
        for (field, column, value) in &self.values {
            let at = column.at(row);
            sheet
                .set_cell(at, value.clone())
                .with_context(|| format!("failed to set {:?} at {}", field, at))?;
        }
        Ok(())
    }
}

/// `=HYPERLINK("<path>", "<file name>")` pointing back at the statement file.
pub fn statement_link(path: &Path) -> Cell {
    let target = path.display().to_string();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| target.clone());
    Cell::Formula {
        source: format!(
            "HYPERLINK(\"{}\", \"{}\")",
            escape_formula_text(&target),
            escape_formula_text(&name)
        ),
        cached: Some(Box::new(Cell::text(name))),
    }
}

/// Double quotes inside a formula string literal are written twice.
fn escape_formula_text(s: &str) -> String {
    s.replace('"', "\"\"")
}

/// Build the canonical row for one classified source row. Name components are
/// left blank for the name splitter to fill in.
pub fn map_row(
    schema: &CanonicalSchema,
    source: &ClassifiedRow,
    line: &str,
    link: &Cell,
) -> CanonicalRow {
    let values = schema
        .columns()
        .iter()
        .filter_map(|spec| {
            let value = match &spec.source {
                FieldSource::Copy { from } => source.row.get(*from).value(),
                FieldSource::Line => Cell::text(line),
                FieldSource::StatementLink => link.clone(),
                FieldSource::NameComponent => return None,
            };
            Some((spec.field, spec.column, value))
        })
        .collect();
    CanonicalRow { values }
}

/// Write the header row of `schema` into row 1.
pub fn write_header<G: Grid>(sheet: &mut G, schema: &CanonicalSchema) -> Result<()> {
    for spec in schema.columns() {
        let at = spec.column.at(1);
        sheet
            .set_cell(at, Cell::text(spec.header()))
            .with_context(|| format!("failed to set header {} at {}", spec.header(), at))?;
    }
    Ok(())
}
