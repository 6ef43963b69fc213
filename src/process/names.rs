// src/process/names.rs

//! "Last First[ Middle]" name handling for the client and agent name fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::grid::{Cell, Column, Grid};

/// What to do with tokens beyond "Last First Middle".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep the first three tokens, drop the rest.
    #[default]
    Drop,
    /// Everything after the first name becomes the middle name.
    JoinMiddle,
    /// Leave the name unsplit.
    Reject,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NameParts {
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl NameParts {
    /// "First Last", without a dangling space when either side is missing.
    pub fn display(&self) -> String {
        match (self.first.is_empty(), self.last.is_empty()) {
            (false, false) => format!("{} {}", self.first, self.last),
            (false, true) => self.first.clone(),
            (true, _) => self.last.clone(),
        }
    }
}

/// A name that could only be parsed lossily. Each variant carries what gets
/// written in its place.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NameParseWarning {
    #[error("name is blank")]
    Empty,
    #[error("name `{raw}` has a single token; kept as the last name")]
    SingleToken { raw: String, parts: NameParts },
    #[error("name `{raw}` has {tokens} tokens; dropped `{dropped}`")]
    Overflow {
        raw: String,
        tokens: usize,
        dropped: String,
        parts: NameParts,
    },
    #[error("name `{raw}` has {tokens} tokens; left unsplit")]
    Rejected {
        raw: String,
        tokens: usize,
        display: String,
    },
}

impl NameParseWarning {
    /// Components and display name to write for this name.
    pub fn fallback(&self) -> (NameParts, String) {
        match self {
            NameParseWarning::Empty => (NameParts::default(), String::new()),
            NameParseWarning::SingleToken { parts, .. }
            | NameParseWarning::Overflow { parts, .. } => (parts.clone(), parts.display()),
            NameParseWarning::Rejected { display, .. } => (NameParts::default(), display.clone()),
        }
    }
}

/// Upper-case the first letter of `word`, lower-case the rest.
pub fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Title-case every whitespace-delimited word, joined by single spaces.
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a "Last First[ Middle]" name into title-cased parts.
///
/// Two and three tokens parse cleanly. Anything else is a
/// [`NameParseWarning`] whose [`fallback`](NameParseWarning::fallback) is the
/// degraded value to write; no input ever panics.
pub fn parse_name(raw: &str, overflow: OverflowPolicy) -> Result<NameParts, NameParseWarning> {
    let tokens: Vec<String> = raw.split_whitespace().map(title_case_word).collect();
    let part = |i: usize| tokens.get(i).cloned().unwrap_or_default();

    match tokens.len() {
        0 => Err(NameParseWarning::Empty),
        1 => Err(NameParseWarning::SingleToken {
            raw: raw.to_string(),
            parts: NameParts {
                last: part(0),
                ..NameParts::default()
            },
        }),
        2 | 3 => Ok(NameParts {
            first: part(1),
            middle: part(2),
            last: part(0),
        }),
        n => match overflow {
            OverflowPolicy::Drop => Err(NameParseWarning::Overflow {
                raw: raw.to_string(),
                tokens: n,
                dropped: tokens[3..].join(" "),
                parts: NameParts {
                    first: part(1),
                    middle: part(2),
                    last: part(0),
                },
            }),
            OverflowPolicy::JoinMiddle => Ok(NameParts {
                first: part(1),
                middle: tokens[2..].join(" "),
                last: part(0),
            }),
            OverflowPolicy::Reject => Err(NameParseWarning::Rejected {
                raw: raw.to_string(),
                tokens: n,
                display: title_case(raw),
            }),
        },
    }
}

fn parse_or_fallback(raw: &str, overflow: OverflowPolicy, row: usize, warnings: &mut usize) -> (NameParts, String) {
    match parse_name(raw, overflow) {
        Ok(parts) => {
            let display = parts.display();
            (parts, display)
        }
        Err(w) => {
            warn!(row, warning = %w, "name parsed lossily");
            *warnings += 1;
            w.fallback()
        }
    }
}

/// Destination columns the client name is spread across.
#[derive(Clone, Copy, Debug)]
pub struct ClientNameColumns {
    pub full: Column,
    pub first: Column,
    pub middle: Column,
    pub last: Column,
}

/// Rewrite each client full name in `rows` as "First Last" and fill the
/// first / middle / last columns. Returns how many names parsed lossily.
#[instrument(level = "info", skip(sheet, cols), fields(sheet = %sheet.name()))]
pub fn split_client_names<G: Grid>(
    sheet: &mut G,
    cols: ClientNameColumns,
    rows: RangeInclusive<usize>,
    overflow: OverflowPolicy,
) -> Result<usize> {
    let mut warnings = 0;
    for row in rows {
        let raw = sheet.text(cols.full.at(row));
        let (parts, display) = parse_or_fallback(&raw, overflow, row, &mut warnings);

        for (col, value, what) in [
            (cols.full, display, "swapped full name"),
            (cols.first, parts.first, "first name"),
            (cols.middle, parts.middle, "middle name/initial"),
            (cols.last, parts.last, "last name"),
        ] {
            sheet
                .set_cell(col.at(row), Cell::text(value))
                .with_context(|| format!("failed to set {} at {}", what, col.at(row)))?;
        }
    }
    Ok(warnings)
}

/// Rewrite each agent name in `rows` as "First Last". Returns how many names
/// parsed lossily.
#[instrument(level = "info", skip(sheet), fields(sheet = %sheet.name()))]
pub fn format_agent_names<G: Grid>(
    sheet: &mut G,
    column: Column,
    rows: RangeInclusive<usize>,
    overflow: OverflowPolicy,
) -> Result<usize> {
    let mut warnings = 0;
    for row in rows {
        let raw = sheet.text(column.at(row));
        let (_, display) = parse_or_fallback(&raw, overflow, row, &mut warnings);
        sheet
            .set_cell(column.at(row), Cell::text(display))
            .with_context(|| format!("failed to set swapped agent name at {}", column.at(row)))?;
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellRef, Sheet};

    fn parts(first: &str, middle: &str, last: &str) -> NameParts {
        NameParts {
            first: first.into(),
            middle: middle.into(),
            last: last.into(),
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("MIKESH ALBERT"), "Mikesh Albert");
        assert_eq!(title_case("  smith   jOHN q "), "Smith John Q");
        assert_eq!(title_case_word("ÉMILE"), "Émile");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_two_tokens() {
        let p = parse_name("MIKESH ALBERT", OverflowPolicy::Drop).unwrap();
        assert_eq!(p, parts("Albert", "", "Mikesh"));
        assert_eq!(p.display(), "Albert Mikesh");
    }

    #[test]
    fn test_three_tokens() {
        let p = parse_name("SMITH JOHN Q", OverflowPolicy::Drop).unwrap();
        assert_eq!(p, parts("John", "Q", "Smith"));
        assert_eq!(p.display(), "John Smith");
    }

    #[test]
    fn test_blank_and_single_token_never_panic() {
        assert_eq!(parse_name("   ", OverflowPolicy::Drop), Err(NameParseWarning::Empty));
        assert_eq!(NameParseWarning::Empty.fallback().1, "");

        let w = parse_name("CHER", OverflowPolicy::Drop).unwrap_err();
        let (p, display) = w.fallback();
        assert_eq!(p, parts("", "", "Cher"));
        assert_eq!(display, "Cher");
    }

    #[test]
    fn test_overflow_policies() {
        let raw = "DE LA CRUZ MARIA ELENA";

        let w = parse_name(raw, OverflowPolicy::Drop).unwrap_err();
        match &w {
            NameParseWarning::Overflow { tokens, dropped, .. } => {
                assert_eq!(*tokens, 5);
                assert_eq!(dropped, "Maria Elena");
            }
            other => panic!("unexpected {:?}", other),
        }
        let (p, display) = w.fallback();
        assert_eq!(p, parts("La", "Cruz", "De"));
        assert_eq!(display, "La De");

        let p = parse_name(raw, OverflowPolicy::JoinMiddle).unwrap();
        assert_eq!(p, parts("La", "Cruz Maria Elena", "De"));

        let w = parse_name(raw, OverflowPolicy::Reject).unwrap_err();
        let (p, display) = w.fallback();
        assert_eq!(p, NameParts::default());
        assert_eq!(display, "De La Cruz Maria Elena");
    }

    fn at(s: &str) -> CellRef {
        CellRef::parse(s).unwrap()
    }

    #[test]
    fn test_blank_names_are_counted() -> Result<()> {
        let mut sheet = Sheet::new("Data_Sh");
        sheet.set_cell(at("A2"), Cell::text("   "))?;
        sheet.set_cell(at("A3"), Cell::text("DOE JANE"))?;
        sheet.set_cell(at("G2"), Cell::text("SMITH JOHN"))?;
        sheet.set_cell(at("G3"), Cell::text(" "))?;

        let agent =
            format_agent_names(&mut sheet, Column::parse("A").unwrap(), 2..=3, OverflowPolicy::Drop)?;
        assert_eq!(agent, 1);
        assert_eq!(sheet.text(at("A2")), "");
        assert_eq!(sheet.text(at("A3")), "Jane Doe");

        let client = split_client_names(&mut sheet, client_cols(), 2..=3, OverflowPolicy::Drop)?;
        assert_eq!(client, 1);
        assert_eq!(sheet.text(at("G2")), "John Smith");
        assert_eq!(sheet.text(at("G3")), "");
        assert_eq!(sheet.text(at("H3")), "");
        assert_eq!(sheet.text(at("J3")), "");
        Ok(())
    }

    fn client_cols() -> ClientNameColumns {
        ClientNameColumns {
            full: Column::parse("G").unwrap(),
            first: Column::parse("H").unwrap(),
            middle: Column::parse("I").unwrap(),
            last: Column::parse("J").unwrap(),
        }
    }

    #[test]
    fn test_split_client_names_in_place() -> Result<()> {
        let mut sheet = Sheet::new("Data_Sh");
        sheet.set_cell(at("G1"), Cell::text("Client Full Name"))?;
        sheet.set_cell(at("G2"), Cell::text("SMITH JOHN Q"))?;
        sheet.set_cell(at("G3"), Cell::text("MIKESH ALBERT"))?;
        sheet.set_cell(at("G4"), Cell::text("A B C D"))?;

        let warnings = split_client_names(&mut sheet, client_cols(), 2..=4, OverflowPolicy::Drop)?;
        assert_eq!(warnings, 1);

        assert_eq!(sheet.text(at("G1")), "Client Full Name");
        assert_eq!(sheet.text(at("G2")), "John Smith");
        assert_eq!(sheet.text(at("H2")), "John");
        assert_eq!(sheet.text(at("I2")), "Q");
        assert_eq!(sheet.text(at("J2")), "Smith");
        assert_eq!(sheet.text(at("G3")), "Albert Mikesh");
        assert_eq!(sheet.text(at("I3")), "");
        assert_eq!(sheet.text(at("G4")), "B A");
        assert_eq!(sheet.text(at("I4")), "C");
        Ok(())
    }

    #[test]
    fn test_format_agent_names_only_touches_display() -> Result<()> {
        let mut sheet = Sheet::new("Data_Sh");
        sheet.set_cell(at("A2"), Cell::text("DOE JANE M"))?;
        sheet.set_cell(at("A3"), Cell::text(""))?;
        let warnings =
            format_agent_names(&mut sheet, Column::parse("A").unwrap(), 2..=3, OverflowPolicy::Drop)?;
        // the blank row is a warning
        assert_eq!(warnings, 1);
        assert_eq!(sheet.text(at("A2")), "Jane Doe");
        assert_eq!(sheet.text(at("A3")), "");
        assert_eq!(sheet.text(at("B2")), "");
        Ok(())
    }
}
