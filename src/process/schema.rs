// src/process/schema.rs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::grid::Column;

/// Every field of the normalized "Data" table shared by all carrier pipelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    AgentName,
    Carrier,
    AgentId,
    StatementDate,
    ClientFullName,
    ClientFirstName,
    ClientMiddleName,
    ClientLastName,
    CarrierMemberId,
    PolicyNumber,
    EffectiveDate,
    Line,
    SubLine,
    PlanType,
    Contract,
    Premium,
    AgentSplit,
    CompRate,
    Commission,
    CommissionAction,
    StatementLink,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 21] = [
        CanonicalField::AgentName,
        CanonicalField::Carrier,
        CanonicalField::AgentId,
        CanonicalField::StatementDate,
        CanonicalField::ClientFullName,
        CanonicalField::ClientFirstName,
        CanonicalField::ClientMiddleName,
        CanonicalField::ClientLastName,
        CanonicalField::CarrierMemberId,
        CanonicalField::PolicyNumber,
        CanonicalField::EffectiveDate,
        CanonicalField::Line,
        CanonicalField::SubLine,
        CanonicalField::PlanType,
        CanonicalField::Contract,
        CanonicalField::Premium,
        CanonicalField::AgentSplit,
        CanonicalField::CompRate,
        CanonicalField::Commission,
        CanonicalField::CommissionAction,
        CanonicalField::StatementLink,
    ];

    pub fn header(self) -> &'static str {
        match self {
            CanonicalField::AgentName => "Agent Name",
            CanonicalField::Carrier => "Carrier",
            CanonicalField::AgentId => "Agent ID",
            CanonicalField::StatementDate => "Statement Date",
            CanonicalField::ClientFullName => "Client Full Name",
            CanonicalField::ClientFirstName => "Client First Name",
            CanonicalField::ClientMiddleName => "Client Middle Name/Initial",
            CanonicalField::ClientLastName => "Client Last name",
            CanonicalField::CarrierMemberId => "Carrier Member ID",
            CanonicalField::PolicyNumber => "Policy Number",
            CanonicalField::EffectiveDate => "Effective Date",
            CanonicalField::Line => "Line",
            CanonicalField::SubLine => "Sub-line",
            CanonicalField::PlanType => "Plan Type",
            CanonicalField::Contract => "Contract",
            CanonicalField::Premium => "Premium",
            CanonicalField::AgentSplit => "Agent Split",
            CanonicalField::CompRate => "Comp Rate",
            CanonicalField::Commission => "Commission",
            CanonicalField::CommissionAction => "Commission Action",
            CanonicalField::StatementLink => "Statement Link",
        }
    }
}

/// Where a canonical field's value comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSource {
    /// Value copied from a source column (the classifier's computed columns included).
    Copy { from: Column },
    /// The pipeline's constant line of business.
    Line,
    /// `HYPERLINK` formula back to the statement file.
    StatementLink,
    /// Filled in afterwards by the name splitter.
    NameComponent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field: CanonicalField,
    pub column: Column,
    pub source: FieldSource,
    /// Overrides the field's default header text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl ColumnSpec {
    pub fn header(&self) -> &str {
        self.header.as_deref().unwrap_or(self.field.header())
    }
}

/// The declarative destination schema: an ordered list of fields, each with
/// its destination column and value source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSchema {
    columns: Vec<ColumnSpec>,
}

impl CanonicalSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn spec(&self, field: CanonicalField) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Destination column of `field`; validation guarantees every field is present.
    pub fn column_of(&self, field: CanonicalField) -> Result<Column> {
        match self.spec(field) {
            Some(spec) => Ok(spec.column),
            None => bail!("schema has no column for {:?}", field),
        }
    }

    /// The `(source, destination)` copy pairs, in schema order.
    pub fn copy_pairs(&self) -> impl Iterator<Item = (Column, Column)> + '_ {
        self.columns.iter().filter_map(|c| match c.source {
            FieldSource::Copy { from } => Some((from, c.column)),
            _ => None,
        })
    }

    /// Every field exactly once, no two fields sharing a destination column,
    /// and the constant / link / name fields sourced the only way they can be.
    pub fn validate(&self) -> Result<()> {
        let mut fields = HashSet::new();
        let mut columns = HashSet::new();
        for spec in &self.columns {
            if !fields.insert(spec.field) {
                bail!("field {:?} is mapped more than once", spec.field);
            }
            if !columns.insert(spec.column) {
                bail!(
                    "destination column {} is used by more than one field",
                    spec.column
                );
            }
            let expected_ok = match spec.field {
                CanonicalField::Line => spec.source == FieldSource::Line,
                CanonicalField::StatementLink => spec.source == FieldSource::StatementLink,
                CanonicalField::ClientFirstName
                | CanonicalField::ClientMiddleName
                | CanonicalField::ClientLastName => spec.source == FieldSource::NameComponent,
                _ => matches!(spec.source, FieldSource::Copy { .. }),
            };
            if !expected_ok {
                bail!("field {:?} cannot be sourced from {:?}", spec.field, spec.source);
            }
        }
        for field in CanonicalField::ALL {
            if !fields.contains(&field) {
                bail!("field {:?} is missing from the schema", field);
            }
        }
        Ok(())
    }
}

fn col(letters: &str) -> Column {
    Column::parse(letters).expect("built-in column letters should parse")
}

fn copy(field: CanonicalField, to: &str, from: &str) -> ColumnSpec {
    ColumnSpec {
        field,
        column: col(to),
        source: FieldSource::Copy { from: col(from) },
        header: None,
    }
}

fn derived(field: CanonicalField, to: &str, source: FieldSource) -> ColumnSpec {
    ColumnSpec {
        field,
        column: col(to),
        source,
        header: None,
    }
}

impl Default for CanonicalSchema {
    /// The Humana statement layout mapped onto the shared Data table columns.
    fn default() -> Self {
        use CanonicalField::*;
        Self {
            columns: vec![
                copy(AgentName, "A", "C"),
                copy(Carrier, "B", "AU"),
                copy(AgentId, "C", "D"),
                copy(StatementDate, "E", "B"),
                copy(ClientFullName, "G", "E"),
                derived(ClientFirstName, "H", FieldSource::NameComponent),
                derived(ClientMiddleName, "I", FieldSource::NameComponent),
                derived(ClientLastName, "J", FieldSource::NameComponent),
                copy(CarrierMemberId, "K", "F"),
                copy(PolicyNumber, "L", "AM"),
                copy(EffectiveDate, "M", "AF"),
                derived(Line, "R", FieldSource::Line),
                copy(SubLine, "S", "AV"),
                copy(PlanType, "T", "T"),
                copy(Contract, "V", "AN"),
                copy(Premium, "Z", "W"),
                copy(AgentSplit, "AA", "X"),
                copy(CompRate, "AB", "V"),
                copy(Commission, "AD", "Y"),
                copy(CommissionAction, "AG", "AB"),
                derived(StatementLink, "AH", FieldSource::StatementLink),
            ],
        }
    }
}
