// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::info;

use crate::grid::Column;
use crate::process::names::OverflowPolicy;
use crate::process::schema::CanonicalSchema;

/// Path of the YAML file overriding the built-in configuration.
pub const CONFIG_ENV: &str = "STATEMENT_CONFIG";

/// Fixed column positions of the carrier's statement layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    /// Rows with this column blank are dropped.
    pub key: Column,
    /// Percentage points rescaled to a fraction.
    pub rate: Column,
    pub product: Column,
    pub business_code: Column,
    pub plan_type: Column,
    pub commission_action: Column,
    /// Computed columns the classifier writes back into the source sheet.
    pub carrier_out: Column,
    pub sub_line_out: Column,
}

impl Default for SourceLayout {
    fn default() -> Self {
        let col = |s: &str| Column::parse(s).expect("built-in column letters should parse");
        Self {
            key: col("C"),
            rate: col("X"),
            product: col("S"),
            business_code: col("J"),
            plan_type: col("T"),
            commission_action: col("AB"),
            carrier_out: col("AU"),
            sub_line_out: col("AV"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sheet holding the statement; the workbook's first sheet when unset.
    pub source_sheet: Option<String>,
    /// Sheet receiving the normalized rows, appended to if it already exists.
    pub data_sheet: String,
    /// Constant written to every row's Line field.
    pub line: String,
    pub name_overflow: OverflowPolicy,
    pub source: SourceLayout,
    pub schema: CanonicalSchema,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_sheet: None,
            data_sheet: "Data_Sh".to_string(),
            line: "Health".to_string(),
            name_overflow: OverflowPolicy::default(),
            source: SourceLayout::default(),
            schema: CanonicalSchema::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig =
            serde_yaml::from_str(text).context("parsing pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading config {:?}", path))
    }

    /// Built-in defaults unless `STATEMENT_CONFIG` names a YAML file.
    pub fn from_env() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                info!(path = %path, "loading pipeline config");
                Self::from_yaml_file(path.trim())
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_sheet.trim().is_empty() {
            bail!("data_sheet must not be blank");
        }
        if self.source_sheet.as_deref() == Some(self.data_sheet.as_str()) {
            bail!(
                "source_sheet and data_sheet are both `{}`",
                self.data_sheet
            );
        }
        if self.source.carrier_out == self.source.sub_line_out {
            bail!(
                "carrier and sub-line are both written to column {}",
                self.source.carrier_out
            );
        }
        self.schema.validate().context("invalid canonical schema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.data_sheet, "Data_Sh");
        assert_eq!(config.line, "Health");
        assert_eq!(config.source.key.letters(), "C");
        assert_eq!(config.source.rate.letters(), "X");
        assert_eq!(config.source.carrier_out.letters(), "AU");
        assert_eq!(config.source.sub_line_out.letters(), "AV");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> Result<()> {
        let config = PipelineConfig::from_yaml_str(
            "data_sheet: Normalized\nname_overflow: join_middle\nsource:\n  key: d\n",
        )?;
        assert_eq!(config.data_sheet, "Normalized");
        assert_eq!(config.name_overflow, OverflowPolicy::JoinMiddle);
        assert_eq!(config.source.key.letters(), "D");
        assert_eq!(config.source.rate.letters(), "X");
        assert_eq!(config.schema, CanonicalSchema::default());
        Ok(())
    }

    #[test]
    fn test_bad_column_rejected() {
        let err = PipelineConfig::from_yaml_str("source:\n  rate: X9\n").unwrap_err();
        assert!(format!("{:#}", err).contains("X9"));
    }

    #[test]
    fn test_same_sheet_rejected() {
        let err = PipelineConfig::from_yaml_str("source_sheet: Data_Sh\n").unwrap_err();
        assert!(err.to_string().contains("Data_Sh"));
    }

    #[test]
    fn test_yaml_file_round_trip() -> Result<()> {
        let config = PipelineConfig {
            line: "Life".into(),
            ..PipelineConfig::default()
        };
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(serde_yaml::to_string(&config)?.as_bytes())?;
        let loaded = PipelineConfig::from_yaml_file(tmp.path())?;
        assert_eq!(loaded, config);
        Ok(())
    }
}
