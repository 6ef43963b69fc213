// src/process/mod.rs

pub mod classify;
pub mod filter;
pub mod mapper;
pub mod names;
pub mod rate;
pub mod row;
pub mod schema;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::config::PipelineConfig;
use crate::grid::{self, Grid, Workbook};
use names::ClientNameColumns;
use row::{ClassifiedRow, SourceRow};
use schema::CanonicalField;

/// What one in-memory normalization pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    /// Data rows in the source sheet before filtering.
    pub source_rows: usize,
    pub removed_rows: usize,
    pub written_rows: usize,
    /// First destination row written this run; `None` when nothing was written.
    pub destination_start_row: Option<usize>,
    pub name_warnings: usize,
}

/// Outcome of processing one statement file.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    /// `None` when the statement had no data rows and nothing was saved.
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub stats: NormalizeStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// `<dir>/<stem>_processed.xlsx` next to the input.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{}_processed.xlsx", stem))
}

/// Run the whole pipeline over the workbook already in memory.
///
/// `input` is only used for the statement link. The source sheet is filtered,
/// rescaled and classified in place; normalized rows are appended to the data
/// sheet after whatever it already holds.
#[instrument(level = "info", skip(workbook, input, config), fields(input = %input.display()))]
pub fn normalize_workbook(
    workbook: &mut Workbook,
    input: &Path,
    config: &PipelineConfig,
) -> Result<NormalizeStats> {
    config.validate()?;
    let layout = &config.source;
    let schema = &config.schema;

    let source_name = match &config.source_sheet {
        Some(name) => name.clone(),
        None => workbook
            .first_sheet_name()
            .ok_or_else(|| anyhow!("workbook has no sheets"))?
            .to_string(),
    };
    if source_name == config.data_sheet {
        return Err(anyhow!(
            "source sheet `{}` is also the data sheet",
            source_name
        ));
    }

    // 1) filter + classify the source sheet
    let source = workbook
        .sheet_mut(&source_name)
        .ok_or_else(|| anyhow!("source sheet `{}` not found", source_name))?;
    let mut stats = NormalizeStats {
        source_rows: source.row_count().saturating_sub(1),
        ..NormalizeStats::default()
    };
    stats.removed_rows = filter::remove_rows_missing_key(source, layout.key)
        .context("filtering source rows")?;

    let last_source_row = source.row_count();
    let mut rows = Vec::with_capacity(last_source_row.saturating_sub(1));
    for number in 2..=last_source_row {
        let classified = ClassifiedRow::new(SourceRow::from_sheet(source, number), layout);
        classified
            .write_back(source, layout)
            .with_context(|| format!("amending source row {}", number))?;
        debug!(row = number, carrier = %classified.classification.carrier, "classified");
        rows.push(classified);
    }
    info!(rows = rows.len(), "classified source rows");

    if rows.is_empty() {
        info!("no data rows to copy");
        return Ok(stats);
    }

    // 2) map onto the data sheet
    let dest = workbook.ensure_sheet(&config.data_sheet);
    mapper::write_header(dest, schema).context("writing data sheet header")?;
    let start = dest.row_count() + 1;
    for (from, to) in schema.copy_pairs() {
        debug!(%from, %to, "copy column");
    }
    let link = mapper::statement_link(input);

    for (offset, classified) in rows.iter().enumerate() {
        let dest_row = start + offset;
        mapper::map_row(schema, classified, &config.line, &link)
            .write_to(dest, dest_row)
            .with_context(|| {
                format!(
                    "copying source row {} to {} row {}",
                    classified.row.number, config.data_sheet, dest_row
                )
            })?;
    }
    let end = start + rows.len() - 1;
    stats.written_rows = rows.len();
    stats.destination_start_row = Some(start);
    info!(start, end, "wrote data rows");

    // 3) names, in place on the rows just written
    let client = ClientNameColumns {
        full: schema.column_of(CanonicalField::ClientFullName)?,
        first: schema.column_of(CanonicalField::ClientFirstName)?,
        middle: schema.column_of(CanonicalField::ClientMiddleName)?,
        last: schema.column_of(CanonicalField::ClientLastName)?,
    };
    stats.name_warnings += names::split_client_names(dest, client, start..=end, config.name_overflow)
        .context("splitting client names")?;
    stats.name_warnings += names::format_agent_names(
        dest,
        schema.column_of(CanonicalField::AgentName)?,
        start..=end,
        config.name_overflow,
    )
    .context("formatting agent names")?;

    Ok(stats)
}

/// Load `input`, normalize it, and save the result next to it as
/// `<name>_processed.xlsx`. The input file itself is never modified.
#[instrument(level = "info", skip(input, config), fields(input = %input.as_ref().display()))]
pub fn process_statement<P: AsRef<Path>>(input: P, config: &PipelineConfig) -> Result<RunSummary> {
    let input = input.as_ref();
    let started_at = Utc::now();

    let mut workbook = grid::load_workbook(input)?;
    let stats = normalize_workbook(&mut workbook, input, config)?;

    let output = if stats.written_rows > 0 {
        let out = output_path(input);
        grid::save_workbook(&workbook, &out)
            .with_context(|| format!("failed to save new file {:?}", out))?;
        info!(output = %out.display(), rows = stats.written_rows, "processing done and file saved");
        Some(out)
    } else {
        info!("nothing to write; no output saved");
        None
    };

    Ok(RunSummary {
        input: input.to_path_buf(),
        output,
        stats,
        started_at,
        finished_at: Utc::now(),
    })
}
