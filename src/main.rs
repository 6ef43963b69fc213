use anyhow::{bail, Context, Result};
use glob::glob;
use statement_normalizer::{process_statement, PipelineConfig};
use std::{env, path::PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Used when neither arguments nor `STATEMENT_PATH` name a statement.
const DEFAULT_STATEMENT: &str = "files/Humana ay64 big file (1).xlsx";

/// Arguments are paths or glob patterns; a pattern matching nothing is kept
/// as a literal path so the failure names it.
fn resolve_inputs(args: &[String]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for arg in args {
        let matched: Vec<PathBuf> = glob(arg)
            .with_context(|| format!("Failed to read glob pattern '{}'", arg))?
            .filter_map(|entry| entry.ok())
            .collect();
        if matched.is_empty() {
            inputs.push(PathBuf::from(arg));
        } else {
            inputs.extend(matched);
        }
    }
    Ok(inputs)
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,statement_normalizer=info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();
    info!("startup");

    // ─── 2) config + inputs ──────────────────────────────────────────
    let config = PipelineConfig::from_env()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let inputs = if !args.is_empty() {
        resolve_inputs(&args)?
    } else if let Ok(path) = env::var("STATEMENT_PATH") {
        vec![PathBuf::from(path)]
    } else {
        vec![PathBuf::from(DEFAULT_STATEMENT)]
    };
    info!("{} statement(s) to process", inputs.len());

    // ─── 3) process one at a time ────────────────────────────────────
    let mut failed = 0;
    for input in &inputs {
        match process_statement(input, &config) {
            Ok(summary) => {
                if summary.output.is_none() {
                    warn!(input = %input.display(), "no data rows; nothing saved");
                }
                info!(summary = %serde_json::to_string(&summary)?, "done");
            }
            Err(e) => {
                error!("{} failed: {:#}", input.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} statement(s) failed", failed, inputs.len());
    }
    Ok(())
}
