use statement_normalizer::grid::{load_workbook, Column, Grid};
use std::{env, path::Path, process::exit};

fn main() {
    // Expect a workbook path, optionally a sheet name and a row limit.
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!("Usage: {} <WORKBOOK> [SHEET] [ROWS]", args[0]);
        exit(1);
    }
    let limit = match args.get(3).map(|s| s.parse::<usize>()) {
        None => 5,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("Error: bad row count: {}", e);
            exit(1);
        }
    };
    if let Err(e) = inspect_workbook(Path::new(&args[1]), args.get(2).map(String::as_str), limit) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print every sheet's row count, then the first `limit` rows of one sheet
/// cell by cell, addressed by column letter.
fn inspect_workbook(path: &Path, sheet: Option<&str>, limit: usize) -> anyhow::Result<()> {
    let workbook = load_workbook(path)?;

    println!("=== Workbook: {} ===", path.display());
    for s in workbook.sheets() {
        println!("- {:<30} | rows: {}", s.name(), s.row_count());
    }
    println!();

    let name = match sheet.or_else(|| workbook.first_sheet_name()) {
        Some(name) => name,
        None => return Ok(()),
    };
    let sheet = workbook
        .sheet(name)
        .ok_or_else(|| anyhow::anyhow!("no sheet named `{}`", name))?;

    println!("=== {} (first {} rows) ===", name, limit);
    for (row, cells) in sheet.rows().take(limit) {
        println!("Row {}:", row);
        for (idx, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let col = Column::from_index(idx)?;
            println!("  {:<4} {:?}", col.letters(), cell);
        }
    }
    Ok(())
}
