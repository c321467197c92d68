use std::path::PathBuf;

use colored::Colorize;

use crate::error::{CenterBooksError, Result};
use crate::importer::{import_file, ImportOptions};
use crate::settings::load_settings;

use super::open_db;

const MAX_ERRORS_SHOWN: usize = 20;

pub fn run(file: &str, year: Option<i32>, json: bool) -> Result<()> {
    let file_path = PathBuf::from(file);
    let settings = load_settings();
    let conn = open_db()?;

    let opts = ImportOptions::new(settings.resolve_year(year));
    let result = import_file(&conn, &file_path, &opts)?;

    if json {
        let out = serde_json::to_string_pretty(&result)
            .map_err(|e| CenterBooksError::Other(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "{} income, {} expense imported",
        result.income_imported.to_string().green().bold(),
        result.expense_imported.to_string().green().bold()
    );

    if !result.errors.is_empty() {
        println!("{}", format!("{} rows failed:", result.errors.len()).yellow());
        for err in result.errors.iter().take(MAX_ERRORS_SHOWN) {
            println!("  {err}");
        }
        if result.errors.len() > MAX_ERRORS_SHOWN {
            println!("  … and {} more (use --json for the full list)", result.errors.len() - MAX_ERRORS_SHOWN);
        }
    }
    Ok(())
}
